use crate::{
    contract::{ContractBinding, Route},
    error::Result,
    strategy::{attempt, first_success, Success},
};
use ethers::types::Log;

/// Retrieves raw contract logs through every transport the binding can reach.
pub struct LogSource<'a> {
    binding: &'a ContractBinding,
}

impl<'a> LogSource<'a> {
    pub fn new(binding: &'a ContractBinding) -> Self {
        Self { binding }
    }

    /// All logs of `event_name` over the full block range.
    ///
    /// Retrieval methods are tried in order and the first one that does not
    /// error wins, even when it returns no logs.
    pub async fn fetch(&self, event_name: &str) -> Result<Success<Vec<Log>>> {
        let binding = self.binding;
        let topic0 = binding.event(event_name)?.signature();
        let filter = binding.topic_filter(topic0);
        let filter = &filter;

        let attempts = vec![
            attempt("signer eth_getLogs", async move {
                binding.get_logs(Route::Signer, filter).await
            }),
            attempt("node eth_getLogs", async move {
                binding.get_logs(Route::Node, filter).await
            }),
            attempt("signer eth_getFilterLogs", async move {
                binding.get_filter_logs(Route::Signer, filter).await
            }),
            attempt("node eth_getFilterLogs", async move {
                binding.get_filter_logs(Route::Node, filter).await
            }),
            attempt("typed query_filter", async move {
                binding.query_filter(event_name, 0).await
            }),
        ];

        let label = format!("logs:{}", event_name);
        let success = first_success(&label, attempts).await?;
        tracing::debug!(
            "Found {} {} logs via {}",
            success.value.len(),
            event_name,
            success.strategy
        );
        Ok(success)
    }

    /// Standard ERC-20 `Transfer` logs through the binding's typed filter.
    pub async fn standard_transfers(&self) -> Result<Vec<Log>> {
        self.binding.query_filter("Transfer", 0).await
    }
}
