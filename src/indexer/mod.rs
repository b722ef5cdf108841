pub mod event_parser;
pub mod log_source;

pub use event_parser::EventParser;
pub use log_source::LogSource;
