pub mod logger;
pub mod request_id;
pub mod skipper;

pub use logger::{LoggerConfig, logger, logger_with_config};
pub use request_id::{RequestIdConfig, request_id, request_id_with_config};
