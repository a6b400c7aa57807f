pub mod config;
pub mod context;
pub mod error;
pub mod handler;

pub use config::SpoolConfig;
pub use context::{Context, Request, Response};
pub use error::SpoolError;
pub use handler::{ErrorHandler, Gas, HandlerFunc, Skipper};
