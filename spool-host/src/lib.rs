pub mod app;
pub mod server;

pub use app::{App, Service};
