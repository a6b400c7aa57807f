pub mod duration;
pub mod field;
pub mod record;
pub mod template;

pub use duration::HumanDuration;
pub use field::Field;
pub use record::LogRecord;
pub use template::{DEFAULT_FORMAT, Template};
