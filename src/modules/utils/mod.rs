pub mod logging;
pub mod time;

pub use logging::{initialize_logging, log_auth_event, log_data_operation};
pub use time::{Clock, ManualClock, SystemClock};
