pub mod clock;
pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
