//! 核心层：错误类型、可注入时钟、运行预算

pub mod budget;
pub mod clock;
pub mod error;

pub use budget::{Budget, Deadline};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::PilotError;
