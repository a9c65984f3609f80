//! The cooperative event loop the board runs on: a logical clock, one-shot
//! timers, the per-frame commit queue, and wall-clock timestamps for records.

mod clock;
pub mod gesture;
mod scheduler;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gesture::{ClickOutcome, DoubleClick, DOUBLE_CLICK_WINDOW_MS};
pub use scheduler::{FrameChange, FrameCommit, Scheduler, TimerId, TimerTask};
