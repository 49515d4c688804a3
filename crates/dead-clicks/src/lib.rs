pub mod clock;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker::{DeadClickConfig, DeadClickTracker, TOOLBAR_ID};
