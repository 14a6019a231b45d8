use chrono::{DateTime, Local};

/// Wall-clock timestamp used for visit boundaries and snapshot names.
pub type Timestamp = DateTime<Local>;

/// Source of "now" for a session.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now()
    }
}
