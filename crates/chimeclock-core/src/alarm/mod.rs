mod matcher;
mod time;

pub use matcher::{AlarmMatcher, SecondGate, TriggerRecord};
pub use time::AlarmTime;
