pub mod book;
pub mod clearing;
pub mod clock;
pub mod period;

pub use book::*;
pub use clearing::*;
pub use clock::{Clock, Deadline, MonotonicClock};
pub use period::*;
