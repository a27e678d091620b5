//! Reminder Scheduler: once a day, after the configured time, remind
//! technicians and dispatchers about orders due tomorrow.
//!
//! The last-swept day lives in `scheduler_state`, and the reminder ledger
//! carries a uniqueness constraint, so a restart neither repeats a day's
//! sweep nor sends a reminder twice.

pub mod clock;
pub mod window;
pub mod sweep;
pub mod background;

pub use clock::*;
pub use window::*;
pub use sweep::*;
pub use background::*;
