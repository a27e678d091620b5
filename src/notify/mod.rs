//! Notification delivery: transport seam, Telegram transport, message
//! templates and the order-created fan-out.

pub mod transport;
pub mod telegram;
pub mod messages;
pub mod dispatcher;

pub use transport::*;
pub use telegram::*;
pub use messages::*;
pub use dispatcher::*;
