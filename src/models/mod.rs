pub mod enums;
pub mod order;
pub mod reminder;
pub mod user;

pub use enums::*;
pub use order::*;
pub use reminder::*;
pub use user::*;
