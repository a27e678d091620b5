pub mod intake;
pub mod orders;
