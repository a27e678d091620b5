//! HTTP intake surface.
//!
//! Stands in for the chat front-end: normalize a dispatcher message into
//! a candidate, then create the confirmed order. Routes are nested under
//! `/api/`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;

pub use router::api_router;
pub use server::serve;
