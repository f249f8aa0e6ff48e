//! Data Transfer Objects for the bridge HTTP API.

pub mod request;
pub mod validation;

pub use request::*;
pub use validation::*;
