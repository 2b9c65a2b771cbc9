//! Wire types and errors shared by the field encryption service and its callers.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
