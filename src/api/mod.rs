//! Surface for the HTTP collaborator: error-to-status mapping.

pub mod error;

pub use error::{ApiError, ErrorBody, ErrorDetail};
