//! API types shared between the correction service and its callers

pub mod types;

pub use types::{CorrectionResponse, CorrectionStatus, ErrorResponse};
