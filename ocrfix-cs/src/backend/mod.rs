//! Remote backend access
//!
//! The backend is the system of record for scripts, OCR payloads and
//! correction results. Everything here is a thin layer over HTTP: no
//! retries, no caching.

pub mod client;
pub mod combined;

pub use client::{ApiResponse, BackendClient, BackendHealth, ClientError, RawResponse};
pub use combined::{fetch_combined, parse_combined, CombinedRecord, COMBINED_DATA_PATH};
