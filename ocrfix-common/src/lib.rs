//! # ocrfix Common Library
//!
//! Shared code for the ocrfix services:
//! - Bootstrap configuration (TOML file, environment, command line)
//! - Common error type
//! - API response types shared by the front door and its clients

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
