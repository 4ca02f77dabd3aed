//! HTTP API handlers for ocrfix-cs

pub mod correction;
pub mod diagnostics;
pub mod health;
pub mod index;

pub use correction::correction_routes;
pub use diagnostics::diagnostic_routes;
pub use health::health_routes;
pub use index::index_routes;
