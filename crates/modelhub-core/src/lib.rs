//! # modelhub-core
//!
//! Core crate for ModelHub. Contains configuration schemas, the shared
//! response payloads, and the unified error system.
//!
//! This crate has **no** internal dependencies on other ModelHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
