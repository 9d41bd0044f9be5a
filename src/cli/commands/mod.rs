//! CLI command implementations
//!
//! Exit codes shared by the commands:
//! - `0` success
//! - `2` invalid configuration
//! - `3` filing not found
//! - `4` partial export
//! - `5` fatal error

pub mod export;
pub mod serve;
pub mod validate;

/// Command succeeded
pub const EXIT_SUCCESS: i32 = 0;
/// Configuration could not be loaded or is invalid
pub const EXIT_CONFIG: i32 = 2;
/// The filing does not exist
pub const EXIT_NOT_FOUND: i32 = 3;
/// The workbook was written but the export stopped early
pub const EXIT_PARTIAL: i32 = 4;
/// Nothing usable was produced
pub const EXIT_FATAL: i32 = 5;
