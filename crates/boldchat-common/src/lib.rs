//! # boldchat-common
//!
//! Common types for the BoldChat REST API client.
//!
//! This crate provides the data model shared by the client:
//! - Account configuration and regional endpoints
//! - Operator records and edit requests
//! - The response envelope every API call returns
//!
//! ## Example
//!
//! ```
//! use boldchat_common::{ApiResponse, Config, Operator, Region};
//!
//! let config = Config::new("123456", "789", "secret").with_region(Region::Us);
//! assert_eq!(config.endpoint(), "https://api.boldchat.com");
//!
//! let response: ApiResponse<Vec<Operator>> = serde_json::from_str(
//!     r#"{"Status":"success","Data":[{"LoginID":"1","Name":"Alex","Disabled":"false"}]}"#,
//! )?;
//! assert!(response.is_success());
//! # Ok::<(), serde_json::Error>(())
//! ```

/// Client configuration and regional endpoints.
pub mod config;
/// Operator records and edit requests.
pub mod operator;
/// The response envelope returned by every API call.
pub mod response;
pub mod vendor;

pub use config::{Config, Region, RetryConfig};
pub use operator::{Operator, OperatorDepartment, OperatorService, OperatorUpdate};
pub use response::{ApiResponse, STATUS_SUCCESS};

/// Library name reported by [`version`].
pub const LIBNAME: &str = "BoldChat";

/// Returns the library name and version, e.g. `BoldChat v0.0.6`.
#[must_use]
pub fn version() -> String {
    format!("{LIBNAME} v{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string() {
        let version = version();
        assert!(version.starts_with("BoldChat v"));
        assert!(version.ends_with(env!("CARGO_PKG_VERSION")));
    }
}
