use serde::{Deserialize, Serialize};

/// `Status` value the API returns on success.
pub const STATUS_SUCCESS: &str = "success";

/// Envelope wrapping every BoldChat API response.
///
/// `message` is only populated when `status` reports an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Outcome of the call, `"success"` when it succeeded.
    #[serde(rename = "Status", default)]
    pub status: String,
    /// Error description from the vendor.
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Operation payload.
    #[serde(rename = "Data", default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Returns `true` if the call succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// The vendor's error message, or the status when no message was given.
    #[must_use]
    pub fn error_message(&self) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ if self.status.is_empty() => "response carried no Status".to_string(),
            _ => format!("status {}", self.status),
        }
    }
}
