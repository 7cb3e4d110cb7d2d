//! Synthetic status codes for failures that never reached a server

use reqwest::StatusCode;

/// Status codes below the HTTP range, reported when the transport fails in a known way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticStatus {
    /// Deadline exceeded while awaiting response headers
    Timeout = 1,
    /// Certificate validation failed
    InvalidCertificate = 2,
}

/// Status code reported for [`SyntheticStatus::Timeout`]
pub const STATUS_TIMEOUT: u16 = SyntheticStatus::Timeout as u16;
/// Status code reported for [`SyntheticStatus::InvalidCertificate`]
pub const STATUS_INVALID_CERTIFICATE: u16 = SyntheticStatus::InvalidCertificate as u16;

impl SyntheticStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn canonical_text(self) -> &'static str {
        match self {
            SyntheticStatus::Timeout => "Request Timeout",
            SyntheticStatus::InvalidCertificate => "Invalid SSL Certificate",
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            STATUS_TIMEOUT => Some(SyntheticStatus::Timeout),
            STATUS_INVALID_CERTIFICATE => Some(SyntheticStatus::InvalidCertificate),
            _ => None,
        }
    }
}

/// Text for a status code.
///
/// Synthetic codes map to their canonical text, real HTTP codes to their reason phrase.
/// Anything else yields an empty string.
pub fn status_text(code: u16) -> &'static str {
    if let Some(status) = SyntheticStatus::from_code(code) {
        return status.canonical_text();
    }
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}
