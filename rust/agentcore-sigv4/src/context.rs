use chrono::{DateTime, Utc};

use crate::KEY_TYPE_IDENTIFIER;

/// Region and service a signature is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    region: String,
    service: String,
}

impl SigningContext {
    /// Create a new signing context.
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Get the region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Credential scope for the given day: `date/region/service/aws4_request`.
    pub fn scope(&self, timestamp: &Timestamp) -> String {
        format!(
            "{}/{}/{}/{}",
            timestamp.date(),
            self.region,
            self.service,
            KEY_TYPE_IDENTIFIER
        )
    }
}

/// A single captured signing instant.
///
/// Both the `YYYYMMDD` scope date and the ISO 8601 basic timestamp are
/// rendered from the same instant, so they can never disagree across a day
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap an instant.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// `YYYYMMDD`
    pub fn date(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `YYYYMMDDTHHMMSSZ`
    pub fn datetime(&self) -> String {
        self.0.format("%Y%m%dT%H%M%SZ").to_string()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(time: DateTime<Utc>) -> Self {
        Self::new(time)
    }
}
