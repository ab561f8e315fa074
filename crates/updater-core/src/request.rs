//! Parsing of the `version` query parameter sent by clients.
//!
//! Fields are joined by `x`:
//!
//! ```text
//! major x minor x maintenance x revision x installationMtime x lastCheck
//!   x channel x edition x build [x phpMajor x phpMinor x phpRelease]
//! ```
//!
//! e.g. `8x2x0x12x1448709225.0768x1448709281xtestingxx2015-10-19T18:44:30+00:00 8ee2009de3x5x6x0`.
//! Missing trailing fields are treated as not reported.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::types::ClientDescriptor;

impl ClientDescriptor {
    /// Parse a client's `version` parameter. Never fails: anything
    /// missing or unreadable is left empty.
    pub fn from_version_param(param: &str) -> Self {
        let mut fields = param.split('x').map(str::trim);
        let mut next = || fields.next().unwrap_or_default().to_string();

        let major_version = next();
        let minor_version = next();
        let maintenance_version = next();
        let revision_version = next();
        let installation_age_token = next();
        let _last_check = next();
        let channel = next();
        let _edition = next();
        let build = next();
        let php_major_version = next();
        let php_minor_version = next();
        let php_release_version = next();

        ClientDescriptor {
            channel,
            major_version,
            minor_version,
            maintenance_version,
            revision_version,
            build_timestamp: parse_build_timestamp(&build),
            installation_age_token,
            php_major_version,
            php_minor_version,
            php_release_version,
        }
    }
}

/// Parse the RFC 3339 timestamp leading a build string
/// (`2015-10-19T18:44:30+00:00 <commit>`).
///
/// An unescaped `+` in the query decodes to a space and splits the
/// offset off; the bare date-time is then read as UTC.
pub fn parse_build_timestamp(build: &str) -> Option<DateTime<Utc>> {
    let stamp = build.split_whitespace().next()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
