//! Wall-clock timestamps for report metadata.

use std::time::SystemTime;

/// RFC 3339 UTC timestamp. Report metadata only; never feeds the search.
pub fn wall_time_iso_utc() -> String {
    let dt: time::OffsetDateTime = SystemTime::now().into();
    dt.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
