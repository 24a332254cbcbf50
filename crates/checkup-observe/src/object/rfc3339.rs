use std::fmt;

use time::{OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

/// RFC3339 timestamps at a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct LoggerRfc3339 {
    offset: UtcOffset,
}

impl LoggerRfc3339 {
    pub fn new(offset: UtcOffset) -> Self {
        Self { offset }
    }

    fn now(&self) -> String {
        OffsetDateTime::now_utc()
            .to_offset(self.offset)
            .format(&Rfc3339)
            .unwrap_or_else(|_| "<invalid-time>".to_string())
    }
}

impl FormatTime for LoggerRfc3339 {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} ", self.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_timestamps_end_with_z() {
        let ts = LoggerRfc3339::new(UtcOffset::UTC).now();
        assert!(ts.ends_with('Z'), "{ts}");
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn carries_the_configured_offset() {
        let offset = UtcOffset::from_hms(3, 0, 0).unwrap();
        let ts = LoggerRfc3339::new(offset).now();
        assert!(ts.ends_with("+03:00"), "{ts}");
    }
}
