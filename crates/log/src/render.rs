//! Line rendering for the two output formats.

use std::fmt;

use serde_json::json;

use crate::level::{Format, Level};

/// One formatted log event.
#[derive(Clone, Debug)]
pub struct Record<'a> {
    pub ts_ms: u64,
    pub level: Level,
    pub target: &'a str,
    pub file: &'a str,
    pub line: u32,
    pub msg: &'a str,
}

/// Renders `record` without a trailing newline.
pub fn render(record: &Record<'_>, format: Format, timestamps: bool) -> String {
    match format {
        Format::Text => {
            let mut out = String::new();
            if timestamps {
                out.push_str(&Timestamp::from_millis(record.ts_ms).to_string());
                out.push(' ');
            }
            out.push_str(&format!(
                "{} {}: {}",
                record.level.as_str(),
                record.target,
                record.msg
            ));
            out
        }
        Format::Json => json!({
            "ts_ms": record.ts_ms,
            "level": record.level.as_str(),
            "target": record.target,
            "file": record.file,
            "line": record.line,
            "msg": record.msg,
        })
        .to_string(),
    }
}

/// UTC wall-clock time with millisecond precision, printed as RFC 3339.
struct Timestamp {
    unix_seconds: u64,
    millis: u32,
}

impl Timestamp {
    fn from_millis(ts_ms: u64) -> Self {
        Self {
            unix_seconds: ts_ms / 1_000,
            millis: (ts_ms % 1_000) as u32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SECS_PER_DAY: u64 = 86_400;
        let days = (self.unix_seconds / SECS_PER_DAY) as i64;
        let secs_of_day = self.unix_seconds % SECS_PER_DAY;
        let (year, month, day) = civil_from_days(days);
        write!(
            f,
            "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
            secs_of_day / 3_600,
            (secs_of_day % 3_600) / 60,
            secs_of_day % 60,
            self.millis
        )
    }
}

// Howard Hinnant's days-to-civil conversion.
fn civil_from_days(days_since_unix_epoch: i64) -> (i32, u32, u32) {
    let z = days_since_unix_epoch + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = (yoe as i32) + (era as i32) * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    (year + i32::from(month <= 2), month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(msg: &str) -> Record<'_> {
        Record {
            ts_ms: 1_555_986_291_250,
            level: Level::Warn,
            target: "kepler_chainstate::index",
            file: "crates/chainstate/src/index.rs",
            line: 42,
            msg,
        }
    }

    #[test]
    fn text_line_with_and_without_timestamp() {
        let rec = record("unexpected difficulty bits");
        assert_eq!(
            render(&rec, Format::Text, true),
            "2019-04-23T02:24:51.250Z WARN kepler_chainstate::index: unexpected difficulty bits"
        );
        assert_eq!(
            render(&rec, Format::Text, false),
            "WARN kepler_chainstate::index: unexpected difficulty bits"
        );
    }

    #[test]
    fn json_line_escapes_message() {
        let line = render(&record("quote \" inside"), Format::Json, true);
        let value: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["line"], 42);
        assert_eq!(value["msg"], "quote \" inside");
        assert_eq!(value["ts_ms"], 1_555_986_291_250u64);
    }

    #[test]
    fn civil_dates() {
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(11_016), (2000, 2, 29));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
    }
}
