use anyhow::{Context, Result, bail};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

const MEASUREMENT_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

const ENVELOPE_TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// Accepts the dataset's own `YYYY-MM-DD HH:MM:SS` (read as UTC) or RFC 3339.
pub fn parse_measurement_time(raw: &str) -> Result<OffsetDateTime> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        bail!("measurement_time is empty");
    }

    if let Ok(parsed) = PrimitiveDateTime::parse(candidate, MEASUREMENT_TIME_FORMAT) {
        return Ok(parsed.assume_utc());
    }
    if let Ok(parsed) = OffsetDateTime::parse(candidate, &Rfc3339) {
        return Ok(parsed.to_offset(UtcOffset::UTC));
    }

    bail!("unsupported timestamp format: {candidate}");
}

/// Canonical `measurement_time` text: `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn normalize_measurement_time(raw: &str) -> Result<String> {
    parse_measurement_time(raw)?
        .format(MEASUREMENT_TIME_FORMAT)
        .with_context(|| format!("failed to format measurement_time: {raw}"))
}

/// Millisecond UTC timestamp for envelopes, e.g. `2024-06-01T07:01:18.000Z`.
#[must_use]
pub fn format_envelope_time(moment: OffsetDateTime) -> String {
    let moment = moment.to_offset(UtcOffset::UTC);
    moment
        .format(ENVELOPE_TIME_FORMAT)
        .unwrap_or_else(|_| format!("{}Z", moment.unix_timestamp()))
}

#[must_use]
pub fn envelope_time_now() -> String {
    format_envelope_time(OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{format_envelope_time, normalize_measurement_time, parse_measurement_time};

    #[test]
    fn dataset_timestamp_is_read_as_utc() {
        let parsed = parse_measurement_time("2024-06-01 07:01:18").expect("timestamp should parse");
        assert_eq!(parsed, datetime!(2024-06-01 07:01:18 UTC));
        assert_eq!(format_envelope_time(parsed), "2024-06-01T07:01:18.000Z");
    }

    #[test]
    fn rfc3339_offsets_are_converted() {
        let parsed =
            parse_measurement_time("2024-06-01T09:01:18+02:00").expect("timestamp should parse");
        assert_eq!(parsed, datetime!(2024-06-01 07:01:18 UTC));
    }

    #[test]
    fn normalizes_every_supported_input_to_dataset_format() {
        for raw in [
            "2024-06-01 07:01:18",
            " 2024-06-01T07:01:18Z ",
            "2024-06-01T12:31:18+05:30",
            "2024-06-01T07:01:18.250Z",
        ] {
            assert_eq!(
                normalize_measurement_time(raw).expect("timestamp should normalize"),
                "2024-06-01 07:01:18",
                "input: {raw}"
            );
        }
    }

    #[test]
    fn rejects_blank_and_unsupported_text() {
        let err = normalize_measurement_time("   ").expect_err("blank should fail");
        assert!(err.to_string().contains("empty"));

        let err =
            normalize_measurement_time("next friday").expect_err("unsupported string should fail");
        assert!(err.to_string().contains("unsupported timestamp format"));
    }

    #[test]
    fn envelope_time_has_millisecond_precision() {
        assert_eq!(
            format_envelope_time(datetime!(2026-02-25 00:00:00.123456 +01:00)),
            "2026-02-24T23:00:00.123Z"
        );
    }
}
