//! Decoding of `d"…"`, `t"…"` and `dt"…"` annotated strings.
//!
//! Accepted reductions, per the wire grammar:
//!
//! - date-times: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, `…THH`, `…THH:MM`,
//!   `…THH:MM:SS`, each optionally suffixed with `Z` or `±HH:MM`
//! - dates: the three date reductions, no time, no offset
//! - times: `HH`, `HH:MM`, `HH:MM:SS`, anchored to 1900-01-01 UTC

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone};

const TIME_REFERENCE_YEAR: i32 = 1900;

/// Parse the body of a `dt"…"` annotation.
pub(crate) fn parse_date_time(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let (body, offset) = split_offset(text)?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (body, None),
    };
    let date = parse_date_part(date_part)?;
    let time = match time_part {
        Some(t) => parse_time_part(t)?,
        None => NaiveTime::MIN,
    };
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| format!("`{text}` is not a valid date-time"))
}

/// Parse the body of a `d"…"` annotation: date reductions only.
pub(crate) fn parse_date(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let date = parse_date_part(text)?;
    Ok(utc()
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .expect("UTC is never ambiguous"))
}

/// Parse the body of a `t"…"` annotation: a time on the reference date.
pub(crate) fn parse_time(text: &str) -> Result<DateTime<FixedOffset>, String> {
    let time = parse_time_part(text)?;
    let reference = NaiveDate::from_ymd_opt(TIME_REFERENCE_YEAR, 1, 1)
        .expect("the reference date is valid");
    Ok(utc()
        .from_local_datetime(&reference.and_time(time))
        .single()
        .expect("UTC is never ambiguous"))
}

fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
}

/// Strip a trailing `Z` or `±HH:MM` offset, defaulting to UTC.
fn split_offset(text: &str) -> Result<(&str, FixedOffset), String> {
    if let Some(body) = text.strip_suffix('Z') {
        return Ok((body, utc()));
    }
    let bytes = text.as_bytes();
    if text.len() > 6 {
        let tail = &bytes[text.len() - 6..];
        let is_offset = matches!(tail[0], b'+' | b'-')
            && tail[1].is_ascii_digit()
            && tail[2].is_ascii_digit()
            && tail[3] == b':'
            && tail[4].is_ascii_digit()
            && tail[5].is_ascii_digit();
        if is_offset {
            let body = &text[..text.len() - 6];
            let hours: i32 = text[text.len() - 5..text.len() - 3].parse().unwrap();
            let minutes: i32 = text[text.len() - 2..].parse().unwrap();
            let mut seconds = hours * 3600 + minutes * 60;
            if tail[0] == b'-' {
                seconds = -seconds;
            }
            let offset = FixedOffset::east_opt(seconds)
                .ok_or_else(|| format!("`{}` is not a valid UTC offset", &text[text.len() - 6..]))?;
            return Ok((body, offset));
        }
    }
    Ok((text, utc()))
}

fn parse_date_part(text: &str) -> Result<NaiveDate, String> {
    let mut fields = text.splitn(3, '-');
    let year_text = fields.next().unwrap_or_default();
    if year_text.len() != 4 {
        return Err(format!("`{text}` is not a valid date: expected a 4-digit year"));
    }
    let year = int_field(year_text, text)? as i32;
    let month = match fields.next() {
        Some(m) => int_field(m, text)?,
        None => 1,
    };
    let day = match fields.next() {
        Some(d) => int_field(d, text)?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("`{text}` is not a valid calendar date"))
}

fn parse_time_part(text: &str) -> Result<NaiveTime, String> {
    let mut fields = text.splitn(3, ':');
    let hour = int_field(fields.next().unwrap_or_default(), text)?;
    let minute = match fields.next() {
        Some(m) => int_field(m, text)?,
        None => 0,
    };
    let second = match fields.next() {
        Some(s) => int_field(s, text)?,
        None => 0,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or_else(|| format!("`{text}` is not a valid time"))
}

fn int_field(field: &str, whole: &str) -> Result<u32, String> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("`{whole}` is not a valid date or time"));
    }
    field
        .parse()
        .map_err(|_| format!("`{whole}` is not a valid date or time"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn date_time_reductions() {
        let full = parse_date_time("2023-04-05T06:07:08").unwrap();
        assert_eq!(full.to_rfc3339(), "2023-04-05T06:07:08+00:00");

        let year_only = parse_date_time("2023").unwrap();
        assert_eq!(year_only.to_rfc3339(), "2023-01-01T00:00:00+00:00");

        let date_and_hour = parse_date_time("2023-04-05T06").unwrap();
        assert_eq!(date_and_hour.to_rfc3339(), "2023-04-05T06:00:00+00:00");
    }

    #[test]
    fn offsets() {
        let zulu = parse_date_time("2023-04-05T06:07Z").unwrap();
        assert_eq!(zulu.offset().local_minus_utc(), 0);

        let plus = parse_date_time("2023-04-05T06:07+05:30").unwrap();
        assert_eq!(plus.offset().local_minus_utc(), 5 * 3600 + 30 * 60);

        let minus = parse_date_time("2023-04-05T06:07-08:00").unwrap();
        assert_eq!(minus.offset().local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn dates_do_not_take_offsets() {
        assert!(parse_date("2023-04-05").is_ok());
        assert!(parse_date("2023-04-05Z").is_err());
        assert!(parse_date("2023-04-05T06").is_err());
    }

    #[test]
    fn times_anchor_to_the_reference_date() {
        let t = parse_time("10:30").unwrap();
        assert_eq!(t.to_rfc3339(), "1900-01-01T10:30:00+00:00");
        assert!(parse_time("25:00").is_err());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_date_time("04-05").is_err());
        assert!(parse_date_time("2023-13-01").is_err());
        assert!(parse_date_time("2023-02-30").is_err());
        assert!(parse_date_time("abcd").is_err());
    }
}
