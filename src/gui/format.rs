use chrono::{DateTime, NaiveDateTime, Utc};

pub const PLACEHOLDER : &str = "—";

/// Human readable age of an ISO timestamp relative to `now`.
/// Missing or unparsable timestamps give the placeholder.
pub fn relative_age(iso : Option<&str>, now : DateTime<Utc>) -> String {
  let at = match iso.and_then(parse_timestamp) {
    Some( at ) => at,
    None => return PLACEHOLDER.to_string(),
  };

  let sec = now.signed_duration_since(at).num_seconds();
  if sec < 10 {
    return String::from("just now");
  }
  if sec < 60 {
    return format!("{}s ago", sec);
  }
  let min = sec / 60;
  if min < 60 {
    return format!("{}m ago", min);
  }
  format!("{}h ago", min / 60)
}

/// RFC 3339 first; timestamps without an offset are taken as UTC.
pub fn parse_timestamp(s : &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok( dt ) = DateTime::parse_from_rfc3339(s) {
    return Some( dt.with_timezone(&Utc) );
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, TimeZone};

  fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
  }

  fn age_of(seconds : i64) -> String {
    let at = (now() - Duration::seconds(seconds)).to_rfc3339();
    relative_age(Some(&at), now())
  }

  #[test]
  fn missing_or_garbage_is_placeholder() {
    assert_eq!(relative_age(None, now()), "—");
    assert_eq!(relative_age(Some(""), now()), "—");
    assert_eq!(relative_age(Some("yesterday-ish"), now()), "—");
  }

  #[test]
  fn boundaries() {
    assert_eq!(age_of(0), "just now");
    assert_eq!(age_of(9), "just now");
    assert_eq!(age_of(10), "10s ago");
    assert_eq!(age_of(59), "59s ago");
    assert_eq!(age_of(60), "1m ago");
    assert_eq!(age_of(3599), "59m ago");
    assert_eq!(age_of(3600), "1h ago");
    assert_eq!(age_of(3 * 86400), "72h ago");
  }

  #[test]
  fn future_timestamp_is_just_now() {
    assert_eq!(age_of(-120), "just now");
  }

  #[test]
  fn accepts_offsets_and_naive_times() {
    assert_eq!(relative_age(Some("2024-05-01T20:58:00+09:00"), now()), "2m ago");
    assert_eq!(relative_age(Some("2024-05-01T11:59:29.500"), now()), "30s ago");
  }
}
