use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Day format written to the store.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Formats older builds wrote: `Date.toDateString()` and the Polish locale
/// short date.
const LEGACY_DAY_FORMATS: [&str; 2] = ["%a %b %d %Y", "%d.%m.%Y"];

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a calendar day in any format the app has ever persisted.
/// Full RFC 3339 timestamps are reduced to their date part.
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
        return Some(d);
    }
    for fmt in LEGACY_DAY_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

/// Time left until the next local midnight.
pub fn duration_until_midnight(now: NaiveDateTime) -> std::time::Duration {
    let next_midnight = now
        .date()
        .succ_opt()
        .and_then(|d| d.and_hms_opt(0, 0, 0));
    match next_midnight {
        Some(midnight) => (midnight - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO),
        None => std::time::Duration::ZERO,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    #[serde(alias = "rano")]
    Morning,
    #[serde(alias = "popołudnie")]
    Afternoon,
    #[serde(alias = "wieczór")]
    Evening,
}

impl TimeOfDay {
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            0..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    pub fn current() -> Self {
        Self::for_hour(Local::now().hour())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
        }
    }

    pub fn greeting(&self) -> &'static str {
        match self {
            Self::Morning => "Good morning",
            Self::Afternoon => "Good afternoon",
            Self::Evening => "Good evening",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "morning" | "rano" => Some(Self::Morning),
            "afternoon" | "popołudnie" => Some(Self::Afternoon),
            "evening" | "wieczór" => Some(Self::Evening),
            _ => None,
        }
    }
}

/// Serde adapter for a required day field.
pub mod day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_day(*day))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_day(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date: {raw}")))
    }
}

/// Serde adapter for an optional day; unreadable values become `None`.
pub mod opt_day {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(day: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match day {
            Some(d) => s.serialize_str(&super::format_day(*d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.and_then(|r| {
            if r.trim().is_empty() {
                return None;
            }
            let parsed = super::parse_day(&r);
            if parsed.is_none() {
                log::warn!("Ignoring unreadable date {:?}", r);
            }
            parsed
        }))
    }
}

/// Serde adapter for a local timestamp. Accepts RFC 3339 (what browsers
/// write) as well as naive timestamps; anything else reads as "now".
pub mod datetime {
    use chrono::{Local, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Local).naive_local());
        }
        if let Ok(dt) = raw.parse::<NaiveDateTime>() {
            return Ok(dt);
        }
        log::warn!("Unreadable timestamp {:?}, using current time", raw);
        Ok(super::now())
    }
}

/// Serde adapter for a list of days; unreadable and repeated entries are
/// dropped.
pub mod day_list {
    use chrono::NaiveDate;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(days: &[NaiveDate], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(days.len()))?;
        for d in days {
            seq.serialize_element(&super::format_day(*d))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<NaiveDate>, D::Error> {
        let raw = Option::<Vec<String>>::deserialize(d)?.unwrap_or_default();
        let mut days: Vec<NaiveDate> = Vec::with_capacity(raw.len());
        for r in &raw {
            match super::parse_day(r) {
                Some(day) if !days.contains(&day) => days.push(day),
                Some(_) => {}
                None => log::warn!("Dropping unreadable history date {:?}", r),
            }
        }
        Ok(days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_persisted_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(parse_day("2026-10-19"), Some(expected));
        assert_eq!(parse_day("Mon Oct 19 2026"), Some(expected));
        assert_eq!(parse_day("19.10.2026"), Some(expected));
        assert_eq!(parse_day("yesterday"), None);
    }

    #[test]
    fn midnight_countdown() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(duration_until_midnight(now).as_secs(), 60);
    }

    #[test]
    fn time_of_day_accepts_legacy_labels() {
        let t: TimeOfDay = serde_json::from_str("\"wieczór\"").unwrap();
        assert_eq!(t, TimeOfDay::Evening);
        assert_eq!(TimeOfDay::for_hour(13), TimeOfDay::Afternoon);
    }
}
