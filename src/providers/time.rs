use crate::error::StewardError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::LazyLock;

static CLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?::(\d{2}))?\s*(am|pm|a\.m\.|p\.m\.)?$").ok());

static RELATIVE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^in\s+(\d+|an?)\s+(minute|min|hour|hr|day|week)s?$").ok()
});

/// Hour used for day phrases without a time ("tomorrow", "friday").
const DEFAULT_HOUR: u32 = 9;
const TONIGHT_HOUR: u32 = 20;

/// Turns phrases like "tomorrow at 3pm" into wall-clock timestamps.
///
/// Ambiguous times resolve to the next future occurrence after the
/// reference time.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalTimeParser;

fn clock(text: &str) -> Option<NaiveTime> {
    match text {
        "noon" | "midday" => return NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => return NaiveTime::from_hms_opt(0, 0, 0),
        _ => {}
    }
    let caps = CLOCK.as_ref()?.captures(text)?;
    let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    match caps.get(3).map(|m| m.as_str().replace('.', "")) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            if meridiem == "pm" && hour != 12 {
                hour += 12;
            } else if meridiem == "am" && hour == 12 {
                hour = 0;
            }
        }
        // A bare number is too ambiguous to be a time
        None if caps.get(2).is_none() => return None,
        None => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn weekday(word: &str) -> Option<Weekday> {
    let day = match word {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Optional "[at] <time>" tail of a day phrase.
fn tail_time(rest: &str) -> Result<Option<NaiveTime>, ()> {
    let rest = rest.trim();
    let rest = rest.strip_prefix("at ").unwrap_or(rest).trim();
    if rest.is_empty() {
        return Ok(None);
    }
    clock(rest).map(Some).ok_or(())
}

fn at(date: NaiveDate, hour: u32) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN))
}

impl NaturalTimeParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(
        &self,
        text: &str,
        reference: NaiveDateTime,
    ) -> Result<NaiveDateTime, StewardError> {
        let unparsable = || StewardError::UnparsableTime(text.trim().to_string());
        let raw = text.trim();
        if raw.is_empty() {
            return Err(unparsable());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.naive_local());
        }
        for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(dt);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Ok(date.and_time(NaiveTime::MIN));
        }

        let normalized = raw
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let phrase = normalized
            .strip_prefix("on ")
            .or_else(|| normalized.strip_prefix("at "))
            .unwrap_or(&normalized);

        self.relative(phrase, reference)
            .or_else(|| self.day_phrase(phrase, reference))
            .or_else(|| self.trailing_day_phrase(phrase, reference))
            .or_else(|| self.next_occurrence(phrase, reference))
            .ok_or_else(unparsable)
    }

    fn relative(&self, phrase: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
        let caps = RELATIVE.as_ref()?.captures(phrase)?;
        let amount: i64 = match caps.get(1)?.as_str() {
            "a" | "an" => 1,
            n => n.parse().ok()?,
        };
        let delta = match caps.get(2)?.as_str() {
            "minute" | "min" => Duration::try_minutes(amount)?,
            "hour" | "hr" => Duration::try_hours(amount)?,
            "day" => Duration::try_days(amount)?,
            _ => Duration::try_weeks(amount)?,
        };
        reference.checked_add_signed(delta)
    }

    fn day_phrase(&self, phrase: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
        let (head, rest) = phrase.split_once(' ').unwrap_or((phrase, ""));
        let today = reference.date();
        match head {
            "today" => {
                let time = tail_time(rest).ok()?;
                Some(time.map_or(reference, |t| today.and_time(t)))
            }
            "tonight" => {
                let time = tail_time(rest).ok()?;
                Some(time.map_or_else(|| at(today, TONIGHT_HOUR), |t| today.and_time(t)))
            }
            "tomorrow" => {
                let date = today.succ_opt()?;
                let time = tail_time(rest).ok()?;
                Some(time.map_or_else(|| at(date, DEFAULT_HOUR), |t| date.and_time(t)))
            }
            "next" => {
                let (day, rest) = rest.split_once(' ').unwrap_or((rest, ""));
                self.weekday_phrase(weekday(day)?, rest, reference, true)
            }
            word => self.weekday_phrase(weekday(word)?, rest, reference, false),
        }
    }

    fn weekday_phrase(
        &self,
        target: Weekday,
        rest: &str,
        reference: NaiveDateTime,
        skip_today: bool,
    ) -> Option<NaiveDateTime> {
        let time = tail_time(rest).ok()?;
        let days_ahead = (7 + i64::from(target.num_days_from_monday())
            - i64::from(reference.weekday().num_days_from_monday()))
            % 7;
        let date = reference.date() + Duration::days(days_ahead);
        let candidate = time.map_or_else(|| at(date, DEFAULT_HOUR), |t| date.and_time(t));
        if days_ahead == 0 && (skip_today || candidate <= reference) {
            return Some(candidate + Duration::days(7));
        }
        Some(candidate)
    }

    /// "3pm tomorrow", "10:30 friday"
    fn trailing_day_phrase(&self, phrase: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
        let (time, day) = phrase.rsplit_once(' ')?;
        let time = time.strip_suffix(" on").unwrap_or(time);
        clock(time)?;
        self.day_phrase(&format!("{day} {time}"), reference)
    }

    fn next_occurrence(&self, phrase: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
        let time = clock(phrase)?;
        let candidate = reference.date().and_time(time);
        if candidate > reference {
            Some(candidate)
        } else {
            Some(candidate + Duration::days(1))
        }
    }
}
