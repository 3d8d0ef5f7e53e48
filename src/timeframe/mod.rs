//! Sampling frequencies and trading sessions.
//!
//! Timeframes are written as compact keys (`15Min`, `1H`, `1D`, `1W-MON`,
//! `1ME`) in scripts and in compiled graph documents.

mod resolver;

pub use resolver::TimeframeResolver;

use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

pub const TRACING_TARGET: &str = "strategy_compiler::timeframe";

const MINUTE_SECS: u64 = 60;
const HOUR_SECS: u64 = 60 * MINUTE_SECS;
const DAY_SECS: u64 = 24 * HOUR_SECS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeframeError {
    #[error("invalid timeframe '{0}'")]
    InvalidTimeframe(String),
    #[error("invalid session '{0}'")]
    InvalidSession(String),
}

// =============================================================================
// TIMEFRAME
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeUnit {
    /// Nominal length of one unit. Calendar units use fixed approximations.
    fn secs(self) -> u64 {
        match self {
            TimeUnit::Minute => MINUTE_SECS,
            TimeUnit::Hour => HOUR_SECS,
            TimeUnit::Day => DAY_SECS,
            TimeUnit::Week => 7 * DAY_SECS,
            TimeUnit::Month => 30 * DAY_SECS,
            TimeUnit::Quarter => 91 * DAY_SECS,
            TimeUnit::Year => 365 * DAY_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Weekday {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Weekday {
    const ALL: [Weekday; 7] = [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Sun => "SUN",
            Weekday::Mon => "MON",
            Weekday::Tue => "TUE",
            Weekday::Wed => "WED",
            Weekday::Thu => "THU",
            Weekday::Fri => "FRI",
            Weekday::Sat => "SAT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeekOfMonth {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekOfMonth {
    const ALL: [WeekOfMonth; 5] = [
        WeekOfMonth::First,
        WeekOfMonth::Second,
        WeekOfMonth::Third,
        WeekOfMonth::Fourth,
        WeekOfMonth::Last,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WeekOfMonth::First => "1st",
            WeekOfMonth::Second => "2nd",
            WeekOfMonth::Third => "3rd",
            WeekOfMonth::Fourth => "4th",
            WeekOfMonth::Last => "Last",
        }
    }
}

/// Where a bar closes within its period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Start,
    End,
    Weekday {
        day: Weekday,
        week: Option<WeekOfMonth>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    interval: u32,
    unit: TimeUnit,
    anchor: Option<Anchor>,
}

impl Timeframe {
    pub fn new(interval: u32, unit: TimeUnit) -> Self {
        let anchor = match unit {
            TimeUnit::Month | TimeUnit::Quarter | TimeUnit::Year => Some(Anchor::End),
            _ => None,
        };
        Timeframe {
            interval: interval.max(1),
            unit,
            anchor,
        }
    }

    pub fn minutes(n: u32) -> Self {
        Self::new(n, TimeUnit::Minute)
    }

    pub fn hours(n: u32) -> Self {
        Self::new(n, TimeUnit::Hour)
    }

    pub fn days(n: u32) -> Self {
        Self::new(n, TimeUnit::Day)
    }

    pub fn weeks(n: u32) -> Self {
        Self::new(n, TimeUnit::Week)
    }

    /// The finest intraday resolution: one minute.
    pub fn finest_intraday() -> Self {
        Self::minutes(1)
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    pub fn duration_secs(&self) -> u64 {
        u64::from(self.interval) * self.unit.secs()
    }

    pub fn is_intraday(&self) -> bool {
        matches!(self.unit, TimeUnit::Minute | TimeUnit::Hour)
    }

    /// True when `self` samples less often than `other`.
    pub fn is_coarser_than(&self, other: &Timeframe) -> bool {
        self.duration_secs() > other.duration_secs()
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.interval)?;
        match (self.unit, self.anchor) {
            (TimeUnit::Minute, _) => f.write_str("Min"),
            (TimeUnit::Hour, _) => f.write_str("H"),
            (TimeUnit::Day, _) => f.write_str("D"),
            (TimeUnit::Week, Some(Anchor::Weekday { day, week })) => {
                write!(f, "W-{}", day.as_str())?;
                match week {
                    Some(week) => write!(f, "-{}", week.as_str()),
                    None => Ok(()),
                }
            }
            (TimeUnit::Week, _) => f.write_str("W"),
            (unit, anchor) => {
                let period = match unit {
                    TimeUnit::Month => 'M',
                    TimeUnit::Quarter => 'Q',
                    _ => 'Y',
                };
                let edge = match anchor {
                    Some(Anchor::Start) => 'S',
                    _ => 'E',
                };
                write!(f, "{period}{edge}")
            }
        }
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeframeError::InvalidTimeframe(key.to_string());

        let digits = key.chars().take_while(char::is_ascii_digit).count();
        let interval: u32 = key[..digits].parse().map_err(|_| invalid())?;
        if interval == 0 {
            return Err(invalid());
        }
        let suffix = &key[digits..];

        let (unit, anchor) = match suffix {
            "Min" => (TimeUnit::Minute, None),
            "H" => (TimeUnit::Hour, None),
            "D" => (TimeUnit::Day, None),
            "W" => (TimeUnit::Week, None),
            "MS" => (TimeUnit::Month, Some(Anchor::Start)),
            "ME" => (TimeUnit::Month, Some(Anchor::End)),
            "QS" => (TimeUnit::Quarter, Some(Anchor::Start)),
            "QE" => (TimeUnit::Quarter, Some(Anchor::End)),
            "YS" => (TimeUnit::Year, Some(Anchor::Start)),
            "YE" => (TimeUnit::Year, Some(Anchor::End)),
            _ => {
                let rest = suffix.strip_prefix("W-").ok_or_else(invalid)?;
                (TimeUnit::Week, Some(parse_weekday_anchor(rest).ok_or_else(invalid)?))
            }
        };

        Ok(Timeframe {
            interval,
            unit,
            anchor,
        })
    }
}

fn parse_weekday_anchor(text: &str) -> Option<Anchor> {
    let (day, week) = match text.split_once('-') {
        Some((day, week)) => (day, Some(week)),
        None => (text, None),
    };
    let day = Weekday::ALL.into_iter().find(|d| d.as_str() == day)?;
    let week = match week {
        Some(w) => Some(WeekOfMonth::ALL.into_iter().find(|n| n.as_str() == w)?),
        None => None,
    };
    Some(Anchor::Weekday { day, week })
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(value: Timeframe) -> Self {
        value.to_string()
    }
}

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Sydney,
    Tokyo,
    London,
    NewYork,
    AsianKillZone,
    LondonOpenKillZone,
    NewYorkKillZone,
    LondonCloseKillZone,
}

impl SessionKind {
    const ALL: [SessionKind; 8] = [
        SessionKind::Sydney,
        SessionKind::Tokyo,
        SessionKind::London,
        SessionKind::NewYork,
        SessionKind::AsianKillZone,
        SessionKind::LondonOpenKillZone,
        SessionKind::NewYorkKillZone,
        SessionKind::LondonCloseKillZone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Sydney => "Sydney",
            SessionKind::Tokyo => "Tokyo",
            SessionKind::London => "London",
            SessionKind::NewYork => "NewYork",
            SessionKind::AsianKillZone => "AsianKillZone",
            SessionKind::LondonOpenKillZone => "LondonOpenKillZone",
            SessionKind::NewYorkKillZone => "NewYorkKillZone",
            SessionKind::LondonCloseKillZone => "LondonCloseKillZone",
        }
    }
}

const CLOCK_FORMAT: &str = "%H:%M";

fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, CLOCK_FORMAT).ok()
}

/// Trading-session context on a node: a named market session or an explicit
/// `HH:MM-HH:MM` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Session {
    Named(SessionKind),
    Range { start: NaiveTime, end: NaiveTime },
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Session::Named(kind) => f.write_str(kind.as_str()),
            Session::Range { start, end } => write!(
                f,
                "{}-{}",
                start.format(CLOCK_FORMAT),
                end.format(CLOCK_FORMAT)
            ),
        }
    }
}

impl FromStr for Session {
    type Err = TimeframeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if let Some(kind) = SessionKind::ALL.into_iter().find(|k| k.as_str() == text) {
            return Ok(Session::Named(kind));
        }
        text.split_once('-')
            .and_then(|(start, end)| {
                Some(Session::Range {
                    start: parse_clock(start)?,
                    end: parse_clock(end)?,
                })
            })
            .ok_or_else(|| TimeframeError::InvalidSession(text.to_string()))
    }
}

impl TryFrom<String> for Session {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Session> for String {
    fn from(value: Session) -> Self {
        value.to_string()
    }
}
