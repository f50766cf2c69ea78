use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// A reminder parsed from speech, not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReminder {
    pub description: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// No explicit hour was given; `time` is the 09:00 default.
    pub time_inferred: bool,
}

impl ParsedReminder {
    pub fn at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A recurring alarm parsed from speech, not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedAlarm {
    pub time: NaiveTime,
    /// Days the alarm rings on. Never empty.
    pub days: Vec<Weekday>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub description: String,
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    pub time: NaiveTime,
    pub days: Vec<Weekday>,
    pub label: String,
    /// Date the alarm last fired, so it rings at most once a day.
    pub last_triggered: Option<NaiveDate>,
}

impl From<ParsedAlarm> for Alarm {
    fn from(parsed: ParsedAlarm) -> Self {
        Self {
            time: parsed.time,
            days: parsed.days,
            label: parsed.label,
            last_triggered: None,
        }
    }
}

/// Learned `trigger -> command` rewrite. Trigger is lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub command: String,
    pub learned_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactEntry {
    pub value: String,
    pub learned_at: DateTime<Local>,
}
