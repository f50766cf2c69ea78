//! Spanish date/time extraction for reminders, alarms and timers.

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, Weekday};

use crate::memory::types::{ParsedAlarm, ParsedReminder};

pub const DEFAULT_REMINDER_HOUR: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderParse {
    Complete(ParsedReminder),
    /// Description understood, no date in the text.
    NeedsDate { description: String },
    /// Nothing left to remind about.
    Empty,
}

/// First run of ASCII digits, as a number.
pub fn first_number(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

pub fn weekday_from(word: &str) -> Option<Weekday> {
    Some(match word {
        "lunes" => Weekday::Mon,
        "martes" => Weekday::Tue,
        "miércoles" | "miercoles" => Weekday::Wed,
        "jueves" => Weekday::Thu,
        "viernes" => Weekday::Fri,
        "sábado" | "sabado" => Weekday::Sat,
        "domingo" => Weekday::Sun,
        _ => return None,
    })
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "lunes",
        Weekday::Tue => "martes",
        Weekday::Wed => "miércoles",
        Weekday::Thu => "jueves",
        Weekday::Fri => "viernes",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

const MONTHS: [&str; 12] = [
    "enero", "febrero", "marzo", "abril", "mayo", "junio",
    "julio", "agosto", "septiembre", "octubre", "noviembre", "diciembre",
];

pub fn month_name(month: u32) -> &'static str {
    MONTHS.get(month.saturating_sub(1) as usize).copied().unwrap_or("")
}

fn month_from(word: &str) -> Option<u32> {
    MONTHS.iter().position(|m| *m == word).map(|i| i as u32 + 1)
}

fn hour_word(word: &str) -> Option<u32> {
    const WORDS: [&str; 12] = [
        "una", "dos", "tres", "cuatro", "cinco", "seis",
        "siete", "ocho", "nueve", "diez", "once", "doce",
    ];
    WORDS.iter().position(|w| *w == word).map(|i| i as u32 + 1)
}

/// Word list with a per-word "consumed" mark, so matched date/time phrases
/// can be cut out of the description.
struct Words {
    raw: Vec<String>,
    norm: Vec<String>,
    used: Vec<bool>,
}

impl Words {
    fn new(text: &str) -> Self {
        let raw: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let norm = raw
            .iter()
            .map(|w| {
                w.to_lowercase()
                    .trim_matches(|c: char| !c.is_alphanumeric() && c != ':')
                    .to_string()
            })
            .collect();
        let used = vec![false; raw.len()];
        Self { raw, norm, used }
    }

    fn at(&self, i: usize) -> Option<&str> {
        match self.used.get(i) {
            Some(false) => self.norm.get(i).map(String::as_str),
            _ => None,
        }
    }

    fn is(&self, i: usize, word: &str) -> bool {
        self.at(i) == Some(word)
    }

    fn consume(&mut self, from: usize, to_inclusive: usize) {
        for flag in self.used.iter_mut().take(to_inclusive + 1).skip(from) {
            *flag = true;
        }
    }

    fn rest(&self) -> String {
        self.raw
            .iter()
            .zip(&self.used)
            .filter(|(_, used)| !**used)
            .map(|(w, _)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_clock(word: &str) -> Option<(u32, u32)> {
    if let Some((h, m)) = word.split_once(':') {
        return Some((h.parse().ok()?, m.parse().ok()?));
    }
    word.parse().ok().or_else(|| hour_word(word)).map(|h| (h, 0))
}

/// `a las H[:MM] [y media|y cuarto] [de la mañana|tarde|noche]`, consumed.
fn take_time(words: &mut Words) -> Option<NaiveTime> {
    for i in 0..words.norm.len() {
        if !words.is(i, "a") || !(words.is(i + 1, "las") || words.is(i + 1, "la")) {
            continue;
        }
        let Some((mut hour, mut minute)) = words.at(i + 2).and_then(parse_clock) else {
            continue;
        };
        let mut end = i + 2;
        if words.is(end + 1, "y") {
            if words.is(end + 2, "media") {
                minute = 30;
                end += 2;
            } else if words.is(end + 2, "cuarto") {
                minute = 15;
                end += 2;
            }
        }
        if words.is(end + 1, "de") && words.is(end + 2, "la") {
            match words.at(end + 3) {
                Some("noche") | Some("madrugada") if hour == 12 => {
                    hour = 0;
                    end += 3;
                }
                Some("tarde") | Some("noche") => {
                    if hour < 12 {
                        hour += 12;
                    }
                    end += 3;
                }
                Some("mañana") | Some("madrugada") => end += 3,
                _ => {}
            }
        }
        let Some(time) = NaiveTime::from_hms_opt(hour, minute, 0) else {
            continue;
        };
        words.consume(i, end);
        return Some(time);
    }
    None
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let mut ahead = target.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64;
    if ahead <= 0 {
        ahead += 7;
    }
    today + Duration::days(ahead)
}

/// `hoy`, `mañana`, `pasado mañana`, `el D de MES`, `el [próximo] DÍA`, consumed.
fn take_date(words: &mut Words, today: NaiveDate) -> Option<NaiveDate> {
    for i in 0..words.norm.len() {
        if words.is(i, "pasado") && words.is(i + 1, "mañana") {
            words.consume(i, i + 1);
            return Some(today + Duration::days(2));
        }
        if words.is(i, "mañana") {
            words.consume(i, i);
            return Some(today + Duration::days(1));
        }
        if words.is(i, "hoy") {
            words.consume(i, i);
            return Some(today);
        }
        if !words.is(i, "el") {
            continue;
        }
        if let (Some(day), true, Some(month)) = (
            words.at(i + 1).and_then(|w| w.parse::<u32>().ok()),
            words.is(i + 2, "de"),
            words.at(i + 3).and_then(month_from),
        ) {
            let mut date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if date < today {
                date = NaiveDate::from_ymd_opt(today.year() + 1, month, day)?;
            }
            words.consume(i, i + 3);
            return Some(date);
        }
        let skip = usize::from(words.is(i + 1, "próximo") || words.is(i + 1, "proximo"));
        if let Some(day) = words.at(i + 1 + skip).and_then(weekday_from) {
            words.consume(i, i + 1 + skip);
            return Some(next_weekday(today, day));
        }
    }
    None
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn clean_description(text: &str) -> String {
    let mut text = format!(" {} ", text.to_lowercase());
    for filler in [" que tengo ", " es el "] {
        text = text.replace(filler, " ");
    }
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    capitalize(text.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.'))
}

pub fn parse_reminder(text: &str, now: DateTime<Local>) -> ReminderParse {
    let mut words = Words::new(text);
    let time = take_time(&mut words);
    let date = take_date(&mut words, now.date_naive());
    let description = clean_description(&words.rest());

    if description.is_empty() {
        return ReminderParse::Empty;
    }
    let Some(date) = date else {
        return ReminderParse::NeedsDate { description };
    };

    let (time, time_inferred) = match time {
        Some(t) => (t, false),
        None => (NaiveTime::from_hms_opt(DEFAULT_REMINDER_HOUR, 0, 0).unwrap_or_default(), true),
    };
    ReminderParse::Complete(ParsedReminder { description, date, time, time_inferred })
}

pub fn parse_alarm(text: &str) -> Option<ParsedAlarm> {
    let lower = text.to_lowercase();

    let (body, label) = match lower.split_once("con la etiqueta") {
        Some((body, label)) if !label.trim().is_empty() => (body.to_string(), capitalize(label.trim())),
        _ => (lower.clone(), "Alarma".to_string()),
    };

    let mut words = Words::new(&body);
    let time = take_time(&mut words)?;

    let all = [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri, Weekday::Sat, Weekday::Sun];
    let mut days: Vec<Weekday> = all
        .iter()
        .copied()
        .filter(|d| words.norm.iter().any(|w| weekday_from(w) == Some(*d)))
        .collect();
    if days.is_empty() || body.contains("todos los días") || body.contains("todos los dias") {
        days = all.to_vec();
    }

    Some(ParsedAlarm { time, days, label })
}

/// "todos los días" or "los lunes, martes".
pub fn describe_days(days: &[Weekday]) -> String {
    if days.len() >= 7 || days.is_empty() {
        return "todos los días".to_string();
    }
    let mut sorted = days.to_vec();
    sorted.sort_by_key(|d| d.num_days_from_monday());
    let names: Vec<&str> = sorted.into_iter().map(weekday_name).collect();
    format!("los {}", names.join(", "))
}
