use crate::error::{EngineError, Result};
use crate::memory::types::{Alarm, AliasEntry, FactEntry, Reminder};
use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Learned trigger -> canonical command rewrites. Last write wins.
pub trait AliasStore: Send + Sync {
    fn lookup(&self, trigger: &str) -> Option<String>;
    fn learn(&mut self, trigger: &str, command: &str) -> Result<()>;
    fn all(&self) -> BTreeMap<String, String>;
}

/// Learned key -> value facts. Last write wins.
pub trait FactStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn add(&mut self, key: &str, value: &str) -> Result<()>;
}

pub trait ReminderStore: Send + Sync {
    fn add(&mut self, reminder: Reminder) -> Result<()>;
    fn for_day(&self, day: NaiveDate) -> Vec<Reminder>;
}

pub trait AlarmStore: Send + Sync {
    fn add(&mut self, alarm: Alarm) -> Result<()>;
    fn all(&self) -> Vec<Alarm>;
    /// Alarms ringing at `now`'s minute that have not fired today.
    /// Marks them fired.
    fn take_due(&mut self, now: DateTime<Local>) -> Result<Vec<Alarm>>;
}

/// JSON snapshot file. `None` path keeps everything in memory.
#[derive(Debug, Clone, Default)]
struct JsonFile {
    path: Option<PathBuf>,
}

impl JsonFile {
    fn at(path: &Path) -> Self {
        Self { path: Some(path.to_path_buf()) }
    }

    fn load<T: DeserializeOwned + Default>(&self) -> Result<T> {
        let Some(path) = &self.path else {
            return Ok(T::default());
        };
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save<T: Serialize>(&self, value: &T) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// File-based alias store.
pub struct FileAliasStore {
    file: JsonFile,
    entries: BTreeMap<String, AliasEntry>,
}

impl FileAliasStore {
    pub fn in_memory() -> Self {
        Self { file: JsonFile::default(), entries: BTreeMap::new() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = JsonFile::at(path);
        let entries: BTreeMap<String, AliasEntry> = file.load()?;
        info!("Loaded {} aliases from {}", entries.len(), path.display());
        Ok(Self { file, entries })
    }
}

impl AliasStore for FileAliasStore {
    fn lookup(&self, trigger: &str) -> Option<String> {
        self.entries.get(&trigger.trim().to_lowercase()).map(|e| e.command.clone())
    }

    fn learn(&mut self, trigger: &str, command: &str) -> Result<()> {
        let trigger = trigger.trim().to_lowercase();
        if trigger.is_empty() {
            return Err(EngineError::Store("empty alias trigger".to_string()));
        }
        self.entries.insert(
            trigger,
            AliasEntry { command: command.trim().to_lowercase(), learned_at: Local::now() },
        );
        self.file.save(&self.entries)
    }

    fn all(&self) -> BTreeMap<String, String> {
        self.entries.iter().map(|(k, v)| (k.clone(), v.command.clone())).collect()
    }
}

/// File-based fact store.
pub struct FileFactStore {
    file: JsonFile,
    entries: BTreeMap<String, FactEntry>,
}

impl FileFactStore {
    pub fn in_memory() -> Self {
        Self { file: JsonFile::default(), entries: BTreeMap::new() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = JsonFile::at(path);
        let entries = file.load()?;
        Ok(Self { file, entries })
    }
}

impl FactStore for FileFactStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(&key.trim().to_lowercase()).map(|e| e.value.clone())
    }

    fn add(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(
            key.trim().to_lowercase(),
            FactEntry { value: value.trim().to_string(), learned_at: Local::now() },
        );
        self.file.save(&self.entries)
    }
}

/// File-based reminder calendar (append-only list).
pub struct FileReminderStore {
    file: JsonFile,
    entries: Vec<Reminder>,
}

impl FileReminderStore {
    pub fn in_memory() -> Self {
        Self { file: JsonFile::default(), entries: Vec::new() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = JsonFile::at(path);
        let entries = file.load()?;
        Ok(Self { file, entries })
    }
}

impl ReminderStore for FileReminderStore {
    fn add(&mut self, reminder: Reminder) -> Result<()> {
        self.entries.push(reminder);
        self.entries.sort_by_key(|r| r.at);
        self.file.save(&self.entries)
    }

    fn for_day(&self, day: NaiveDate) -> Vec<Reminder> {
        self.entries.iter().filter(|r| r.at.date() == day).cloned().collect()
    }
}

/// File-based alarm list.
pub struct FileAlarmStore {
    file: JsonFile,
    entries: Vec<Alarm>,
}

impl FileAlarmStore {
    pub fn in_memory() -> Self {
        Self { file: JsonFile::default(), entries: Vec::new() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let file = JsonFile::at(path);
        let entries = file.load()?;
        Ok(Self { file, entries })
    }
}

impl AlarmStore for FileAlarmStore {
    fn add(&mut self, alarm: Alarm) -> Result<()> {
        self.entries.push(alarm);
        self.file.save(&self.entries)
    }

    fn all(&self) -> Vec<Alarm> {
        self.entries.clone()
    }

    fn take_due(&mut self, now: DateTime<Local>) -> Result<Vec<Alarm>> {
        let today = now.date_naive();
        let mut due = Vec::new();
        for alarm in self.entries.iter_mut() {
            let same_minute = alarm.time.hour() == now.hour() && alarm.time.minute() == now.minute();
            if same_minute && alarm.days.contains(&now.weekday()) && alarm.last_triggered != Some(today) {
                alarm.last_triggered = Some(today);
                due.push(alarm.clone());
            }
        }
        if !due.is_empty() {
            self.file.save(&self.entries)?;
        }
        Ok(due)
    }
}

/// The single running countdown timer.
#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    ends_at: Option<DateTime<Local>>,
}

impl TimerSlot {
    pub fn start(&mut self, now: DateTime<Local>, minutes: u32) -> DateTime<Local> {
        let ends = now + chrono::Duration::minutes(i64::from(minutes));
        if self.ends_at.replace(ends).is_some() {
            warn!("Replacing running timer");
        }
        ends
    }

    pub fn ends_at(&self) -> Option<DateTime<Local>> {
        self.ends_at
    }

    pub fn remaining(&self, now: DateTime<Local>) -> Option<chrono::Duration> {
        self.ends_at.map(|end| end - now)
    }

    /// Clears and reports the timer once it has run out.
    pub fn take_expired(&mut self, now: DateTime<Local>) -> bool {
        match self.ends_at {
            Some(end) if now >= end => {
                self.ends_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Every persistence collaborator the engine writes to.
pub struct Stores {
    pub aliases: Box<dyn AliasStore>,
    pub facts: Box<dyn FactStore>,
    pub reminders: Box<dyn ReminderStore>,
    pub alarms: Box<dyn AlarmStore>,
    pub timer: TimerSlot,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            aliases: Box::new(FileAliasStore::in_memory()),
            facts: Box::new(FileFactStore::in_memory()),
            reminders: Box::new(FileReminderStore::in_memory()),
            alarms: Box::new(FileAlarmStore::in_memory()),
            timer: TimerSlot::default(),
        }
    }

    /// Open the JSON stores under `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        Ok(Self {
            aliases: Box::new(FileAliasStore::open(&dir.join("aliases.json"))?),
            facts: Box::new(FileFactStore::open(&dir.join("facts.json"))?),
            reminders: Box::new(FileReminderStore::open(&dir.join("reminders.json"))?),
            alarms: Box::new(FileAlarmStore::open(&dir.join("alarms.json"))?),
            timer: TimerSlot::default(),
        })
    }
}
