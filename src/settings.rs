use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::error::PersistenceError;
use crate::problem::{Difficulty, Operator, OperatorSet};

pub const LAST_LOGIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimedModeSettings {
    /// Seconds.
    pub time_limit: u64,
    pub question_count: usize,
}

impl Default for TimedModeSettings {
    fn default() -> Self {
        Self {
            time_limit: 60,
            question_count: 10,
        }
    }
}

/// Per-user preferences. Missing fields fall back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub operations: Vec<Operator>,
    pub timed_mode: TimedModeSettings,
    pub last_login: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            operations: Operator::ALL.to_vec(),
            timed_mode: TimedModeSettings::default(),
            last_login: now_formatted(),
        }
    }
}

impl Settings {
    /// The configured operators, or addition alone if none are left.
    pub fn operator_set(&self) -> OperatorSet {
        OperatorSet::from_selection_or_default(self.operations.iter().copied())
    }

    pub fn set_operators(&mut self, operators: &OperatorSet) {
        self.operations = operators.as_slice().to_vec();
    }

    pub fn touch_login(&mut self) {
        self.last_login = now_formatted();
    }
}

fn now_formatted() -> String {
    Local::now().format(LAST_LOGIN_FORMAT).to_string()
}

pub trait SettingsStore {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// `{dir}/{username}_settings.json`
    pub fn for_user<P: AsRef<Path>>(dir: P, username: &str) -> Self {
        Self {
            path: dir
                .as_ref()
                .join(format!("{}_settings.json", sanitize_username(username))),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let Ok(bytes) = fs::read(&self.path) else {
            return Settings::default();
        };
        serde_json::from_slice::<Settings>(&bytes).unwrap_or_else(|err| {
            tracing::warn!(path = %self.path.display(), error = %err, "unreadable settings, using defaults");
            Settings::default()
        })
    }

    fn save(&self, settings: &Settings) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(settings)?)?;
        Ok(())
    }
}

fn sanitize_username(username: &str) -> String {
    let cleaned: String = username
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    match cleaned.trim_matches('.') {
        "" => "guest".to_string(),
        name => name.to_string(),
    }
}
