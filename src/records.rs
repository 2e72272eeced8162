use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Days, Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::attempt::Attempt;
use crate::error::PersistenceError;
use crate::timed::ChallengeResults;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Basic,
    Timed,
}

/// Seconds since the unix epoch, with millisecond precision.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

/// One graded practice answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub question: String,
    pub correct_answer: i64,
    pub user_answer: Option<i64>,
    pub is_correct: bool,
    pub time_taken: f64,
    pub timestamp: f64,
}

impl ExerciseRecord {
    pub fn from_attempt(attempt: &Attempt) -> Self {
        Self {
            question: attempt.problem.question(),
            correct_answer: attempt.problem.correct_answer,
            user_answer: attempt.submitted_answer,
            is_correct: attempt.is_correct == Some(true),
            time_taken: attempt.elapsed_time,
            timestamp: unix_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub question: String,
    pub answer: i64,
    pub user_answer: Option<i64>,
    pub is_correct: Option<bool>,
}

/// Summary of a finished timed challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub time_taken: f64,
    #[serde(default)]
    pub questions: Vec<QuestionEntry>,
    pub timestamp: f64,
}

impl ChallengeRecord {
    pub fn new(results: &ChallengeResults, attempts: &[Attempt]) -> Self {
        Self {
            total_questions: results.total_questions,
            attempted: results.attempted,
            correct: results.correct,
            accuracy: results.accuracy,
            time_taken: results.time_taken,
            questions: attempts
                .iter()
                .map(|a| QuestionEntry {
                    question: a.problem.question(),
                    answer: a.problem.correct_answer,
                    user_answer: a.submitted_answer,
                    is_correct: a.is_correct,
                })
                .collect(),
            timestamp: unix_timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Basic(ExerciseRecord),
    Timed(ChallengeRecord),
}

impl Record {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            Record::Basic(_) => ExerciseKind::Basic,
            Record::Timed(_) => ExerciseKind::Timed,
        }
    }
}

/// Where graded work goes. Saving never reports back to the caller.
pub trait RecordSink {
    fn save(&mut self, record: Record);
}

impl RecordSink for Vec<Record> {
    fn save(&mut self, record: Record) {
        self.push(record);
    }
}

/// On-disk shape of a daily file. Entries stay untyped until a reader
/// asks for a concrete record type.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    #[serde(default)]
    records: Vec<serde_json::Value>,
}

/// Daily JSON files, `{kind}_{YYYY-MM-DD}.json`, each holding `{"records": [...]}`.
#[derive(Debug, Clone)]
pub struct JsonRecordStore {
    dir: PathBuf,
}

impl JsonRecordStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn file_path(&self, kind: ExerciseKind, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", kind, date.format("%Y-%m-%d")))
    }

    pub fn append(&self, record: &Record) -> Result<(), PersistenceError> {
        self.append_on(Local::now().date_naive(), record)
    }

    /// Appends to the file for `date`. A missing or corrupt file starts over empty.
    pub fn append_on(&self, date: NaiveDate, record: &Record) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.file_path(record.kind(), date);

        let mut file = read_record_file(&path);
        file.records.push(serde_json::to_value(record)?);

        fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        tracing::debug!(path = %path.display(), count = file.records.len(), "record appended");
        Ok(())
    }

    pub fn practice_history(&self, days: u32) -> Vec<ExerciseRecord> {
        self.history_until(ExerciseKind::Basic, days, Local::now().date_naive())
    }

    pub fn challenge_history(&self, days: u32) -> Vec<ChallengeRecord> {
        self.history_until(ExerciseKind::Timed, days, Local::now().date_naive())
    }

    /// Records of `kind` from the `days` daily files ending at `today`, oldest first.
    /// Entries that do not match `T` are skipped.
    pub fn history_until<T: DeserializeOwned>(
        &self,
        kind: ExerciseKind,
        days: u32,
        today: NaiveDate,
    ) -> Vec<T> {
        (0..days)
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
            .flat_map(|date| read_record_file(&self.file_path(kind, date)).records)
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::debug!(error = %err, %kind, "skipping unreadable record");
                    None
                }
            })
            .collect()
    }
}

impl RecordSink for JsonRecordStore {
    fn save(&mut self, record: Record) {
        if let Err(err) = self.append(&record) {
            tracing::warn!(error = %err, kind = %record.kind(), "failed to persist record");
        }
    }
}

fn read_record_file(path: &Path) -> RecordFile {
    match fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "corrupt record file, treating as empty");
            RecordFile::default()
        }),
        Err(_) => RecordFile::default(),
    }
}
