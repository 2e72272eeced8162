use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/arithmo`, or the platform data dir without `HOME`.
    pub fn data_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("arithmo"),
            )
        } else {
            ProjectDirs::from("", "", "arithmo").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn records_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("records")
    }

    pub fn log_path(data_dir: &Path) -> PathBuf {
        data_dir.join("arithmo.log")
    }
}
