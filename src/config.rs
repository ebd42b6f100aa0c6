use std::path::PathBuf;

use chrono::{DateTime, TimeZone};

pub const DEFAULT_BACKUP_FOLDER: &str = "BackupFolder";
pub const DEFAULT_LOCAL_ROOT: &str = "BackupFolder";
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["private"];
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/drive"];
pub const DEFAULT_CREDENTIALS_FILE: &str = "private/credentials.json";
pub const DEFAULT_TOKEN_FILE: &str = "private/token.json";
pub const DEFAULT_ERROR_LOG: &str = "logs/error.log";

/// Suffix appended to the backup folder name in `Backup` mode.
const TIMESTAMP_FORMAT: &str = "%m.%d.%y-%H:%M:%S";

/// How the remote root folder is chosen for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackupMode {
    /// A freshly timestamped folder per run; everything is uploaded.
    Backup,
    /// One folder with a fixed name, reused across runs.
    Sync,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub local_root: PathBuf,
    pub backup_folder_name: String,
    pub mode: BackupMode,
    pub reserved_names: Vec<String>,
    pub scopes: Vec<String>,
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub error_log: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            local_root: PathBuf::from(DEFAULT_LOCAL_ROOT),
            backup_folder_name: DEFAULT_BACKUP_FOLDER.to_string(),
            mode: BackupMode::Backup,
            reserved_names: DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            credentials_file: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            error_log: PathBuf::from(DEFAULT_ERROR_LOG),
        }
    }
}

impl Config {
    /// Name of the top-level Drive folder this run writes into.
    pub fn remote_root_name<Tz>(&self, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        match self.mode {
            BackupMode::Backup => {
                format!("{}-{}", self.backup_folder_name, now.format(TIMESTAMP_FORMAT))
            }
            BackupMode::Sync => self.backup_folder_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn backup_mode_appends_timestamp() {
        let config = Config::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();

        assert_eq!(config.remote_root_name(&now), "BackupFolder-03.07.24-09:05:01");
    }

    #[test]
    fn sync_mode_uses_fixed_name() {
        let config = Config {
            mode: BackupMode::Sync,
            backup_folder_name: "Photos".to_string(),
            ..Config::default()
        };
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 1).unwrap();

        assert_eq!(config.remote_root_name(&now), "Photos");
    }

    #[test]
    fn defaults_reserve_private_folder() {
        let config = Config::default();
        assert_eq!(config.reserved_names, vec!["private".to_string()]);
        assert_eq!(config.token_file, PathBuf::from("private/token.json"));
    }
}
