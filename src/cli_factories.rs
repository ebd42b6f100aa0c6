use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone};
use log::{Level, LevelFilter, Log, Metadata, Record};
use yup_oauth2::{ApplicationSecret, InstalledFlowAuthenticator, InstalledFlowReturnMethod};

use crate::config::Config;
use crate::drive::{create_drive_hub, Drive};
use crate::errors::{ErrorKind, Result, ResultExt};

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Builds the client secret from `CLIENT_ID` and `CLIENT_SECRET`.
pub fn create_application_secret_from_env_vars() -> Result<ApplicationSecret> {
    Ok(ApplicationSecret {
        client_id: std::env::var("CLIENT_ID")?,
        client_secret: std::env::var("CLIENT_SECRET")?,
        auth_uri: GOOGLE_AUTH_URI.to_string(),
        token_uri: GOOGLE_TOKEN_URI.to_string(),
        ..Default::default()
    })
}

/// Runs the installed-app OAuth flow (or reuses the cached token) and
/// returns a Drive handle carrying a valid credential.
pub async fn create_drive(config: &Config) -> Result<Drive> {
    let secret = match create_application_secret_from_env_vars() {
        Ok(secret) => secret,
        Err(_) => yup_oauth2::read_application_secret(&config.credentials_file)
            .await
            .chain_err(|| {
                ErrorKind::Authentication(format!(
                    "could not read client secrets from {}",
                    config.credentials_file.display()
                ))
            })?,
    };

    if let Some(parent) = config.token_file.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    log::info!("Using token file {}", config.token_file.display());

    let authenticator =
        InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
            .persist_tokens_to_disk(config.token_file.clone())
            .build()
            .await
            .chain_err(|| ErrorKind::Authentication("could not set up the OAuth flow".into()))?;
    authenticator
        .token(config.scopes.as_slice())
        .await
        .chain_err(|| ErrorKind::Authentication("could not obtain an access token".into()))?;

    Ok(Drive::new(create_drive_hub(authenticator), config.scopes.clone()))
}

/// Console logging through env_logger, plus error records appended to a file.
struct BackupLogger {
    console: env_logger::Logger,
    error_log: Mutex<File>,
}

impl Log for BackupLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata) || metadata.level() == Level::Error
    }

    fn log(&self, record: &Record) {
        self.console.log(record);
        if record.level() == Level::Error {
            if let Ok(mut file) = self.error_log.lock() {
                let _ = writeln!(
                    file,
                    "{}",
                    error_log_line(&chrono::Local::now(), record.level(), record.args())
                );
            }
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Ok(mut file) = self.error_log.lock() {
            let _ = file.flush();
        }
    }
}

fn error_log_line<Tz>(now: &DateTime<Tz>, level: Level, message: impl Display) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{} | {} | {}", now.to_rfc3339(), level, message)
}

pub fn set_up_logging(error_log: &Path) -> Result<()> {
    if let Some(parent) = error_log.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log)
        .chain_err(|| format!("Could not open error log {}", error_log.display()))?;

    let console = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .build();

    let max_level = console.filter().max(LevelFilter::Error);
    log::set_boxed_logger(Box::new(BackupLogger { console, error_log: Mutex::new(file) }))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn error_log_line_has_time_level_and_message() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            error_log_line(&now, Level::Error, "upload failed"),
            "2024-01-02T03:04:05+00:00 | ERROR | upload failed"
        );
    }
}
