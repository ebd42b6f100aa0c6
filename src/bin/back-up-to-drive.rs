use std::io;
use std::path::PathBuf;

use clap::Parser;
use error_chain::ChainedError;
use log::{error, info};

use drive_tree_backup::cli_factories::{create_drive, set_up_logging};
use drive_tree_backup::config::{self, BackupMode, Config};
use drive_tree_backup::errors::Result;
use drive_tree_backup::prompt::{choose_command, Command};
use drive_tree_backup::back_up;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Local directory to back up
    #[arg(long, default_value = config::DEFAULT_LOCAL_ROOT)]
    local_root: PathBuf,

    /// Name of the top-level Google Drive folder
    #[arg(long, default_value = config::DEFAULT_BACKUP_FOLDER)]
    folder_name: String,

    /// `backup` uploads into a new timestamped folder on every run,
    /// `sync` reuses one folder and only uploads what is missing
    #[arg(long, value_enum, default_value_t = BackupMode::Backup)]
    mode: BackupMode,

    /// Directory names that are never backed up (dot-prefixed names never are)
    #[arg(long = "reserved", value_name = "NAME")]
    reserved_names: Vec<String>,

    /// OAuth client secrets downloaded from the Google Cloud console
    #[arg(long, default_value = config::DEFAULT_CREDENTIALS_FILE)]
    credentials: PathBuf,

    /// Where the OAuth token is cached between runs
    #[arg(long, default_value = config::DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    /// File that receives error-level log records
    #[arg(long, default_value = config::DEFAULT_ERROR_LOG)]
    error_log: PathBuf,

    /// Run B (backup), D (download) or E (exit) without prompting
    #[arg(long)]
    command: Option<Command>,
}

impl Args {
    fn to_config(&self) -> Config {
        let mut config = Config {
            local_root: self.local_root.clone(),
            backup_folder_name: self.folder_name.clone(),
            mode: self.mode,
            credentials_file: self.credentials.clone(),
            token_file: self.token_file.clone(),
            error_log: self.error_log.clone(),
            ..Config::default()
        };
        if !self.reserved_names.is_empty() {
            config.reserved_names = self.reserved_names.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.to_config();

    set_up_logging(&config.error_log)?;

    let command = match args.command {
        Some(command) => command,
        None => choose_command(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let succeeded = match command {
        Command::Backup => run_backup(&config).await,
        Command::Download => {
            println!(" [•] Coming soon...");
            true
        }
        Command::Exit => {
            println!(" [•] Exit from program...");
            true
        }
    };

    log::logger().flush();
    if !succeeded {
        ::std::process::exit(1);
    }
    Ok(())
}

async fn run_backup(config: &Config) -> bool {
    info!("Starting");

    let drive = match create_drive(config).await {
        Ok(drive) => drive,
        Err(e) => {
            error!("{}", e.display_chain());
            println!(" [•] Something went wrong...");
            return false;
        }
    };

    match back_up(config, &drive).await {
        Ok(report) => {
            println!(" [•] All done. {report}");
            !report.has_failures()
        }
        Err(e) => {
            error!("{}", e.display_chain());
            false
        }
    }
}
