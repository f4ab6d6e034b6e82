mod logging;
mod mail_reader;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use log::{error, info};

use mail_reader::error::EXIT_SETTINGS;
use mail_reader::mailbox::{FixedFolder, FolderChooser};
use mail_reader::prompt::{ask_password, Prompt};
use mail_reader::settings::{Credentials, DownloadConfig};

/// Download every message of an IMAP folder into text and attachment files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    host: Option<String>,
    username: Option<String>,
    password: Option<String>,
    /// Folder to save the mails in
    base_directory: Option<PathBuf>,

    /// YAML file with directory_for_year, directory_for_month, port, folder and on_collision
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Overrides the port from the settings file
    #[arg(long)]
    port: Option<u16>,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

// Missing arguments are asked for in order
fn gather_inputs(args: Args) -> Result<(Credentials, PathBuf), mail_reader::Error> {
    let mut prompt = Prompt::stdio();
    let host = match args.host {
        Some(host) => host,
        None => prompt.ask("host", "Please enter your imap server: ")?,
    };
    let username = match args.username {
        Some(username) => username,
        None => prompt.ask("username", "Please enter your username: ")?,
    };
    let password = match args.password {
        Some(password) => password,
        None => ask_password("Please enter your account's password: ")?,
    };
    let base_directory = match args.base_directory {
        Some(directory) => directory,
        None => PathBuf::from(prompt.ask(
            "directory",
            "Please enter the folder to save the mails in: ",
        )?),
    };

    Ok((
        Credentials {
            host,
            username,
            password,
        },
        base_directory,
    ))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("Cannot set up logging: {}", e);
    }

    let config = match settings::load_settings(args.settings.as_deref()) {
        Ok(config) => config,
        Err(_) => return ExitCode::from(EXIT_SETTINGS),
    };
    let port = args.port.unwrap_or(config.port);

    let (credentials, base_directory) = match gather_inputs(args) {
        Ok(inputs) => inputs,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };
    let download_config = DownloadConfig::new(base_directory, &config);

    let mut chooser: Box<dyn FolderChooser> = match config.folder.clone() {
        Some(folder) => Box::new(FixedFolder(folder)),
        None => Box::new(Prompt::stdio()),
    };

    match mail_reader::main(&credentials, port, &download_config, chooser.as_mut()).await {
        Ok(_) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
