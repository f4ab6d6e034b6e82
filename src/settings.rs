use serde::Deserialize;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use anyhow::{Context, Result};
use backtrace::Backtrace;
use log::{debug, error};

use crate::mail_reader::imap::DEFAULT_PORT;
use crate::mail_reader::writer::CollisionPolicy;

// Optional settings file, every key has a default
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub port: u16,
    pub directory_for_year: bool,
    pub directory_for_month: bool,
    pub folder: Option<String>,
    pub on_collision: CollisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            directory_for_year: true,
            directory_for_month: true,
            folder: None,
            on_collision: CollisionPolicy::Overwrite,
        }
    }
}

fn read_settings(path: &Path) -> Result<Config> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open settings file {}", path.display()))?;
    let reader = BufReader::new(file);

    // Parse the YAML file into the Config struct
    serde_yaml::from_reader(reader)
        .with_context(|| format!("Cannot deserialize settings from {}", path.display()))
}

pub fn load_settings(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    match read_settings(path) {
        Ok(config) => {
            debug!("Loaded settings {:?}", config);
            Ok(config)
        }
        Err(err) => {
            error!("Error: {:#}", err);
            debug!("Backtrace:\n{:?}", Backtrace::new());
            Err(err)
        }
    }
}
