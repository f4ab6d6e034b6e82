use std::fmt;
use std::path::PathBuf;

use crate::mail_reader::writer::CollisionPolicy;
use crate::settings::Config;

pub struct Credentials {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where and how messages are laid out on disk for one run.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub base_directory: PathBuf,
    pub directory_for_year: bool,
    pub directory_for_month: bool,
    pub collision_policy: CollisionPolicy,
}

impl DownloadConfig {
    pub fn new(base_directory: PathBuf, config: &Config) -> DownloadConfig {
        DownloadConfig {
            base_directory,
            directory_for_year: config.directory_for_year,
            directory_for_month: config.directory_for_month,
            collision_policy: config.on_collision,
        }
    }
}
