use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;

use crate::mail_reader::error::Error;
use crate::mail_reader::message::Artifact;
use crate::mail_reader::sanitize::sanitize;

pub const MAX_FILENAME_LEN: usize = 143;
const HEAD_LEN: usize = 123;
const TAIL_LEN: usize = 15;
const ELLIPSIS: &str = "...";

const TEXT_SUFFIXES: [&str; 3] = [".txt", ".htm", "html"];

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    #[default]
    Overwrite,
    /// Insert `-1`, `-2`, ... before the extension until the name is free.
    KeepBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Text,
    Binary,
}

impl WriteMode {
    pub fn for_filename(filename: &str) -> WriteMode {
        if TEXT_SUFFIXES.iter().any(|suffix| filename.ends_with(suffix)) {
            WriteMode::Text
        } else {
            WriteMode::Binary
        }
    }
}

/// Collapses names over `MAX_FILENAME_LEN` to head + `...` + tail so the
/// extension survives.
pub fn shorten(filename: &str) -> String {
    let len = filename.chars().count();
    if len <= MAX_FILENAME_LEN {
        return filename.to_string();
    }
    let head: String = filename.chars().take(HEAD_LEN).collect();
    let tail: String = filename.chars().skip(len - TAIL_LEN).collect();
    format!("{}{}{}", head, ELLIPSIS, tail)
}

fn numbered(filename: &str, n: usize) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &filename[..dot], n, &filename[dot..]),
        _ => format!("{}-{}", filename, n),
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileWriter {
    policy: CollisionPolicy,
}

impl FileWriter {
    pub fn new(policy: CollisionPolicy) -> FileWriter {
        FileWriter { policy }
    }

    fn target_path(&self, directory: &Path, filename: &str) -> PathBuf {
        let path = directory.join(filename);
        if self.policy == CollisionPolicy::Overwrite || !path.exists() {
            return path;
        }
        (1..)
            .map(|n| directory.join(shorten(&numbered(filename, n))))
            .find(|candidate| !candidate.exists())
            .unwrap_or(path)
    }

    /// Writes `content` under a sanitized, length-capped version of
    /// `filename`. Empty content is skipped and yields `Ok(None)`.
    pub fn write(
        &self,
        directory: &Path,
        filename: &str,
        content: &[u8],
    ) -> Result<Option<PathBuf>, Error> {
        if content.is_empty() {
            debug!("Nothing to write for {}", filename);
            return Ok(None);
        }

        let filename = shorten(&sanitize(filename));
        if filename.is_empty() {
            warn!("No usable filename left after sanitizing, skipping");
            return Ok(None);
        }

        fs::create_dir_all(directory)?;
        let path = self.target_path(directory, &filename);

        // Bytes go out verbatim in both modes, the body text is already UTF-8
        let mode = WriteMode::for_filename(&filename);
        let mut file = File::create(&path)?;
        file.write_all(content)?;
        file.flush()?;

        debug!("Wrote {} bytes ({:?}) to {}", content.len(), mode, path.display());
        Ok(Some(path))
    }

    pub fn write_artifact(&self, artifact: &Artifact) -> Result<Option<PathBuf>, Error> {
        self.write(&artifact.directory, &artifact.filename, &artifact.content)
    }
}
