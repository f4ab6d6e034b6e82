use itertools::Itertools;
use log::{debug, info, warn};

use crate::mail_reader::error::Error;

/// The IMAP operations the downloader needs from a server session.
#[allow(async_fn_in_trait)]
pub trait Mailbox {
    async fn list_folders(&mut self) -> Result<Vec<String>, Error>;

    async fn select(&mut self, folder: &str) -> Result<(), Error>;

    /// Every message of the selected folder, in server order.
    async fn search_all(&mut self) -> Result<Vec<u32>, Error>;

    /// The full RFC822 form of one message.
    async fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>, Error>;
}

/// Given the folders a server offers, picks the one to download.
pub trait FolderChooser {
    fn choose(&mut self, folders: &[String]) -> Result<String, Error>;
}

/// A folder decided ahead of time, e.g. in the settings file.
pub struct FixedFolder(pub String);

impl FolderChooser for FixedFolder {
    fn choose(&mut self, folders: &[String]) -> Result<String, Error> {
        if !folders.iter().any(|folder| folder == &self.0) {
            warn!("Folder {:?} is not among the listed folders, trying anyway", self.0);
        }
        Ok(self.0.clone())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub saved: usize,
    pub skipped: usize,
    pub files_written: usize,
}

pub async fn enumerate_uids<M, C>(mailbox: &mut M, chooser: &mut C) -> Result<Vec<u32>, Error>
where
    M: Mailbox,
    C: FolderChooser + ?Sized,
{
    let folders = mailbox.list_folders().await?;
    debug!("-- folders: {}", folders.iter().join(", "));
    let folder = chooser.choose(&folders)?;
    mailbox.select(&folder).await?;
    let uids = mailbox.search_all().await?;
    info!("-- {} messages in {}", uids.len(), folder);
    Ok(uids)
}

/// Fetches each UID in turn and hands the raw message to `process`, which
/// returns the number of files it wrote.
///
/// Per-message errors are logged and counted as skipped; anything else
/// ends the run.
pub async fn download_messages<M, F>(
    mailbox: &mut M,
    uids: &[u32],
    mut process: F,
) -> Result<RunReport, Error>
where
    M: Mailbox,
    F: FnMut(u32, Vec<u8>) -> Result<usize, Error>,
{
    let total = uids.len();
    let mut report = RunReport::default();

    for (position, &uid) in uids.iter().enumerate() {
        info!("Fetching message No.{}/{} (UID {})...", position + 1, total, uid);

        let outcome = match mailbox.fetch_raw(uid).await {
            Ok(raw) => {
                report.fetched += 1;
                process(uid, raw)
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(files) => {
                report.saved += 1;
                report.files_written += files;
            }
            Err(e) if e.is_per_message() => {
                warn!("Skipping message UID {}: {}", uid, e);
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
