pub mod display;
pub mod error;
pub mod imap;
pub mod mailbox;
pub mod message;
pub mod prompt;
pub mod sanitize;
pub mod settings;
pub mod writer;

pub use error::Error;

use log::{info, warn};

use mailbox::{FolderChooser, Mailbox, RunReport};
use message::MessageProcessor;
use settings::{Credentials, DownloadConfig};
use writer::FileWriter;

fn save_message(
    processor: &MessageProcessor,
    writer: &FileWriter,
    raw: &[u8],
) -> Result<usize, Error> {
    let mut written = 0;
    for artifact in processor.process(raw)? {
        if writer.write_artifact(&artifact)?.is_some() {
            written += 1;
        }
    }
    Ok(written)
}

/// Downloads `uids` from the selected folder into the layout `config` describes.
pub async fn save_messages<M: Mailbox>(
    mailbox: &mut M,
    uids: &[u32],
    config: &DownloadConfig,
) -> Result<RunReport, Error> {
    let processor = MessageProcessor::new(config);
    let writer = FileWriter::new(config.collision_policy);
    mailbox::download_messages(mailbox, uids, |_uid, raw| {
        save_message(&processor, &writer, &raw)
    })
    .await
}

pub async fn main(
    credentials: &Credentials,
    port: u16,
    config: &DownloadConfig,
    chooser: &mut dyn FolderChooser,
) -> Result<RunReport, Error> {
    let mut mailbox = imap::connect(credentials, port).await?;
    let uids = mailbox::enumerate_uids(&mut mailbox, chooser).await?;
    info!("-- saving into {}", config.base_directory.display());

    let report = save_messages(&mut mailbox, &uids, config).await?;
    if let Err(e) = mailbox.logout().await {
        warn!("Logout failed: {}", e);
    }

    display::display_report(&report);
    Ok(report)
}
