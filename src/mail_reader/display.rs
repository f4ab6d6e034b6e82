use crate::mail_reader::mailbox::RunReport;
use log::{info, warn};

pub fn display_report(report: &RunReport) {
    info!(
        "Fetched {} messages, saved {}, wrote {} files",
        report.fetched, report.saved, report.files_written
    );
    if report.skipped > 0 {
        warn!("{} messages were skipped, see the warnings above", report.skipped);
    }
}
