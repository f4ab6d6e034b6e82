use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, FixedOffset, Local};
use log::{debug, warn};
use regex::Regex;
use mailparse::{addrparse_header, parse_mail, MailAddr, MailHeader, MailHeaderMap, ParsedMail};

use crate::mail_reader::error::Error;
use crate::mail_reader::settings::DownloadConfig;

const TOKEN_LEN: usize = 60;
const HEADER_SEPARATOR: &str = "\r\n";

/// A file about to be handed to the writer. The filename is not sanitized yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub directory: PathBuf,
    pub filename: String,
    pub content: Vec<u8>,
}

fn date_shape() -> &'static Regex {
    static DATE_SHAPE: OnceLock<Regex> = OnceLock::new();
    // a year plus an hh:mm time, anything less is not a date
    DATE_SHAPE.get_or_init(|| Regex::new(r"\b\d{4}\b.*\b\d{1,2}:\d{2}").expect("static pattern"))
}

fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc2822(value) {
        return Some(timestamp);
    }
    // Trailing zone comments such as "(CEST)"
    let uncommented = match value.rfind('(') {
        Some(open) if value.ends_with(')') => value[..open].trim_end(),
        _ => value,
    };
    if let Ok(timestamp) = DateTime::parse_from_rfc2822(uncommented) {
        return Some(timestamp);
    }
    if !date_shape().is_match(uncommented) {
        return None;
    }
    // mailparse answers Ok(0) for text it cannot read
    mailparse::dateparse(uncommented)
        .ok()
        .filter(|&timestamp| timestamp > 0)
        .and_then(|timestamp| DateTime::from_timestamp(timestamp, 0))
        .map(|utc| utc.fixed_offset())
}

/// `Date`, or `Delivery-date` when `Date` is missing or unparsable.
pub fn message_timestamp(headers: &[MailHeader]) -> Result<DateTime<FixedOffset>, Error> {
    ["Date", "Delivery-date"]
        .iter()
        .filter_map(|name| headers.get_first_value(name))
        .find_map(|value| parse_date(&value))
        .ok_or(Error::Date)
}

/// Base directory plus optional `<year>/<month>` taken in the message's own offset.
pub fn target_directory(config: &DownloadConfig, timestamp: &DateTime<FixedOffset>) -> PathBuf {
    let mut directory = config.base_directory.clone();
    if config.directory_for_year {
        directory.push(timestamp.year().to_string());
    }
    if config.directory_for_month {
        directory.push(timestamp.month().to_string());
    }
    directory
}

pub fn timestamp_token(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.with_timezone(&Local).format("%Y%m%d-%H%M").to_string()
}

fn first_address(addr: &MailAddr) -> Option<String> {
    match addr {
        MailAddr::Single(info) => Some(info.addr.clone()),
        MailAddr::Group(group) => group.addrs.first().map(|info| info.addr.clone()),
    }
}

fn truncate(value: &str) -> String {
    value.chars().take(TOKEN_LEN).collect()
}

pub fn recipient_token(headers: &[MailHeader]) -> String {
    let address = headers
        .get_first_header("To")
        .and_then(|header| addrparse_header(header).ok())
        .and_then(|list| list.iter().find_map(first_address))
        .unwrap_or_default();
    truncate(&address.replace('@', "_").replace('.', "-"))
}

pub fn subject_token(headers: &[MailHeader]) -> String {
    truncate(&headers.get_first_value("Subject").unwrap_or_default())
}

fn push_headers(text: &mut String, headers: &[MailHeader]) {
    for header in headers {
        text.push_str(&header.get_key());
        text.push_str(": ");
        text.push_str(&String::from_utf8_lossy(header.get_value_raw()));
        text.push_str(HEADER_SEPARATOR);
    }
}

fn main_type(part: &ParsedMail) -> String {
    part.ctype
        .mimetype
        .split('/')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn guess_extension(mimetype: &str) -> &'static str {
    match mimetype.to_ascii_lowercase().as_str() {
        "application/pdf" => ".pdf",
        "application/zip" => ".zip",
        "application/gzip" | "application/x-gzip" => ".gz",
        "application/x-tar" => ".tar",
        "application/json" => ".json",
        "application/xml" => ".xml",
        "application/rtf" => ".rtf",
        "application/msword" => ".doc",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.ms-powerpoint" => ".ppt",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => ".pptx",
        "application/vnd.oasis.opendocument.text" => ".odt",
        "application/pkcs7-signature" | "application/x-pkcs7-signature" => ".p7s",
        "application/pgp-signature" => ".sig",
        "image/jpeg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "image/tiff" => ".tiff",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "audio/mpeg" => ".mp3",
        "audio/ogg" => ".ogg",
        "audio/wav" | "audio/x-wav" => ".wav",
        "video/mp4" => ".mp4",
        "video/mpeg" => ".mpeg",
        "video/webm" => ".webm",
        "message/rfc822" => ".eml",
        _ => ".bin",
    }
}

fn encoded_word() -> &'static Regex {
    static ENCODED_WORD: OnceLock<Regex> = OnceLock::new();
    ENCODED_WORD.get_or_init(|| Regex::new(r"=\?[^?\s]+\?[BbQq]\?[^?\s]*\?=").expect("static pattern"))
}

fn decode_encoded_words(raw: &str) -> Result<String, Error> {
    let decode_error = |reason: String| Error::FilenameDecode {
        raw: raw.to_string(),
        reason,
    };
    let line = format!("Filename: {}", raw.replace(['\r', '\n'], " "));
    let (header, _) =
        mailparse::parse_header(line.as_bytes()).map_err(|e| decode_error(e.to_string()))?;
    let decoded = header.get_value();
    // mailparse leaves encoded-words it cannot decode untouched
    if encoded_word().is_match(&decoded) {
        return Err(decode_error("malformed encoded-word".to_string()));
    }
    Ok(decoded)
}

fn declared_filename(part: &ParsedMail) -> Result<Option<String>, Error> {
    let disposition = part.get_content_disposition();
    disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .map(|raw| decode_encoded_words(raw))
        .transpose()
}

fn attachment_name(part: &ParsedMail, index: usize) -> String {
    match declared_filename(part) {
        Ok(Some(name)) if !name.trim().is_empty() => return name,
        Ok(_) => {}
        Err(e) => warn!("Error when parsing filename: {}", e),
    }
    format!("attachment{}{}", index, guess_extension(&part.ctype.mimetype))
}

/// Flattened text plus the attachments found while walking one message.
#[derive(Default)]
struct PartWalk {
    text: String,
    attachments: Vec<(String, Vec<u8>)>,
    counter: usize,
}

impl PartWalk {
    fn push_text(&mut self, part: &ParsedMail) -> Result<(), Error> {
        push_headers(&mut self.text, &part.headers);
        self.text.push_str(HEADER_SEPARATOR);
        self.text.push_str(&part.get_body()?);
        self.text.push_str(HEADER_SEPARATOR);
        Ok(())
    }

    fn push_attachment(&mut self, part: &ParsedMail) -> Result<(), Error> {
        self.counter += 1;
        let name = attachment_name(part, self.counter);
        debug!("Attachment {} ({})", name, part.ctype.mimetype);
        self.attachments.push((name, part.get_body_raw()?));
        Ok(())
    }

    fn walk(&mut self, part: &ParsedMail) -> Result<(), Error> {
        match main_type(part).as_str() {
            "multipart" => {
                for subpart in &part.subparts {
                    self.walk(subpart)?;
                }
                Ok(())
            }
            "text" => self.push_text(part),
            _ => self.push_attachment(part),
        }
    }
}

pub struct MessageProcessor<'a> {
    config: &'a DownloadConfig,
}

impl<'a> MessageProcessor<'a> {
    pub fn new(config: &'a DownloadConfig) -> MessageProcessor<'a> {
        MessageProcessor { config }
    }

    /// Splits one raw RFC822 message into its attachment files followed by
    /// the `.txt` file holding the headers and every textual part.
    pub fn process(&self, raw: &[u8]) -> Result<Vec<Artifact>, Error> {
        let parsed = parse_mail(raw)?;

        let timestamp = message_timestamp(&parsed.headers)?;
        let directory = target_directory(self.config, &timestamp);
        let filename = format!(
            "{}_{}_{}",
            timestamp_token(&timestamp),
            recipient_token(&parsed.headers),
            subject_token(&parsed.headers)
        );

        let mut walk = PartWalk::default();
        push_headers(&mut walk.text, &parsed.headers);
        match main_type(&parsed).as_str() {
            "text" => walk.text.push_str(&parsed.get_body()?),
            "multipart" => walk.walk(&parsed)?,
            _ => walk.push_attachment(&parsed)?,
        }

        let mut artifacts: Vec<Artifact> = walk
            .attachments
            .into_iter()
            .map(|(name, content)| Artifact {
                directory: directory.clone(),
                filename: format!("{}_{}", filename, name),
                content,
            })
            .collect();
        artifacts.push(Artifact {
            directory,
            filename: format!("{}.txt", filename),
            content: walk.text.into_bytes(),
        });
        Ok(artifacts)
    }
}
