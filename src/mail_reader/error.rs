use std::io;
use thiserror::Error;

pub const EXIT_CONNECTION: u8 = 2;
pub const EXIT_AUTHENTICATION: u8 = 3;
pub const EXIT_FOLDER: u8 = 4;
pub const EXIT_PROCESSING: u8 = 5;
pub const EXIT_SETTINGS: u8 = 6;

#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot connect to {host}:{port}: {reason}")]
    Connection {
        host: String,
        port: u16,
        reason: String,
    },
    #[error("login rejected for {username}: {reason}")]
    Authentication { username: String, reason: String },
    #[error("cannot select folder {folder:?}: {reason}")]
    Folder { folder: String, reason: String },
    #[error("IMAP command failed: {0}")]
    Imap(#[from] async_imap::error::Error),
    #[error("message {uid} has no body in the FETCH response")]
    MissingBody { uid: u32 },
    #[error("message has neither a usable Date nor Delivery-date header")]
    Date,
    #[error("cannot parse message: {0}")]
    Parse(#[from] mailparse::MailParseError),
    #[error("cannot decode attachment filename {raw:?}: {reason}")]
    FilenameDecode { raw: String, reason: String },
    #[error("cannot read {what} from the terminal: {source}")]
    Prompt {
        what: &'static str,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Errors that only spoil the message being handled; the run goes on.
    pub fn is_per_message(&self) -> bool {
        matches!(
            self,
            Error::MissingBody { .. }
                | Error::Date
                | Error::Parse(_)
                | Error::FilenameDecode { .. }
                | Error::Io(_)
        )
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Connection { .. } => EXIT_CONNECTION,
            Error::Authentication { .. } => EXIT_AUTHENTICATION,
            Error::Folder { .. } => EXIT_FOLDER,
            Error::Prompt { .. } => EXIT_SETTINGS,
            _ => EXIT_PROCESSING,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail_reader::imap::login_error;
    use crate::mail_reader::settings::Credentials;

    #[test]
    fn fatal_errors_map_to_distinct_exit_codes() {
        let connection = Error::Connection {
            host: "imap.example.com".to_string(),
            port: 993,
            reason: "refused".to_string(),
        };
        let auth = Error::Authentication {
            username: "alice".to_string(),
            reason: "NO".to_string(),
        };
        let folder = Error::Folder {
            folder: "Nope".to_string(),
            reason: "NO".to_string(),
        };

        assert_eq!(connection.exit_code(), EXIT_CONNECTION);
        assert_eq!(auth.exit_code(), EXIT_AUTHENTICATION);
        assert_eq!(folder.exit_code(), EXIT_FOLDER);
        assert!(!connection.is_per_message());
        assert!(!auth.is_per_message());
        assert!(!folder.is_per_message());
    }

    fn credentials() -> Credentials {
        Credentials {
            host: "imap.example.com".to_string(),
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        }
    }

    #[test]
    fn login_transport_failure_is_a_connection_error() {
        let dropped = async_imap::error::Error::Io(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));

        let error = login_error(dropped, &credentials(), 993);

        match &error {
            Error::Connection { host, port, reason } => {
                assert_eq!(host, "imap.example.com");
                assert_eq!(*port, 993);
                assert!(reason.contains("reset by peer"));
            }
            other => panic!("expected a connection error, got {:?}", other),
        }
        assert_eq!(error.exit_code(), EXIT_CONNECTION);
    }

    #[test]
    fn login_rejection_is_an_authentication_error() {
        let rejected = async_imap::error::Error::No("[AUTHENTICATIONFAILED] Invalid credentials".to_string());

        let error = login_error(rejected, &credentials(), 993);

        match &error {
            Error::Authentication { username, reason } => {
                assert_eq!(username, "alice");
                assert!(reason.contains("Invalid credentials"));
                assert!(!reason.contains("hunter2"));
            }
            other => panic!("expected an authentication error, got {:?}", other),
        }
        assert_eq!(error.exit_code(), EXIT_AUTHENTICATION);
    }

    #[test]
    fn date_and_write_failures_stay_per_message() {
        assert!(Error::Date.is_per_message());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Other, "disk full")).is_per_message());
    }
}
