use std::io::{self, BufRead, StdinLock, Stdout, Write};

use crate::mail_reader::error::Error;
use crate::mail_reader::mailbox::FolderChooser;

/// Line-based questions on a terminal (or anything readable/writable).
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl Prompt<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Prompt::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    fn try_ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    pub fn ask(&mut self, what: &'static str, question: &str) -> Result<String, Error> {
        self.try_ask(question)
            .map_err(|source| Error::Prompt { what, source })
    }
}

impl<R: BufRead, W: Write> FolderChooser for Prompt<R, W> {
    fn choose(&mut self, folders: &[String]) -> Result<String, Error> {
        let listing: io::Result<()> = folders
            .iter()
            .try_for_each(|folder| writeln!(self.output, "\t{}", folder));
        listing.map_err(|source| Error::Prompt {
            what: "folder",
            source,
        })?;
        self.ask("folder", "Please choose one of the above folders: ")
    }
}

/// Reads the password without echoing it.
pub fn ask_password(question: &str) -> Result<String, Error> {
    rpassword::prompt_password(question).map_err(|source| Error::Prompt {
        what: "password",
        source,
    })
}
