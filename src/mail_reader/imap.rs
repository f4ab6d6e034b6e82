use async_imap::{Client, Session};
use futures::TryStreamExt;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};

use crate::mail_reader::error::Error;
use crate::mail_reader::mailbox::Mailbox;
use crate::mail_reader::settings::Credentials;
use log::{debug, info};

/// Implicit-TLS IMAP.
pub const DEFAULT_PORT: u16 = 993;

type ImapStream = Compat<tokio_native_tls::TlsStream<TcpStream>>;

// Establish a TLS-encrypted connection to the IMAP server
async fn connect_to_server(server: &str, port: u16) -> Result<tokio_native_tls::TlsStream<TcpStream>, Error> {
    let connection_error = |reason: String| Error::Connection {
        host: server.to_string(),
        port,
        reason,
    };

    let tcp_stream = TcpStream::connect((server, port))
        .await
        .map_err(|e| connection_error(e.to_string()))?;
    let connector = native_tls::TlsConnector::new().map_err(|e| connection_error(e.to_string()))?;
    let tls = tokio_native_tls::TlsConnector::from(connector);
    let tls_stream = tls
        .connect(server, tcp_stream)
        .await
        .map_err(|e| connection_error(format!("TLS handshake failed: {}", e)))?;

    info!("-- connected to {}:{}", server, port);
    Ok(tls_stream)
}

/// A transport failure during LOGIN is a connection problem, anything else
/// the server says is a rejected login.
pub(crate) fn login_error(e: async_imap::error::Error, credentials: &Credentials, port: u16) -> Error {
    match e {
        async_imap::error::Error::Io(io) => Error::Connection {
            host: credentials.host.clone(),
            port,
            reason: io.to_string(),
        },
        other => Error::Authentication {
            username: credentials.username.clone(),
            reason: other.to_string(),
        },
    }
}

// Login to the IMAP server and return an authenticated session
async fn login_to_server(
    client: Client<ImapStream>,
    credentials: &Credentials,
    port: u16,
) -> Result<Session<ImapStream>, Error> {
    let imap_session = client
        .login(&credentials.username, &credentials.password)
        .await
        .map_err(|(e, _client)| login_error(e, credentials, port))?;

    info!("-- logged in as {}", credentials.username);
    Ok(imap_session)
}

/// An authenticated IMAP session; SELECT keeps at most one folder open.
pub struct ImapMailbox {
    session: Session<ImapStream>,
}

pub async fn connect(credentials: &Credentials, port: u16) -> Result<ImapMailbox, Error> {
    let tls_stream = connect_to_server(&credentials.host, port).await?;
    let client = Client::new(tls_stream.compat());
    let session = login_to_server(client, credentials, port).await?;
    Ok(ImapMailbox { session })
}

impl ImapMailbox {
    // Be nice to the server and log out
    pub async fn logout(mut self) -> Result<(), Error> {
        self.session.logout().await?;
        debug!("-- logged out");
        Ok(())
    }
}

impl Mailbox for ImapMailbox {
    async fn list_folders(&mut self) -> Result<Vec<String>, Error> {
        let names: Vec<_> = self
            .session
            .list(Some(""), Some("*"))
            .await?
            .try_collect()
            .await?;
        Ok(names.iter().map(|name| name.name().to_string()).collect())
    }

    async fn select(&mut self, folder: &str) -> Result<(), Error> {
        let mailbox_data = self
            .session
            .select(folder)
            .await
            .map_err(|e| Error::Folder {
                folder: folder.to_string(),
                reason: e.to_string(),
            })?;
        info!("-- {} selected, {} messages", folder, mailbox_data.exists);
        Ok(())
    }

    async fn search_all(&mut self) -> Result<Vec<u32>, Error> {
        let mut uids: Vec<u32> = self.session.uid_search("ALL").await?.into_iter().collect();
        // UID SEARCH comes back as a set; ascending is the server's order
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch_raw(&mut self, uid: u32) -> Result<Vec<u8>, Error> {
        let messages: Vec<_> = self
            .session
            .uid_fetch(uid.to_string(), "RFC822")
            .await?
            .try_collect()
            .await?;
        messages
            .iter()
            .find_map(|message| message.body())
            .map(<[u8]>::to_vec)
            .ok_or(Error::MissingBody { uid })
    }
}
