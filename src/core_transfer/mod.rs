pub mod error;

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::constants::{
    REPLY_LOGGED_IN, REPLY_OPENING_DATA, REPLY_PASSWORD_REQUIRED, REPLY_SERVICE_READY,
    REPLY_TRANSFER_COMPLETE,
};
use crate::core_control::ControlChannel;
use crate::core_network::{self, pasv, pasv::DataEndpoint};
use crate::core_reference::FileReference;
use error::TransferError;

/// Tunables for a single retrieval, resolved from the CLI and configuration.
#[derive(Debug, Clone)]
pub struct TransferOptions {
    pub control_port: u16,
    pub buffer_size: usize,
    pub output_dir: PathBuf,
}

/// Outcome of a confirmed retrieval.
#[derive(Debug)]
pub struct DownloadSummary {
    pub local_path: PathBuf,
    pub bytes_received: u64,
}

/// Retrieves the referenced file over a passive mode FTP session.
///
/// Drives the full control sequence: greeting, USER/PASS, PASV, data
/// connection, RETR, data pump, completion check. Every step must see its
/// expected reply code; any mismatch aborts the whole operation. The control
/// channel, the data stream and the file handle are plain owned values, so
/// each early return releases them.
///
/// # Arguments
///
/// * `reference` - The parsed target: credentials, host and remote path.
/// * `options` - Control port, transfer buffer size and output directory.
///
/// # Returns
///
/// The local path and byte count of the confirmed transfer, or the
/// `TransferError` naming the step that failed.
pub async fn download(
    reference: &FileReference,
    options: &TransferOptions,
) -> Result<DownloadSummary, TransferError> {
    let local_name = reference.local_filename()?;
    let local_path = options.output_dir.join(&local_name);

    let control_port = reference.port.unwrap_or(options.control_port);
    let mut session =
        TransferSession::establish(&reference.host, control_port, options.buffer_size).await?;
    session
        .authenticate(&reference.user, &reference.password)
        .await?;
    let bytes_received = session.retrieve(&reference.remote_path, &local_path).await?;

    info!(
        "File transfer complete. File saved as: {}",
        local_path.display()
    );
    Ok(DownloadSummary {
        local_path,
        bytes_received,
    })
}

/// One live FTP session: the open control channel, plus a data stream
/// strictly nested inside `retrieve`.
struct TransferSession {
    control: ControlChannel,
    buffer_size: usize,
}

impl TransferSession {
    /// Opens the control connection and consumes the 220 greeting.
    async fn establish(
        host: &str,
        port: u16,
        buffer_size: usize,
    ) -> Result<Self, TransferError> {
        let address = core_network::resolve(host).await?;
        let mut control = ControlChannel::open(address, port).await?;

        let greeting = control.read_response().await?;
        if greeting.code != REPLY_SERVICE_READY {
            return Err(TransferError::Protocol(format!(
                "Unexpected greeting: {}",
                greeting.text
            )));
        }
        debug!("Server greeting: {}", greeting.text);

        Ok(Self {
            control,
            buffer_size,
        })
    }

    /// Runs the USER/PASS exchange.
    ///
    /// Servers may emit further 220-coded banner lines after USER; those are
    /// drained until the first differing code, which classifies the login. A
    /// 230 straight away means no password is required and PASS is skipped.
    async fn authenticate(&mut self, user: &str, password: &str) -> Result<(), TransferError> {
        self.control.send_command("USER", user).await?;

        let mut response = self.control.read_response().await?;
        while response.code == REPLY_SERVICE_READY {
            debug!("Ignoring additional banner line: {}", response.text);
            response = self.control.read_response().await?;
        }

        match response.code {
            REPLY_LOGGED_IN => {
                info!("Login successful (no password required).");
                Ok(())
            }
            REPLY_PASSWORD_REQUIRED => {
                self.control.send_command("PASS", password).await?;
                let reply = self.control.read_response().await?;
                if reply.code != REPLY_LOGGED_IN {
                    return Err(TransferError::Authentication(reply.text));
                }
                info!("Login successful.");
                Ok(())
            }
            _ => Err(TransferError::Authentication(response.text)),
        }
    }

    /// Negotiates passive mode, issues RETR and pumps the data connection
    /// into `local_path`.
    async fn retrieve(
        &mut self,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<u64, TransferError> {
        let endpoint = pasv::negotiate(&mut self.control).await?;
        let mut data_stream =
            core_network::connect(endpoint.ip.into(), endpoint.port).await?;

        self.control.send_command("RETR", remote_path).await?;
        let reply = self.control.read_response().await?;
        if reply.code != REPLY_OPENING_DATA {
            // Dropping data_stream here closes the data connection before the
            // error propagates.
            return Err(TransferError::Protocol(format!(
                "RETR rejected: {}",
                reply.text
            )));
        }

        let bytes_received = self.pump(&mut data_stream, &endpoint, local_path).await?;
        drop(data_stream);

        let completion = self.control.read_response().await?;
        if completion.code != REPLY_TRANSFER_COMPLETE {
            warn!(
                "Transfer of {} not confirmed: {}",
                remote_path, completion.text
            );
            return Err(TransferError::IncompleteTransfer(completion.text));
        }
        Ok(bytes_received)
    }

    /// Streams the data connection into the local file until the server
    /// closes it, writing chunks in arrival order. The file is only created
    /// here, after the 150 reply.
    async fn pump(
        &self,
        data_stream: &mut TcpStream,
        endpoint: &DataEndpoint,
        local_path: &Path,
    ) -> Result<u64, TransferError> {
        let mut file = File::create(local_path)
            .await
            .map_err(|source| TransferError::Storage {
                path: local_path.to_path_buf(),
                source,
            })?;

        let mut buffer = vec![0; self.buffer_size];
        let mut bytes_received: u64 = 0;
        loop {
            let n = data_stream.read(&mut buffer).await.map_err(|source| {
                TransferError::Connection {
                    endpoint: format!("{}:{}", endpoint.ip, endpoint.port),
                    source,
                }
            })?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])
                .await
                .map_err(|source| TransferError::Storage {
                    path: local_path.to_path_buf(),
                    source,
                })?;
            bytes_received += n as u64;
        }

        file.flush()
            .await
            .map_err(|source| TransferError::Storage {
                path: local_path.to_path_buf(),
                source,
            })?;
        debug!(
            "Received {} bytes into {}",
            bytes_received,
            local_path.display()
        );
        Ok(bytes_received)
    }
}
