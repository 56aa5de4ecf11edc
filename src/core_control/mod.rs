use log::debug;
use std::net::IpAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::core_network;
use crate::core_transfer::error::TransferError;

/// One status-coded reply line from the control connection.
#[derive(Debug, Clone)]
pub struct ControlResponse {
    pub code: u16,
    pub text: String,
}

impl ControlResponse {
    /// Classifies a reply line by the integer value of its first three
    /// characters. Anything without a numeric [100,599] prefix is a protocol
    /// error.
    pub(crate) fn parse(line: &str) -> Result<Self, TransferError> {
        let prefix = line.get(0..3).ok_or_else(|| {
            TransferError::Protocol(format!("Response line too short: {:?}", line))
        })?;
        let code: u16 = prefix.parse().map_err(|_| {
            TransferError::Protocol(format!("Non-numeric response code: {:?}", line))
        })?;
        if !(100..=599).contains(&code) {
            return Err(TransferError::Protocol(format!(
                "Response code out of range: {:?}",
                line
            )));
        }
        Ok(Self {
            code,
            text: line.trim_end().to_string(),
        })
    }
}

/// The command channel of an FTP session: sends CRLF-terminated commands and
/// reads status-coded reply lines.
pub struct ControlChannel {
    stream: BufReader<TcpStream>,
    peer: String,
}

impl ControlChannel {
    /// Opens the control connection to the server's command port.
    pub async fn open(address: IpAddr, port: u16) -> Result<Self, TransferError> {
        let stream = core_network::connect(address, port).await?;
        Ok(Self {
            stream: BufReader::new(stream),
            peer: format!("{}:{}", address, port),
        })
    }

    /// Writes `"VERB argument\r\n"` (bare `"VERB\r\n"` when the argument is
    /// empty) to the server.
    pub async fn send_command(&mut self, verb: &str, argument: &str) -> Result<(), TransferError> {
        let line = if argument.is_empty() {
            format!("{}\r\n", verb)
        } else {
            format!("{} {}\r\n", verb, argument)
        };

        self.stream
            .write_all(line.as_bytes())
            .await
            .map_err(|source| TransferError::Transmission {
                verb: verb.to_string(),
                source,
            })?;
        self.stream
            .flush()
            .await
            .map_err(|source| TransferError::Transmission {
                verb: verb.to_string(),
                source,
            })?;

        let shown = if verb == "PASS" { "****" } else { argument };
        debug!("Command sent: {} {}", verb, shown);
        Ok(())
    }

    /// Reads one newline-terminated reply line and classifies it.
    pub async fn read_response(&mut self) -> Result<ControlResponse, TransferError> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await.map_err(|e| {
            TransferError::Protocol(format!("Control read from {} failed: {}", self.peer, e))
        })?;
        if n == 0 {
            return Err(TransferError::Protocol(format!(
                "Control connection to {} closed by server",
                self.peer
            )));
        }

        let response = ControlResponse::parse(&line)?;
        debug!("Response received: {}", response.text);
        Ok(response)
    }
}
