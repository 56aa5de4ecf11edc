use log::info;
use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use crate::constants::REPLY_ENTERING_PASSIVE;
use crate::core_control::ControlChannel;
use crate::core_transfer::error::TransferError;

/// Address and port of the server-side data listener announced in a 227
/// reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

static PASV_TUPLE: OnceLock<Regex> = OnceLock::new();

fn pasv_tuple() -> &'static Regex {
    PASV_TUPLE.get_or_init(|| Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").unwrap())
}

/// Asks the server for a passive mode data endpoint.
pub async fn negotiate(control: &mut ControlChannel) -> Result<DataEndpoint, TransferError> {
    control.send_command("PASV", "").await?;

    let response = control.read_response().await?;
    if response.code != REPLY_ENTERING_PASSIVE {
        return Err(TransferError::PassiveMode(response.text));
    }

    let endpoint = parse_pasv_reply(&response.text)?;
    info!("Passive mode: IP = {}, Port = {}", endpoint.ip, endpoint.port);
    Ok(endpoint)
}

/// Extracts the `(a,b,c,d,p1,p2)` tuple from the first parenthesized group
/// of a 227 reply. The data port travels as two octets; `p1 * 256 + p2`
/// rebuilds the 16-bit value.
pub fn parse_pasv_reply(text: &str) -> Result<DataEndpoint, TransferError> {
    let captures = pasv_tuple()
        .captures(text)
        .ok_or_else(|| TransferError::PassiveReplyParse(text.to_string()))?;

    let mut octets = [0u8; 6];
    for (slot, capture) in octets.iter_mut().zip(captures.iter().skip(1)) {
        let digits =
            capture.ok_or_else(|| TransferError::PassiveReplyParse(text.to_string()))?;
        *slot = digits
            .as_str()
            .parse()
            .map_err(|_| TransferError::PassiveReplyParse(text.to_string()))?;
    }

    let [a, b, c, d, p1, p2] = octets;
    Ok(DataEndpoint {
        ip: Ipv4Addr::new(a, b, c, d),
        port: u16::from(p1) * 256 + u16::from(p2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[test]
    fn parses_entering_passive_reply() {
        let endpoint =
            parse_pasv_reply("227 Entering Passive Mode (192,168,1,5,200,10).").unwrap();
        assert_eq!(endpoint.ip, Ipv4Addr::new(192, 168, 1, 5));
        assert_eq!(endpoint.port, 200 * 256 + 10);
    }

    #[test]
    fn five_integers_fail_closed() {
        let err = parse_pasv_reply("227 Entering Passive Mode (192,168,1,5,200).").unwrap_err();
        assert!(matches!(err, TransferError::PassiveReplyParse(_)));
    }

    #[test]
    fn missing_tuple_fails_closed() {
        assert!(parse_pasv_reply("227 Entering Passive Mode.").is_err());
        assert!(parse_pasv_reply("227").is_err());
    }

    #[test]
    fn out_of_range_octets_fail_closed() {
        let err = parse_pasv_reply("227 Entering Passive Mode (300,0,0,1,10,10).").unwrap_err();
        assert!(matches!(err, TransferError::PassiveReplyParse(_)));
    }

    #[tokio::test]
    async fn refused_pasv_surfaces_raw_text() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut stream = BufReader::new(stream);
            let mut line = String::new();
            stream.read_line(&mut line).await.unwrap();
            assert_eq!(line, "PASV\r\n");
            stream
                .write_all(b"421 Service not available.\r\n")
                .await
                .unwrap();
        });

        let mut control = ControlChannel::open(addr.ip(), addr.port()).await.unwrap();
        let err = negotiate(&mut control).await.unwrap_err();
        match err {
            TransferError::PassiveMode(text) => {
                assert_eq!(text, "421 Service not available.")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        server.await.unwrap();
    }
}
