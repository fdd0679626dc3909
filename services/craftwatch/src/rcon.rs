//! RCON admin query client
//!
//! Packet layout (little endian):
//! `i32 length | i32 request id | i32 type | body | 0x00 0x00`
//! where `length` counts everything after itself.

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::{CraftwatchError, Result};
use crate::net;
use crate::probe::AdminQueryProbe;

const TYPE_RESPONSE: i32 = 0;
const TYPE_COMMAND: i32 = 2;
const TYPE_AUTH_RESPONSE: i32 = 2;
const TYPE_LOGIN: i32 = 3;
const AUTH_FAILED_ID: i32 = -1;
/// Servers cap payloads at 4096 bytes; anything larger is garbage
const MAX_PACKET_LEN: i32 = 4096 + 10;

const LOGIN_ID: i32 = 1;
const COMMAND_ID: i32 = 2;

/// A single RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconPacket {
    pub id: i32,
    pub kind: i32,
    pub body: String,
}

impl RconPacket {
    pub fn encode(&self) -> Vec<u8> {
        let body = self.body.as_bytes();
        let length = (4 + 4 + body.len() + 2) as i32;

        let mut buf = Vec::with_capacity(length as usize + 4);
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&self.id.to_le_bytes());
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.extend_from_slice(body);
        buf.extend_from_slice(&[0, 0]);
        buf
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let length = read_i32(reader)?;
        if !(10..=MAX_PACKET_LEN).contains(&length) {
            return Err(CraftwatchError::AdminQueryFailed(format!(
                "invalid packet length {}",
                length
            )));
        }

        let id = read_i32(reader)?;
        let kind = read_i32(reader)?;
        let mut rest = vec![0u8; length as usize - 8];
        reader.read_exact(&mut rest)?;

        // body is terminated by two NUL bytes
        rest.truncate(rest.len() - 2);
        let body = String::from_utf8_lossy(&rest).into_owned();

        Ok(Self { id, kind, body })
    }
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(i32::from_le_bytes(bytes))
}

/// Log in and run a single command on an already connected stream
pub fn run_command<S: Read + Write>(stream: &mut S, password: &str, command: &str) -> Result<String> {
    let login = RconPacket {
        id: LOGIN_ID,
        kind: TYPE_LOGIN,
        body: password.to_string(),
    };
    stream.write_all(&login.encode())?;

    // some servers send an empty response packet ahead of the auth response
    let mut reply = RconPacket::read_from(stream)?;
    if reply.kind == TYPE_RESPONSE && reply.id == LOGIN_ID {
        reply = RconPacket::read_from(stream)?;
    }
    if reply.id == AUTH_FAILED_ID {
        return Err(CraftwatchError::AdminQueryFailed(
            "RCON authentication rejected".to_string(),
        ));
    }
    if reply.kind != TYPE_AUTH_RESPONSE || reply.id != LOGIN_ID {
        return Err(CraftwatchError::AdminQueryFailed(format!(
            "unexpected RCON login reply (id {}, type {})",
            reply.id, reply.kind
        )));
    }

    let request = RconPacket {
        id: COMMAND_ID,
        kind: TYPE_COMMAND,
        body: command.to_string(),
    };
    stream.write_all(&request.encode())?;
    stream.flush()?;

    let response = RconPacket::read_from(stream)?;
    if response.id != COMMAND_ID || response.kind != TYPE_RESPONSE {
        return Err(CraftwatchError::AdminQueryFailed(format!(
            "unexpected RCON command reply (id {}, type {})",
            response.id, response.kind
        )));
    }
    Ok(response.body)
}

/// Admin query over RCON using the `list` command
pub struct RconAdminProbe {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
}

impl std::fmt::Debug for RconAdminProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RconAdminProbe")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl RconAdminProbe {
    pub fn new(host: &str, port: u16, password: &str, timeout: Duration) -> Self {
        tracing::debug!("Created RconAdminProbe for {}:{}", host, port);
        Self {
            host: host.to_string(),
            port,
            password: password.to_string(),
            timeout,
        }
    }
}

impl AdminQueryProbe for RconAdminProbe {
    fn list_players(&self) -> Result<String> {
        let mut stream = net::connect(&self.host, self.port, self.timeout).map_err(|e| {
            CraftwatchError::AdminQueryFailed(format!(
                "connect to {}:{} failed: {}",
                self.host, self.port, e
            ))
        })?;
        run_command(&mut stream, &self.password, "list")
    }
}
