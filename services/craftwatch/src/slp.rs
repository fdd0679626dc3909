//! Minecraft Java edition Server List Ping
//!
//! Packets are framed as `VarInt length | VarInt packet id | payload`.
//! Exchange: handshake (next state = status), status request, JSON status
//! response, then an optional ping/pong used to measure latency.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::{CraftwatchError, Result};
use crate::net;
use crate::probe::{ServerStatus, StatusProbe};

/// Protocol version sent in the handshake; -1 asks the server for its own
const HANDSHAKE_PROTOCOL_VERSION: i32 = -1;
const NEXT_STATE_STATUS: i32 = 1;
/// Status JSON can embed a base64 favicon, so allow generous packets
const MAX_PACKET_LEN: usize = 2 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct StatusResponse {
    players: Players,
}

#[derive(Debug, Deserialize)]
struct Players {
    online: u32,
    max: u32,
    /// Absent or `null` on servers and proxies that hide the player list
    #[serde(default)]
    sample: Option<Vec<SamplePlayer>>,
}

#[derive(Debug, Deserialize)]
struct SamplePlayer {
    name: String,
}

/// Status probe speaking Server List Ping over TCP
#[derive(Debug, Clone)]
pub struct SlpStatusProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SlpStatusProbe {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        tracing::debug!("Created SlpStatusProbe for {}:{}", host, port);
        Self {
            host: host.to_string(),
            port,
            timeout,
        }
    }
}

impl StatusProbe for SlpStatusProbe {
    fn status(&self) -> Result<ServerStatus> {
        let mut stream = net::connect(&self.host, self.port, self.timeout).map_err(|e| {
            CraftwatchError::ProbeUnreachable(format!(
                "connect to {}:{} failed: {}",
                self.host, self.port, e
            ))
        })?;
        exchange(&mut stream, &self.host, self.port)
    }
}

/// Run the status exchange on an already connected stream
pub fn exchange<S: Read + Write>(stream: &mut S, host: &str, port: u16) -> Result<ServerStatus> {
    let mut handshake = Vec::new();
    write_varint(&mut handshake, HANDSHAKE_PROTOCOL_VERSION);
    write_string(&mut handshake, host);
    handshake.extend_from_slice(&port.to_be_bytes());
    write_varint(&mut handshake, NEXT_STATE_STATUS);
    write_packet(stream, 0x00, &handshake)?;
    write_packet(stream, 0x00, &[])?;

    let (id, payload) = read_packet(stream)?;
    if id != 0x00 {
        return Err(protocol_error(format!(
            "expected status response, got packet 0x{:02x}",
            id
        )));
    }
    let json = read_string(&mut payload.as_slice())?;
    let response: StatusResponse = serde_json::from_str(&json)
        .map_err(|e| protocol_error(format!("invalid status JSON: {}", e)))?;

    let latency = match ping(stream) {
        Ok(latency) => Some(latency),
        Err(e) => {
            tracing::debug!("Ping after status failed: {}", e);
            None
        }
    };

    Ok(ServerStatus {
        reachable: true,
        online_count: response.players.online,
        max_count: response.players.max,
        sample_names: response
            .players
            .sample
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.name)
            .collect(),
        latency,
    })
}

fn ping<S: Read + Write>(stream: &mut S) -> Result<Duration> {
    let token: i64 = 0x6372_6166_7477_6368;
    let started = Instant::now();
    write_packet(stream, 0x01, &token.to_be_bytes())?;

    let (id, payload) = read_packet(stream)?;
    if id != 0x01 || payload != token.to_be_bytes() {
        return Err(protocol_error("unexpected pong".to_string()));
    }
    Ok(started.elapsed())
}

fn protocol_error(message: String) -> CraftwatchError {
    CraftwatchError::ProbeUnreachable(format!("protocol error: {}", message))
}

fn write_varint(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7f == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
}

fn read_varint<R: Read>(reader: &mut R) -> Result<i32> {
    let mut value: u32 = 0;
    for position in 0..5 {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        value |= ((byte[0] & 0x7f) as u32) << (7 * position);
        if byte[0] & 0x80 == 0 {
            return Ok(value as i32);
        }
    }
    Err(protocol_error("VarInt too long".to_string()))
}

fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_varint(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

fn read_string<R: Read>(reader: &mut R) -> Result<String> {
    let len = read_length(reader)?;
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| protocol_error(format!("invalid UTF-8: {}", e)))
}

fn read_length<R: Read>(reader: &mut R) -> Result<usize> {
    let len = read_varint(reader)?;
    match usize::try_from(len) {
        Ok(len) if len <= MAX_PACKET_LEN => Ok(len),
        _ => Err(protocol_error(format!("invalid length {}", len))),
    }
}

fn write_packet<W: Write>(writer: &mut W, id: i32, payload: &[u8]) -> Result<()> {
    let mut body = Vec::with_capacity(payload.len() + 5);
    write_varint(&mut body, id);
    body.extend_from_slice(payload);

    let mut frame = Vec::with_capacity(body.len() + 5);
    write_varint(&mut frame, body.len() as i32);
    frame.extend_from_slice(&body);

    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

fn read_packet<R: Read>(reader: &mut R) -> Result<(i32, Vec<u8>)> {
    let len = read_length(reader)?;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;

    let mut cursor = body.as_slice();
    let id = read_varint(&mut cursor)?;
    Ok((id, cursor.to_vec()))
}
