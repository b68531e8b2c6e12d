//! Wire framing and message codec for the datagram transport.
//!
//! Every frame is `[msg_type:u8][payload_len:u16 BE][payload]`. All
//! multi-byte payload fields are big-endian; there are no string fields
//! anywhere in this path.

use crate::sim::command::{Command, CommandKind};
use crate::sim::entity::PlayerId;
use crate::sim::hash::StateDigest;
use std::fmt;

/// Digest length is fixed; see [`crate::sim::hash::StateDigest`].
const DIGEST_LEN: usize = 32;

/// One decoded message, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Sent by the joiner to initiate the handshake.
    Connect,
    /// Sent by the host in reply to `Connect`.
    ConnectAck {
        /// Map-generation seed the joiner must adopt.
        seed: u32,
        /// Ticks per second both peers must run at.
        tick_rate: u32,
        /// The player id assigned to the recipient.
        your_player_id: u8,
    },
    /// A tick's worth of commands from one peer.
    Commands {
        /// The tick these commands execute on.
        tick: u32,
        /// The commands themselves, in wire order (not necessarily canonical).
        commands: Vec<Command>,
    },
    /// A state digest for a completed tick, used for desync detection.
    HashCheck {
        /// The tick the digest was computed for.
        tick: u32,
        /// The digest itself.
        digest: StateDigest,
    },
    /// Sent on clean shutdown.
    Disconnect,
}

impl Message {
    fn kind_byte(&self) -> u8 {
        match self {
            Message::Connect => 0,
            Message::ConnectAck { .. } => 1,
            Message::Commands { .. } => 2,
            Message::HashCheck { .. } => 3,
            Message::Disconnect => 4,
        }
    }
}

/// A malformed or unsupported datagram. The receiver always drops the
/// packet and continues; this type exists for logging, not for control
/// flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes were available than the frame header requires.
    TruncatedHeader,
    /// The declared payload length exceeds the bytes actually available.
    TruncatedPayload {
        /// Payload length declared in the frame header.
        declared: u16,
        /// Bytes actually available after the header.
        available: usize,
    },
    /// The message kind byte did not match any known kind.
    UnknownMessageKind(u8),
    /// A `COMMANDS` record named a command kind byte with no mapping.
    UnknownCommandKind(u8),
    /// A payload's internal length prefix did not match the frame.
    MalformedPayload(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedHeader => write!(f, "frame shorter than the 3-byte header"),
            DecodeError::TruncatedPayload { declared, available } => {
                write!(f, "payload declared {declared} bytes but only {available} available")
            }
            DecodeError::UnknownMessageKind(b) => write!(f, "unknown message kind byte {b}"),
            DecodeError::UnknownCommandKind(b) => write!(f, "unknown command kind byte {b}"),
            DecodeError::MalformedPayload(what) => write!(f, "malformed payload: {what}"),
        }
    }
}

impl std::error::Error for DecodeError {}

fn command_kind_byte(kind: CommandKind) -> u8 {
    match kind {
        CommandKind::Move => 0,
        CommandKind::Stop => 1,
        CommandKind::Harvest => 2,
        CommandKind::SpawnAnt => 3,
        CommandKind::MergeQueen => 4,
        CommandKind::FoundHive => 5,
        CommandKind::Attack => 6,
        CommandKind::MorphSpitter => 7,
    }
}

fn command_kind_from_byte(byte: u8) -> Result<CommandKind, DecodeError> {
    match byte {
        0 => Ok(CommandKind::Move),
        1 => Ok(CommandKind::Stop),
        2 => Ok(CommandKind::Harvest),
        3 => Ok(CommandKind::SpawnAnt),
        4 => Ok(CommandKind::MergeQueen),
        5 => Ok(CommandKind::FoundHive),
        6 => Ok(CommandKind::Attack),
        7 => Ok(CommandKind::MorphSpitter),
        other => Err(DecodeError::UnknownCommandKind(other)),
    }
}

fn encode_command(buf: &mut Vec<u8>, command: &Command) {
    buf.push(command_kind_byte(command.kind));
    #[allow(clippy::cast_sign_loss)]
    buf.push(command.player as u8);
    buf.extend_from_slice(&command.tick.to_be_bytes());
    #[allow(clippy::cast_possible_truncation)]
    let n_entities = command.entity_ids.len() as u16;
    buf.extend_from_slice(&n_entities.to_be_bytes());
    for id in &command.entity_ids {
        buf.extend_from_slice(&id.to_be_bytes());
    }
    buf.extend_from_slice(&command.target_x.to_be_bytes());
    buf.extend_from_slice(&command.target_y.to_be_bytes());
    buf.extend_from_slice(&command.target_entity_id.unwrap_or(u32::MAX).to_be_bytes());
}

fn decode_command(bytes: &[u8], cursor: &mut usize) -> Result<Command, DecodeError> {
    let kind = command_kind_from_byte(take_u8(bytes, cursor)?)?;
    #[allow(clippy::cast_possible_wrap)]
    let player = take_u8(bytes, cursor)? as PlayerId;
    let tick = take_u32(bytes, cursor)?;
    let n_entities = take_u16(bytes, cursor)?;
    let mut entity_ids = Vec::with_capacity(usize::from(n_entities));
    for _ in 0..n_entities {
        entity_ids.push(take_u32(bytes, cursor)?);
    }
    let target_x = take_i32(bytes, cursor)?;
    let target_y = take_i32(bytes, cursor)?;
    let target_entity_raw = take_u32(bytes, cursor)?;
    let target_entity_id = if target_entity_raw == u32::MAX { None } else { Some(target_entity_raw) };
    Ok(Command { kind, player, tick, entity_ids, target_x, target_y, target_entity_id })
}

fn take_u8(bytes: &[u8], cursor: &mut usize) -> Result<u8, DecodeError> {
    let byte = *bytes.get(*cursor).ok_or(DecodeError::MalformedPayload("truncated command record"))?;
    *cursor += 1;
    Ok(byte)
}

fn take_u16(bytes: &[u8], cursor: &mut usize) -> Result<u16, DecodeError> {
    let slice = bytes.get(*cursor..*cursor + 2).ok_or(DecodeError::MalformedPayload("truncated command record"))?;
    *cursor += 2;
    Ok(u16::from_be_bytes([slice[0], slice[1]]))
}

fn take_u32(bytes: &[u8], cursor: &mut usize) -> Result<u32, DecodeError> {
    let slice = bytes.get(*cursor..*cursor + 4).ok_or(DecodeError::MalformedPayload("truncated command record"))?;
    *cursor += 4;
    Ok(u32::from_be_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn take_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, DecodeError> {
    take_u32(bytes, cursor).map(|v| v as i32)
}

fn encode_payload(message: &Message) -> Vec<u8> {
    let mut payload = Vec::new();
    match message {
        Message::Connect | Message::Disconnect => {}
        Message::ConnectAck { seed, tick_rate, your_player_id } => {
            payload.extend_from_slice(&seed.to_be_bytes());
            payload.extend_from_slice(&tick_rate.to_be_bytes());
            payload.push(*your_player_id);
        }
        Message::Commands { tick, commands } => {
            payload.extend_from_slice(&tick.to_be_bytes());
            #[allow(clippy::cast_possible_truncation)]
            let n_commands = commands.len() as u16;
            payload.extend_from_slice(&n_commands.to_be_bytes());
            for command in commands {
                encode_command(&mut payload, command);
            }
        }
        Message::HashCheck { tick, digest } => {
            payload.extend_from_slice(&tick.to_be_bytes());
            payload.extend_from_slice(digest);
        }
    }
    payload
}

/// Encode a message into a self-contained frame ready to hand to the
/// socket.
///
/// # Panics
/// Panics if the encoded payload exceeds `u16::MAX` bytes. This cannot
/// happen for any payload this codec produces given realistic command
/// counts, but a pathological `Commands` batch could in principle
/// overflow it.
#[must_use]
pub fn encode(message: &Message) -> Vec<u8> {
    let payload = encode_payload(message);
    assert!(payload.len() <= usize::from(u16::MAX), "encoded payload exceeds frame length limit");
    #[allow(clippy::cast_possible_truncation)]
    let len = payload.len() as u16;
    let mut frame = Vec::with_capacity(3 + payload.len());
    frame.push(message.kind_byte());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&payload);
    frame
}

/// Decode one frame from the front of `bytes`. Extra trailing bytes
/// beyond the declared payload are ignored; the caller is expected to
/// hand in exactly one datagram.
pub fn decode(bytes: &[u8]) -> Result<Message, DecodeError> {
    let &[kind_byte, len_hi, len_lo, ref rest @ ..] = bytes else {
        return Err(DecodeError::TruncatedHeader);
    };
    let declared = u16::from_be_bytes([len_hi, len_lo]);
    let payload = rest.get(..usize::from(declared)).ok_or(DecodeError::TruncatedPayload { declared, available: rest.len() })?;

    match kind_byte {
        0 => Ok(Message::Connect),
        1 => {
            let mut cursor = 0;
            let seed = take_u32(payload, &mut cursor)?;
            let tick_rate = take_u32(payload, &mut cursor)?;
            let your_player_id = take_u8(payload, &mut cursor)?;
            Ok(Message::ConnectAck { seed, tick_rate, your_player_id })
        }
        2 => {
            let mut cursor = 0;
            let tick = take_u32(payload, &mut cursor)?;
            let n_commands = take_u16(payload, &mut cursor)?;
            let mut commands = Vec::with_capacity(usize::from(n_commands));
            for _ in 0..n_commands {
                commands.push(decode_command(payload, &mut cursor)?);
            }
            Ok(Message::Commands { tick, commands })
        }
        3 => {
            let mut cursor = 0;
            let tick = take_u32(payload, &mut cursor)?;
            let digest_slice = payload
                .get(cursor..cursor + DIGEST_LEN)
                .ok_or(DecodeError::MalformedPayload("truncated digest"))?;
            let mut digest = [0u8; DIGEST_LEN];
            digest.copy_from_slice(digest_slice);
            Ok(Message::HashCheck { tick, digest })
        }
        4 => Ok(Message::Disconnect),
        other => Err(DecodeError::UnknownMessageKind(other)),
    }
}

/// The `(tick, kind)` key the receiver deduplicates frames by.
#[must_use]
pub fn dedup_key(message: &Message) -> (u32, u8) {
    let tick = match message {
        Message::Commands { tick, .. } | Message::HashCheck { tick, .. } => *tick,
        Message::Connect | Message::ConnectAck { .. } | Message::Disconnect => 0,
    };
    (tick, message.kind_byte())
}
