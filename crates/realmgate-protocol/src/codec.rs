//! Codec trait and the standard opcode-tagged implementation.
//!
//! A codec converts between [`Message`] values and raw frames. The rest
//! of the stack doesn't care HOW frames are laid out — it programs
//! against the [`Codec`] trait, and implementations can be swapped
//! without touching the connection handler.
//!
//! The standard layout ([`OpcodeCodec`]) is a short textual opcode tag
//! followed by the JSON body of that kind. JSON keeps control-link
//! traffic inspectable in logs and packet captures; the control link is
//! low-volume, so compactness is not a concern here.

#[cfg(feature = "json")]
use serde::{Serialize, de::DeserializeOwned};

use crate::{Message, ProtocolError};

/// Encodes and decodes control-link frames.
///
/// `Send + Sync + 'static` because the codec is shared by every
/// connection task on the Tokio thread pool.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into one frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if the body can't be
    /// serialized.
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError>;

    /// Parses exactly one message from a frame.
    ///
    /// # Errors
    /// - [`ProtocolError::Truncated`] — empty frame.
    /// - [`ProtocolError::UnknownOpcode`] — no registered opcode tags
    ///   this frame.
    /// - [`ProtocolError::Decode`] — the opcode is known but the body
    ///   is malformed.
    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError>;
}

// ---------------------------------------------------------------------------
// OpcodeCodec
// ---------------------------------------------------------------------------

/// A registered body parser: turns the bytes after the opcode tag into
/// a [`Message`].
#[cfg(feature = "json")]
pub type DecodeFn = fn(&[u8]) -> Result<Message, ProtocolError>;

/// Parses a JSON body into the given kind and wraps it in [`Message`].
///
/// This is the parser behind every standard opcode; it is public so
/// alias opcodes (say, a legacy tag for an existing kind) can be
/// registered with `register(tag, parse_body::<Kind>)`.
#[cfg(feature = "json")]
pub fn parse_body<T>(body: &[u8]) -> Result<Message, ProtocolError>
where
    T: DeserializeOwned + Into<Message>,
{
    serde_json::from_slice::<T>(body)
        .map(Into::into)
        .map_err(ProtocolError::Decode)
}

/// The standard [`Codec`]: opcode tag + JSON body.
///
/// Holds a registry from opcode tag to body parser. Decoding picks the
/// longest registered tag that prefixes the frame, so a longer tag may
/// safely shadow a shorter one; among the standard opcodes no tag
/// prefixes another.
#[cfg(feature = "json")]
#[derive(Clone)]
pub struct OpcodeCodec {
    registry: std::collections::HashMap<&'static str, DecodeFn>,
}

#[cfg(feature = "json")]
impl OpcodeCodec {
    /// Creates a codec with every standard message kind registered.
    pub fn standard() -> Self {
        use crate::types::*;

        let mut codec = Self {
            registry: std::collections::HashMap::new(),
        };
        codec.register(Challenge::OPCODE, parse_body::<Challenge>);
        codec.register(AuthRequest::OPCODE, parse_body::<AuthRequest>);
        codec.register(AuthResponse::OPCODE, parse_body::<AuthResponse>);
        codec.register(SetInfos::OPCODE, parse_body::<SetInfos>);
        codec.register(SetState::OPCODE, parse_body::<SetState>);
        codec.register(ConnectRequest::OPCODE, parse_body::<ConnectRequest>);
        codec.register(ConnectReady::OPCODE, parse_body::<ConnectReady>);
        codec
    }

    /// Registers (or replaces) the parser for an opcode tag.
    pub fn register(&mut self, opcode: &'static str, parse: DecodeFn) {
        self.registry.insert(opcode, parse);
    }

    fn frame<T: Serialize>(
        opcode: &str,
        body: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        let mut out = opcode.as_bytes().to_vec();
        serde_json::to_writer(&mut out, body).map_err(ProtocolError::Encode)?;
        Ok(out)
    }
}

#[cfg(feature = "json")]
impl Default for OpcodeCodec {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(feature = "json")]
impl Codec for OpcodeCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, ProtocolError> {
        match msg {
            Message::Challenge(m) => Self::frame(msg.opcode(), m),
            Message::AuthRequest(m) => Self::frame(msg.opcode(), m),
            Message::AuthResponse(m) => Self::frame(msg.opcode(), m),
            Message::SetInfos(m) => Self::frame(msg.opcode(), m),
            Message::SetState(m) => Self::frame(msg.opcode(), m),
            Message::ConnectRequest(m) => Self::frame(msg.opcode(), m),
            Message::ConnectReady(m) => Self::frame(msg.opcode(), m),
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Message, ProtocolError> {
        if data.is_empty() {
            return Err(ProtocolError::Truncated);
        }

        // Longest registered tag prefixing the frame wins.
        let mut best: Option<(&'static str, DecodeFn)> = None;
        for (&opcode, &parse) in &self.registry {
            if data.starts_with(opcode.as_bytes())
                && best.map_or(true, |(current, _)| opcode.len() > current.len())
            {
                best = Some((opcode, parse));
            }
        }

        match best {
            Some((opcode, parse)) => parse(&data[opcode.len()..]),
            None => {
                let lead: Vec<u8> =
                    data.iter().copied().take(8).collect();
                Err(ProtocolError::UnknownOpcode(
                    String::from_utf8_lossy(&lead).into_owned(),
                ))
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
