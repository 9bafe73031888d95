//! Error types for the protocol layer.
//!
//! Each crate in Realmgate defines its own error enum. A `ProtocolError`
//! always means the problem is in a frame's bytes — not in networking,
//! not in realm bookkeeping.

/// Errors that can occur while encoding or decoding frames.
///
/// How the connection handler reacts depends on the variant: a frame
/// whose opcode is known but whose body won't parse is grounds to drop
/// the link, while an unknown opcode is merely skipped (it may be a
/// newer realm speaking a superset of this protocol).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The body of a recognized opcode is malformed: bad JSON, missing
    /// fields, wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame doesn't start with any registered opcode. Carries the
    /// leading bytes (lossily decoded) for logging.
    #[error("unknown opcode: {0:?}")]
    UnknownOpcode(String),

    /// The frame ended before a full opcode tag.
    #[error("truncated frame")]
    Truncated,
}
