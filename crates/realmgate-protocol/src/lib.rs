//! Wire protocol for Realmgate.
//!
//! This crate defines the "language" spoken on a realm control link:
//!
//! - **Types** ([`Message`], [`PlayerProfile`], [`RealmState`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`OpcodeCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the realm
//! layer (registered realms, pending handoffs). It doesn't know about
//! connections or registries — it only knows how to serialize and
//! deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Message) → Realm (registry, handoffs)
//! ```
//!
//! # Wire format
//!
//! Every frame starts with a short textual opcode tag identifying the
//! message kind, followed by the JSON encoding of that kind's fields.
//! The tag makes frames self-describing without a wrapping envelope, and
//! keeps the set of kinds open: new opcodes can be registered on the
//! codec without touching existing ones.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::{DecodeFn, OpcodeCodec, parse_body};
pub use error::ProtocolError;
pub use types::{
    AuthRequest, AuthResponse, Challenge, ConnectReady, ConnectRequest,
    Message, Opcoded, PlayerId, PlayerProfile, RealmId, RealmState,
    SetInfos, SetState,
};
