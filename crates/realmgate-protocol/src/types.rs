//! Core protocol types for Realmgate's wire format.
//!
//! This module defines every type that travels between the login service
//! and a realm's control connection. Each message kind is its own struct
//! carrying a fixed opcode tag; [`Message`] is the tagged union the codec
//! produces and consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a realm (one game-world server).
///
/// Newtype over `u32`. The id is *claimed* by the realm during
/// authentication, never assigned by the login service — operators
/// configure each realm with its own id.
///
/// `#[serde(transparent)]` makes `RealmId(7)` serialize as plain `7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealmId(pub u32);

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realm-{}", self.0)
    }
}

/// A unique identifier for a player account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RealmState
// ---------------------------------------------------------------------------

/// The advertised lifecycle state of a realm.
///
/// The realm reports its own state over the control link; the login
/// service treats it as authoritative for routing decisions. Whether a
/// realm may receive new player handoffs is a pure function of this
/// state (see [`is_joinable`](Self::is_joinable)) — there is no separate
/// flag that could drift out of sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub enum RealmState {
    /// Not reachable. Freshly registered realms start here until they
    /// report otherwise.
    #[default]
    Offline,

    /// Up and serving existing players, but not accepting new ones
    /// (booting, saving, or draining).
    Online,

    /// Up and accepting new player handoffs.
    Joinable,
}

impl RealmState {
    /// Returns `true` if a realm in this state accepts new handoffs.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Joinable)
    }
}

impl fmt::Display for RealmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "Offline"),
            Self::Online => write!(f, "Online"),
            Self::Joinable => write!(f, "Joinable"),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerProfile
// ---------------------------------------------------------------------------

/// The identity and authorization attributes a realm needs to admit a
/// player without querying account storage itself.
///
/// Sent inside [`ConnectRequest`] when the login service hands a player
/// off. The realm caches this against the ticket and applies it when the
/// player shows up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// The player's account id.
    pub id: PlayerId,

    /// Account recovery question, mirrored to the realm so in-world
    /// support flows don't need the account database.
    pub secret_question: String,

    /// Answer to the recovery question.
    pub secret_answer: String,

    /// When the player's subscription lapses.
    pub subscription_end: DateTime<Utc>,

    /// Rights bitmask (moderator, game master, ...). Interpreted by the
    /// realm; opaque to the login service.
    pub rights: u64,
}

// ---------------------------------------------------------------------------
// Message kinds
// ---------------------------------------------------------------------------

/// A message kind with a fixed wire opcode.
///
/// Every frame on the control link starts with the opcode tag of its
/// kind. Opcodes are short ASCII strings; no registered opcode may be a
/// prefix of another, so a frame's kind is always unambiguous.
pub trait Opcoded {
    /// The opcode tag written before this kind's payload.
    const OPCODE: &'static str;
}

/// Login service → realm: the first message on every connection.
///
/// Carries the per-connection salt the realm must fold into its
/// credentials. A fresh salt per connection makes captured credentials
/// worthless on the next connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    /// Random nonce, hex-encoded. Scoped to this connection only.
    pub salt: String,
}

impl Opcoded for Challenge {
    const OPCODE: &'static str = "HC";
}

/// Realm → login service: "this is who I am, and here is proof".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRequest {
    /// The realm id this server claims.
    pub id: RealmId,

    /// Keyed hash of the connection's salt under the shared realm
    /// secret. Compared byte-for-byte against the expected value.
    pub credentials: Vec<u8>,
}

impl Opcoded for AuthRequest {
    const OPCODE: &'static str = "AQ";
}

/// Login service → realm: outcome of an [`AuthRequest`].
///
/// On failure the login service closes the connection right after
/// sending this; there is no retry on the same link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
}

impl Opcoded for AuthResponse {
    const OPCODE: &'static str = "AR";
}

/// Realm → login service: where players should connect, and how full
/// the realm is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfos {
    /// Address handed to players who complete a handoff.
    pub address: String,
    pub port: u16,

    /// Fill indicator reported by the realm. No range is enforced;
    /// last write wins.
    pub completion: i32,
}

impl Opcoded for SetInfos {
    const OPCODE: &'static str = "SI";
}

/// Realm → login service: state transition announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetState {
    pub state: RealmState,
}

impl Opcoded for SetState {
    const OPCODE: &'static str = "SS";
}

/// Login service → realm: "prepare for this player".
///
/// Opens one handoff: the realm should cache the profile against the
/// ticket and answer with [`ConnectReady`] once it is willing to let
/// the player in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    /// One-time correlation token for this handoff.
    pub ticket: String,
    pub player: PlayerProfile,
}

impl Opcoded for ConnectRequest {
    const OPCODE: &'static str = "CC";
}

/// Realm → login service: "I'm ready for the player behind this ticket".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectReady {
    pub ticket: String,
}

impl Opcoded for ConnectReady {
    const OPCODE: &'static str = "CR";
}

// ---------------------------------------------------------------------------
// Message — the decoded tagged union
// ---------------------------------------------------------------------------

/// Any message that can appear on a realm control link, either direction.
///
/// This is what [`Codec::decode`](crate::Codec::decode) hands back: the
/// opcode tag selects the variant, the rest of the frame fills it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Challenge(Challenge),
    AuthRequest(AuthRequest),
    AuthResponse(AuthResponse),
    SetInfos(SetInfos),
    SetState(SetState),
    ConnectRequest(ConnectRequest),
    ConnectReady(ConnectReady),
}

impl Message {
    /// Returns the opcode tag of the wrapped kind.
    pub fn opcode(&self) -> &'static str {
        match self {
            Self::Challenge(_) => Challenge::OPCODE,
            Self::AuthRequest(_) => AuthRequest::OPCODE,
            Self::AuthResponse(_) => AuthResponse::OPCODE,
            Self::SetInfos(_) => SetInfos::OPCODE,
            Self::SetState(_) => SetState::OPCODE,
            Self::ConnectRequest(_) => ConnectRequest::OPCODE,
            Self::ConnectReady(_) => ConnectReady::OPCODE,
        }
    }
}

macro_rules! impl_from_kind {
    ($($kind:ident),+ $(,)?) => {
        $(impl From<$kind> for Message {
            fn from(msg: $kind) -> Self {
                Self::$kind(msg)
            }
        })+
    };
}

impl_from_kind!(
    Challenge,
    AuthRequest,
    AuthResponse,
    SetInfos,
    SetState,
    ConnectRequest,
    ConnectReady,
);

// =========================================================================
// Tests
// =========================================================================
