//! Error types for the realm layer.

use realmgate_protocol::RealmId;

/// Errors raised while registering or looking up realms.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    /// The id is already bound to a live realm. First registrant wins;
    /// the later connection is turned away.
    #[error("realm {0} is already registered")]
    DuplicateId(RealmId),

    /// The presented credentials don't match the expected keyed hash
    /// for this connection's salt.
    #[error("realm credentials rejected")]
    AuthenticationFailed,

    /// No realm with this id is currently registered.
    #[error("realm {0} is not registered")]
    NotFound(RealmId),
}

/// Errors raised when starting a player handoff.
///
/// These are caller errors, scoped to one handoff attempt — the realm's
/// control connection is unaffected.
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    /// The realm's advertised state doesn't accept new players.
    #[error("realm {0} is not joinable")]
    NotJoinable(RealmId),

    /// The realm's control connection is gone; nothing can be sent to
    /// it anymore.
    #[error("realm {0} is gone")]
    RealmGone(RealmId),
}
