//! Unified error type for the Realmgate gateway.

use realmgate_protocol::ProtocolError;
use realmgate_realm::{HandoffError, RealmError};
use realmgate_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When embedding the `realmgate` meta-crate, callers deal with this
/// single type instead of importing errors from each sub-crate. The
/// `#[from]` attributes auto-generate `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown opcode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A realm registration or lookup error.
    #[error(transparent)]
    Realm(#[from] RealmError),

    /// A handoff error (not joinable, realm gone).
    #[error(transparent)]
    Handoff(#[from] HandoffError),
}

#[cfg(test)]
mod tests {
    use realmgate_protocol::RealmId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let gate_err: GateError = err.into();
        assert!(matches!(gate_err, GateError::Transport(_)));
        assert!(gate_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::UnknownOpcode("ZZ".into());
        let gate_err: GateError = err.into();
        assert!(matches!(gate_err, GateError::Protocol(_)));
    }

    #[test]
    fn test_from_realm_error() {
        let err = RealmError::DuplicateId(RealmId(7));
        let gate_err: GateError = err.into();
        assert!(matches!(gate_err, GateError::Realm(_)));
        assert!(gate_err.to_string().contains("realm-7"));
    }

    #[test]
    fn test_from_handoff_error() {
        let err = HandoffError::NotJoinable(RealmId(7));
        let gate_err: GateError = err.into();
        assert!(matches!(gate_err, GateError::Handoff(_)));
    }
}
