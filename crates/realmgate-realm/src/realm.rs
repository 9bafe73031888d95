//! The in-memory record of one registered realm.
//!
//! A `Realm` is created by the connection handler after a successful
//! authentication and shared as an `Arc`: the handler task mutates it
//! as control messages arrive, the registry hands it out for lookups,
//! and handoff callers park one-shot futures in it.
//!
//! # Concurrency note
//!
//! Two locks, deliberately separate:
//!
//! - `status` — address/port/completion/state. Written only by the
//!   owning connection task, read by anyone.
//! - `pending` — the ticket → waiter map. Written by the owning task
//!   (acknowledge, teardown) AND by handoff callers (insert). Keeping
//!   it out of the status lock means a burst of handoffs never blocks
//!   a `SetInfos` update, and vice versa.

use std::collections::HashMap;

use realmgate_protocol::{Message, RealmId, RealmState};
use tokio::sync::{Mutex, mpsc, oneshot};

use crate::HandoffOutcome;

/// Outbound path from the realm record to its control connection's
/// writer task. Unbounded: the control link is low-volume and the
/// writer drains continuously.
pub type RealmLink = mpsc::UnboundedSender<Message>;

// ---------------------------------------------------------------------------
// RealmInfos / RealmStatus
// ---------------------------------------------------------------------------

/// Network location and fill indicator, as last reported by the realm.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealmInfos {
    /// Address handed to players who complete a handoff.
    pub address: String,
    pub port: u16,

    /// Fill indicator. Unvalidated; last write wins.
    pub completion: i32,
}

/// Snapshot of everything a realm has advertised about itself.
#[derive(Debug, Clone, Default)]
pub struct RealmStatus {
    pub infos: RealmInfos,
    pub state: RealmState,
}

// ---------------------------------------------------------------------------
// Realm
// ---------------------------------------------------------------------------

/// The ticket → waiter map plus its teardown latch.
///
/// `closed` flips exactly once, when the realm is retired. After that,
/// no new ticket may be parked here — otherwise a waiter registered
/// after the drain would never resolve.
pub(crate) struct PendingTickets {
    pub(crate) closed: bool,
    pub(crate) tickets: HashMap<String, oneshot::Sender<HandoffOutcome>>,
}

/// One registered game-world server.
///
/// Lives from successful authentication until its control connection
/// drops. The id is immutable; everything else is updated in place as
/// the realm reports changes.
pub struct Realm {
    id: RealmId,
    pub(crate) link: RealmLink,
    pub(crate) status: Mutex<RealmStatus>,
    pub(crate) pending: Mutex<PendingTickets>,
}

impl Realm {
    /// Creates a freshly authenticated realm: state `Offline`, empty
    /// infos, no pending tickets. It becomes routable only once it
    /// reports a joinable state.
    pub fn new(id: RealmId, link: RealmLink) -> Self {
        Self {
            id,
            link,
            status: Mutex::new(RealmStatus::default()),
            pending: Mutex::new(PendingTickets {
                closed: false,
                tickets: HashMap::new(),
            }),
        }
    }

    /// The id this realm registered under.
    pub fn id(&self) -> RealmId {
        self.id
    }

    /// Overwrites the realm's advertised network infos.
    pub async fn set_infos(&self, infos: RealmInfos) {
        let mut status = self.status.lock().await;
        status.infos = infos;
        tracing::info!(realm_id = %self.id, "realm updated its infos");
    }

    /// Overwrites the realm's advertised state.
    ///
    /// Handoff eligibility follows immediately: joinability is derived
    /// from the state, so there is no second flag to flip.
    pub async fn set_state(&self, state: RealmState) {
        let mut status = self.status.lock().await;
        status.state = state;
        tracing::info!(realm_id = %self.id, %state, "realm updated its state");
    }

    /// Snapshot of the current status.
    pub async fn status(&self) -> RealmStatus {
        self.status.lock().await.clone()
    }

    /// Whether the realm currently accepts new player handoffs.
    pub async fn is_joinable(&self) -> bool {
        self.status.lock().await.state.is_joinable()
    }

    /// Resolves the handoff behind `ticket` with success and forgets it.
    ///
    /// Returns `false` if the ticket isn't pending — a stale or
    /// made-up acknowledgement. That case has no effect on any other
    /// ticket; the caller decides whether to log it.
    pub async fn resolve_ready(&self, ticket: &str) -> bool {
        let waiter = self.pending.lock().await.tickets.remove(ticket);
        match waiter {
            Some(tx) => {
                // The receiver may have been dropped by an impatient
                // caller; that's their business, the ticket is done.
                let _ = tx.send(HandoffOutcome::Ready);
                tracing::debug!(realm_id = %self.id, %ticket, "handoff acknowledged");
                true
            }
            None => false,
        }
    }

    /// Tears the realm down after its control connection is gone.
    ///
    /// Marks the state `Offline` (no longer joinable) and resolves
    /// every pending handoff with [`HandoffOutcome::RealmWentOffline`],
    /// so no waiter is ever left parked forever. Idempotent: a second
    /// call finds nothing to drain.
    pub async fn retire(&self) {
        {
            let mut status = self.status.lock().await;
            status.state = RealmState::Offline;
        }

        let drained: Vec<(String, oneshot::Sender<HandoffOutcome>)> = {
            let mut pending = self.pending.lock().await;
            pending.closed = true;
            pending.tickets.drain().collect()
        };

        for (ticket, tx) in drained {
            let _ = tx.send(HandoffOutcome::RealmWentOffline);
            tracing::debug!(
                realm_id = %self.id,
                %ticket,
                "released pending handoff, realm went offline"
            );
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn realm(id: u32) -> (Realm, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Realm::new(RealmId(id), tx), rx)
    }

    #[tokio::test]
    async fn test_new_realm_starts_offline_with_empty_infos() {
        let (realm, _rx) = realm(7);

        let status = realm.status().await;
        assert_eq!(status.state, RealmState::Offline);
        assert_eq!(status.infos, RealmInfos::default());
        assert!(!realm.is_joinable().await);
    }

    #[tokio::test]
    async fn test_set_infos_overwrites_in_place() {
        let (realm, _rx) = realm(7);

        realm
            .set_infos(RealmInfos {
                address: "play.example.net".into(),
                port: 5555,
                completion: 2,
            })
            .await;

        let status = realm.status().await;
        assert_eq!(status.infos.address, "play.example.net");
        assert_eq!(status.infos.port, 5555);
        assert_eq!(status.infos.completion, 2);

        // Last write wins, no validation.
        realm
            .set_infos(RealmInfos {
                address: "play.example.net".into(),
                port: 5555,
                completion: -3,
            })
            .await;
        assert_eq!(realm.status().await.infos.completion, -3);
    }

    #[tokio::test]
    async fn test_set_state_joinable_makes_realm_eligible() {
        let (realm, _rx) = realm(7);

        realm.set_state(RealmState::Joinable).await;
        assert!(realm.is_joinable().await);

        realm.set_state(RealmState::Online).await;
        assert!(!realm.is_joinable().await);
    }

    #[tokio::test]
    async fn test_resolve_ready_unknown_ticket_returns_false() {
        let (realm, _rx) = realm(7);

        assert!(!realm.resolve_ready("no-such-ticket").await);
    }

    #[tokio::test]
    async fn test_retire_sets_offline_and_is_idempotent() {
        let (realm, _rx) = realm(7);
        realm.set_state(RealmState::Joinable).await;

        realm.retire().await;
        assert_eq!(realm.status().await.state, RealmState::Offline);
        assert!(!realm.is_joinable().await);

        // Second retire finds nothing to do.
        realm.retire().await;
        assert_eq!(realm.status().await.state, RealmState::Offline);
    }
}
