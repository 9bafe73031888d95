//! Ticket handoffs: pushing one authenticated player to one realm.
//!
//! A handoff is a tiny two-message protocol run over the realm's
//! control link: the login service sends `ConnectRequest{ticket,
//! player}` and the realm answers `ConnectReady{ticket}` once it is
//! willing to admit the player. In between, the caller parks on a
//! one-shot future keyed by the ticket.
//!
//! The future resolves exactly once — with [`HandoffOutcome::Ready`]
//! on acknowledgement, or [`HandoffOutcome::RealmWentOffline`] when
//! the realm's connection drops first. The core imposes no deadline;
//! callers that want one wrap [`PendingHandoff::wait`] in
//! `tokio::time::timeout`.

use rand::Rng;
use realmgate_protocol::{ConnectRequest, Message, PlayerProfile};
use tokio::sync::oneshot;

use crate::{HandoffError, Realm};

/// How a handoff ended.
///
/// Distinct from "still pending": a waiter always sees one of these,
/// never silence, because realm teardown force-resolves every ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The realm acknowledged the ticket; the player may connect.
    Ready,

    /// The realm's control connection dropped before acknowledging.
    RealmWentOffline,
}

/// A handoff that has been sent to a realm and awaits its answer.
#[derive(Debug)]
pub struct PendingHandoff {
    ticket: String,
    rx: oneshot::Receiver<HandoffOutcome>,
}

impl PendingHandoff {
    /// The one-time token correlating request and acknowledgement.
    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    /// Waits for the realm's answer.
    ///
    /// A dropped sender can only mean the realm record was torn down,
    /// so it maps to [`HandoffOutcome::RealmWentOffline`] as well.
    pub async fn wait(self) -> HandoffOutcome {
        self.rx.await.unwrap_or(HandoffOutcome::RealmWentOffline)
    }
}

impl Realm {
    /// Starts a handoff: sends the realm a connect-request for
    /// `player` and returns the pending ticket.
    ///
    /// # Errors
    /// - [`HandoffError::NotJoinable`] — the realm's advertised state
    ///   doesn't accept players. Nothing is sent.
    /// - [`HandoffError::RealmGone`] — the realm was retired or its
    ///   link is closed. Nothing is registered.
    pub async fn begin_handoff(
        &self,
        player: PlayerProfile,
    ) -> Result<PendingHandoff, HandoffError> {
        if !self.is_joinable().await {
            return Err(HandoffError::NotJoinable(self.id()));
        }

        // Everything below happens under the pending lock: teardown
        // also takes it, so a retire() can never slip between the send
        // and the insert and leave this waiter unresolvable.
        let mut pending = self.pending.lock().await;
        if pending.closed {
            return Err(HandoffError::RealmGone(self.id()));
        }

        let mut ticket = generate_ticket();
        while pending.tickets.contains_key(&ticket) {
            ticket = generate_ticket();
        }

        let player_id = player.id;
        let request = Message::ConnectRequest(ConnectRequest {
            ticket: ticket.clone(),
            player,
        });
        self.link
            .send(request)
            .map_err(|_| HandoffError::RealmGone(self.id()))?;

        let (tx, rx) = oneshot::channel();
        pending.tickets.insert(ticket.clone(), tx);

        tracing::info!(
            realm_id = %self.id(),
            %player_id,
            %ticket,
            "handoff started"
        );

        Ok(PendingHandoff { ticket, rx })
    }
}

/// Generates a random 32-character hex ticket (128 bits of entropy).
///
/// Guessing a live ticket is computationally infeasible; collisions
/// among pending tickets are handled by regeneration above anyway.
fn generate_ticket() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::TimeZone;
    use realmgate_protocol::{PlayerId, RealmId, RealmState};
    use tokio::sync::mpsc;

    use super::*;

    fn player(id: u64) -> PlayerProfile {
        PlayerProfile {
            id: PlayerId(id),
            secret_question: "first pet?".into(),
            secret_answer: "bidou".into(),
            subscription_end: chrono::Utc
                .with_ymd_and_hms(2026, 12, 31, 0, 0, 0)
                .unwrap(),
            rights: 0,
        }
    }

    fn fresh_realm(
        id: u32,
    ) -> (Arc<Realm>, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let realm = Arc::new(Realm::new(RealmId(id), tx));
        (realm, rx)
    }

    #[tokio::test]
    async fn test_begin_handoff_not_joinable_sends_nothing() {
        let (realm, mut rx) = fresh_realm(7);
        // Never set Joinable — a fresh realm is Offline.

        let result = realm.begin_handoff(player(42)).await;

        assert!(matches!(result, Err(HandoffError::NotJoinable(id)) if id == RealmId(7)));
        // No ConnectRequest must have been written to the link.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_begin_handoff_sends_connect_request_with_ticket() {
        let (realm, mut rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;

        let handoff = realm.begin_handoff(player(42)).await.unwrap();

        let sent = rx.try_recv().expect("link should carry a message");
        match sent {
            Message::ConnectRequest(req) => {
                assert_eq!(req.ticket, handoff.ticket());
                assert_eq!(req.player.id, PlayerId(42));
            }
            other => panic!("expected ConnectRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_ready_resolves_future_and_forgets_ticket() {
        let (realm, _rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;

        let handoff = realm.begin_handoff(player(42)).await.unwrap();
        let ticket = handoff.ticket().to_string();

        assert!(realm.resolve_ready(&ticket).await);
        assert_eq!(handoff.wait().await, HandoffOutcome::Ready);

        // The ticket is gone: acknowledging it again has no effect.
        assert!(!realm.resolve_ready(&ticket).await);
    }

    #[tokio::test]
    async fn test_retire_resolves_every_pending_handoff_with_failure() {
        let (realm, _rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;

        let first = realm.begin_handoff(player(1)).await.unwrap();
        let second = realm.begin_handoff(player(2)).await.unwrap();

        realm.retire().await;

        assert_eq!(first.wait().await, HandoffOutcome::RealmWentOffline);
        assert_eq!(second.wait().await, HandoffOutcome::RealmWentOffline);
    }

    #[tokio::test]
    async fn test_begin_handoff_after_retire_fails() {
        let (realm, _rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;
        realm.retire().await;

        // retire() forced the state Offline, so the joinable guard
        // already rejects this.
        let result = realm.begin_handoff(player(1)).await;
        assert!(matches!(result, Err(HandoffError::NotJoinable(_))));
    }

    #[tokio::test]
    async fn test_begin_handoff_closed_link_fails() {
        let (realm, rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;
        drop(rx); // the writer side is gone

        let result = realm.begin_handoff(player(1)).await;
        assert!(matches!(result, Err(HandoffError::RealmGone(id)) if id == RealmId(7)));
    }

    #[tokio::test]
    async fn test_acknowledge_after_retire_has_no_effect() {
        let (realm, _rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;

        let handoff = realm.begin_handoff(player(1)).await.unwrap();
        let ticket = handoff.ticket().to_string();

        realm.retire().await;
        assert_eq!(handoff.wait().await, HandoffOutcome::RealmWentOffline);

        // A late acknowledgement for a drained ticket is a no-op.
        assert!(!realm.resolve_ready(&ticket).await);
    }

    #[tokio::test]
    async fn test_concurrent_handoffs_get_unique_tickets() {
        let (realm, _rx) = fresh_realm(7);
        realm.set_state(RealmState::Joinable).await;

        let mut tasks = Vec::new();
        for i in 0..32 {
            let realm = Arc::clone(&realm);
            tasks.push(tokio::spawn(async move {
                realm
                    .begin_handoff(player(i))
                    .await
                    .expect("handoff should start")
                    .ticket()
                    .to_string()
            }));
        }

        let mut tickets = HashSet::new();
        for task in tasks {
            let ticket = task.await.unwrap();
            assert_eq!(ticket.len(), 32);
            assert!(
                tickets.insert(ticket),
                "two handoffs received the same ticket"
            );
        }
    }
}
