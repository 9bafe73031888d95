//! The login side's view of the registered realms.

use std::sync::Arc;

use realmgate_protocol::{PlayerProfile, RealmId};
use realmgate_realm::{
    PendingHandoff, Realm, RealmError, RealmOverview, RealmRegistry,
};
use tokio::sync::Mutex;

use crate::GateError;

/// Read-and-handoff handle over the realm registry.
///
/// Cheap to clone; every clone observes the same registry the accept
/// loop feeds. This is what the player-facing login flow holds — it
/// never touches control connections directly.
#[derive(Clone)]
pub struct RealmDirectory {
    registry: Arc<Mutex<RealmRegistry>>,
}

impl RealmDirectory {
    pub(crate) fn new(registry: Arc<Mutex<RealmRegistry>>) -> Self {
        Self { registry }
    }

    /// Looks up a registered realm by id.
    pub async fn realm(&self, id: RealmId) -> Option<Arc<Realm>> {
        self.registry.lock().await.get(id)
    }

    /// Summarizes every registered realm (for realm-list screens).
    pub async fn realms(&self) -> Vec<RealmOverview> {
        self.registry.lock().await.list().await
    }

    /// Starts handing `player` off to realm `id`.
    ///
    /// Returns the pending handoff; await
    /// [`wait()`](PendingHandoff::wait) for the realm's answer. The
    /// registry lock is released before waiting — a slow realm never
    /// stalls other lookups.
    ///
    /// # Errors
    /// - [`RealmError::NotFound`] — no realm registered under `id`.
    /// - [`HandoffError`](realmgate_realm::HandoffError) — the realm
    ///   is not joinable, or its connection is gone.
    pub async fn begin_handoff(
        &self,
        id: RealmId,
        player: PlayerProfile,
    ) -> Result<PendingHandoff, GateError> {
        let realm = self
            .realm(id)
            .await
            .ok_or(RealmError::NotFound(id))?;
        Ok(realm.begin_handoff(player).await?)
    }
}
