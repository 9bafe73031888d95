//! The realm registry: id → realm, first registrant wins.
//!
//! # Concurrency note
//!
//! `RealmRegistry` is NOT thread-safe by itself — it uses a plain
//! `HashMap`. The gate layer wraps it in a single `tokio::sync::Mutex`,
//! which is what makes the duplicate-id check and the insert one
//! atomic step: two connections racing to authenticate the same id are
//! serialized by that lock, and exactly one wins.

use std::collections::HashMap;
use std::sync::Arc;

use realmgate_protocol::{RealmId, RealmState};

use crate::{Realm, RealmError, RealmInfos};

/// A point-in-time summary of one registered realm, for listings.
#[derive(Debug, Clone)]
pub struct RealmOverview {
    pub id: RealmId,
    pub infos: RealmInfos,
    pub state: RealmState,
}

/// All currently registered realms.
pub struct RealmRegistry {
    realms: HashMap<RealmId, Arc<Realm>>,
}

impl RealmRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            realms: HashMap::new(),
        }
    }

    /// Registers a freshly authenticated realm under its claimed id.
    ///
    /// # Errors
    /// Returns [`RealmError::DuplicateId`] if the id is already bound
    /// to a live realm — the existing registration always wins.
    pub fn register(&mut self, realm: Arc<Realm>) -> Result<(), RealmError> {
        let id = realm.id();
        if self.realms.contains_key(&id) {
            return Err(RealmError::DuplicateId(id));
        }
        self.realms.insert(id, realm);
        tracing::info!(realm_id = %id, "realm is now synchronized");
        Ok(())
    }

    /// Removes a realm, freeing its id for a future registration.
    ///
    /// Called when the realm's control connection goes away. Returns
    /// the removed realm so the caller can finish tearing it down.
    pub fn remove(&mut self, id: RealmId) -> Option<Arc<Realm>> {
        let removed = self.realms.remove(&id);
        if removed.is_some() {
            tracing::info!(realm_id = %id, "realm is now offline");
        }
        removed
    }

    /// Looks up a realm by id.
    pub fn get(&self, id: RealmId) -> Option<Arc<Realm>> {
        self.realms.get(&id).cloned()
    }

    /// Summarizes every registered realm.
    pub async fn list(&self) -> Vec<RealmOverview> {
        let mut overviews = Vec::with_capacity(self.realms.len());
        for realm in self.realms.values() {
            let status = realm.status().await;
            overviews.push(RealmOverview {
                id: realm.id(),
                infos: status.infos,
                state: status.state,
            });
        }
        overviews
    }

    /// Returns the number of registered realms.
    pub fn len(&self) -> usize {
        self.realms.len()
    }

    /// Returns `true` if no realm is registered.
    pub fn is_empty(&self) -> bool {
        self.realms.is_empty()
    }
}

impl Default for RealmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use realmgate_protocol::RealmState;
    use tokio::sync::mpsc;

    use super::*;

    fn realm(id: u32) -> Arc<Realm> {
        let (tx, _rx) = mpsc::unbounded_channel();
        Arc::new(Realm::new(RealmId(id), tx))
    }

    #[test]
    fn test_register_new_id_succeeds() {
        let mut registry = RealmRegistry::new();

        registry.register(realm(7)).expect("should register");

        assert_eq!(registry.len(), 1);
        assert!(registry.get(RealmId(7)).is_some());
    }

    #[test]
    fn test_register_duplicate_id_rejected_first_wins() {
        let mut registry = RealmRegistry::new();
        let original = realm(7);
        registry.register(Arc::clone(&original)).unwrap();

        let result = registry.register(realm(7));

        assert!(
            matches!(result, Err(RealmError::DuplicateId(id)) if id == RealmId(7))
        );
        // The original registration is untouched.
        let kept = registry.get(RealmId(7)).unwrap();
        assert!(Arc::ptr_eq(&kept, &original));
    }

    #[test]
    fn test_remove_frees_id_for_reregistration() {
        let mut registry = RealmRegistry::new();
        registry.register(realm(7)).unwrap();

        assert!(registry.remove(RealmId(7)).is_some());
        assert!(registry.is_empty());

        // A reconnecting realm can claim the id again.
        registry.register(realm(7)).expect("id should be free");
    }

    #[test]
    fn test_remove_unknown_id_returns_none() {
        let mut registry = RealmRegistry::new();

        assert!(registry.remove(RealmId(99)).is_none());
    }

    #[test]
    fn test_get_unknown_id_returns_none() {
        let registry = RealmRegistry::new();

        assert!(registry.get(RealmId(99)).is_none());
    }

    #[tokio::test]
    async fn test_list_reports_current_state() {
        let mut registry = RealmRegistry::new();
        let seven = realm(7);
        registry.register(Arc::clone(&seven)).unwrap();
        registry.register(realm(8)).unwrap();

        seven.set_state(RealmState::Joinable).await;

        let mut overviews = registry.list().await;
        overviews.sort_by_key(|o| o.id.0);

        assert_eq!(overviews.len(), 2);
        assert_eq!(overviews[0].id, RealmId(7));
        assert_eq!(overviews[0].state, RealmState::Joinable);
        assert_eq!(overviews[1].state, RealmState::Offline);
    }
}
