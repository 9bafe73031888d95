//! Realm bookkeeping for Realmgate.
//!
//! This crate is the stateful heart of the login service's realm side:
//!
//! 1. **Credential verification** — proving a realm knows the shared
//!    secret ([`RealmAuthenticator`] trait, [`SharedSecretAuthenticator`])
//! 2. **Realm records** — one [`Realm`] per registered game-world
//!    server: where it is, how full it is, whether it takes players
//! 3. **The registry** — id → realm, first-registrant-wins
//!    ([`RealmRegistry`])
//! 4. **Ticket handoffs** — one-shot futures correlating a
//!    connect-request with the realm's ready acknowledgement
//!    ([`PendingHandoff`], [`HandoffOutcome`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Gate layer (above)   ← drives a Realm from its control connection
//!     ↕
//! Realm layer (this crate)  ← registry, realm state, pending tickets
//!     ↕
//! Protocol layer (below)    ← provides RealmId, Message types
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod handoff;
mod realm;
mod registry;

pub use auth::{
    RealmAuthenticator, SharedSecretAuthenticator, generate_salt,
    verify_credentials,
};
pub use error::{HandoffError, RealmError};
pub use handoff::{HandoffOutcome, PendingHandoff};
pub use realm::{Realm, RealmInfos, RealmLink, RealmStatus};
pub use registry::{RealmOverview, RealmRegistry};
