//! # Realmgate
//!
//! The session-handoff layer between a central login service and its
//! game-world servers ("realms").
//!
//! A realm dials the login service on a control connection, proves it
//! knows the shared secret, and registers under its id. From then on it
//! advertises its address, fill level, and state. When a player
//! finishes logging in, the login side calls
//! [`RealmDirectory::begin_handoff`]: the realm receives the player's
//! profile under a one-time ticket and, once it acknowledges, the
//! caller's future resolves and the player may connect to the realm
//! directly. The login service never proxies game traffic — it only
//! brokers the introduction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use realmgate::prelude::*;
//!
//! # async fn run() -> Result<(), GateError> {
//! let server = GateServerBuilder::new()
//!     .bind("0.0.0.0:4440")
//!     .build(SharedSecretAuthenticator::new("realm secret"))
//!     .await?;
//!
//! // Hand to the login flow; clone freely.
//! let directory = server.directory();
//!
//! server.run().await
//! # }
//! ```

mod directory;
mod error;
mod handler;
mod server;

pub use directory::RealmDirectory;
pub use error::GateError;
pub use server::{GateServer, GateServerBuilder};

/// Installs a `tracing` subscriber reading the `RUST_LOG` environment
/// variable. Call once at startup; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// One-stop imports for embedding Realmgate in a login service.
pub mod prelude {
    pub use realmgate_protocol::{
        AuthRequest, AuthResponse, Challenge, Codec, ConnectReady,
        ConnectRequest, Message, OpcodeCodec, PlayerId, PlayerProfile,
        ProtocolError, RealmId, RealmState, SetInfos, SetState,
    };
    pub use realmgate_realm::{
        HandoffError, HandoffOutcome, PendingHandoff, Realm,
        RealmAuthenticator, RealmError, RealmInfos, RealmOverview,
        SharedSecretAuthenticator,
    };
    pub use realmgate_transport::TransportError;

    pub use crate::{
        GateError, GateServer, GateServerBuilder, RealmDirectory,
    };
}
