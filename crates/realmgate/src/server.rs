//! `GateServer` builder and accept loop.
//!
//! This is the entry point for running the realm gateway. It ties the
//! layers together: transport → protocol → realm registry, with one
//! handler task per accepted control connection.

use std::sync::Arc;

use realmgate_protocol::{Codec, OpcodeCodec};
use realmgate_realm::{RealmAuthenticator, RealmRegistry};
use realmgate_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{GateError, RealmDirectory};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry carries its own `Arc<Mutex<..>>` because the
/// [`RealmDirectory`] shares it without caring about the
/// authenticator or codec type parameters.
pub(crate) struct GateState<A, C> {
    pub(crate) registry: Arc<Mutex<RealmRegistry>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a realm gateway.
///
/// # Example
///
/// ```rust,no_run
/// use realmgate::prelude::*;
///
/// # async fn run() -> Result<(), GateError> {
/// let server = GateServerBuilder::new()
///     .bind("0.0.0.0:4440")
///     .build(SharedSecretAuthenticator::new("realm secret"))
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GateServerBuilder {
    bind_addr: String,
}

impl GateServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:4440".to_string(),
        }
    }

    /// Sets the address realms dial to reach the gateway.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the transport and assembles the server with the given
    /// authenticator. Uses the standard opcode codec.
    pub async fn build<A: RealmAuthenticator>(
        self,
        auth: A,
    ) -> Result<GateServer<A, OpcodeCodec>, GateError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(GateState {
            registry: Arc::new(Mutex::new(RealmRegistry::new())),
            auth,
            codec: OpcodeCodec::standard(),
        });

        Ok(GateServer { transport, state })
    }
}

impl Default for GateServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running realm gateway.
///
/// Call [`run()`](Self::run) to start accepting control connections,
/// and hand [`directory()`](Self::directory) to the login flow first —
/// `run` consumes the server.
pub struct GateServer<A: RealmAuthenticator, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<GateState<A, C>>,
}

impl<A, C> GateServer<A, C>
where
    A: RealmAuthenticator,
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> GateServerBuilder {
        GateServerBuilder::new()
    }

    /// Returns the local address the gateway is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the login side's view of the registered realms.
    pub fn directory(&self) -> RealmDirectory {
        RealmDirectory::new(Arc::clone(&self.state.registry))
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own handler task driving the
    /// challenge/authenticate/synchronize state machine. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), GateError> {
        tracing::info!("realm gateway running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<A, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "realm control connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
