//! Per-connection handler: the realm control state machine.
//!
//! Each accepted control connection gets its own Tokio task running
//! this handler. The flow is:
//!   1. Send a Challenge carrying a fresh salt
//!   2. Wait for AuthRequest → verify credentials, register the realm
//!   3. Loop: SetInfos / SetState / ConnectReady update the bound realm
//!   4. On disconnect: retire the realm, release its pending handoffs
//!
//! Messages from one connection are processed strictly in arrival
//! order; connections never block each other.

use std::sync::Arc;

use realmgate_protocol::{
    AuthRequest, AuthResponse, Challenge, Codec, Message, ProtocolError,
};
use realmgate_realm::{
    Realm, RealmAuthenticator, RealmError, RealmInfos, RealmLink,
    RealmRegistry, generate_salt, verify_credentials,
};
use realmgate_transport::{Connection, WebSocketConnection};
use tokio::sync::{Mutex, mpsc};

use crate::GateError;
use crate::server::GateState;

/// Drop guard that retires the bound realm when the handler exits.
///
/// Cleanup must not depend on how the handler ends (clean close, recv
/// error, protocol violation, panic), so it lives in `Drop`. `Drop` is
/// synchronous, so the async teardown runs in a fire-and-forget task.
struct RealmGuard {
    realm: Arc<Realm>,
    registry: Arc<Mutex<RealmRegistry>>,
}

impl Drop for RealmGuard {
    fn drop(&mut self) {
        let realm = Arc::clone(&self.realm);
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            // Order matters: retire first, so a handoff that races the
            // teardown either fails on the closed ticket map or gets
            // drained — never parked forever.
            realm.retire().await;
            registry.lock().await.remove(realm.id());
        });
    }
}

/// Handles a single realm control connection from accept to close.
pub(crate) async fn handle_connection<A, C>(
    conn: WebSocketConnection,
    state: Arc<GateState<A, C>>,
) -> Result<(), GateError>
where
    A: RealmAuthenticator,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new realm control connection");

    // The connection's nonce for the authentication step. One per
    // connection: captured credentials don't replay on the next link.
    let salt = generate_salt();
    send_message(
        &conn,
        &state.codec,
        Message::Challenge(Challenge { salt: salt.clone() }),
    )
    .await?;

    let mut guard: Option<RealmGuard> = None;
    let mut link_writer: Option<tokio::task::JoinHandle<()>> = None;

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "realm control connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e @ ProtocolError::UnknownOpcode(_)) => {
                // Possibly a newer realm speaking a superset of this
                // protocol; skip the frame, keep the link.
                tracing::warn!(%conn_id, error = %e, "unknown opcode, skipping frame");
                continue;
            }
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "malformed frame, closing");
                break;
            }
        };

        match msg {
            Message::AuthRequest(req) => {
                if let Some(bound) = &guard {
                    tracing::warn!(
                        realm_id = %bound.realm.id(),
                        "realm tried to reauthenticate, ignoring"
                    );
                    continue;
                }

                let (link, link_rx) = mpsc::unbounded_channel();
                match authenticate(&state, &salt, req, link).await {
                    Ok(realm) => {
                        link_writer = Some(spawn_link_writer(
                            Arc::clone(&conn),
                            state.codec.clone(),
                            link_rx,
                        ));
                        guard = Some(RealmGuard {
                            realm,
                            registry: Arc::clone(&state.registry),
                        });
                        let reply = Message::AuthResponse(AuthResponse {
                            success: true,
                        });
                        if send_message(&conn, &state.codec, reply)
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(e) => {
                        // Terminal for the connection, whatever the
                        // failed check was: reply once, close, done.
                        tracing::warn!(
                            %conn_id,
                            error = %e,
                            "realm authentication failed"
                        );
                        let reply = Message::AuthResponse(AuthResponse {
                            success: false,
                        });
                        let _ =
                            send_message(&conn, &state.codec, reply).await;
                        break;
                    }
                }
            }

            Message::SetInfos(infos) => match &guard {
                Some(bound) => {
                    bound
                        .realm
                        .set_infos(RealmInfos {
                            address: infos.address,
                            port: infos.port,
                            completion: infos.completion,
                        })
                        .await;
                }
                None => {
                    tracing::warn!(%conn_id, "SetInfos before authentication, closing");
                    break;
                }
            },

            Message::SetState(msg) => match &guard {
                Some(bound) => bound.realm.set_state(msg.state).await,
                None => {
                    tracing::warn!(%conn_id, "SetState before authentication, closing");
                    break;
                }
            },

            Message::ConnectReady(ready) => match &guard {
                Some(bound) => {
                    if !bound.realm.resolve_ready(&ready.ticket).await {
                        // Stale or made-up ticket: log it, change
                        // nothing. Other tickets are unaffected.
                        tracing::warn!(
                            realm_id = %bound.realm.id(),
                            ticket = %ready.ticket,
                            "realm acknowledged an unknown ticket"
                        );
                    }
                }
                None => {
                    tracing::warn!(%conn_id, "ConnectReady before authentication, closing");
                    break;
                }
            },

            // Gate-bound kinds have no business arriving inbound.
            other @ (Message::Challenge(_)
            | Message::AuthResponse(_)
            | Message::ConnectRequest(_)) => {
                tracing::warn!(
                    %conn_id,
                    opcode = other.opcode(),
                    "unexpected gate-bound opcode from realm, closing"
                );
                break;
            }
        }
    }

    let _ = conn.close().await;
    if let Some(writer) = link_writer {
        writer.abort();
    }

    // `guard` drops here → realm retires, registry entry is removed.
    Ok(())
}

/// Runs the authentication checks for an `AuthRequest`.
///
/// Each guard returns its own taxonomy error; the caller performs the
/// single terminal action (reply failure, close) once.
async fn authenticate<A, C>(
    state: &Arc<GateState<A, C>>,
    salt: &str,
    req: AuthRequest,
    link: RealmLink,
) -> Result<Arc<Realm>, RealmError>
where
    A: RealmAuthenticator,
    C: Codec,
{
    // Fast reject on an id that's already live...
    {
        let registry = state.registry.lock().await;
        if registry.get(req.id).is_some() {
            return Err(RealmError::DuplicateId(req.id));
        }
    }

    let expected = state.auth.expected_credentials(salt).await;
    if !verify_credentials(&expected, &req.credentials) {
        return Err(RealmError::AuthenticationFailed);
    }

    // ...and the authoritative check: register() re-checks under the
    // same lock that inserts, so two connections racing to claim one
    // id cannot both win.
    let realm = Arc::new(Realm::new(req.id, link));
    state.registry.lock().await.register(Arc::clone(&realm))?;
    Ok(realm)
}

/// Spawns the outbound writer for a bound realm: drains the realm's
/// link channel onto the socket. Handoff connect-requests travel this
/// path, serialized with everything else the realm is sent.
fn spawn_link_writer<C>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut link_rx: mpsc::UnboundedReceiver<Message>,
) -> tokio::task::JoinHandle<()>
where
    C: Codec,
{
    tokio::spawn(async move {
        while let Some(msg) = link_rx.recv().await {
            let bytes = match codec.encode(&msg) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode outbound frame");
                    continue;
                }
            };
            if conn.send(&bytes).await.is_err() {
                break;
            }
        }
    })
}

/// Encodes and sends one message on the control connection.
async fn send_message<C: Codec>(
    conn: &WebSocketConnection,
    codec: &C,
    msg: Message,
) -> Result<(), GateError> {
    let bytes = codec.encode(&msg)?;
    conn.send(&bytes).await?;
    Ok(())
}
