//! Per-connection handler: handshake, join, and request routing.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!   1. Fixed-string handshake — any deviation closes the connection
//!      before a slot is allocated.
//!   2. The first envelope must be `JOIN LOBBY`; a rejected join sends
//!      the `ERROR` and closes, consuming nothing.
//!   3. Loop: decode a request, dispatch it into the shared session under
//!      the lock, send the response. Semantic rejections answer `ERROR`
//!      and keep the connection open; only transport failure, timeout, or
//!      an explicit `EXIT` ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tinyrpg_protocol::{
    Codec, GameStart, ReasonCode, Request, Response, SlotId, CLIENT_HELLO,
    SERVER_HELLO,
};
use tinyrpg_session::{GameSession, SessionSnapshot};
use tinyrpg_transport::{Connection, TcpConnection};

use crate::server::ServerState;
use crate::ServerError;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Drop guard that releases a connection's slot when the handler exits,
/// however it exits. `Drop` is synchronous, so the async lock is taken in
/// a fire-and-forget task.
struct SlotGuard<C: Codec> {
    slot: SlotId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SlotGuard<C> {
    fn drop(&mut self) {
        let slot = self.slot;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.session.lock().await.leave(slot);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: TcpConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    perform_handshake(&conn).await?;

    let (slot, snapshot) = match join_first(&conn, &state).await? {
        Some(joined) => joined,
        None => return Ok(()),
    };
    tracing::info!(%conn_id, %slot, "participant joined");

    // Guard first, then acknowledge: if the accept can't be delivered the
    // slot is still released.
    let _guard = SlotGuard {
        slot,
        state: Arc::clone(&state),
    };
    let accept = state.codec.encode(&Response::JoinAccept(snapshot))?;
    conn.send(&accept).await.map_err(ServerError::Transport)?;

    loop {
        let data = match tokio::time::timeout(
            state.request_timeout,
            conn.recv(),
        )
        .await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%slot, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%slot, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%slot, "connection timed out");
                break;
            }
        };

        let request: Request = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%slot, error = %e, "failed to decode request");
                send_error(&conn, &state.codec, ReasonCode::InvalidCommand)
                    .await?;
                continue;
            }
        };

        if matches!(request, Request::Exit(_)) {
            state.session.lock().await.leave(slot);
            tracing::info!(%slot, "participant exited");
            let _ = conn.close().await;
            break;
        }

        // Dispatch under the lock, send after releasing it.
        let response = {
            let mut session = state.session.lock().await;
            dispatch(&mut session, slot, request)
        };
        let bytes = state.codec.encode(&response)?;
        conn.send(&bytes).await.map_err(ServerError::Transport)?;
    }

    // _guard drops here → the slot is released.
    Ok(())
}

/// Exchanges the fixed greeting strings. Anything else is fatal to the
/// connection and consumes no slot.
async fn perform_handshake(conn: &TcpConnection) -> Result<(), ServerError> {
    let hello =
        match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(ServerError::Handshake(
                    "connection closed before handshake".into(),
                ));
            }
            Ok(Err(e)) => return Err(ServerError::Transport(e)),
            Err(_) => {
                return Err(ServerError::Handshake("handshake timed out".into()));
            }
        };

    if hello != CLIENT_HELLO.as_bytes() {
        return Err(ServerError::Handshake(
            "unexpected client greeting".into(),
        ));
    }

    conn.send(SERVER_HELLO.as_bytes())
        .await
        .map_err(ServerError::Transport)
}

/// Receives the connection's first envelope and performs the join.
///
/// Returns the allocated slot and the accept snapshot, or `None` if the
/// connection was rejected and closed (no slot consumed).
async fn join_first<C: Codec>(
    conn: &TcpConnection,
    state: &Arc<ServerState<C>>,
) -> Result<Option<(SlotId, tinyrpg_protocol::LobbySnapshot)>, ServerError> {
    let data = match tokio::time::timeout(state.request_timeout, conn.recv())
        .await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => return Ok(None),
        Ok(Err(e)) => return Err(ServerError::Transport(e)),
        Err(_) => {
            tracing::debug!("connection sent no join request");
            return Ok(None);
        }
    };

    let name = match state.codec.decode::<Request>(&data) {
        Ok(Request::JoinLobby(name)) => name,
        Ok(_) | Err(_) => {
            send_error(conn, &state.codec, ReasonCode::InvalidCommand).await?;
            let _ = conn.close().await;
            return Ok(None);
        }
    };

    let joined = {
        let mut session = state.session.lock().await;
        session
            .join(&name)
            .map(|slot| (slot, session.lobby_snapshot(Some(slot))))
    };

    match joined {
        Ok(joined) => Ok(Some(joined)),
        Err(e) => {
            tracing::debug!(name, error = %e, "join rejected");
            send_error(conn, &state.codec, e.reason()).await?;
            let _ = conn.close().await;
            Ok(None)
        }
    }
}

/// Maps one request to one session operation and its response envelope.
/// Expected rejections become `ERROR` responses; nothing here closes the
/// connection.
fn dispatch(
    session: &mut GameSession,
    slot: SlotId,
    request: Request,
) -> Response {
    match request {
        // This connection already holds a slot; a second join is nonsense.
        Request::JoinLobby(_) => Response::Error(ReasonCode::InvalidCommand),

        Request::UpdateProfession(name) => {
            match session.update_profession(slot, &name) {
                Ok(()) => Response::LobbyData(session.lobby_snapshot(None)),
                Err(e) => Response::Error(e.reason()),
            }
        }

        Request::UpdateReady(ready) => {
            match session.update_ready(slot, ready) {
                Ok(()) => Response::LobbyData(session.lobby_snapshot(None)),
                Err(e) => Response::Error(e.reason()),
            }
        }

        Request::GetUpdate(_) => match session.snapshot_for(slot) {
            SessionSnapshot::Lobby(snapshot) => Response::LobbyData(snapshot),
            SessionSnapshot::Combat(snapshot) => Response::GameData(snapshot),
        },

        Request::TryStart(_) => match session.try_start(slot) {
            Ok(true) => Response::GameStart(GameStart {
                game: session.combat_snapshot(None),
            }),
            Ok(false) => Response::LobbyData(session.lobby_snapshot(None)),
            Err(e) => Response::Error(e.reason()),
        },

        Request::DoAction(action) => {
            match session.do_action(slot, &action.action, action.target) {
                Ok(()) => Response::GameData(session.combat_snapshot(None)),
                Err(e) => Response::Error(e.reason()),
            }
        }

        Request::EndTurn(_) => match session.end_turn(slot) {
            Ok(()) => Response::GameData(session.combat_snapshot(None)),
            Err(e) => Response::Error(e.reason()),
        },

        // Handled by the connection loop before dispatch; kept total so
        // the match stays exhaustive.
        Request::Exit(_) => Response::Error(ReasonCode::InvalidCommand),
    }
}

/// Sends an `ERROR` response carrying the given reason code.
async fn send_error(
    conn: &TcpConnection,
    codec: &impl Codec,
    reason: ReasonCode,
) -> Result<(), ServerError> {
    let bytes = codec.encode(&Response::Error(reason))?;
    conn.send(&bytes).await.map_err(ServerError::Transport)
}
