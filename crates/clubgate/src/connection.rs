//! Per-connection loop: receive a frame, dispatch it, send the replies.
//!
//! Each accepted connection gets its own Tokio task running this loop with
//! its own [`AuthState`]. Nothing is shared between connections except the
//! read-only dispatcher.
//!
//! The loop is strictly sequential. A frame is fully resolved, push
//! included, before the next one is read.

use std::sync::Arc;

use clubgate_protocol::Codec;
use clubgate_session::{AuthState, Collaborator};
use clubgate_transport::{Connection, WebSocketConnection};

use crate::server::ServerState;
use crate::GatewayError;

/// Handles a single connection from accept to close.
///
/// Returns `Ok(())` when the client goes away, the transport fails on
/// receive, or the idle timeout fires. A failed send ends the loop with an
/// error; whatever was being answered is dropped.
pub(crate) async fn handle_connection<C, K>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C, K>>,
) -> Result<(), GatewayError>
where
    C: Collaborator,
    K: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut session = AuthState::<C>::anonymous();

    loop {
        let received = match state.config.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await
            {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    // The peer may already be gone; nothing to do about it.
                    let _ = conn.close().await;
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let replies = state.dispatcher.dispatch(&mut session, &data).await;
        for reply in &replies {
            let frame = state.dispatcher.codec().encode(reply)?;
            conn.send(frame).await?;
        }
    }

    tracing::debug!(%conn_id, "connection handler finished");
    Ok(())
}
