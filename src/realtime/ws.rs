use axum::{
    debug_handler,
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message as WsMessage, WebSocket, WebSocketUpgrade},
        rejection::QueryRejection,
        Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::{AppError, AppState};

use super::gateway::{AuthenticatedConnection, Handshake, SessionGateway};

#[derive(Deserialize)]
pub struct HandshakeQuery {
    token: Option<String>,
}

/// Credentials are checked before anything else, the upgrade included; a bad
/// handshake gets a plain 401 and no socket.
#[debug_handler(state = AppState)]
pub async fn realtime_ws(
    State(gateway): State<SessionGateway>,
    query: Result<Query<HandshakeQuery>, QueryRejection>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let token = match query {
        Ok(Query(HandshakeQuery { token })) => token,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let connection = match gateway.authenticate(&Handshake::new(token, &headers)) {
        Ok(connection) => connection,
        Err(err) => return err.into_response(),
    };

    match ws {
        Ok(ws) => ws.on_upgrade(move |socket| serve(connection, socket)),
        Err(rejection) => rejection.into_response(),
    }
}

async fn serve(connection: AuthenticatedConnection, socket: WebSocket) {
    let (outbox, mut inbox) = super::outbox();
    let mut bound = connection.bind(outbox);
    let (mut sender, mut receiver) = socket.split();

    let mut forward_task = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let Ok(frame) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => bound.handle_frame(text.as_str()),
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = &mut forward_task => break,
        }
    }

    forward_task.abort();
    bound.close();
}
