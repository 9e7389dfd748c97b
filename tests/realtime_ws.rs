use std::time::Duration as StdDuration;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestServer, TestWebSocket};
use handsup::{app, auth::TokenVerifier, db, models::UserId, AppState};
use serde_json::{json, Value};
use time::Duration;
use uuid::Uuid;

struct LiveApp {
    server: TestServer,
    state: AppState,
    tokens: TokenVerifier,
}

async fn spawn_live_app() -> LiveApp {
    let db_pool = db::connect_in_memory().await.unwrap();
    let tokens = TokenVerifier::new(b"socket secret");
    let state = AppState::new(db_pool, tokens.clone());

    let server = TestServer::builder()
        .http_transport()
        .build(app(state.clone(), Duration::minutes(5)))
        .unwrap();

    LiveApp { server, state, tokens }
}

impl LiveApp {
    fn token(&self, user: UserId) -> String {
        self.tokens.issue(user, Duration::hours(1)).unwrap()
    }

    async fn connect(&self, user: UserId) -> TestWebSocket {
        let socket = self
            .server
            .get_websocket("/ws")
            .add_query_param("token", self.token(user))
            .await
            .into_websocket()
            .await;
        self.wait_until(|| self.state.gateway.channels().is_bound(user)).await;
        socket
    }

    async fn wait_until(&self, check: impl Fn() -> bool) {
        for _ in 0..200 {
            if check() {
                return;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
        panic!("registry never reached the expected state");
    }
}

#[tokio::test]
async fn socket_lifecycle_binds_receives_relays_and_releases() {
    let app = spawn_live_app().await;
    let (alice, bob) = (Uuid::now_v7(), Uuid::now_v7());

    let mut bob_socket = app.connect(bob).await;

    let response = app
        .server
        .post("/messages")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", app.token(alice))).unwrap(),
        )
        .json(&json!({ "receiver_id": bob, "content": "see you at the drive" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();

    let pushed: Value = bob_socket.receive_json().await;
    assert_eq!(pushed, json!({ "event": "newMessage", "data": created }));

    // junk frames are ignored and the socket stays up
    bob_socket.send_text("{not json").await;

    let mut alice_socket = app.connect(alice).await;
    alice_socket
        .send_json(&json!({
            "event": "outgoingMessage",
            "data": { "receiver_id": bob, "content": "typing fast", "sender_id": Uuid::nil() },
        }))
        .await;

    let echo: Value = bob_socket.receive_json().await;
    assert_eq!(echo["event"], "newMessage");
    assert_eq!(echo["data"]["sender_id"], json!(alice));
    assert_eq!(echo["data"]["content"], "typing fast");

    bob_socket.close().await;
    app.wait_until(|| !app.state.gateway.channels().is_bound(bob)).await;
    assert!(app.state.gateway.channels().is_bound(alice));

    alice_socket.close().await;
    app.wait_until(|| !app.state.gateway.channels().is_bound(alice)).await;
}
