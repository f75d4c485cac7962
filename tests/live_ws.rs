//! Live session protocol over a real socket.

mod common;

use common::{build_test_app, interviewer_token, test_config};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, String) {
    let (app, state) = build_test_app(test_config());
    let token = interviewer_token(&state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
    });
    (addr, token)
}

async fn connect(addr: SocketAddr, code: &str, query: &str) -> Socket {
    let url = format!("ws://{addr}/api/sessions/{code}/live?{query}");
    let (socket, _) = connect_async(url).await.expect("handshake should succeed");
    socket
}

/// Next frame of the given type, skipping others.
async fn expect_type(socket: &mut Socket, kind: &str) -> Value {
    timeout(Duration::from_secs(2), async {
        loop {
            let frame = socket.next().await.expect("socket open").expect("frame ok");
            let Ok(text) = frame.to_text() else { continue };
            let Ok(value) = serde_json::from_str::<Value>(text) else { continue };
            if value["type"] == kind {
                return value;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("no '{kind}' frame in time"))
}

async fn send(socket: &mut Socket, value: Value) {
    socket.send(Message::text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn interview_over_the_live_endpoint() {
    let (addr, token) = spawn_server().await;

    let mut interviewer = connect(addr, "482913", &format!("token={token}&name=Interviewer")).await;
    let welcome = expect_type(&mut interviewer, "welcome").await;
    assert_eq!(welcome["participant"]["role"], "interviewer");
    assert_eq!(welcome["readOnly"], false);

    let mut asha = connect(addr, "482913", "name=Asha").await;
    let welcome = expect_type(&mut asha, "welcome").await;
    assert_eq!(welcome["participant"]["role"], "candidate");
    assert_eq!(welcome["roster"].as_array().unwrap().len(), 2);

    let joined = expect_type(&mut interviewer, "joined").await;
    assert_eq!(joined["message"], "Asha joined the session");

    send(&mut asha, json!({"type": "edit", "content": "print(1+1)"})).await;
    let document = expect_type(&mut interviewer, "document").await;
    assert_eq!(document["content"], "print(1+1)");

    send(&mut asha, json!({"type": "ping"})).await;
    expect_type(&mut asha, "pong").await;

    send(&mut asha, json!({"type": "end"})).await;
    expect_type(&mut asha, "error").await;

    send(&mut interviewer, json!({"type": "end", "language": "python"})).await;
    let terminated = expect_type(&mut asha, "terminated").await;
    assert_eq!(terminated["readOnly"], true);
    assert_eq!(terminated["record"]["terminatedBy"], "Interviewer");
    assert_eq!(terminated["notice"], "This interview has been terminated by the interviewer.");

    send(&mut asha, json!({"type": "edit", "content": "sneaky"})).await;
    let error = expect_type(&mut asha, "error").await;
    assert_eq!(error["error"], "Session has ended; the editor is read-only");
}

#[tokio::test]
async fn leaving_is_broadcast_when_a_socket_closes() {
    let (addr, token) = spawn_server().await;
    let mut interviewer = connect(addr, "LEAVE123", &format!("token={token}")).await;
    expect_type(&mut interviewer, "welcome").await;

    let mut asha = connect(addr, "LEAVE123", "name=Asha").await;
    expect_type(&mut asha, "welcome").await;
    expect_type(&mut interviewer, "joined").await;

    asha.close(None).await.unwrap();
    let left = expect_type(&mut interviewer, "left").await;
    assert_eq!(left["message"], "Asha left the session");
}

#[tokio::test]
async fn rejected_joins_fail_the_handshake() {
    let (addr, _token) = spawn_server().await;

    let missing = connect_async(format!("ws://{addr}/api/sessions/NOPE1234/live?name=Asha")).await;
    match missing {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 404),
        other => panic!("expected HTTP 404, got {:?}", other.map(|_| ())),
    }

    let bad_token = connect_async(format!("ws://{addr}/api/sessions/482913/live?name=X&token=garbage")).await;
    match bad_token {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected HTTP 401, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn connected_participant_id_cannot_be_taken_over() {
    let (addr, token) = spawn_server().await;
    let mut interviewer = connect(addr, "482913", &format!("token={token}&name=Interviewer")).await;
    let welcome = expect_type(&mut interviewer, "welcome").await;
    let id = welcome["participant"]["id"].as_str().unwrap().to_string();

    let takeover = connect_async(format!("ws://{addr}/api/sessions/482913/live?name=Mallory&id={id}")).await;
    match takeover {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 403),
        other => panic!("expected HTTP 403, got {:?}", other.map(|_| ())),
    }

    // The interviewer is still listed and still sees newcomers.
    let mut asha = connect(addr, "482913", "name=Asha").await;
    let welcome = expect_type(&mut asha, "welcome").await;
    let roster = welcome["roster"].as_array().unwrap();
    assert!(roster.iter().any(|p| p["id"] == id.as_str() && p["name"] == "Interviewer"));
    expect_type(&mut interviewer, "joined").await;
}
