mod support;

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header;
use serde_json::Value;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue},
};

use support::{spawn_app, Cookies, TestApp};

async fn open_presence_socket(
    app: &TestApp,
    room: i64,
    cookies: &Cookies,
) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>> {
    let mut request = app
        .ws_url(&format!("/api/v1/rooms/{room}/presence/ws"))
        .into_client_request()
        .expect("ws request");
    request.headers_mut().insert(
        "cookie",
        HeaderValue::from_str(&cookies.header()).expect("cookie header"),
    );
    let (socket, _) = connect_async(request).await.expect("ws connect");
    socket
}

async fn next_event(
    socket: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
) -> Value {
    let message = timeout(Duration::from_secs(2), socket.next())
        .await
        .expect("event in time")
        .expect("socket open")
        .expect("ws frame");
    serde_json::from_str(message.to_text().expect("text frame")).expect("event json")
}

fn live_ids(event: &Value) -> Vec<String> {
    event["liveUsers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["id"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn presence_changes_are_pushed_to_room_subscribers() {
    let app = spawn_app(false).await;
    let (alice, alice_cookies) = app.register("Alice", "a@x.com").await;
    let (bob, bob_cookies) = app.register("Bob", "b@x.com").await;
    let alice_id = alice["id"].as_str().unwrap().to_owned();
    let bob_id = bob["id"].as_str().unwrap().to_owned();

    let mut socket = open_presence_socket(&app, 42, &bob_cookies).await;

    for (method, cookies) in [
        ("POST", &alice_cookies),
        ("POST", &bob_cookies),
        ("DELETE", &alice_cookies),
    ] {
        let response = app
            .client
            .request(
                method.parse().unwrap(),
                app.url("/api/v1/rooms/42/presence"),
            )
            .header(header::COOKIE, cookies.header())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.json::<Value>().await.unwrap(), true);
    }

    let first = next_event(&mut socket).await;
    assert_eq!(first["chatroomId"], 42);
    assert_eq!(live_ids(&first), vec![alice_id.clone()]);

    let second = next_event(&mut socket).await;
    assert_eq!(live_ids(&second), vec![alice_id, bob_id.clone()]);

    let third = next_event(&mut socket).await;
    assert_eq!(live_ids(&third), vec![bob_id]);

    let listed: Value = app
        .client
        .get(app.url("/api/v1/rooms/42/presence"))
        .header(header::COOKIE, alice_cookies.header())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["fullname"], "Bob");
    assert!(listed[0].get("password").is_none());
}

#[tokio::test]
async fn other_rooms_are_not_delivered() {
    let app = spawn_app(false).await;
    let (_, cookies) = app.register("Alice", "a@x.com").await;
    let mut socket = open_presence_socket(&app, 1, &cookies).await;

    app.client
        .post(app.url("/api/v1/rooms/2/presence"))
        .header(header::COOKIE, cookies.header())
        .send()
        .await
        .unwrap();

    assert!(timeout(Duration::from_millis(200), socket.next())
        .await
        .is_err());
}

#[tokio::test]
async fn unauthenticated_subscription_is_rejected() {
    let app = spawn_app(false).await;
    let result = connect_async(app.ws_url("/api/v1/rooms/1/presence/ws")).await;
    assert!(result.is_err());
}
