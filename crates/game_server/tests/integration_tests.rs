//! End-to-end tests over real WebSocket connections.
//!
//! Each test runs its own server on an ephemeral port and drives it with
//! `tokio-tungstenite` clients.

use futures::{SinkExt, StreamExt};
use game_server::{create_server_with_config, GameServer, ServerConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STEP: Duration = Duration::from_secs(5);

async fn spawn_server(config: ServerConfig) -> (Arc<GameServer>, SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(create_server_with_config(config));
    let running = server.clone();
    let task = tokio::spawn(async move {
        running.serve(listener).await.unwrap();
    });
    (server, addr, task)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::Text(frame.to_string().into())).await.unwrap();
}

/// Next text frame as JSON, or `None` once the server closed the socket.
async fn recv(client: &mut Client) -> Option<Value> {
    loop {
        match timeout(STEP, client.next()).await.expect("timed out waiting for a frame") {
            Some(Ok(Message::Text(text))) => return Some(serde_json::from_str(text.as_str()).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

async fn recv_of(client: &mut Client, kind: &str) -> Value {
    loop {
        let message = recv(client).await.unwrap_or_else(|| panic!("closed before {kind}"));
        if message["type"] == kind {
            return message;
        }
    }
}

async fn join(client: &mut Client, room_id: &str) -> Value {
    send(client, json!({"type": "JOIN_ROOM", "payload": {"roomId": room_id}})).await;
    recv_of(client, "PLAYER_ASSIGNED").await
}

async fn play(client: &mut Client, board_id: usize, square_id: usize, player: &str) {
    send(
        client,
        json!({"type": "MAKE_MOVE", "payload": {"boardId": board_id, "squareId": square_id, "player": player}}),
    )
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_two_players_join_and_play() {
    let (server, addr, _task) = spawn_server(ServerConfig::default()).await;
    let mut x = connect(addr).await;
    let mut o = connect(addr).await;

    let assigned = join(&mut x, "table").await;
    assert_eq!(assigned["payload"]["symbol"], "X");
    assert_eq!(assigned["payload"]["gameState"]["activeBoard"], Value::Null);

    let assigned = join(&mut o, "table").await;
    assert_eq!(assigned["payload"]["symbol"], "O");
    assert_eq!(recv_of(&mut o, "PLAYERS_CONNECTED").await["payload"], 2);
    assert_eq!(recv_of(&mut x, "PLAYERS_CONNECTED").await["payload"], 1);
    assert_eq!(recv_of(&mut x, "PLAYERS_CONNECTED").await["payload"], 2);

    play(&mut x, 4, 0, "X").await;
    for client in [&mut x, &mut o] {
        let update = recv_of(client, "GAME_STATE_UPDATE").await;
        assert_eq!(update["payload"]["board"][4]["squares"][0]["owner"]["symbol"], "X");
        assert_eq!(update["payload"]["activeBoard"], 0);
    }

    // Off the forced board.
    play(&mut o, 1, 1, "O").await;
    let rejected = recv(&mut o).await.unwrap();
    assert_eq!(rejected["type"], "INVALID_MOVE");

    assert_eq!(server.get_server_stats().room_count, 1);
    assert_eq!(server.get_server_stats().connection_count, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_third_client_gets_game_full_and_is_closed() {
    let (_server, addr, _task) = spawn_server(ServerConfig::default()).await;
    let mut x = connect(addr).await;
    let mut o = connect(addr).await;
    join(&mut x, "busy").await;
    join(&mut o, "busy").await;

    let mut third = connect(addr).await;
    send(&mut third, json!({"type": "JOIN_ROOM", "payload": {"roomId": "busy"}})).await;

    assert_eq!(
        recv(&mut third).await,
        Some(json!({"type": "GAME_FULL", "payload": "Room is full"}))
    );
    assert_eq!(recv(&mut third).await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let (_server, addr, _task) = spawn_server(ServerConfig::default()).await;
    let mut client = connect(addr).await;

    client.send(Message::Text("{oops".into())).await.unwrap();
    assert_eq!(recv(&mut client).await.unwrap()["type"], "ERROR");

    let assigned = join(&mut client, "after-error").await;
    assert_eq!(assigned["payload"]["symbol"], "X");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_disconnect_resets_room_for_remaining_player() {
    let (server, addr, _task) = spawn_server(ServerConfig::default()).await;
    let mut x = connect(addr).await;
    let mut o = connect(addr).await;
    join(&mut x, "reset").await;
    join(&mut o, "reset").await;

    play(&mut x, 4, 0, "X").await;
    recv_of(&mut o, "GAME_STATE_UPDATE").await;

    x.close(None).await.unwrap();

    assert_eq!(recv_of(&mut o, "PLAYERS_CONNECTED").await["payload"], 1);
    let reset = recv_of(&mut o, "GAME_STATE_UPDATE").await;
    assert_eq!(reset["payload"]["currentPlayerIndex"], 0);
    assert_eq!(reset["payload"]["board"][4]["squares"][0]["owner"], Value::Null);

    o.close(None).await.unwrap();
    for _ in 0..50 {
        if server.get_server_stats().room_count == 0 {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.get_server_stats().room_count, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rooms_are_isolated() {
    let (_server, addr, _task) = spawn_server(ServerConfig::default()).await;
    let mut a_x = connect(addr).await;
    let mut a_o = connect(addr).await;
    let mut b_x = connect(addr).await;

    join(&mut a_x, "a").await;
    join(&mut a_o, "a").await;
    let assigned = join(&mut b_x, "b").await;
    assert_eq!(assigned["payload"]["symbol"], "X");

    play(&mut a_x, 0, 0, "X").await;
    recv_of(&mut a_o, "GAME_STATE_UPDATE").await;

    // Room b saw nothing from room a: its next frame is its own move's update.
    play(&mut b_x, 8, 8, "X").await;
    let update = recv_of(&mut b_x, "GAME_STATE_UPDATE").await;
    assert_eq!(update["payload"]["board"][0]["squares"][0]["owner"], Value::Null);
    assert_eq!(update["payload"]["board"][8]["squares"][8]["owner"]["symbol"], "X");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_limit_turns_clients_away() {
    let config = ServerConfig::default().with_max_connections(1);
    let (_server, addr, _task) = spawn_server(config).await;

    let mut first = connect(addr).await;
    join(&mut first, "limited").await;

    let mut second = connect(addr).await;
    assert_eq!(
        recv(&mut second).await,
        Some(json!({"type": "ERROR", "payload": "Server is full"}))
    );
    assert_eq!(recv(&mut second).await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_closes_clients() {
    let (server, addr, task) = spawn_server(ServerConfig::default()).await;
    let mut client = connect(addr).await;
    join(&mut client, "closing").await;

    server.shutdown().await.unwrap();
    timeout(STEP, task).await.unwrap().unwrap();

    assert_eq!(recv(&mut client).await.unwrap()["type"], "PLAYERS_CONNECTED");
    assert_eq!(recv(&mut client).await, None);
}
