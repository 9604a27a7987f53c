//! End-to-end relay tests over real QUIC on localhost.
//!
//! Each test starts a server with a freshly generated certificate written to
//! a temp directory, then drives it with Quinn clients that trust exactly
//! that certificate.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use quinn::{ClientConfig, Connection, Endpoint, RecvStream, SendStream};
use roomcast_core::RouterConfig;
use roomcast_proto::{
    ALPN_PROTOCOL, Payload,
    payloads::{ChatMessage, JoinRoom, Message, RoomUsers},
};
use roomcast_server::{Server, ServerRuntimeConfig, read_frame, write_frame};

const TIMEOUT: Duration = Duration::from_secs(5);

struct TestServer {
    addr: SocketAddr,
    client_config: ClientConfig,
    _dir: tempfile::TempDir,
}

async fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();

    let cert_path = dir.path().join("cert.pem");
    let key_path = dir.path().join("key.pem");
    std::fs::write(&cert_path, certified.cert.pem()).unwrap();
    std::fs::write(&key_path, certified.key_pair.serialize_pem()).unwrap();

    let config = ServerRuntimeConfig {
        bind_address: "127.0.0.1:0".to_string(),
        cert_path: Some(cert_path.to_string_lossy().into_owned()),
        key_path: Some(key_path.to_string_lossy().into_owned()),
        router: RouterConfig::default(),
    };

    let server = Server::bind(config).unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    let mut roots = rustls::RootCertStore::empty();
    roots.add(certified.cert.der().clone()).unwrap();

    let mut crypto =
        rustls::ClientConfig::builder().with_root_certificates(roots).with_no_client_auth();
    crypto.alpn_protocols = vec![ALPN_PROTOCOL.to_vec()];

    let client_config = ClientConfig::new(Arc::new(
        quinn::crypto::rustls::QuicClientConfig::try_from(crypto).unwrap(),
    ));

    TestServer { addr, client_config, _dir: dir }
}

struct TestClient {
    _endpoint: Endpoint,
    connection: Connection,
    send: SendStream,
    recv: Option<RecvStream>,
}

impl TestClient {
    async fn connect(server: &TestServer) -> Self {
        let mut endpoint = Endpoint::client("127.0.0.1:0".parse().unwrap()).unwrap();
        endpoint.set_default_client_config(server.client_config.clone());

        let connection = endpoint.connect(server.addr, "localhost").unwrap().await.unwrap();
        let (send, _) = connection.open_bi().await.unwrap();

        Self { _endpoint: endpoint, connection, send, recv: None }
    }

    async fn send(&mut self, payload: Payload) {
        let frame = payload.into_frame().unwrap();
        write_frame(&mut self.send, &frame).await.unwrap();
    }

    async fn join(&mut self, username: &str, room: &str) {
        self.send(Payload::JoinRoom(JoinRoom {
            username: username.to_string(),
            room: room.to_string(),
        }))
        .await;
    }

    async fn chat(&mut self, text: &str) {
        self.send(Payload::ChatMessage(ChatMessage { text: text.to_string() })).await;
    }

    async fn next(&mut self) -> Payload {
        tokio::time::timeout(TIMEOUT, async {
            if self.recv.is_none() {
                self.recv = Some(self.connection.accept_uni().await.unwrap());
            }
            let recv = self.recv.as_mut().unwrap();
            let frame = read_frame(recv).await.unwrap().expect("stream ended");
            Payload::from_frame(&frame).unwrap()
        })
        .await
        .expect("timed out waiting for a frame")
    }

    async fn next_message(&mut self) -> Message {
        match self.next().await {
            Payload::Message(message) => message,
            other => panic!("expected message, got {other:?}"),
        }
    }

    async fn next_roster(&mut self) -> RoomUsers {
        match self.next().await {
            Payload::RoomUsers(roster) => roster,
            other => panic!("expected roster, got {other:?}"),
        }
    }
}

fn names(roster: &RoomUsers) -> Vec<&str> {
    roster.users.iter().map(|u| u.display_name.as_str()).collect()
}

#[tokio::test]
async fn join_chat_and_leave_over_quic() {
    let server = start_server().await;

    let mut alice = TestClient::connect(&server).await;
    alice.join("alice", "general").await;

    let welcome = alice.next_message().await;
    assert_eq!(welcome.sender_name, "chatBot");
    assert_eq!(welcome.text, "Welcome aboard!");
    assert_eq!(names(&alice.next_roster().await), vec!["alice"]);

    let mut bob = TestClient::connect(&server).await;
    bob.join("bob", "general").await;

    assert_eq!(bob.next_message().await.text, "Welcome aboard!");
    assert_eq!(names(&bob.next_roster().await), vec!["alice", "bob"]);

    let notice = alice.next_message().await;
    assert_eq!(notice.sender_name, "chatBot");
    assert_eq!(notice.text, "bob has joined the chat!");
    assert_eq!(names(&alice.next_roster().await), vec!["alice", "bob"]);

    bob.chat("hi all").await;

    for client in [&mut alice, &mut bob] {
        let line = client.next_message().await;
        assert_eq!(line.sender_name, "bob");
        assert_eq!(line.text, "hi all");
    }

    bob.connection.close(0u32.into(), b"bye");

    assert_eq!(alice.next_message().await.text, "bob has left the chat!");
    let roster = alice.next_roster().await;
    assert_eq!(roster.room, "general");
    assert_eq!(names(&roster), vec!["alice"]);
}

#[tokio::test]
async fn chat_before_join_is_dropped() {
    let server = start_server().await;

    let mut alice = TestClient::connect(&server).await;
    alice.join("alice", "general").await;
    alice.next_message().await;
    alice.next_roster().await;

    let mut carol = TestClient::connect(&server).await;
    carol.chat("anyone here?").await;
    carol.join("carol", "general").await;

    // Carol's first frame is her welcome, alice's next is the join notice
    assert_eq!(carol.next_message().await.text, "Welcome aboard!");
    assert_eq!(alice.next_message().await.text, "carol has joined the chat!");
}

#[tokio::test]
async fn rooms_are_isolated() {
    let server = start_server().await;

    let mut alice = TestClient::connect(&server).await;
    alice.join("alice", "general").await;
    alice.next_message().await;
    alice.next_roster().await;

    let mut dave = TestClient::connect(&server).await;
    dave.join("dave", "random").await;
    dave.next_message().await;
    assert_eq!(names(&dave.next_roster().await), vec!["dave"]);

    dave.chat("only random hears this").await;
    assert_eq!(dave.next_message().await.text, "only random hears this");

    alice.chat("only general hears this").await;
    let line = alice.next_message().await;
    assert_eq!(line.sender_name, "alice");
    assert_eq!(line.text, "only general hears this");
}
