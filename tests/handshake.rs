//! End-to-end dispatcher tests: upgrade request out, literal wire bytes
//! in, decoded messages and errors surfacing through the callback.

use bytes::{Bytes, BytesMut};
use ws_client_core::{
    error::Utf8Error, http, Error, HandshakeConfig, Inbound, Message, PipelineDirective, Response,
    ResponseDecoder, WebSocketCallback, WebSocketClient,
};

#[derive(Debug, Default)]
struct Recorder {
    connects: usize,
    messages: Vec<Message>,
    disconnects: usize,
    errors: Vec<String>,
}

impl WebSocketCallback for Recorder {
    fn on_connect(&mut self) {
        self.connects += 1;
    }

    fn on_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn on_disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn on_error(&mut self, error: &Error) {
        self.errors.push(error.to_string());
    }
}

fn client(subprotocol: Option<&str>) -> WebSocketClient<Recorder> {
    let mut config = HandshakeConfig::default();
    if let Some(subprotocol) = subprotocol {
        config = config.subprotocol(subprotocol);
    }
    WebSocketClient::new(
        "ws://server.example.com/chat".parse().unwrap(),
        config,
        Recorder::default(),
    )
    .unwrap()
}

/// Parses the literal response a well-behaved server would send back for
/// the client's current attempt.
fn server_response(client: &WebSocketClient<Recorder>) -> Response {
    let accept = client.engine().expected_accept().unwrap();
    let raw = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\
         \r\n"
    );
    let mut buf = BytesMut::from(raw.as_bytes());
    ResponseDecoder.decode(&mut buf).unwrap().unwrap()
}

fn open_client() -> WebSocketClient<Recorder> {
    let mut client = client(None);
    client.transport_ready().unwrap();
    let response = server_response(&client);
    client.inbound(Inbound::Response(response)).unwrap();
    client
}

#[test]
fn full_open_cycle() {
    let mut client = client(Some("chat"));

    let started = client.transport_ready().unwrap();
    let request = std::str::from_utf8(&started.request).unwrap();
    assert!(request.starts_with("GET /chat HTTP/1.1\r\n"));
    assert!(request.contains("Upgrade: websocket\r\n"));
    assert!(request.contains("Sec-WebSocket-Protocol: chat\r\n"));
    assert!(request.contains("Sec-WebSocket-Version: 8\r\n"));
    assert!(request.ends_with("\r\n\r\n"));
    assert!(matches!(
        started.directive,
        PipelineDirective::InstallFrameEncoder(_)
    ));
    assert!(!client.is_open());

    let response = server_response(&client);
    let directive = client.inbound(Inbound::Response(response)).unwrap();
    assert!(matches!(
        directive,
        Some(PipelineDirective::InstallFrameDecoder(_))
    ));
    assert!(client.is_open());
    assert_eq!(client.callback_mut().connects, 1);
    assert!(client.callback_mut().errors.is_empty());
}

#[test]
fn text_payloads_are_validated_and_decoded() {
    let mut client = open_client();

    let payload = Bytes::from_static("caf\u{E9} \u{1F980}".as_bytes());
    client.inbound(Inbound::Text(payload)).unwrap();

    assert_eq!(
        client.callback_mut().messages,
        vec![Message::Text("caf\u{E9} \u{1F980}".to_owned())]
    );
}

#[test]
fn binary_payloads_pass_through() {
    let mut client = open_client();

    client
        .inbound(Inbound::Binary(Bytes::from_static(b"\x00\xFF\x80")))
        .unwrap();

    assert_eq!(
        client.callback_mut().messages,
        vec![Message::Binary(Bytes::from_static(b"\x00\xFF\x80"))]
    );
}

#[test]
fn invalid_utf8_text_payload_is_fatal_to_the_message() {
    let mut client = open_client();

    let err = client
        .inbound(Inbound::Text(Bytes::from_static(b"ok\x80")))
        .unwrap_err();
    assert!(matches!(err, Error::Utf8(Utf8Error::InvalidUtf8)));
    assert_eq!(client.callback_mut().errors.len(), 1);
    assert!(client.callback_mut().messages.is_empty());
}

#[test]
fn truncated_utf8_text_payload_is_incomplete() {
    let mut client = open_client();

    // first two bytes of a three-byte sequence
    let err = client
        .inbound(Inbound::Text(Bytes::from_static(b"\xE2\x82")))
        .unwrap_err();
    assert!(matches!(err, Error::Utf8(Utf8Error::IncompleteSequence)));
}

#[test]
fn rejected_handshake_reports_through_the_callback() {
    let mut client = client(None);
    client.transport_ready().unwrap();

    let raw = b"HTTP/1.1 101 Switching Protocols\r\n\
                Upgrade: websocket\r\n\
                Connection: Upgrade\r\n\
                Sec-WebSocket-Accept: c3RhbGUgYWNjZXB0IHZhbHVlIQ==\r\n\
                \r\n";
    let mut buf = BytesMut::from(&raw[..]);
    let response = ResponseDecoder.decode(&mut buf).unwrap().unwrap();

    let err = client.inbound(Inbound::Response(response)).unwrap_err();
    assert!(matches!(err, Error::Handshake(_)));
    assert!(!client.is_open());
    assert_eq!(client.callback_mut().connects, 0);
    assert_eq!(client.callback_mut().errors.len(), 1);
}

#[test]
fn http_response_after_open_is_an_error() {
    let mut client = open_client();

    let stray = http::Response::builder().status(200).body(()).unwrap();
    let err = client.inbound(Inbound::Response(stray)).unwrap_err();
    assert!(matches!(err, Error::UnexpectedHttpResponse(status) if status == 200));
    assert_eq!(client.callback_mut().errors.len(), 1);
}

#[test]
fn transport_close_reaches_the_callback() {
    let mut client = open_client();
    client.transport_closed();
    assert_eq!(client.callback_mut().disconnects, 1);
}
