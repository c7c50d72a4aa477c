//! Client side of the opening handshake.

use std::fmt::Write;

use bytes::{Buf, Bytes, BytesMut};
use http::{HeaderMap, StatusCode, Uri};
use httparse::Status;
use log::{debug, trace};

use super::{
    derive_accept_key, generate_key,
    headers::{FromHttparse, MAX_HEADERS},
};
use crate::{
    error::{Error, HandshakeError, Result, UrlError},
    protocol::{FrameDecoderConfig, FrameEncoderConfig, PipelineDirective},
};

/// Server response type.
pub type Response = http::Response<()>;

/// Options for one handshake attempt.
#[derive(Debug, Clone, Default)]
pub struct HandshakeConfig {
    /// Sub-protocol requested via `Sec-WebSocket-Protocol`. The header is
    /// only sent when this is a non-empty string.
    pub subprotocol: Option<String>,
    /// Whether extensions may use the reserved bits of the frame header.
    /// Forwarded to the inbound frame decoder; it has no effect on the
    /// handshake itself.
    pub allow_extensions: bool,
}

impl HandshakeConfig {
    /// Requests `subprotocol` during the handshake.
    pub fn subprotocol<P: Into<String>>(mut self, subprotocol: P) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }

    /// Allows extensions to use the reserved bits of the frame header.
    pub fn allow_extensions(mut self, allow: bool) -> Self {
        self.allow_extensions = allow;
        self
    }
}

/// State of one handshake attempt.
///
/// `Open` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// [`HandshakeEngine::start`] has not been called yet.
    NotStarted,
    /// The upgrade request has been produced and the engine waits for the
    /// server response.
    AwaitingResponse,
    /// The server response verified and the connection is upgraded.
    Open,
    /// Verification failed. The connection must be closed.
    Failed,
}

/// Output of [`HandshakeEngine::start`].
#[derive(Debug)]
pub struct StartedHandshake {
    /// The serialized HTTP upgrade request, ready for transmission.
    pub request: Bytes,
    /// Directive replacing the outbound HTTP encoder with a frame
    /// encoder.
    pub directive: PipelineDirective,
}

/// Drives the client side of the opening handshake for one connection
/// attempt.
///
/// The engine performs no I/O. [`start`](Self::start) returns the
/// serialized upgrade request together with the directive to swap the
/// outbound codec; the transport sends the bytes and applies the
/// directive. Once the server response arrives (parsed e.g. with
/// [`ResponseDecoder`]), [`complete`](Self::complete) verifies it and
/// returns the directive for the inbound codec.
///
/// An engine instance covers exactly one attempt. Restarting it
/// regenerates the nonce, the request key and the expected accept value
/// together; a stale accept value is never compared against a new key.
#[derive(Debug)]
pub struct HandshakeEngine {
    target: Uri,
    config: HandshakeConfig,
    request_key: Option<String>,
    expected_accept: Option<String>,
    state: HandshakeState,
}

impl HandshakeEngine {
    /// Creates an engine for a single attempt against `target`.
    ///
    /// The target must be a `ws` or `wss` URI with a non-empty host.
    pub fn new(target: Uri, config: HandshakeConfig) -> Result<Self> {
        match target.scheme_str() {
            Some("ws") | Some("wss") => {}
            _ => return Err(Error::Url(UrlError::UnsupportedUrlScheme)),
        }
        match target.host() {
            None => return Err(Error::Url(UrlError::NoHostName)),
            Some(host) if host.is_empty() => return Err(Error::Url(UrlError::EmptyHostName)),
            Some(_) => {}
        }

        Ok(Self {
            target,
            config,
            request_key: None,
            expected_accept: None,
            state: HandshakeState::NotStarted,
        })
    }

    /// Current state of the attempt.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// The `Sec-WebSocket-Key` sent with the current attempt, once
    /// started.
    pub fn request_key(&self) -> Option<&str> {
        self.request_key.as_deref()
    }

    /// The `Sec-WebSocket-Accept` value the server must echo, once
    /// started.
    pub fn expected_accept(&self) -> Option<&str> {
        self.expected_accept.as_deref()
    }

    /// Begins the handshake.
    ///
    /// Generates a fresh 16-byte nonce, derives the request key and the
    /// expected accept value from it, and serializes the upgrade request:
    ///
    /// ```text
    /// GET /chat HTTP/1.1
    /// Upgrade: websocket
    /// Connection: Upgrade
    /// Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==
    /// Host: server.example.com
    /// Origin: http://server.example.com
    /// Sec-WebSocket-Protocol: chat
    /// Sec-WebSocket-Version: 8
    /// ```
    ///
    /// Transitions the engine to [`HandshakeState::AwaitingResponse`].
    pub fn start(&mut self) -> Result<StartedHandshake> {
        let key = generate_key();
        let accept = derive_accept_key(key.as_bytes());
        debug!("client handshake key: {key}, expected accept: {accept}");

        let request = self.encode_request(&key)?;
        self.request_key = Some(key);
        self.expected_accept = Some(accept);
        self.state = HandshakeState::AwaitingResponse;

        Ok(StartedHandshake {
            request,
            directive: PipelineDirective::InstallFrameEncoder(FrameEncoderConfig {
                mask_payloads: true,
            }),
        })
    }

    /// Verifies the server response and finishes the handshake.
    ///
    /// The checks run in order and the first failure wins: the status
    /// must be `101 Switching Protocols`, the `Upgrade` header must equal
    /// `websocket`, the `Connection` header must equal `Upgrade`, and
    /// `Sec-WebSocket-Accept` must echo the expected accept value
    /// byte-for-byte. Header value comparison is deliberately
    /// case-sensitive: the values must match what was sent.
    ///
    /// On success the engine becomes [`HandshakeState::Open`] and the
    /// returned directive installs the inbound frame decoder. On failure
    /// the engine becomes [`HandshakeState::Failed`] and the error
    /// carries the offending value; the caller must close the connection.
    pub fn complete(&mut self, response: &Response) -> Result<PipelineDirective> {
        if self.state != HandshakeState::AwaitingResponse {
            return Err(Error::Handshake(HandshakeError::NotInProgress));
        }

        if let Err(e) = self.verify_response(response) {
            self.state = HandshakeState::Failed;
            return Err(Error::Handshake(e));
        }

        self.state = HandshakeState::Open;
        trace!("handshake completed, switching the pipeline to frame decoding");

        Ok(PipelineDirective::InstallFrameDecoder(FrameDecoderConfig {
            expect_masked_payloads: false,
            allow_extensions: self.config.allow_extensions,
        }))
    }

    fn verify_response(&self, response: &Response) -> Result<(), HandshakeError> {
        let expected = self
            .expected_accept
            .as_deref()
            .expect("Bug: awaiting a response without a stored accept value");

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            return Err(HandshakeError::UnexpectedStatus(response.status()));
        }

        let headers = response.headers();

        if !header_eq(headers, "Upgrade", b"websocket") {
            return Err(HandshakeError::InvalidUpgradeHeader(header_string(
                headers, "Upgrade",
            )));
        }

        if !header_eq(headers, "Connection", b"Upgrade") {
            return Err(HandshakeError::InvalidConnectionHeader(header_string(
                headers,
                "Connection",
            )));
        }

        if !header_eq(headers, "Sec-WebSocket-Accept", expected.as_bytes()) {
            return Err(HandshakeError::ChallengeMismatch {
                actual: header_string(headers, "Sec-WebSocket-Accept"),
                expected: expected.to_owned(),
            });
        }

        Ok(())
    }

    fn encode_request(&self, key: &str) -> Result<Bytes> {
        let path = self
            .target
            .path_and_query()
            .ok_or(Error::Url(UrlError::NoPathOrQuery))?
            .as_str();
        let host = self
            .target
            .host()
            .expect("Bug: host checked on construction");

        let mut dst = BytesMut::with_capacity(256);
        // `fmt::Write` for `BytesMut` only ever grows the buffer.
        write!(
            dst,
            "GET {path} HTTP/1.1\r\n\
             Upgrade: websocket\r\n\
             Connection: Upgrade\r\n\
             Sec-WebSocket-Key: {key}\r\n\
             Host: {host}\r\n\
             Origin: http://{host}\r\n"
        )
        .unwrap();

        if let Some(protocol) = self.config.subprotocol.as_deref().filter(|p| !p.is_empty()) {
            write!(dst, "Sec-WebSocket-Protocol: {protocol}\r\n").unwrap();
        }

        dst.extend_from_slice(b"Sec-WebSocket-Version: 8\r\n\r\n");
        Ok(dst.freeze())
    }
}

fn header_eq(headers: &HeaderMap, name: &str, expected: &[u8]) -> bool {
    headers
        .get(name)
        .map(|value| value.as_bytes() == expected)
        .unwrap_or(false)
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
}

/// Incremental decoder for the server's HTTP response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    /// Attempts to parse one complete HTTP response from `src`.
    ///
    /// Returns `None` when more input is needed. On success exactly the
    /// parsed bytes are consumed from `src`; anything left behind them is
    /// frame data that arrived back-to-back with the response.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Response>> {
        let mut hbuffer = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut raw = httparse::Response::new(&mut hbuffer);

        match raw.parse(src)? {
            Status::Partial => Ok(None),
            Status::Complete(size) => {
                let response = Response::from_httparse(raw)?;
                src.advance(size);
                Ok(Some(response))
            }
        }
    }
}

impl<'h, 'b: 'h> FromHttparse<httparse::Response<'h, 'b>> for Response {
    fn from_httparse(raw: httparse::Response<'h, 'b>) -> Result<Self> {
        if raw.version.expect("Bug: no HTTP version") < /*1.*/1 {
            return Err(Error::Handshake(HandshakeError::UnsupportedHttpVersion));
        }

        let headers = HeaderMap::from_httparse(&*raw.headers)?;

        let mut response = Response::new(());
        *response.status_mut() = StatusCode::from_u16(raw.code.expect("Bug: no HTTP status code"))?;
        *response.headers_mut() = headers;
        // httparse only supports HTTP 0.9/1.0/1.1, so after the version
        // check above the only value we could have parsed is 1.1.
        *response.version_mut() = http::Version::HTTP_11;

        Ok(response)
    }
}
