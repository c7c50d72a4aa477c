//! WebSocket opening-handshake control.

pub mod client;
pub mod headers;

use sha1::{Digest, Sha1};

/// Derives the `Sec-WebSocket-Accept` value from a `Sec-WebSocket-Key`
/// request header.
///
/// The server proves it understood the upgrade request by echoing this
/// value; [`client::HandshakeEngine`] recomputes it from the key it sent
/// and compares byte-for-byte.
pub fn derive_accept_key(request_key: &[u8]) -> String {
    // ... the value is constructed by concatenating /key/ with the string
    // "258EAFA5-E914-47DA-95CA-C5AB0DC85B11" (RFC 6455)
    const WS_GUID: &[u8] = b"258EAFA5-E914-47DA-95CA-C5AB0DC85B11";
    let mut digest = Sha1::new();
    digest.update(request_key);
    digest.update(WS_GUID);
    data_encoding::BASE64.encode(&digest.finalize())
}

/// Generates a fresh random key for the `Sec-WebSocket-Key` header.
///
/// The nonce only needs to avoid collisions between attempts, it is not a
/// cryptographic secret.
pub fn generate_key() -> String {
    // a base64-encoded (see Section 4 of [RFC4648]) value that,
    // when decoded, is 16 bytes in length (RFC 6455)
    let nonce: [u8; 16] = rand::random();
    data_encoding::BASE64.encode(&nonce)
}
