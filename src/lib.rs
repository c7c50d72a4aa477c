//! Sans-IO client side of the WebSocket opening handshake (HyBi drafts
//! 08/10) with strict incremental UTF-8 validation of text payloads.
//!
//! The crate contains two independent state machines and the dispatcher
//! that composes them:
//!
//! - [`HandshakeEngine`] builds the HTTP upgrade request, derives the
//!   expected `Sec-WebSocket-Accept` value and strictly verifies the
//!   server response. Codec swaps at the upgrade point are returned as
//!   [`PipelineDirective`] values instead of mutating a pipeline.
//! - [`Utf8Validator`] is a byte-wise automaton rejecting malformed
//!   text payloads at the first invalid byte.
//! - [`WebSocketClient`] routes transport events into the two machines
//!   and surfaces results to a [`WebSocketCallback`].
//!
//! No transport, frame codec, or retry policy lives here: all bytes in
//! and out are plain values exchanged with the caller, and every failure
//! is fatal to the attempt or payload that produced it.

#![deny(
    missing_docs,
    unused_must_use,
    unused_mut,
    unused_imports,
    unused_import_braces
)]

pub mod error;
pub use error::{Error, Result};

pub mod client;
pub mod handshake;
pub mod protocol;

// re-export bytes since used in the `Message` and payload APIs.
pub use bytes::Bytes;
pub use http;

pub use crate::{
    client::{Inbound, WebSocketCallback, WebSocketClient},
    handshake::client::{
        HandshakeConfig, HandshakeEngine, HandshakeState, Response, ResponseDecoder,
        StartedHandshake,
    },
    protocol::{utf8::Utf8Validator, Message, PipelineDirective},
};
