//! Connection-event dispatcher for a WebSocket client.
//!
//! The dispatcher owns no I/O: the transport calls in with its events
//! (ready, inbound message, closed) and carries out the returned request
//! bytes and pipeline directives. Inbound HTTP responses are routed into
//! the handshake engine, text payloads through a fresh
//! [`Utf8Validator`], and the results surface to the application through
//! a [`WebSocketCallback`].

use bytes::Bytes;
use http::Uri;

use crate::{
    error::{Error, Result},
    handshake::client::{
        HandshakeConfig, HandshakeEngine, HandshakeState, Response, StartedHandshake,
    },
    protocol::{utf8::Utf8Validator, Message, PipelineDirective},
};

/// Application-side callbacks, invoked by the dispatcher.
pub trait WebSocketCallback {
    /// Called once the opening handshake has completed.
    fn on_connect(&mut self);
    /// Called for every decoded inbound message.
    fn on_message(&mut self, message: Message);
    /// Called when the transport reports that the connection closed.
    fn on_disconnect(&mut self);
    /// Called when an unrecoverable error occurred. The connection must
    /// be torn down afterwards.
    fn on_error(&mut self, error: &Error);
}

/// An inbound event, tagged by the transport.
#[derive(Debug)]
pub enum Inbound {
    /// A parsed HTTP response. Only expected while the handshake is in
    /// flight.
    Response(Response),
    /// The payload of a text frame, not yet validated.
    Text(Bytes),
    /// The payload of a binary frame.
    Binary(Bytes),
}

/// Dispatcher for one client connection attempt.
///
/// Lives exactly as long as the attempt: it neither retries a failed
/// handshake nor reconnects. Every error is reported through
/// [`WebSocketCallback::on_error`] and returned to the transport, which
/// is expected to tear the connection down.
#[derive(Debug)]
pub struct WebSocketClient<C> {
    engine: HandshakeEngine,
    callback: C,
}

impl<C: WebSocketCallback> WebSocketClient<C> {
    /// Creates a client for one connection attempt against `target`.
    pub fn new(target: Uri, config: HandshakeConfig, callback: C) -> Result<Self> {
        Ok(Self {
            engine: HandshakeEngine::new(target, config)?,
            callback,
        })
    }

    /// Whether the opening handshake has completed.
    pub fn is_open(&self) -> bool {
        self.engine.state() == HandshakeState::Open
    }

    /// The handshake engine driving this attempt.
    pub fn engine(&self) -> &HandshakeEngine {
        &self.engine
    }

    /// The application callback.
    pub fn callback_mut(&mut self) -> &mut C {
        &mut self.callback
    }

    /// Begins the opening handshake. To be called once the underlying
    /// transport is ready.
    ///
    /// The returned request bytes must be transmitted and the directive
    /// applied to the outbound side of the pipeline.
    pub fn transport_ready(&mut self) -> Result<StartedHandshake> {
        self.engine.start().map_err(|e| self.report(e))
    }

    /// Routes one inbound event.
    ///
    /// Returns a directive when the event completed the handshake. On
    /// error the callback has already been notified; the caller must
    /// close the connection.
    pub fn inbound(&mut self, event: Inbound) -> Result<Option<PipelineDirective>> {
        self.dispatch(event).map_err(|e| self.report(e))
    }

    /// To be called when the transport reports the connection closed.
    pub fn transport_closed(&mut self) {
        self.callback.on_disconnect();
    }

    fn dispatch(&mut self, event: Inbound) -> Result<Option<PipelineDirective>> {
        match event {
            Inbound::Response(response) => {
                if self.engine.state() == HandshakeState::Open {
                    return Err(Error::UnexpectedHttpResponse(response.status()));
                }

                let directive = self.engine.complete(&response)?;
                self.callback.on_connect();
                Ok(Some(directive))
            }

            Inbound::Text(payload) => {
                let mut validator = Utf8Validator::with_capacity(payload.len());
                validator.feed_all(&payload)?;
                self.callback.on_message(Message::Text(validator.finish()?));
                Ok(None)
            }

            Inbound::Binary(payload) => {
                self.callback.on_message(Message::Binary(payload));
                Ok(None)
            }
        }
    }

    fn report(&mut self, error: Error) -> Error {
        self.callback.on_error(&error);
        error
    }
}
