//! Types exchanged between the handshake core and the surrounding
//! transport pipeline.

pub mod utf8;

use bytes::Bytes;

/// A decoded inbound message, as delivered to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A UTF-8 validated text message.
    Text(String),
    /// A binary message.
    Binary(Bytes),
}

impl Message {
    /// Returns true if this message is a text message.
    pub fn is_text(&self) -> bool {
        matches!(self, Message::Text(_))
    }

    /// Returns true if this message is a binary message.
    pub fn is_binary(&self) -> bool {
        matches!(self, Message::Binary(_))
    }
}

/// Configuration for the outbound frame encoder installed at the
/// protocol upgrade point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameEncoderConfig {
    /// Whether outgoing payloads are masked. Clients always mask.
    pub mask_payloads: bool,
}

/// Configuration for the inbound frame decoder installed once the
/// handshake completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDecoderConfig {
    /// Whether inbound payloads are expected to be masked. Servers send
    /// unmasked frames.
    pub expect_masked_payloads: bool,
    /// Whether extensions may use the reserved bits of the frame header.
    pub allow_extensions: bool,
}

/// Command to the transport pipeline to swap a codec at the protocol
/// upgrade point.
///
/// The handshake engine never mutates the pipeline itself: it returns
/// these directives and the transport applies them, replacing the plain
/// HTTP codecs with frame codecs once the upgrade is agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineDirective {
    /// Replace the outbound HTTP encoder with a frame encoder.
    InstallFrameEncoder(FrameEncoderConfig),
    /// Replace the inbound HTTP response decoder with a frame decoder.
    InstallFrameDecoder(FrameDecoderConfig),
}
