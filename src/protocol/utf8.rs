//! Strict incremental UTF-8 validation for text payloads.

use crate::error::Utf8Error;

/// State meaning "a complete code point has just been decoded".
const UTF8_ACCEPT: u8 = 0;
/// Terminal failure state.
const UTF8_REJECT: u8 = 12;

// Bjoern Hoehrmann's UTF-8 automaton (https://bjoern.hoehrmann.de/utf-8/decoder/dfa/):
// a byte-class table and a transition table over states that are
// multiples of 12. The tables are opaque data and must stay bit-exact.
#[rustfmt::skip]
static BYTE_CLASSES: [u8; 256] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x00..0x0F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x10..0x1F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x20..0x2F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x30..0x3F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x40..0x4F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x50..0x5F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x60..0x6F
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // 0x70..0x7F
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 0x80..0x8F
    9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, // 0x90..0x9F
    7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, // 0xA0..0xAF
    7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, 7, // 0xB0..0xBF
    8, 8, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // 0xC0..0xCF
    2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, // 0xD0..0xDF
   10, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 4, 3, 3, // 0xE0..0xEF
   11, 6, 6, 6, 5, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, // 0xF0..0xFF
];

// Maps `state + byte class` to the next state.
#[rustfmt::skip]
static TRANSITIONS: [u8; 108] = [
     0, 12, 24, 36, 60, 96, 84, 12, 12, 12, 48, 72,
    12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12,
    12,  0, 12, 12, 12, 12, 12,  0, 12,  0, 12, 12,
    12, 24, 12, 12, 12, 12, 12, 24, 12, 24, 12, 12,
    12, 12, 12, 12, 12, 12, 12, 24, 12, 12, 12, 12,
    12, 24, 12, 12, 12, 12, 12, 12, 12, 24, 12, 12,
    12, 12, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12,
    12, 36, 12, 12, 12, 12, 12, 36, 12, 36, 12, 12,
    12, 36, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12,
];

/// Validates and decodes the payload of one text frame, byte by byte.
///
/// Feeding one byte at a time lets validation interleave with streaming
/// frame reassembly, and malformed input fails at the first bad byte
/// instead of after the whole payload was buffered.
///
/// One instance covers exactly one payload: the decoded text is taken
/// with [`finish`](Self::finish), which consumes the validator, so
/// accumulator state can never leak into an independent payload. A
/// rejected validator must not be fed again; doing so is a programming
/// error in the caller.
#[derive(Debug)]
pub struct Utf8Validator {
    state: u8,
    code_point: u32,
    output: String,
}

impl Utf8Validator {
    /// Creates a validator for one payload.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a validator with `capacity` bytes of output preallocated.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: UTF8_ACCEPT,
            code_point: 0,
            output: String::with_capacity(capacity),
        }
    }

    /// Feeds one payload byte through the automaton.
    ///
    /// Fails with [`Utf8Error::InvalidUtf8`] iff the byte drives the
    /// automaton into its reject state. Rejection is permanent.
    pub fn feed(&mut self, byte: u8) -> Result<(), Utf8Error> {
        debug_assert!(
            self.state != UTF8_REJECT,
            "validator fed after rejecting its payload"
        );
        if self.state == UTF8_REJECT {
            return Err(Utf8Error::InvalidUtf8);
        }

        let class = BYTE_CLASSES[usize::from(byte)];
        self.code_point = if self.state == UTF8_ACCEPT {
            (0xFF_u32 >> class) & u32::from(byte)
        } else {
            u32::from(byte & 0x3F) | (self.code_point << 6)
        };
        self.state = TRANSITIONS[usize::from(self.state) + usize::from(class)];

        match self.state {
            UTF8_ACCEPT => {
                // The automaton only completes on scalar values, so the
                // conversion cannot fail here.
                match char::from_u32(self.code_point) {
                    Some(c) => self.output.push(c),
                    None => {
                        self.state = UTF8_REJECT;
                        return Err(Utf8Error::InvalidUtf8);
                    }
                }
                Ok(())
            }
            UTF8_REJECT => Err(Utf8Error::InvalidUtf8),
            _ => Ok(()),
        }
    }

    /// Feeds `bytes` in order, stopping at the first invalid byte.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Result<(), Utf8Error> {
        for &byte in bytes {
            self.feed(byte)?;
        }
        Ok(())
    }

    /// Consumes the validator and produces the decoded text.
    ///
    /// Fails with [`Utf8Error::IncompleteSequence`] when the payload
    /// ended in the middle of a multi-byte sequence, and re-signals
    /// [`Utf8Error::InvalidUtf8`] on a rejected payload.
    pub fn finish(self) -> Result<String, Utf8Error> {
        match self.state {
            UTF8_ACCEPT => Ok(self.output),
            UTF8_REJECT => Err(Utf8Error::InvalidUtf8),
            _ => Err(Utf8Error::IncompleteSequence),
        }
    }
}

impl Default for Utf8Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<String, Utf8Error> {
        let mut validator = Utf8Validator::new();
        validator.feed_all(bytes)?;
        validator.finish()
    }

    #[test]
    fn ascii_passes_through() {
        assert_eq!(decode(b"hello").unwrap(), "hello");
    }

    #[test]
    fn two_byte_sequence_decodes() {
        assert_eq!(decode(&[0xC2, 0xA9]).unwrap(), "\u{A9}");
    }

    #[test]
    fn four_byte_sequence_decodes() {
        assert_eq!(decode("a\u{1F600}b".as_bytes()).unwrap(), "a\u{1F600}b");
    }

    #[test]
    fn lone_continuation_byte_is_rejected() {
        let mut validator = Utf8Validator::new();
        assert_eq!(validator.feed(0x80), Err(Utf8Error::InvalidUtf8));
    }

    #[test]
    fn truncated_sequence_is_incomplete() {
        let mut validator = Utf8Validator::new();
        validator.feed_all(&[0xE2, 0x82]).unwrap();
        assert_eq!(validator.finish(), Err(Utf8Error::IncompleteSequence));
    }

    #[test]
    fn overlong_encoding_is_rejected() {
        assert_eq!(decode(&[0xC0, 0xAF]), Err(Utf8Error::InvalidUtf8));
    }

    #[test]
    fn surrogate_code_points_are_rejected() {
        // an encoded UTF-16 surrogate (U+D800) is not valid UTF-8
        assert_eq!(decode(&[0xED, 0xA0, 0x80]), Err(Utf8Error::InvalidUtf8));
    }

    #[test]
    fn code_points_beyond_u10ffff_are_rejected() {
        assert_eq!(
            decode(&[0xF4, 0x90, 0x80, 0x80]),
            Err(Utf8Error::InvalidUtf8)
        );
    }

    #[test]
    fn feed_all_stops_at_the_first_invalid_byte() {
        let mut validator = Utf8Validator::new();
        assert_eq!(
            validator.feed_all(b"ok\xFFignored"),
            Err(Utf8Error::InvalidUtf8)
        );
    }

    #[test]
    fn split_feeding_matches_single_feed() {
        let text = "caf\u{E9} \u{2764} \u{1F980}";

        let mut one_byte_at_a_time = Utf8Validator::new();
        for &byte in text.as_bytes() {
            one_byte_at_a_time.feed(byte).unwrap();
        }

        let mut all_at_once = Utf8Validator::new();
        all_at_once.feed_all(text.as_bytes()).unwrap();

        assert_eq!(one_byte_at_a_time.finish().unwrap(), text);
        assert_eq!(all_at_once.finish().unwrap(), text);
    }

    #[test]
    fn separate_instances_decode_identically() {
        let payload = "\u{3053}\u{3093}\u{306B}\u{3061}\u{306F}".as_bytes();
        assert_eq!(decode(payload).unwrap(), decode(payload).unwrap());
    }
}
