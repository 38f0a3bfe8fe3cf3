//! Incremental framing of request objects from the host byte stream.
//!
//! The host may send a request in one write or one byte per second; the
//! framer does not care. Bytes are discarded until an opening brace, then
//! accumulated until the matching close brace balances the object. Quotes
//! and backslash escapes are tracked so braces inside string values do not
//! count toward nesting.
//!
//! There is no error path: input that never closes its outer brace fills
//! the buffer and is silently discarded wholesale, leaving the framer ready
//! for the next well-formed object. One malformed message is lost; the
//! stream heals itself.

use heapless::Vec;

/// Accumulation buffer capacity in bytes
///
/// Also the upper bound on a framable request; anything longer is dropped
/// by the overflow reset.
pub const FRAMER_CAPACITY: usize = 512;

/// One complete balanced-brace object, raw bytes as received
pub type RawObject = Vec<u8, FRAMER_CAPACITY>;

/// State machine for extracting balanced-brace objects from a byte stream
#[derive(Debug, Clone, Default)]
pub struct ObjectFramer {
    buffer: Vec<u8, FRAMER_CAPACITY>,
    /// Brace nesting depth; 0 means "between objects"
    depth: u16,
    /// Inside a `"..."` string literal
    in_string: bool,
    /// Previous byte was an unconsumed backslash
    escaped: bool,
}

impl ObjectFramer {
    /// Create a new framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all accumulation state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }

    /// Feed a single byte
    ///
    /// Returns `Some(object)` when this byte completes a balanced object,
    /// `None` when more bytes are needed. Bytes outside any object are
    /// ignored unless they open one.
    pub fn feed(&mut self, byte: u8) -> Option<RawObject> {
        // Overflow: the partial object is unsalvageable. Drop everything,
        // silently, and wait for the next opening brace.
        if self.buffer.is_full() {
            self.reset();
        }

        if self.depth == 0 {
            if byte == b'{' {
                // Cannot fail, fullness was checked above
                let _ = self.buffer.push(byte);
                self.depth = 1;
                self.in_string = false;
                self.escaped = false;
            }
            return None;
        }

        let _ = self.buffer.push(byte);

        if self.escaped {
            // The escaped byte is literal, whatever it is
            self.escaped = false;
            return None;
        }

        match byte {
            b'\\' => self.escaped = true,
            b'"' => self.in_string = !self.in_string,
            b'{' if !self.in_string => self.depth += 1,
            b'}' if !self.in_string => {
                self.depth -= 1;
                if self.depth == 0 {
                    let object = self.buffer.clone();
                    self.reset();
                    return Some(object);
                }
            }
            _ => {}
        }

        None
    }

    /// Feed multiple bytes
    ///
    /// Returns the first complete object found, if any. Bytes after a
    /// completed object are not consumed; callers that may receive
    /// back-to-back objects in one chunk should feed byte-by-byte.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Option<RawObject> {
        for &byte in bytes {
            if let Some(object) = self.feed(byte) {
                return Some(object);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_str(framer: &mut ObjectFramer, input: &str) -> Option<RawObject> {
        framer.feed_bytes(input.as_bytes())
    }

    #[test]
    fn test_simple_object() {
        let mut framer = ObjectFramer::new();
        let object = frame_str(&mut framer, "{\"get\":[\"v\"]}").unwrap();
        assert_eq!(object.as_slice(), b"{\"get\":[\"v\"]}");
    }

    #[test]
    fn test_leading_garbage_discarded() {
        let mut framer = ObjectFramer::new();
        let object = frame_str(&mut framer, "\r\nhello {\"a\":1}").unwrap();
        assert_eq!(object.as_slice(), b"{\"a\":1}");
    }

    #[test]
    fn test_fragmented_delivery() {
        let mut framer = ObjectFramer::new();
        assert!(frame_str(&mut framer, "{\"get\":").is_none());
        assert!(frame_str(&mut framer, "[\"pct\"").is_none());
        let object = frame_str(&mut framer, "]}").unwrap();
        assert_eq!(object.as_slice(), b"{\"get\":[\"pct\"]}");
    }

    #[test]
    fn test_nested_braces() {
        let mut framer = ObjectFramer::new();
        let object = frame_str(&mut framer, "{\"set\":{\"min_v\":20.5}}").unwrap();
        assert_eq!(object.as_slice(), b"{\"set\":{\"min_v\":20.5}}");
    }

    #[test]
    fn test_brace_inside_string_does_not_count() {
        let mut framer = ObjectFramer::new();
        assert!(frame_str(&mut framer, "{\"note\":\"{\"").is_none());
        // The quoted { must not have opened a nesting level
        let object = frame_str(&mut framer, "}").unwrap();
        assert_eq!(object.as_slice(), b"{\"note\":\"{\"}");
    }

    #[test]
    fn test_escaped_quote_then_brace_stays_open() {
        // The \" is literal, so the } after it is still inside the string
        let mut framer = ObjectFramer::new();
        assert!(frame_str(&mut framer, "{\"k\":\"\\\"}").is_none());
        let object = frame_str(&mut framer, "\"}").unwrap();
        assert_eq!(object.as_slice(), b"{\"k\":\"\\\"}\"}");
    }

    #[test]
    fn test_escaped_backslash_does_not_escape_quote() {
        // "x\\" - the second backslash is the escaped byte, the quote after
        // it closes the string normally
        let mut framer = ObjectFramer::new();
        let object = frame_str(&mut framer, "{\"k\":\"x\\\\\"}").unwrap();
        assert_eq!(object.as_slice(), b"{\"k\":\"x\\\\\"}");
    }

    #[test]
    fn test_overflow_resets_and_recovers() {
        let mut framer = ObjectFramer::new();
        framer.feed(b'{');
        for _ in 0..FRAMER_CAPACITY + 16 {
            assert!(framer.feed(b'x').is_none());
        }
        // Never-closed garbage was dropped; the next object frames cleanly
        let object = frame_str(&mut framer, "{\"get\":[\"v\"]}").unwrap();
        assert_eq!(object.as_slice(), b"{\"get\":[\"v\"]}");
    }

    #[test]
    fn test_back_to_back_objects() {
        let mut framer = ObjectFramer::new();
        let mut objects = heapless::Vec::<RawObject, 4>::new();
        for &byte in b"{\"a\":1}{\"b\":2}" {
            if let Some(object) = framer.feed(byte) {
                objects.push(object).unwrap();
            }
        }
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].as_slice(), b"{\"a\":1}");
        assert_eq!(objects[1].as_slice(), b"{\"b\":2}");
    }

    #[test]
    fn test_no_newline_required() {
        let mut framer = ObjectFramer::new();
        assert!(frame_str(&mut framer, "{\"get\":[\"v\"]").is_none());
        assert!(framer.feed(b'}').is_some());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Arbitrary garbage never panics, and a reset framer always
            /// frames the next well-formed object
            #[test]
            fn survives_arbitrary_input(bytes in proptest::collection::vec(any::<u8>(), 0..2048)) {
                let mut framer = ObjectFramer::new();
                for byte in bytes {
                    let _ = framer.feed(byte);
                }
                framer.reset();
                prop_assert!(framer.feed_bytes(b"{\"get\":[\"v\"]}").is_some(), "reset framer must frame a well-formed object");
            }
        }
    }
}
