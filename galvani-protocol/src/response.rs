//! Reply serialization.
//!
//! Every request gets exactly one reply: a single-line JSON object,
//! comma-separated, no trailing comma, terminated with `\n`. The decimal
//! widths are a compatibility contract with deployed hosts - changing them
//! breaks parsers on the other end of the cable.

use core::fmt::Write;

use heapless::String;

/// Reply buffer capacity in bytes
///
/// A full ten-field query reply is under 200 bytes; 256 leaves headroom.
pub const REPLY_CAPACITY: usize = 256;

/// A serialized reply line
pub type Reply = String<REPLY_CAPACITY>;

/// Decimal places for voltage fields
pub const VOLTS_DECIMALS: usize = 3;
/// Decimal places for current fields
pub const AMPS_DECIMALS: usize = 4;
/// Decimal places for power fields
pub const WATTS_DECIMALS: usize = 4;
/// Decimal places for the charge percentage
pub const PERCENT_DECIMALS: usize = 2;
/// Decimal places for hour fields
pub const HOURS_DECIMALS: usize = 1;

/// Errors that can occur while building a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// Reply exceeded [`REPLY_CAPACITY`]
    Overflow,
}

/// Incremental builder for one reply object
///
/// ```
/// use galvani_protocol::response::{ReplyWriter, VOLTS_DECIMALS};
///
/// let mut writer = ReplyWriter::new();
/// writer.number("v", 25.312, VOLTS_DECIMALS).unwrap();
/// writer.boolean("charging", false).unwrap();
/// assert_eq!(writer.finish().unwrap().as_str(), "{\"v\":25.312,\"charging\":false}\n");
/// ```
#[derive(Debug)]
pub struct ReplyWriter {
    buf: Reply,
    first: bool,
}

impl Default for ReplyWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyWriter {
    /// Start a new reply object
    pub fn new() -> Self {
        let mut buf = Reply::new();
        // Cannot fail, the buffer is empty
        let _ = buf.push('{');
        Self { buf, first: true }
    }

    fn separator(&mut self) -> Result<(), ResponseError> {
        if self.first {
            self.first = false;
            Ok(())
        } else {
            self.buf.push(',').map_err(|_| ResponseError::Overflow)
        }
    }

    /// Emit `"key":<value>` with a fixed number of decimals
    pub fn number(&mut self, key: &str, value: f32, decimals: usize) -> Result<(), ResponseError> {
        self.separator()?;
        write!(self.buf, "\"{}\":{:.*}", key, decimals, value).map_err(|_| ResponseError::Overflow)
    }

    /// Emit `"key":true` / `"key":false`
    pub fn boolean(&mut self, key: &str, value: bool) -> Result<(), ResponseError> {
        self.separator()?;
        write!(self.buf, "\"{}\":{}", key, value).map_err(|_| ResponseError::Overflow)
    }

    /// Emit `"key":"value"`
    ///
    /// The value is written verbatim; callers only pass version tags and
    /// error codes, never host-controlled text.
    pub fn string(&mut self, key: &str, value: &str) -> Result<(), ResponseError> {
        self.separator()?;
        write!(self.buf, "\"{}\":\"{}\"", key, value).map_err(|_| ResponseError::Overflow)
    }

    /// Close the object and terminate the line
    pub fn finish(mut self) -> Result<Reply, ResponseError> {
        self.buf
            .push_str("}\n")
            .map_err(|_| ResponseError::Overflow)?;
        Ok(self.buf)
    }
}

/// Build a bare `{"error":"<code>"}` reply
pub fn error_reply(code: &str) -> Reply {
    let mut writer = ReplyWriter::new();
    if writer.string("error", code).is_ok() {
        if let Ok(reply) = writer.finish() {
            return reply;
        }
    }
    // Unreachable with sane codes; keep the wire alive regardless
    let mut fallback = Reply::new();
    let _ = fallback.push_str("{\"error\":\"bad_request\"}\n");
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_contract() {
        let mut writer = ReplyWriter::new();
        writer.number("v", 25.0, VOLTS_DECIMALS).unwrap();
        writer.number("a", 0.05, AMPS_DECIMALS).unwrap();
        writer.number("w", 1.25, WATTS_DECIMALS).unwrap();
        writer.number("pct", 38.5, PERCENT_DECIMALS).unwrap();
        writer.number("hrs_remaining", 3.8, HOURS_DECIMALS).unwrap();
        let reply = writer.finish().unwrap();
        assert_eq!(
            reply.as_str(),
            "{\"v\":25.000,\"a\":0.0500,\"w\":1.2500,\"pct\":38.50,\"hrs_remaining\":3.8}\n"
        );
    }

    #[test]
    fn test_empty_reply() {
        let reply = ReplyWriter::new().finish().unwrap();
        assert_eq!(reply.as_str(), "{}\n");
    }

    #[test]
    fn test_no_trailing_comma_and_newline() {
        let mut writer = ReplyWriter::new();
        writer.boolean("ok", true).unwrap();
        writer.string("fw", "galvani-0.2.0").unwrap();
        let reply = writer.finish().unwrap();
        assert_eq!(reply.as_str(), "{\"ok\":true,\"fw\":\"galvani-0.2.0\"}\n");
    }

    #[test]
    fn test_error_reply() {
        assert_eq!(
            error_reply("both_get_and_set").as_str(),
            "{\"error\":\"both_get_and_set\"}\n"
        );
    }

    #[test]
    fn test_overflow_reported() {
        let mut writer = ReplyWriter::new();
        let long = [b'x'; REPLY_CAPACITY];
        let long = core::str::from_utf8(&long).unwrap();
        assert_eq!(writer.string("k", long), Err(ResponseError::Overflow));
    }
}
