//! Host query protocol for the Galvani power monitor
//!
//! The host talks to the node over a raw byte stream (USB CDC in practice)
//! with one JSON-style object per request and one per reply:
//!
//! ```text
//! -> {"get":["v","pct","charging"]}
//! <- {"v":25.312,"pct":38.51,"charging":false}
//! -> {"set":{"min_v":20.5,"max_v":31.8}}
//! <- {"ok":true,"min_v":20.500,"max_v":31.800,"hrs_capacity":10.0}
//! ```
//!
//! Requests carry no delimiter beyond balanced braces; replies are a single
//! line terminated with `\n`. This crate owns the three stream-facing
//! pieces:
//!
//! - [`framer`] - extracts one complete object at a time from the stream,
//!   tolerant of fragmentation and arbitrary inter-byte delays
//! - [`request`] - classifies a framed object as a query or a configure and
//!   extracts the named fields
//! - [`response`] - serializes a reply object with the fixed decimal
//!   formatting existing hosts depend on

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod framer;
pub mod request;
pub mod response;

pub use framer::{ObjectFramer, RawObject, FRAMER_CAPACITY};
pub use request::{parse, ConfigUpdate, FieldSet, QueryField, Request, RequestError};
pub use response::{Reply, ReplyWriter, ResponseError, REPLY_CAPACITY};
