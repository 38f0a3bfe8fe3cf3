//! Power monitor drivers

pub mod ina226;

pub use ina226::{Ina226, Ina226Config, Ina226Error};
