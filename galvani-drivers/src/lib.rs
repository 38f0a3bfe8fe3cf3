//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in galvani-core:
//!
//! - INA226 bus-voltage/current/power monitor (the only sensor on the node)

#![no_std]
#![deny(unsafe_code)]

pub mod power;
