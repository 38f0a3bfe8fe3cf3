//! Firmware tasks
//!
//! Two tasks only: the USB device event loop and the serve loop. All
//! application state lives in the serve loop's dispatcher.

pub mod serve;
pub mod usb;
