//! Modbus to UDP bridge.
//!
//! This bridge polls holding registers from one Modbus device (RTU/serial or
//! TCP) and forwards each poll cycle as a single UDP text line.
//!
//! # Wire format
//!
//! ```text
//! <unix seconds>|<name>:<value>|<name>:<value>...
//! ```
//!
//! Fields are ordered by register name.

pub mod config;
pub mod reader;
pub mod sender;
