//! RF Explorer UART Protocol
//!
//! This crate provides types and utilities for communicating with RF Explorer
//! spectrum analyzers over their UART protocol. The protocol is asymmetric:
//!
//! - **Commands** (host → instrument): framed as `'#' <length> <payload>`,
//!   where the length byte counts the framing bytes too
//! - **Replies** (instrument → host): a mix of CR-LF-terminated ASCII lines
//!   (`#C2-F:`, `#Sn`, ...) and binary frames (`$S` sweeps, `$D` screen
//!   dumps, `$P` preset records) whose length is fixed or length-prefixed
//!
//! The crate is transport-agnostic: [`Command::encode`] produces bytes to
//! write, [`FrameDecoder`] turns received bytes into [`Packet`]s. Serial
//! port handling, the read loop, and connection lifecycle live in the
//! `rfexplorer-driver` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use rfexplorer_protocol::{Command, FrameDecoder, Packet};
//!
//! // Build a command
//! let bytes = Command::RequestConfig.encode()?;
//!
//! // Decode replies from received bytes
//! let mut decoder = FrameDecoder::new();
//! decoder.push(&received);
//! while let Some(packet) = decoder.try_decode() {
//!     // ...
//! }
//! ```

mod commands;
mod constants;
mod error;
mod frame;
mod packets;
mod types;

pub use commands::*;
pub use constants::*;
pub use error::*;
pub use frame::*;
pub use packets::*;
pub use types::*;
