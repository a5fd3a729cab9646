//! RF Explorer Connection Driver
//!
//! Async session management for RF Explorer spectrum analyzers on top of
//! the `rfexplorer-protocol` crate. An [`RfExplorer`] session owns the
//! transport: a background read loop decodes the inbound byte stream into
//! packets, keeps a cache of the latest analyzer configuration, and routes
//! preset-write acknowledgments, while commands are written directly from
//! the session handle.
//!
//! The transport is any [`Transport`] (a serial port handle, or an
//! in-memory pipe in tests); port enumeration and baud configuration are
//! left to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use rfexplorer_driver::RfExplorer;
//!
//! let mut session = RfExplorer::open(port).await?;
//! println!("tuned to {} kHz", session.config().start_freq_khz);
//! while let Some(packet) = session.recv().await {
//!     // ...
//! }
//! ```

mod error;
mod session;
mod transport;

pub use error::*;
pub use session::*;
pub use transport::*;

pub use rfexplorer_protocol as protocol;
