//! Transport abstraction.

use tokio::io::{AsyncRead, AsyncWrite};

/// A bidirectional byte stream carrying the serial link.
///
/// Implemented automatically for any async stream, so a session can run over
/// a real serial port as well as an in-memory pipe in tests.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin + 'static> Transport for T {}
