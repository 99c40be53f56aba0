//! Utility macros and helpers shared by the codec and connection modules.

use bytes::{BufMut, BytesMut};
use std::io;

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
///
/// ```ignore
/// ensure!(headers.len() < max_headers, ParseError::too_many_headers(max_headers));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// `io::Write` adapter over a [`BytesMut`], so `write!` can format straight
/// into an output buffer.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl io::Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
