//! Application request handlers.
//!
//! A handler receives every complete request of every connection as an
//! [`Exchange`] and builds the response through it. The handler value is also
//! where application state lives: the server shares it between connections
//! behind an `Arc`, see [`Server::handler`](crate::server::Server::handler).
//!
//! Implement [`Handler`] for async handlers, or wrap a plain closure with
//! [`make_handler`]:
//!
//! ```
//! use micro_h1::handler::{Handler, make_handler};
//! use micro_h1::connection::Exchange;
//!
//! let hello = make_handler(|exchange: &mut Exchange<'_>| {
//!     exchange.write("hello world");
//! });
//!
//! struct Counter(std::sync::atomic::AtomicUsize);
//!
//! impl Handler for Counter {
//!     async fn call(&self, exchange: &mut Exchange<'_>) {
//!         let n = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         write!(exchange, "request #{n}");
//!     }
//! }
//! ```

use bytes::Bytes;
use futures::Stream;

use crate::connection::Exchange;

#[trait_variant::make(Handler: Send)]
pub trait LocalHandler {
    /// Handles one request. Returning without ending or streaming the
    /// response ends it as it is.
    async fn call(&self, exchange: &mut Exchange<'_>);
}

/// A [`Handler`] calling a synchronous closure.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Exchange<'_>) + Send + Sync,
{
    async fn call(&self, exchange: &mut Exchange<'_>) {
        (self.f)(exchange);
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut Exchange<'_>) + Send + Sync,
{
    HandlerFn { f }
}

/// Adapts a closure producing one chunk per call into a generator for
/// [`Exchange::stream`]. Returning an empty chunk ends the stream.
///
/// ```
/// use bytes::Bytes;
/// use micro_h1::handler::generator_fn;
///
/// let mut left = 3;
/// let generator = generator_fn(move || {
///     if left == 0 {
///         return Bytes::new();
///     }
///     left -= 1;
///     Bytes::from_static(b"tick\n")
/// });
/// # drop(generator);
/// ```
pub fn generator_fn<F>(f: F) -> impl Stream<Item = Bytes> + Send + 'static
where
    F: FnMut() -> Bytes + Send + 'static,
{
    futures::stream::repeat_with(f)
}
