//! Request header folding and response head serialization.

mod header_accumulator;
mod header_encoder;

pub use header_accumulator::HeaderAccumulator;
pub use header_encoder::{HeaderEncoder, ResponseHead};
