//! Vocabulary handling: normalized words and the pool boards are seeded from.

/// Vocabulary loading and unique word draws.
pub mod pool;
mod word;

pub use pool::{WordPool, WordPoolError};
pub use word::Word;
pub(crate) use word::normalize;
