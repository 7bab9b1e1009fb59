//! Core rate resolution abstractions

pub mod config;
pub mod log;
pub mod rate;
pub mod resolver;
pub mod source;

// Re-export main types for cleaner imports
pub use rate::{CompositeRate, CurrencyPair, Derivation, RateQuote};
pub use resolver::{RateResolver, RateSources, ResolveError};
pub use source::{RateSource, SourceError};
