//! # Pegrt
//!
//! The runtime engine for generated PEG parsers: ordered-choice
//! resolution (sequential or speculatively parallel), a bounded sliding
//! window over the input, and a bounded packrat memo table.
//!
//! ## Overview
//!
//! Code generated from a grammar drives this engine. It provides:
//!
//! - **Ordered choice**: [`ChoicePoint`] resolves alternatives with PEG
//!   leftmost-determinism in both evaluation modes
//! - **Speculative parallelism**: alternatives run concurrently on the
//!   rayon pool (feature `parallel`), observably identical to the
//!   sequential mode
//! - **Bounded input window**: [`WindowBuffer`] keeps backtracking
//!   memory constant on long or streaming input, with cut/commit
//! - **Packrat memoization**: [`BoundedCache`] records `(rule, position)`
//!   outcomes and evicts in insertion order
//!
//! ## Quick Start
//!
//! A hand-driven choice point over character input, the same shape a
//! generated rule body takes:
//!
//! ```rust
//! use pegrt::{ChoicePoint, ParseConfig, ParseContext};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ctx = ParseContext::<char, char>::new(&ParseConfig::default())?;
//! for c in "x7".chars() {
//!     ctx.append(c);
//! }
//!
//! // letter / digit, tried in order
//! let mut choice = ChoicePoint::sequential();
//! choice.expect("letter");
//! choice.register(|ctx: &mut ParseContext<char, char>| {
//!     ctx.accept("letter", |c| c.is_ascii_alphabetic())
//! });
//! choice.expect("digit");
//! choice.register(|ctx: &mut ParseContext<char, char>| {
//!     ctx.accept("digit", |c| c.is_ascii_digit())
//! });
//!
//! let value = choice.resolve(&mut ctx)?;
//! assert_eq!(value, Some('x'));
//! assert_eq!(ctx.position(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `parallel` (default): speculative choice resolution via rayon.
//!   Without it, [`ChoiceMode::Speculative`] degrades to the sequential
//!   loop with identical results.

pub mod buffer;
pub mod cache;
pub mod choice;
pub mod context;
pub mod error;
pub mod support;

pub use buffer::WindowBuffer;
pub use cache::{BoundedCache, CacheStats, MemoCache, MemoEntry, MemoKey, RuleId};
pub use choice::{ChoiceMode, ChoicePoint};
pub use context::{CancelToken, Checkpoint, ParseConfig, ParseContext};
pub use error::{ConfigError, ParseError};
pub use support::{OrderedSet, Slot};
