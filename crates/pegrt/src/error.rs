//! # Error Types
//!
//! Error taxonomy for the engine.
//!
//! There are exactly three classes of failure:
//!
//! - **Recoverable failures** ([`ParseError::Mismatch`],
//!   [`ParseError::NoAlternative`]): an expected-token mismatch inside an
//!   alternative. The enclosing choice rewinds to its checkpoint and tries
//!   the next alternative. A recoverable failure only surfaces past the
//!   outermost choice when every alternative there failed too.
//! - **Fatal errors** (everything else): malformed internal state, an
//!   out-of-window access, cancellation, or an error propagated from user
//!   semantics. Fatal errors propagate unchanged through every enclosing
//!   choice resolution and are never retried.
//! - **Configuration errors** ([`ConfigError`]): invalid construction
//!   parameters. These fail fast at construction time and never occur
//!   mid-parse.

use compact_str::CompactString;
use thiserror::Error;

/// An error raised while parsing.
///
/// Use [`ParseError::is_recoverable`] to decide between
/// rewind-and-try-next and immediate propagation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Expected-token mismatch inside an alternative.
    #[error("expected {expected} at position {position}")]
    Mismatch {
        position: usize,
        expected: CompactString,
    },

    /// Every alternative of a choice point failed recoverably. `expected`
    /// lists the registered token descriptions in insertion order; kept
    /// structural so a memo replay can restore them.
    #[error("no alternative matched at position {position}: expected {}", .expected.join(", "))]
    NoAlternative {
        position: usize,
        expected: Vec<CompactString>,
    },

    /// Absolute position outside the buffered window: either already
    /// evicted (`position < start`) or not yet appended
    /// (`position >= end`).
    #[error("position {position} is outside the buffered window {start}..{end}")]
    OutOfWindow {
        position: usize,
        start: usize,
        end: usize,
    },

    /// The caller-supplied cancellation token was triggered. Observed at
    /// every choice-point boundary; aborts pending alternatives.
    #[error("parse cancelled")]
    Cancelled,

    /// Anything else, including errors propagated from user semantics.
    #[error("{message}")]
    Fatal { message: String },
}

impl ParseError {
    /// Whether the enclosing choice may swallow this error and try the
    /// next alternative.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Mismatch { .. } | Self::NoAlternative { .. })
    }

    /// Create a fatal error from an arbitrary message.
    #[must_use]
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    /// The input position the error was raised at, when it has one.
    #[must_use]
    pub const fn position(&self) -> Option<usize> {
        match self {
            Self::Mismatch { position, .. }
            | Self::NoAlternative { position, .. }
            | Self::OutOfWindow { position, .. } => Some(*position),
            Self::Cancelled | Self::Fatal { .. } => None,
        }
    }
}

/// Invalid construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A capacity that must be at least 1 was configured as 0.
    #[error("{what} capacity must be at least 1")]
    ZeroCapacity { what: &'static str },
}
