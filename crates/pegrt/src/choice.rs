//! # Choice Resolution
//!
//! Orchestrates the alternatives of one ordered-choice point,
//! sequentially or with bounded speculative parallelism, always
//! producing PEG-deterministic results: the earliest-registered
//! alternative that matches wins, regardless of wall-clock completion
//! order.
//!
//! ## Overview
//!
//! Generated rule code creates a [`ChoicePoint`] on entering a choice,
//! registers one closure per alternative in grammar source order, and
//! calls [`ChoicePoint::resolve`]. In sequential mode alternatives run
//! in place against the shared [`ParseContext`], with checkpoint/rewind
//! between attempts. In speculative mode (`parallel` feature) every
//! alternative is dispatched to the rayon worker pool against an
//! isolated context snapshot; outcomes are then inspected strictly in
//! registration order and only the winner's snapshot is committed.
//!
//! Every task of a choice point is joined before `resolve` returns, on
//! both the success and the failure path, so no worker threads remain
//! attached to a resolved choice point.

use crate::context::ParseContext;
use crate::error::ParseError;
use crate::support::OrderedSet;
use compact_str::CompactString;
use smallvec::SmallVec;

/// How a choice point evaluates its alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChoiceMode {
    /// Strict left-to-right evaluation with checkpoint/rewind.
    #[default]
    Sequential,
    /// Evaluate all alternatives concurrently on the worker pool, then
    /// pick the earliest-registered success. Observably identical to
    /// [`ChoiceMode::Sequential`].
    Speculative,
}

type BoxedAlternative<'env, T, V> =
    Box<dyn FnOnce(&mut ParseContext<T, V>) -> Result<V, ParseError> + Send + 'env>;

/// One ordered-choice point: an append-only, source-ordered list of
/// alternatives plus the expected-token descriptions for its failure
/// message. Created on entering a choice point, consumed by
/// [`ChoicePoint::resolve`].
pub struct ChoicePoint<'env, T, V> {
    mode: ChoiceMode,
    alternatives: SmallVec<[BoxedAlternative<'env, T, V>; 4]>,
    expected: OrderedSet<CompactString>,
}

impl<'env, T, V> ChoicePoint<'env, T, V>
where
    T: Clone + Send,
    V: Send,
{
    #[must_use]
    pub fn new(mode: ChoiceMode) -> Self {
        Self {
            mode,
            alternatives: SmallVec::new(),
            expected: OrderedSet::new(),
        }
    }

    #[must_use]
    pub fn sequential() -> Self {
        Self::new(ChoiceMode::Sequential)
    }

    #[must_use]
    pub fn speculative() -> Self {
        Self::new(ChoiceMode::Speculative)
    }

    /// Pick the mode from the context's configuration.
    #[must_use]
    pub fn for_context(ctx: &ParseContext<T, V>) -> Self {
        if ctx.speculative_by_default() {
            Self::speculative()
        } else {
            Self::sequential()
        }
    }

    /// Append an alternative. Registration order is grammar source order
    /// and is never reordered.
    pub fn register<F>(&mut self, alternative: F)
    where
        F: FnOnce(&mut ParseContext<T, V>) -> Result<V, ParseError> + Send + 'env,
    {
        self.alternatives.push(Box::new(alternative));
    }

    /// Append a human-readable expected-token description, used only in
    /// the all-alternatives-failed message.
    pub fn expect(&mut self, description: impl Into<CompactString>) {
        self.expected.insert(description.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    #[must_use]
    pub const fn mode(&self) -> ChoiceMode {
        self.mode
    }

    /// Resolve the choice point.
    ///
    /// Returns `Ok(None)` for zero alternatives (epsilon; the caller
    /// decides validity), `Ok(Some(value))` for the earliest-registered
    /// alternative that succeeds, and an error when every alternative
    /// fails recoverably or any inspected alternative fails fatally.
    /// After a failing resolve the context position equals the entry
    /// position exactly.
    pub fn resolve(self, ctx: &mut ParseContext<T, V>) -> Result<Option<V>, ParseError> {
        ctx.check_cancelled()?;
        if self.alternatives.is_empty() {
            return Ok(None);
        }
        match self.mode {
            ChoiceMode::Sequential => Self::resolve_sequential(self.alternatives, &self.expected, ctx),
            ChoiceMode::Speculative => {
                Self::resolve_speculative(self.alternatives, &self.expected, ctx)
            }
        }
    }

    fn no_alternative(expected: &OrderedSet<CompactString>, position: usize) -> ParseError {
        ParseError::NoAlternative {
            position,
            expected: expected.iter().cloned().collect(),
        }
    }

    fn resolve_sequential(
        alternatives: SmallVec<[BoxedAlternative<'env, T, V>; 4]>,
        expected: &OrderedSet<CompactString>,
        ctx: &mut ParseContext<T, V>,
    ) -> Result<Option<V>, ParseError> {
        let entry = ctx.position();
        for alternative in alternatives {
            ctx.check_cancelled()?;
            let checkpoint = ctx.checkpoint();
            match alternative(ctx) {
                Ok(value) => return Ok(Some(value)),
                Err(error) if error.is_recoverable() => ctx.rewind(checkpoint),
                Err(error) => {
                    // Restore the entry position so the fatal path leaves
                    // the context in the same state as speculative mode,
                    // which discards the failing branch's snapshot.
                    ctx.rewind(checkpoint);
                    return Err(error);
                }
            }
        }
        Err(Self::no_alternative(expected, entry))
    }

    /// Dispatch every alternative to the rayon pool against an isolated
    /// snapshot, each writing its outcome into a per-alternative slot.
    /// The scope joins all tasks through work-stealing, so resolution
    /// never blocks a pool worker on another task; nested speculative
    /// choice points and single-thread pools make progress. Outcomes are
    /// then inspected strictly in registration order: the first success
    /// commits its snapshot, a fatal error propagates, and a success or
    /// fatal at index `i` cuts off not-yet-started tasks registered
    /// after `i`.
    #[cfg(feature = "parallel")]
    fn resolve_speculative(
        alternatives: SmallVec<[BoxedAlternative<'env, T, V>; 4]>,
        expected: &OrderedSet<CompactString>,
        ctx: &mut ParseContext<T, V>,
    ) -> Result<Option<V>, ParseError> {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let entry = ctx.position();
        // Lowest registration index that produced a success or a fatal
        // error. Alternatives registered after it cannot win.
        let decided = AtomicUsize::new(usize::MAX);
        let tasks: Vec<(usize, BoxedAlternative<'env, T, V>, ParseContext<T, V>)> = alternatives
            .into_iter()
            .enumerate()
            .map(|(index, alternative)| (index, alternative, ctx.speculate()))
            .collect();
        let mut outcomes: Vec<Option<(Result<V, ParseError>, ParseContext<T, V>)>> =
            Vec::with_capacity(tasks.len());
        outcomes.resize_with(tasks.len(), || None);

        rayon::scope(|scope| {
            for ((index, alternative, mut branch), slot) in
                tasks.into_iter().zip(outcomes.iter_mut())
            {
                let decided = &decided;
                scope.spawn(move |_| {
                    // A slot left `None` marks a task cut off by an
                    // earlier decision or by cancellation.
                    if decided.load(Ordering::Acquire) < index || branch.is_cancelled() {
                        return;
                    }
                    let outcome = alternative(&mut branch);
                    if !matches!(&outcome, Err(error) if error.is_recoverable()) {
                        decided.fetch_min(index, Ordering::AcqRel);
                    }
                    *slot = Some((outcome, branch));
                });
            }
        });

        for outcome in outcomes {
            match outcome {
                Some((Ok(value), branch)) => {
                    ctx.commit(branch);
                    return Ok(Some(value));
                }
                Some((Err(error), branch)) if error.is_recoverable() => {
                    ctx.absorb_failure(&branch);
                }
                Some((Err(error), _)) => return Err(error),
                // Inspection reaches an unwritten slot only when every
                // earlier task failed recoverably, so the skip came from
                // cancellation, not from a cut-off.
                None => return Err(ParseError::Cancelled),
            }
        }
        Err(Self::no_alternative(expected, entry))
    }

    /// Without the `parallel` feature, speculative mode degrades to the
    /// sequential loop; results are identical by construction.
    #[cfg(not(feature = "parallel"))]
    fn resolve_speculative(
        alternatives: SmallVec<[BoxedAlternative<'env, T, V>; 4]>,
        expected: &OrderedSet<CompactString>,
        ctx: &mut ParseContext<T, V>,
    ) -> Result<Option<V>, ParseError> {
        Self::resolve_sequential(alternatives, expected, ctx)
    }
}

impl<T, V> std::fmt::Debug for ChoicePoint<'_, T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoicePoint")
            .field("mode", &self.mode)
            .field("alternatives", &self.alternatives.len())
            .field("expected", &self.expected)
            .finish()
    }
}

impl<T, V> Default for ChoicePoint<'_, T, V>
where
    T: Clone + Send,
    V: Send,
{
    fn default() -> Self {
        Self::sequential()
    }
}
