//! # Parse Context
//!
//! Per-invocation mutable parse state: the cursor, the input window, the
//! shared memo table, furthest-failure bookkeeping, and the cancellation
//! token.
//!
//! ## Ownership under speculation
//!
//! A `ParseContext` is exclusively owned by one top-level parse.
//! Concurrent speculative alternatives never touch the shared instance:
//! each gets an isolated [`ParseContext::speculate`] snapshot (private
//! cursor and window, shared memo handle and cancel token), and only the
//! winning branch is merged back through [`ParseContext::commit`]. The
//! memo table is shared through `Arc<Mutex<_>>`; the lock is held only
//! for individual lookups and stores, never across rule bodies.

use crate::buffer::WindowBuffer;
use crate::cache::{BoundedCache, MemoCache, MemoEntry, MemoKey, RuleId};
use crate::error::{ConfigError, ParseError};
use crate::support::OrderedSet;
use compact_str::CompactString;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Engine configuration.
///
/// Capacities must be at least 1; construction fails fast otherwise.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Resolve choice points speculatively by default. Individual choice
    /// points may still pick a mode explicitly.
    pub parallel: bool,
    /// Maximum number of buffered input elements.
    pub buffer_capacity: usize,
    /// Maximum number of memo entries.
    pub cache_capacity: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            buffer_capacity: 4096,
            cache_capacity: 5000,
        }
    }
}

/// Caller-supplied cancellation signal, observed at every choice-point
/// boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A saved cursor/window state that a failing alternative rewinds to.
#[derive(Debug, Clone)]
pub struct Checkpoint<T> {
    pos: usize,
    window: WindowBuffer<T>,
    rule_depth: usize,
}

impl<T> Checkpoint<T> {
    /// The absolute position the checkpoint was taken at.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }
}

/// Mutable state for one top-level parse.
///
/// `T` is the buffered input element (typically a token or byte); `V` is
/// the semantic value generated rule bodies produce and the memo table
/// records.
pub struct ParseContext<T, V> {
    pos: usize,
    window: WindowBuffer<T>,
    memo: Arc<Mutex<MemoCache<V>>>,
    furthest: usize,
    expected: OrderedSet<CompactString>,
    rule_stack: Vec<RuleId>,
    cancel: CancelToken,
    parallel: bool,
}

impl<T, V> ParseContext<T, V> {
    /// Create a context with a fresh memo table and cancel token.
    pub fn new(config: &ParseConfig) -> Result<Self, ConfigError> {
        Self::with_cancel(config, CancelToken::new())
    }

    /// Create a context observing a caller-supplied cancellation token.
    pub fn with_cancel(config: &ParseConfig, cancel: CancelToken) -> Result<Self, ConfigError> {
        let memo = Arc::new(Mutex::new(BoundedCache::new(config.cache_capacity)?));
        Self::with_shared_memo(config, memo, cancel)
    }

    /// Create a context sharing an existing memo table, e.g. across
    /// successive parses over the same input.
    pub fn with_shared_memo(
        config: &ParseConfig,
        memo: Arc<Mutex<MemoCache<V>>>,
        cancel: CancelToken,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            pos: 0,
            window: WindowBuffer::new(config.buffer_capacity)?,
            memo,
            furthest: 0,
            expected: OrderedSet::new(),
            rule_stack: Vec::new(),
            cancel,
            parallel: config.parallel,
        })
    }

    /// Current absolute position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn window(&self) -> &WindowBuffer<T> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut WindowBuffer<T> {
        &mut self.window
    }

    /// Append one element to the input window.
    pub fn append(&mut self, item: T) {
        self.window.append(item);
    }

    /// Read the element under the cursor.
    pub fn peek(&self) -> Result<&T, ParseError> {
        self.window.read(self.pos)
    }

    /// Read the element under the cursor and advance past it.
    pub fn bump(&mut self) -> Result<T, ParseError>
    where
        T: Clone,
    {
        let item = self.window.read(self.pos)?.clone();
        self.pos += 1;
        Ok(item)
    }

    /// Cut/commit: discard all buffered elements. No rewind before the
    /// current end of input is possible afterwards.
    pub fn cut(&mut self) {
        self.window.flush();
    }

    /// Match the element under the cursor against a predicate. On a
    /// match the cursor advances; otherwise a recoverable failure is
    /// recorded against the furthest-failure bookkeeping. Running out of
    /// buffered input (cursor at the window end) is a recoverable
    /// failure too; reading an evicted position is fatal.
    pub fn accept<P>(&mut self, expected: impl Into<CompactString>, matches: P) -> Result<T, ParseError>
    where
        T: Clone,
        P: FnOnce(&T) -> bool,
    {
        let position = self.pos;
        let probed: Result<Option<T>, ParseError> = match self.window.read(position) {
            Ok(item) => Ok(matches(item).then(|| item.clone())),
            Err(error) => Err(error),
        };
        match probed {
            Ok(Some(item)) => {
                self.pos += 1;
                Ok(item)
            }
            Ok(None) => Err(self.fail(expected)),
            Err(_) if position >= self.window.end() => Err(self.fail(expected)),
            Err(error) => Err(error),
        }
    }

    /// Record a recoverable expected-token mismatch at the cursor and
    /// return it.
    pub fn fail(&mut self, expected: impl Into<CompactString>) -> ParseError {
        let expected = expected.into();
        self.note_expected(self.pos, expected.clone());
        ParseError::Mismatch {
            position: self.pos,
            expected,
        }
    }

    fn note_expected(&mut self, position: usize, description: CompactString) {
        if position > self.furthest {
            self.furthest = position;
            self.expected.clear();
        }
        if position == self.furthest {
            self.expected.insert(description);
        }
    }

    /// Deepest position any recoverable failure was recorded at.
    #[must_use]
    pub const fn furthest_failure(&self) -> usize {
        self.furthest
    }

    /// Expected-token descriptions collected at the furthest failure, in
    /// insertion order.
    #[must_use]
    pub const fn expected(&self) -> &OrderedSet<CompactString> {
        &self.expected
    }

    /// Total-parse failure report: the deepest position reached and the
    /// expected descriptions collected there, joined in insertion order.
    #[must_use]
    pub fn failure_report(&self) -> ParseError {
        ParseError::NoAlternative {
            position: self.furthest,
            expected: self.expected.iter().cloned().collect(),
        }
    }

    /// Snapshot the cursor and window for a later rewind.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint<T>
    where
        T: Clone,
    {
        Checkpoint {
            pos: self.pos,
            window: self.window.clone(),
            rule_depth: self.rule_stack.len(),
        }
    }

    /// Restore cursor and window to a checkpoint. Furthest-failure
    /// bookkeeping deliberately survives the rewind so error reports
    /// still describe the deepest attempt.
    pub fn rewind(&mut self, checkpoint: Checkpoint<T>) {
        self.pos = checkpoint.pos;
        self.window = checkpoint.window;
        self.rule_stack.truncate(checkpoint.rule_depth);
    }

    /// Isolated snapshot for one speculative alternative: private cursor,
    /// window, rule stack and failure bookkeeping; shared memo table and
    /// cancel token.
    #[must_use]
    pub fn speculate(&self) -> Self
    where
        T: Clone,
    {
        Self {
            pos: self.pos,
            window: self.window.clone(),
            memo: Arc::clone(&self.memo),
            furthest: self.furthest,
            expected: self.expected.clone(),
            rule_stack: self.rule_stack.clone(),
            cancel: self.cancel.clone(),
            parallel: self.parallel,
        }
    }

    /// Merge the winning branch's state delta into this context: adopt
    /// its cursor, window and rule stack, and merge its failure
    /// bookkeeping the same way [`ParseContext::absorb_failure`] does.
    /// The winner's snapshot predates any loser bookkeeping absorbed
    /// here in the meantime, so assignment would lose it.
    pub fn commit(&mut self, winner: Self) {
        self.pos = winner.pos;
        self.window = winner.window;
        self.rule_stack = winner.rule_stack;
        if winner.furthest > self.furthest {
            self.furthest = winner.furthest;
            self.expected = winner.expected;
        } else if winner.furthest == self.furthest {
            self.expected.extend(winner.expected);
        }
    }

    /// Merge only the failure bookkeeping of a losing branch, keeping
    /// speculative error reports identical to sequential ones. Called in
    /// registration order.
    pub fn absorb_failure(&mut self, branch: &Self) {
        if branch.furthest > self.furthest {
            self.furthest = branch.furthest;
            self.expected = branch.expected.clone();
        } else if branch.furthest == self.furthest {
            self.expected.extend(branch.expected.iter().cloned());
        }
    }

    /// Packrat wrapper: replay the recorded outcome for
    /// `(rule, position)` if present, otherwise run `body` and record its
    /// outcome. Fatal errors are never memoized. The memo lock is not
    /// held while `body` runs.
    pub fn memoize<F>(&mut self, rule: RuleId, body: F) -> Result<V, ParseError>
    where
        V: Clone,
        F: FnOnce(&mut Self) -> Result<V, ParseError>,
    {
        let key = MemoKey {
            rule,
            position: self.pos,
        };
        let replay = {
            let mut memo = self.memo_guard();
            memo.get(&key).cloned()
        };
        if let Some(entry) = replay {
            match entry {
                MemoEntry::Success { value, end_pos } => {
                    self.pos = end_pos;
                    return Ok(value);
                }
                MemoEntry::Failure(error) => {
                    // Replay restores the bookkeeping the original
                    // derivation produced, so failure reports do not
                    // depend on whether the memo hit.
                    match &error {
                        ParseError::Mismatch { position, expected } => {
                            self.note_expected(*position, expected.clone());
                        }
                        ParseError::NoAlternative { position, expected } => {
                            for description in expected {
                                self.note_expected(*position, description.clone());
                            }
                        }
                        _ => {}
                    }
                    return Err(error);
                }
            }
        }

        self.rule_stack.push(rule);
        let outcome = body(self);
        self.rule_stack.pop();

        match &outcome {
            Ok(value) => self.memo_guard().set(
                key,
                MemoEntry::Success {
                    value: value.clone(),
                    end_pos: self.pos,
                },
            ),
            Err(error) if error.is_recoverable() => {
                self.memo_guard().set(key, MemoEntry::Failure(error.clone()));
            }
            Err(_) => {}
        }
        outcome
    }

    /// Caller-observable cancellation check.
    pub fn check_cancelled(&self) -> Result<(), ParseError> {
        if self.cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }
        Ok(())
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Rule currently being memoized, if any.
    #[must_use]
    pub fn current_rule(&self) -> Option<RuleId> {
        self.rule_stack.last().copied()
    }

    /// Active-rule stack, outermost first.
    #[must_use]
    pub fn rule_stack(&self) -> &[RuleId] {
        &self.rule_stack
    }

    /// Handle to the shared memo table, e.g. for reuse across parses.
    #[must_use]
    pub fn memo(&self) -> &Arc<Mutex<MemoCache<V>>> {
        &self.memo
    }

    /// Whether choice points default to speculative resolution.
    #[must_use]
    pub const fn speculative_by_default(&self) -> bool {
        self.parallel
    }

    fn memo_guard(&self) -> MutexGuard<'_, MemoCache<V>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug, V> fmt::Debug for ParseContext<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseContext")
            .field("pos", &self.pos)
            .field("window", &self.window)
            .field("furthest", &self.furthest)
            .field("expected", &self.expected)
            .field("rule_stack", &self.rule_stack)
            .finish_non_exhaustive()
    }
}
