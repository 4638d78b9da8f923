//! Parse-context integration tests
//!
//! Exercises the cursor/window interplay, cut/commit, failure
//! bookkeeping, memo sharing across parses, and memo eviction under a
//! small capacity.

use pegrt::{MemoEntry, ParseConfig, ParseContext, ParseError, RuleId};
use std::sync::Arc;

type Ctx = ParseContext<u8, u32>;

fn context_with(input: &[u8], config: &ParseConfig) -> Ctx {
    let mut ctx = Ctx::new(config).unwrap();
    for b in input {
        ctx.append(*b);
    }
    ctx
}

#[test]
fn test_accept_advances_on_match() {
    let mut ctx = context_with(b"7a", &ParseConfig::default());
    assert_eq!(ctx.accept("digit", u8::is_ascii_digit), Ok(b'7'));
    assert_eq!(ctx.position(), 1);
    let error = ctx.accept("digit", u8::is_ascii_digit).unwrap_err();
    assert_eq!(
        error,
        ParseError::Mismatch {
            position: 1,
            expected: "digit".into(),
        }
    );
    // Failed accepts never advance.
    assert_eq!(ctx.position(), 1);
}

#[test]
fn test_accept_at_end_of_input_is_recoverable() {
    let mut ctx = context_with(b"1", &ParseConfig::default());
    ctx.accept("digit", u8::is_ascii_digit).unwrap();
    let error = ctx.accept("digit", u8::is_ascii_digit).unwrap_err();
    assert!(error.is_recoverable());
    assert_eq!(error.position(), Some(1));
}

#[test]
fn test_reading_evicted_position_is_fatal() {
    let config = ParseConfig {
        buffer_capacity: 2,
        ..ParseConfig::default()
    };
    let mut ctx = context_with(b"abc", &config);
    // Position 0 was evicted when 'c' arrived; the cursor still points
    // there, so the failure is not an ordinary mismatch.
    let error = ctx.accept("letter", u8::is_ascii_alphabetic).unwrap_err();
    assert!(matches!(
        error,
        ParseError::OutOfWindow {
            position: 0,
            start: 1,
            end: 3,
        }
    ));
    assert!(!error.is_recoverable());
}

#[test]
fn test_cut_discards_window_and_forbids_rewind() {
    let mut ctx = context_with(b"ab", &ParseConfig::default());
    ctx.accept("a", |b| *b == b'a').unwrap();
    ctx.accept("b", |b| *b == b'b').unwrap();
    ctx.cut();
    assert_eq!(ctx.window().len(), 0);
    assert_eq!(ctx.window().start(), 2);

    // A checkpoint taken after the cut carries the advanced window
    // start, so pre-cut positions stay unreachable through it.
    let checkpoint = ctx.checkpoint();
    ctx.append(b'c');
    ctx.rewind(checkpoint);
    assert_eq!(ctx.position(), 2);
    assert!(ctx.window().read(0).is_err());
    assert!(ctx.window().read(1).is_err());
}

#[test]
fn test_failure_report_lists_expected_in_order() {
    let mut ctx = context_with(b"x", &ParseConfig::default());
    let _ = ctx.accept("digit", u8::is_ascii_digit);
    let _ = ctx.accept("sign", |b| *b == b'+' || *b == b'-');
    let report = ctx.failure_report();
    assert_eq!(
        report,
        ParseError::NoAlternative {
            position: 0,
            expected: vec!["digit".into(), "sign".into()],
        }
    );
    assert_eq!(
        report.to_string(),
        "no alternative matched at position 0: expected digit, sign"
    );
}

#[test]
fn test_deeper_failure_clears_shallower_expectations() {
    let mut ctx = context_with(b"ax", &ParseConfig::default());
    let _ = ctx.accept("digit", u8::is_ascii_digit);
    ctx.accept("letter", u8::is_ascii_alphabetic).unwrap();
    let _ = ctx.accept("digit", u8::is_ascii_digit);
    assert_eq!(ctx.furthest_failure(), 1);
    assert_eq!(ctx.expected().join(", "), "digit");
}

#[test]
fn test_memo_shared_across_parses() {
    let config = ParseConfig::default();
    let mut first = context_with(b"a", &config);
    first
        .memoize(RuleId(1), |ctx| {
            ctx.accept("a", |b| *b == b'a')?;
            Ok(1u32)
        })
        .unwrap();

    let memo = Arc::clone(first.memo());
    let mut second =
        Ctx::with_shared_memo(&config, memo, pegrt::CancelToken::new()).unwrap();
    second.append(b'z');
    // Replays the recorded outcome without touching the new input.
    let value = second
        .memoize(RuleId(1), |_| panic!("body must not run"))
        .unwrap();
    assert_eq!(value, 1);
    assert_eq!(second.position(), 1);
}

#[test]
fn test_memo_eviction_under_pressure() {
    let config = ParseConfig {
        cache_capacity: 2,
        ..ParseConfig::default()
    };
    let mut ctx = context_with(b"aaaa", &config);
    for rule in 0..4u32 {
        ctx.memoize(RuleId(rule), |ctx| {
            ctx.accept("a", |b| *b == b'a')?;
            Ok(rule)
        })
        .unwrap();
    }
    let memo = ctx.memo().lock().unwrap();
    assert_eq!(memo.len(), 2);
    assert_eq!(memo.stats().evictions, 2);
    assert!(memo.capacity() >= memo.len());
}

#[test]
fn test_fatal_outcome_is_not_memoized() {
    let mut ctx = context_with(b"a", &ParseConfig::default());
    let error = ctx
        .memoize(RuleId(9), |_| -> Result<u32, ParseError> {
            Err(ParseError::fatal("boom"))
        })
        .unwrap_err();
    assert!(!error.is_recoverable());

    let memo = ctx.memo().lock().unwrap();
    assert!(memo.is_empty());
}

#[test]
fn test_memo_records_end_position() {
    let mut ctx = context_with(b"ab", &ParseConfig::default());
    ctx.memoize(RuleId(2), |ctx| {
        ctx.accept("a", |b| *b == b'a')?;
        ctx.accept("b", |b| *b == b'b')?;
        Ok(2u32)
    })
    .unwrap();

    let memo = ctx.memo().lock().unwrap();
    let entries: Vec<_> = memo.iter().collect();
    assert_eq!(entries.len(), 1);
    let (key, entry) = entries[0];
    assert_eq!(key.rule, RuleId(2));
    assert_eq!(key.position, 0);
    assert_eq!(
        *entry,
        MemoEntry::Success {
            value: 2,
            end_pos: 2,
        }
    );
}

#[test]
fn test_zero_capacity_config_rejected() {
    let config = ParseConfig {
        buffer_capacity: 0,
        ..ParseConfig::default()
    };
    assert!(Ctx::new(&config).is_err());

    let config = ParseConfig {
        cache_capacity: 0,
        ..ParseConfig::default()
    };
    assert!(Ctx::new(&config).is_err());
}
