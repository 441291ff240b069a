use crate::plan::LineRange;

use super::super::buffer::FileBuffer;
use super::super::hunks::apply_hunks;
use super::super::{ApplyConfig, WhitespaceMode};
use super::{addition, context, deletion, exact_config, hunk};

fn buffer_of(lines: &[&str]) -> FileBuffer {
    FileBuffer {
        lines: lines.iter().map(|line| line.to_string()).collect(),
        has_trailing_newline: true,
    }
}

#[test]
fn unique_match_is_replaced_in_place() {
    let mut buffer = buffer_of(&["alpha", "beta", "gamma"]);
    let hunks = vec![hunk(vec![context("alpha"), deletion("beta"), addition("BETA")])];

    apply_hunks(&hunks, &mut buffer, &exact_config()).expect("hunk should apply");
    assert_eq!(buffer.lines, vec!["alpha", "BETA", "gamma"]);
}

#[test]
fn header_old_range_preempts_the_scan_for_repeated_runs() {
    let mut buffer = buffer_of(&["foo", "bar", "baz", "bar", "qux"]);
    let mut edit = hunk(vec![deletion("bar"), addition("BAR")]);
    edit.old_range = Some(LineRange { start: 4, len: 1 });
    edit.new_range = Some(LineRange { start: 4, len: 1 });

    apply_hunks(&[edit], &mut buffer, &exact_config()).expect("header should disambiguate");
    assert_eq!(buffer.lines, vec!["foo", "bar", "baz", "BAR", "qux"]);
}

#[test]
fn header_old_range_pointing_at_a_mismatch_falls_back_to_the_scan() {
    let mut buffer = buffer_of(&["foo", "bar", "baz"]);
    let mut edit = hunk(vec![deletion("baz"), addition("BAZ")]);
    edit.old_range = Some(LineRange { start: 1, len: 1 });
    edit.new_range = Some(LineRange { start: 1, len: 1 });

    apply_hunks(&[edit], &mut buffer, &exact_config()).expect("scan should find the line");
    assert_eq!(buffer.lines, vec!["foo", "bar", "BAZ"]);
}

#[test]
fn repeated_match_without_a_header_is_ambiguous() {
    let mut buffer = buffer_of(&["beta", "beta", "beta", "beta", "beta", "beta"]);
    let hunks = vec![hunk(vec![deletion("beta"), addition("gamma")])];

    let error =
        apply_hunks(&hunks, &mut buffer, &exact_config()).expect_err("match should be ambiguous");
    assert!(error.to_string().contains("ambiguous hunk match"));
    assert_eq!(buffer.lines.len(), 6, "buffer must be left untouched");
}

#[test]
fn missing_context_is_a_context_mismatch() {
    let mut buffer = buffer_of(&["alpha", "beta"]);
    let hunks = vec![hunk(vec![context("nope"), deletion("beta"), addition("BETA")])];

    let error = apply_hunks(&hunks, &mut buffer, &exact_config()).expect_err("context should miss");
    assert!(error.to_string().contains("context mismatch"));
}

#[test]
fn context_tolerance_sheds_stale_leading_context() {
    let mut buffer = buffer_of(&["changed", "beta", "gamma"]);
    let hunks = vec![hunk(vec![
        context("original"),
        deletion("beta"),
        addition("BETA"),
    ])];

    let strict = apply_hunks(&hunks, &mut buffer.clone(), &exact_config());
    assert!(strict.is_err(), "zero tolerance should fail");

    let tolerant = ApplyConfig {
        whitespace: WhitespaceMode::Exact,
        context_tolerance: 1,
    };
    apply_hunks(&hunks, &mut buffer, &tolerant).expect("one trimmed context should match");
    assert_eq!(buffer.lines, vec!["changed", "BETA", "gamma"]);
}

#[test]
fn context_tolerance_sheds_stale_trailing_context() {
    let mut buffer = buffer_of(&["alpha", "beta", "changed"]);
    let hunks = vec![hunk(vec![
        context("alpha"),
        deletion("beta"),
        addition("BETA"),
        context("original"),
    ])];

    let tolerant = ApplyConfig {
        whitespace: WhitespaceMode::Exact,
        context_tolerance: 1,
    };
    apply_hunks(&hunks, &mut buffer, &tolerant).expect("one trimmed context should match");
    assert_eq!(buffer.lines, vec!["alpha", "BETA", "changed"]);
}

#[test]
fn tolerance_never_sheds_deletions() {
    let mut buffer = buffer_of(&["alpha", "gamma"]);
    let hunks = vec![hunk(vec![deletion("missing"), addition("added")])];

    let tolerant = ApplyConfig {
        whitespace: WhitespaceMode::Exact,
        context_tolerance: 4,
    };
    let error = apply_hunks(&hunks, &mut buffer, &tolerant)
        .expect_err("a deletion can never be trimmed away");
    assert!(error.to_string().contains("context mismatch"));
}

#[test]
fn equal_total_trims_shed_the_trailing_context_first() {
    // With tolerance 1 both the (lead 0, trail 1) and (lead 1, trail 0)
    // variants match this buffer, at different positions. The tie-break on
    // smaller leading trim decides which edit happens.
    let mut buffer = buffer_of(&["lead", "beta", "zzz", "beta", "tail"]);
    let hunks = vec![hunk(vec![
        context("lead"),
        deletion("beta"),
        addition("BETA"),
        context("tail"),
    ])];

    let tolerant = ApplyConfig {
        whitespace: WhitespaceMode::Exact,
        context_tolerance: 1,
    };
    apply_hunks(&hunks, &mut buffer, &tolerant).expect("a trimmed variant should match");
    assert_eq!(buffer.lines, vec!["lead", "BETA", "zzz", "beta", "tail"]);
}

#[test]
fn ignore_all_whitespace_matches_reindented_lines() {
    let mut buffer = buffer_of(&["    fn main() {", "        old();", "    }"]);
    let hunks = vec![hunk(vec![
        context("fn main() {"),
        deletion("old();"),
        addition("new();"),
        context("}"),
    ])];

    let loose = ApplyConfig {
        whitespace: WhitespaceMode::IgnoreAll,
        context_tolerance: 0,
    };
    apply_hunks(&hunks, &mut buffer, &loose).expect("whitespace should be ignored");
    // The replacement sequence is taken from the hunk as-is, so matched
    // context lines end up with the hunk's spelling of their whitespace.
    assert_eq!(buffer.lines, vec!["fn main() {", "new();", "}"]);
}

#[test]
fn pure_insertion_lands_at_the_new_range_position() {
    let mut buffer = buffer_of(&["one", "two", "three"]);
    let mut insert = hunk(vec![addition("inserted")]);
    insert.new_range = Some(LineRange { start: 2, len: 1 });

    apply_hunks(&[insert], &mut buffer, &exact_config()).expect("insertion should apply");
    assert_eq!(buffer.lines, vec!["one", "inserted", "two", "three"]);
}

#[test]
fn pure_insertion_without_ranges_appends_to_the_end() {
    let mut buffer = buffer_of(&["one", "two"]);
    let hunks = vec![hunk(vec![addition("three")])];

    apply_hunks(&hunks, &mut buffer, &exact_config()).expect("append should apply");
    assert_eq!(buffer.lines, vec!["one", "two", "three"]);
}

#[test]
fn hunks_apply_sequentially_against_the_updated_buffer() {
    let mut buffer = buffer_of(&["a", "b", "c", "d"]);
    let hunks = vec![
        hunk(vec![deletion("a"), addition("A")]),
        hunk(vec![context("A"), deletion("b"), addition("B")]),
    ];

    apply_hunks(&hunks, &mut buffer, &exact_config()).expect("both hunks should apply");
    assert_eq!(buffer.lines, vec!["A", "B", "c", "d"]);
}
