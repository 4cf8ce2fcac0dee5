use abysmal_compiler::SourceLine;

use super::get_uncovered_lines;

#[test]
fn fully_covered_lines_are_omitted() {
    let source_map = vec![Some(SourceLine::Single(1)), Some(SourceLine::Single(2))];
    let runs = vec![vec![true, true]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert!(partially_covered.is_empty());
    assert!(uncovered.is_empty());
}

#[test]
fn never_executed_instruction_marks_its_line_uncovered() {
    let source_map = vec![Some(SourceLine::Single(1)), Some(SourceLine::Single(2))];
    let runs = vec![vec![true, false]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert!(partially_covered.is_empty());
    assert_eq!(uncovered, vec![2]);
}

#[test]
fn merging_runs_can_turn_uncovered_into_covered() {
    let source_map = vec![Some(SourceLine::Single(1)), Some(SourceLine::Single(2))];
    let runs = vec![vec![true, false], vec![false, true]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert!(partially_covered.is_empty());
    assert!(uncovered.is_empty());
}

#[test]
fn range_entries_expand_to_every_line_they_span() {
    // A three-line continued statement compiles to two instructions: one
    // executed, one not, both mapping to the same (1, 3) range.
    let source_map = vec![
        Some(SourceLine::Range(1, 3)),
        Some(SourceLine::Range(1, 3)),
    ];
    let runs = vec![vec![true, false]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert_eq!(partially_covered, vec![1, 2, 3]);
    assert!(uncovered.is_empty());
}

#[test]
fn a_line_with_both_a_covered_and_uncovered_instruction_is_partial() {
    let source_map = vec![Some(SourceLine::Single(5)), Some(SourceLine::Single(5))];
    let runs = vec![vec![true, false]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert_eq!(partially_covered, vec![5]);
    assert!(uncovered.is_empty());
}

#[test]
fn synthetic_instructions_with_no_source_line_are_ignored() {
    let source_map = vec![Some(SourceLine::Single(1)), None];
    let runs = vec![vec![false, false]];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &runs);
    assert!(partially_covered.is_empty());
    assert_eq!(uncovered, vec![1]);
}

#[test]
fn no_runs_at_all_means_every_mapped_line_is_uncovered() {
    let source_map = vec![Some(SourceLine::Single(1)), Some(SourceLine::Single(2))];

    let (partially_covered, uncovered) = get_uncovered_lines(&source_map, &[]);
    assert!(partially_covered.is_empty());
    assert_eq!(uncovered, vec![1, 2]);
}
