//! Fuses the per-run coverage vectors a [`abysmal_vm::Machine`] records via
//! `run_with_coverage` into source-line coverage, against the source map a
//! compiled program's front end produces.
//!
//! This is deliberately a tiny, separate crate: the core DSM only ever
//! produces flat per-instruction boolean vectors, and a source map is the
//! sole bridge between those and the line numbers a human cares about.
//! Aggregating many runs' vectors into a single verdict per line is a
//! post-processing concern, not something the executor needs to know about.

use std::collections::BTreeSet;

use abysmal_compiler::SourceMap;

/// Merges `coverage_vectors` (one per program run, each aligned 1:1 with
/// `source_map`) and classifies every source line the map mentions as
/// fully covered (omitted from the result), partially covered, or
/// uncovered.
///
/// A line is partially covered if, across all runs taken together, at
/// least one instruction mapped to it executed and at least one did not.
/// Multi-line statements — source-map entries of the form `Range(start,
/// end)` — expand to their inclusive line range before classification.
///
/// Returns `(partially_covered, uncovered)`, each a sorted, deduplicated
/// list of line numbers.
///
/// # Panics
///
/// Panics in debug builds if any `coverage_vectors` entry's length
/// differs from `source_map.len()` — they must come from runs of the same
/// compiled program.
pub fn get_uncovered_lines(
    source_map: &SourceMap,
    coverage_vectors: &[Vec<bool>],
) -> (Vec<u32>, Vec<u32>) {
    for vector in coverage_vectors {
        debug_assert_eq!(
            vector.len(),
            source_map.len(),
            "coverage vector length must match the source map it was recorded against"
        );
    }

    let mut line_covered: BTreeSet<u32> = BTreeSet::new();
    let mut line_uncovered: BTreeSet<u32> = BTreeSet::new();

    for (index, entry) in source_map.iter().enumerate() {
        let Some(source_line) = entry else {
            continue;
        };
        let executed = coverage_vectors
            .iter()
            .any(|vector| vector.get(index).copied().unwrap_or(false));

        let (start, end) = match *source_line {
            abysmal_compiler::SourceLine::Single(line) => (line, line),
            abysmal_compiler::SourceLine::Range(start, end) => (start, end),
        };
        for line in start..=end {
            if executed {
                line_covered.insert(line);
            } else {
                line_uncovered.insert(line);
            }
        }
    }

    let partially_covered: Vec<u32> = line_covered
        .intersection(&line_uncovered)
        .copied()
        .collect();
    let uncovered: Vec<u32> = line_uncovered.difference(&line_covered).copied().collect();

    (partially_covered, uncovered)
}

#[cfg(test)]
mod test;
