//! Lockstep comparison of two realizations of the automaton.

use hashbrown::HashSet;
use indicatif::ProgressBar;
use log::{debug, info, warn};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::{
    automata::{CellularAutomaton, TotalValue, ValueAt},
    coords::Coordinates,
    region::{BoundsRegion, Region},
    Error, Result, Value,
};

/// The amount of position mismatches kept in a [`ComparisonReport`]. Any
/// further ones are only counted.
pub const MAX_REPORTED_MISMATCHES: usize = 1000;

/// A position where the two models disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub step: u64,
    pub position: Coordinates,
    pub reference: Value,
    pub candidate: Value,
}

/// A step after which the two models hold different total values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TotalMismatch {
    pub step: u64,
    pub reference: Value,
    pub candidate: Value,
}

#[derive(Debug, Default)]
pub struct ComparisonReport {
    /// The amount of steps both models were advanced.
    pub steps: u64,
    /// The amount of position comparisons performed, over all steps.
    pub positions_checked: u64,
    /// The first [`MAX_REPORTED_MISMATCHES`] position mismatches.
    pub mismatches: Vec<Mismatch>,
    /// The amount of position mismatches, over all steps.
    pub mismatch_count: u64,
    pub total_mismatches: Vec<TotalMismatch>,
    /// Steps after which one model reported a change and the other did not.
    pub activity_mismatches: Vec<u64>,
    mismatched_positions: HashSet<Coordinates>,
}

impl ComparisonReport {
    /// `true` if the models agreed on everything that was compared.
    pub fn is_equivalent(&self) -> bool {
        self.mismatch_count == 0
            && self.total_mismatches.is_empty()
            && self.activity_mismatches.is_empty()
    }

    /// The amount of distinct positions at which the models disagreed at
    /// least once.
    pub fn distinct_positions(&self) -> usize {
        self.mismatched_positions.len()
    }

    fn record(&mut self, mismatches: Vec<Mismatch>) {
        self.mismatch_count += mismatches.len() as u64;
        for mismatch in mismatches {
            self.mismatched_positions.insert(mismatch.position.clone());
            if self.mismatches.len() < MAX_REPORTED_MISMATCHES {
                self.mismatches.push(mismatch);
            }
        }
    }
}

/// Compare the values of `reference` and `candidate` at every position of
/// the box enclosing both.
///
/// Returns the mismatches sorted by position, and the amount of positions
/// compared.
pub fn compare_values<A, B>(
    reference: &A,
    candidate: &B,
    step: u64,
    parallel: bool,
) -> (Vec<Mismatch>, u64)
where
    A: Region + ValueAt + Sync,
    B: Region + ValueAt + Sync,
{
    let positions: Vec<Coordinates> = BoundsRegion::enclosing(reference, candidate)
        .into_positions()
        .collect();

    if positions.is_empty() {
        return (Vec::new(), 0);
    }

    let available_parallelism = if parallel { num_cpus::get() } else { 1 };
    let chunk_size = (positions.len() / available_parallelism) + 1;

    let found = RwLock::new(Vec::new());

    let check_chunk = |chunk: &[Coordinates]| {
        let local: Vec<Mismatch> = chunk
            .iter()
            .filter_map(|c| {
                let expected = reference.value_at(c);
                let actual = candidate.value_at(c);
                (expected != actual).then(|| Mismatch {
                    step,
                    position: c.clone(),
                    reference: expected,
                    candidate: actual,
                })
            })
            .collect();

        if !local.is_empty() {
            found.write().extend(local);
        }
    };

    if parallel {
        positions.par_chunks(chunk_size).for_each(check_chunk);
    } else {
        positions.chunks(chunk_size).for_each(check_chunk);
    }

    let mut found = found.into_inner();
    found.sort_by(|a, b| a.position.cmp(&b.position));

    (found, positions.len() as u64)
}

fn check_state<A, B>(
    report: &mut ComparisonReport,
    reference: &A,
    candidate: &B,
    step: u64,
    parallel: bool,
) where
    A: TotalValue + Sync,
    B: TotalValue + Sync,
{
    let (mismatches, checked) = compare_values(reference, candidate, step, parallel);
    report.positions_checked += checked;

    if !mismatches.is_empty() {
        warn!(
            "{} positions differ after step {step}, first at {}",
            mismatches.len(),
            mismatches[0].position
        );
        report.record(mismatches);
    }

    let expected = reference.total_value();
    let actual = candidate.total_value();
    if expected != actual {
        warn!("Totals differ after step {step}: {expected} != {actual}");
        report.total_mismatches.push(TotalMismatch {
            step,
            reference: expected,
            candidate: actual,
        });
    }
}

/// Step `reference` and `candidate` side by side for up to `steps` steps,
/// comparing every position and the total value before the first step and
/// after each one.
///
/// Stops early once both models report that nothing changed, since neither
/// can change after that. `bar` is advanced once per step.
pub fn compare<A, B>(
    reference: &mut A,
    candidate: &mut B,
    steps: u64,
    parallel: bool,
    bar: &ProgressBar,
) -> Result<ComparisonReport>
where
    A: CellularAutomaton + TotalValue + Sync,
    B: CellularAutomaton + TotalValue + Sync,
{
    if reference.dimension() != candidate.dimension() {
        return Err(Error::DimensionMismatch {
            expected: reference.dimension(),
            got: candidate.dimension(),
        });
    }

    debug!(
        "Comparing {} against {} for {steps} steps",
        candidate.name(),
        reference.name()
    );

    let mut report = ComparisonReport::default();
    check_state(&mut report, reference, candidate, reference.step(), parallel);

    for _ in 0..steps {
        let reference_changed = reference.next_step()?;
        let candidate_changed = candidate.next_step()?;
        let step = reference.step();
        report.steps += 1;

        if reference_changed != candidate_changed {
            warn!(
                "After step {step}, {} reported change {reference_changed} but {} reported {candidate_changed}",
                reference.name(),
                candidate.name()
            );
            report.activity_mismatches.push(step);
        }

        check_state(&mut report, reference, candidate, step, parallel);
        bar.inc(1);

        if !reference_changed && !candidate_changed {
            info!("Both models are stable after step {step}");
            break;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        automata::{SimpleSpreadIntegerValue, SimulationConfig, SpreadIntegerValue},
        coords::PartialCoordinates,
    };

    /// A box of constant value.
    struct Flat {
        radius: isize,
        value: Value,
    }

    impl Region for Flat {
        fn dimension(&self) -> usize {
            2
        }

        fn upper_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
            self.radius
        }

        fn lower_bound(&self, _: usize, _: &PartialCoordinates) -> isize {
            -self.radius
        }
    }

    impl ValueAt for Flat {
        fn value_at(&self, coordinates: &Coordinates) -> Value {
            if coordinates.as_slice().iter().all(|c| c.abs() <= self.radius) {
                self.value
            } else {
                0
            }
        }
    }

    #[test]
    fn values_are_compared_over_the_enclosing_box() {
        let small = Flat { radius: 1, value: 3 };
        let large = Flat { radius: 2, value: 3 };

        let (mismatches, checked) = compare_values(&small, &large, 7, true);

        assert_eq!(checked, 25);
        assert_eq!(mismatches.len(), 25 - 9);
        assert!(mismatches.iter().all(|m| m.step == 7 && m.reference == 0 && m.candidate == 3));
        assert!(mismatches.windows(2).all(|w| w[0].position < w[1].position));
    }

    #[test]
    fn models_agree_in_lockstep() {
        let config = SimulationConfig::new(2, 3_000, 0);
        let mut reference = SimpleSpreadIntegerValue::new(config).unwrap();
        let mut candidate = SpreadIntegerValue::new(config).unwrap();

        let report = compare(&mut reference, &mut candidate, 25, true, &ProgressBar::hidden()).unwrap();

        assert!(report.is_equivalent(), "{:?}", report.mismatches.first());
        assert_eq!(report.distinct_positions(), 0);
        assert!(report.positions_checked > 0);
    }

    #[test]
    fn stable_models_stop_early() {
        let config = SimulationConfig::new(3, 4, 0);
        let mut reference = SimpleSpreadIntegerValue::new(config).unwrap();
        let mut candidate = SpreadIntegerValue::new(config).unwrap();

        let report = compare(&mut reference, &mut candidate, 100, true, &ProgressBar::hidden()).unwrap();

        assert_eq!(report.steps, 1);
        assert!(report.is_equivalent());
    }

    #[test]
    fn different_configurations_are_caught() {
        let mut reference = SimpleSpreadIntegerValue::new(SimulationConfig::new(1, 30, 0)).unwrap();
        let mut candidate = SpreadIntegerValue::new(SimulationConfig::new(1, 31, 0)).unwrap();

        let report = compare(&mut reference, &mut candidate, 3, true, &ProgressBar::hidden()).unwrap();

        assert!(!report.is_equivalent());
        assert!(report.mismatch_count > 0);
        assert_eq!(report.total_mismatches[0].step, 0);
        assert!(report.distinct_positions() > 0);
    }

    #[test]
    fn dimensions_must_match() {
        let mut reference = SimpleSpreadIntegerValue::new(SimulationConfig::new(1, 30, 0)).unwrap();
        let mut candidate = SpreadIntegerValue::new(SimulationConfig::new(2, 30, 0)).unwrap();

        assert!(matches!(
            compare(&mut reference, &mut candidate, 3, true, &ProgressBar::hidden()),
            Err(Error::DimensionMismatch {
                expected: 1,
                got: 2
            })
        ));
    }
}
