use std::time::Instant;

use sivsim::{
    automata::{CellularAutomaton, SimpleSpreadIntegerValue, SpreadIntegerValue, TotalValue},
    compare::compare as compare_models,
    cross_section::CrossSection2D,
    snapshot::{ModelKind, Persistent, Snapshot},
    Result,
};

use crate::{
    finish_bar, make_bar, unknown_bar, CompareOpts, ModelChoice, OutputOpts, ResumeOpts, RunOpts,
};

fn exit_with(msg: &str) -> ! {
    println!("{msg}");
    std::process::exit(1);
}

fn print_section<M>(model: &M)
where
    M: TotalValue,
{
    if model.dimension() == 1 {
        let line: Vec<String> = model
            .positions()
            .map(|c| model.value_at(&c).to_string())
            .collect();
        println!("{}", line.join(" "));
        return;
    }

    match CrossSection2D::through_origin(model, 0, 1) {
        Ok(section) => print!("{}", section.render_text()),
        Err(e) => println!("Cannot print section. {e}"),
    }
}

/// Step `model` until it is stable or `output.steps` steps were taken, then
/// report on and optionally save the final state.
fn simulate<M>(mut model: M, output: &OutputOpts)
where
    M: CellularAutomaton + TotalValue + Persistent,
{
    let bar = match output.steps {
        Some(steps) => make_bar(steps),
        None => unknown_bar(),
    };
    bar.set_message(format!("steps of {}", model.sub_folder_path()));

    let start = Instant::now();
    let mut taken = 0;
    let mut stable = false;

    while output.steps.map_or(true, |steps| taken < steps) {
        match model.next_step() {
            Ok(true) => {}
            Ok(false) => {
                stable = true;
                bar.inc(1);
                break;
            }
            Err(e) => {
                bar.abandon();
                exit_with(&format!("Step {} failed. Error: {e}", model.step() + 1));
            }
        }

        taken += 1;
        bar.inc(1);
    }

    finish_bar(&bar, start.elapsed(), model.step(), stable);

    println!("Total value: {}", model.total_value());

    if let Some(path) = &output.backup {
        println!("Saving snapshot of step {} to {}", model.step(), path.display());
        if let Err(e) = model.snapshot().write_file(output.compression.into(), path) {
            exit_with(&format!("Failed to write snapshot. Error: {e}"));
        }
    }

    if output.section {
        print_section(&model);
    }
}

fn unwrap_or_exit<T>(result: Result<T>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => exit_with(&format!("Error: {e}")),
    }
}

pub fn run(opts: &RunOpts) {
    let config = opts.config.config(opts.dimension, opts.initial_value);

    match opts.model {
        ModelChoice::Symmetric => {
            let model = unwrap_or_exit(SpreadIntegerValue::new(config));
            simulate(model, &opts.output)
        }
        ModelChoice::Full => {
            let model = unwrap_or_exit(SimpleSpreadIntegerValue::new(config));
            simulate(model, &opts.output)
        }
    }
}

pub fn resume(opts: &ResumeOpts) {
    let snapshot = unwrap_or_exit(Snapshot::read_file(&opts.path));

    println!(
        "Resuming {} model from step {}",
        snapshot.kind.name(),
        snapshot.step
    );

    match snapshot.kind {
        ModelKind::Reduced => {
            let model = unwrap_or_exit(SpreadIntegerValue::from_snapshot(snapshot));
            simulate(model, &opts.output)
        }
        ModelKind::FullGrid => {
            let model = unwrap_or_exit(SimpleSpreadIntegerValue::from_snapshot(snapshot));
            simulate(model, &opts.output)
        }
    }
}

pub fn compare(opts: &CompareOpts) {
    let mut all_equivalent = true;

    for &dimension in &opts.dimension {
        let config = opts.config.config(dimension, opts.initial_value);

        let mut reference = unwrap_or_exit(SimpleSpreadIntegerValue::new(config));
        let mut candidate = unwrap_or_exit(SpreadIntegerValue::new(config));

        let bar = make_bar(opts.steps);
        bar.set_message(format!("steps compared in {dimension}D"));

        let start = Instant::now();
        let report = unwrap_or_exit(compare_models(
            &mut reference,
            &mut candidate,
            opts.steps,
            !opts.no_parallelism,
            &bar,
        ));

        finish_bar(&bar, start.elapsed(), report.steps, report.steps < opts.steps);

        println!(
            "{dimension}D: {} positions checked over {} steps, final side {}",
            report.positions_checked,
            report.steps,
            candidate.side()
        );

        if report.is_equivalent() {
            println!("{dimension}D: models agree");
            continue;
        }

        all_equivalent = false;
        println!(
            "{dimension}D: {} mismatches at {} distinct positions, {} total mismatches",
            report.mismatch_count,
            report.distinct_positions(),
            report.total_mismatches.len()
        );

        for mismatch in report.mismatches.iter().take(10) {
            println!(
                "  step {} at {}: full grid {}, reduced {}",
                mismatch.step, mismatch.position, mismatch.reference, mismatch.candidate
            );
        }
    }

    if !all_equivalent {
        std::process::exit(1);
    }
}
