use std::{path::PathBuf, time::Duration};

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::Level;
use sivsim::{
    automata::{FrontierPolicy, SimulationConfig},
    snapshot::{self, Snapshot},
    Value,
};

mod simulate;
use simulate::{compare, resume, run};

fn finish_bar(bar: &ProgressBar, duration: Duration, steps: u64, stable: bool) {
    let time = duration.as_micros();
    let secs = time / 1_000_000;
    let micros = time % 1_000_000;

    if let Some(len) = bar.length() {
        let pos_width = format!("{}", len).len();

        let template = format!(
            "[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos:>{pos_width}}}/{{len}} {{msg}}"
        );

        if let Ok(style) = ProgressStyle::with_template(&template) {
            bar.set_style(style.progress_chars("#>-"));
        }
    }

    let state = if stable { "stable" } else { "still toppling" };
    bar.finish_with_message(format!(
        "Done! Reached step {steps} ({state}) in {secs}.{micros:06} s"
    ));
}

fn unknown_bar() -> ProgressBar {
    let template = "[{elapsed_precise}] [{spinner:10.cyan/blue}] {pos} {msg}";

    let bar = ProgressBar::new_spinner();

    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.tick_strings(&[
            ">---------",
            "=>--------",
            "<=>-------",
            "-<=>------",
            "--<=>-----",
            "---<=>----",
            "----<=>---",
            "-----<=>--",
            "------<=>-",
            "-------<=>",
            "--------<=",
            "---------<",
            "--------<=",
            "-------<=>",
            "------<=>-",
            "-----<=>--",
            "---<=>----",
            "--<=>-----",
            "-<=>------",
            "<=>-------",
            "=>--------",
        ]));
    }

    bar.enable_steady_tick(Duration::from_millis(66));

    bar
}

pub fn make_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);

    let pos_width = format!("{len}").len();

    let template =
        format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos:>{pos_width}}}/{{len}} {{msg}} remaining: [{{eta_precise}}]");

    if let Ok(style) = ProgressStyle::with_template(&template) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

#[derive(Clone, Parser)]
#[clap(version, about = "Simulate the spread integer value automaton on Z^n")]
pub struct Cli {
    /// Log more. Repeat for more detail.
    #[clap(long, short, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[clap(long, short, global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Opts,
}

#[derive(Clone, Subcommand)]
pub enum Opts {
    /// Simulate the automaton from a single value at the origin
    Run(RunOpts),
    /// Step the full grid and the symmetry reduced model side by side and
    /// check that they agree
    Compare(CompareOpts),
    /// Perform operations on snapshot files
    #[clap(subcommand)]
    Snapshot(SnapshotCommands),
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ModelChoice {
    /// Store one cell per symmetry orbit
    Symmetric,
    /// Store every cell of the grid
    Full,
}

#[derive(Clone, Args)]
pub struct ConfigOpts {
    /// The value of every position other than the origin.
    #[clap(long, short, default_value_t = 0, allow_negative_numbers = true)]
    pub background: Value,

    /// Never grow the grid. Value flowing past its edge is lost.
    #[clap(long, short)]
    pub fixed_frontier: bool,
}

impl ConfigOpts {
    fn config(&self, dimension: usize, initial_value: Value) -> SimulationConfig {
        let frontier = if self.fixed_frontier {
            FrontierPolicy::Fixed
        } else {
            FrontierPolicy::Grow
        };

        SimulationConfig::new(dimension, initial_value, self.background).with_frontier(frontier)
    }
}

#[derive(Clone, Args)]
pub struct OutputOpts {
    /// Stop after this many steps instead of at the first stable state.
    #[clap(long, short)]
    pub steps: Option<u64>,

    /// Write a snapshot of the final state to this path.
    #[clap(long)]
    pub backup: Option<PathBuf>,

    /// Compression of the written snapshot
    #[clap(long, short = 'z', value_enum, default_value = "gzip")]
    pub compression: Compression,

    /// Print the section through the origin spanned by axes 0 and 1.
    #[clap(long)]
    pub section: bool,
}

#[derive(Clone, Args)]
pub struct RunOpts {
    /// The dimension of the lattice.
    pub dimension: usize,

    /// The value placed at the origin.
    #[clap(allow_negative_numbers = true)]
    pub initial_value: Value,

    #[clap(long, short, value_enum, default_value = "symmetric")]
    pub model: ModelChoice,

    #[clap(flatten)]
    pub config: ConfigOpts,

    #[clap(flatten)]
    pub output: OutputOpts,
}

#[derive(Clone, Args)]
pub struct CompareOpts {
    /// The value placed at the origin.
    #[clap(allow_negative_numbers = true)]
    pub initial_value: Value,

    /// The dimensions to compare in.
    #[clap(long, short, default_values_t = vec![1, 2, 3])]
    pub dimension: Vec<usize>,

    /// The maximum amount of steps to compare.
    #[clap(long, short, default_value_t = 100)]
    pub steps: u64,

    /// Disable parallelism.
    #[clap(long, short = 'p')]
    pub no_parallelism: bool,

    #[clap(flatten)]
    pub config: ConfigOpts,
}

#[derive(Clone, Subcommand)]
pub enum SnapshotCommands {
    /// Print the header of snapshot files
    Info {
        #[clap(required = true)]
        path: Vec<String>,
    },
    /// Continue the simulation stored in a snapshot file
    Resume(ResumeOpts),
}

#[derive(Clone, Args)]
pub struct ResumeOpts {
    /// The path of the snapshot file to resume from
    pub path: String,

    #[clap(flatten)]
    pub output: OutputOpts,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Compression {
    None,
    Gzip,
}

impl From<Compression> for snapshot::Compression {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => snapshot::Compression::None,
            Compression::Gzip => snapshot::Compression::Gzip,
        }
    }
}

fn info(path: &str) {
    let snapshot = match Snapshot::read_file(path) {
        Ok(s) => s,
        Err(e) => {
            println!("Failed to open file. {e}");
            std::process::exit(1);
        }
    };

    let config = snapshot.config;

    println!();
    println!("Info for {path}");
    println!("Model: {}", snapshot.kind.name());
    println!("Dimension: {}", config.dimension);
    println!("Initial value: {}", config.initial_value);
    println!("Background value: {}", config.background_value);
    println!("Frontier: {}", config.frontier);
    println!("Step: {}", snapshot.step);
    println!("Side: {}", snapshot.side);
    println!("Stored cells: {}", snapshot.values.len());
    println!("Discarded value: {}", snapshot.discarded);
    println!(
        "Grows before next step: {}",
        if snapshot.bounds_reached { "yes" } else { "no" }
    );
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::Error,
        (false, 0) => Level::Warn,
        (false, 1) => Level::Info,
        (false, 2) => Level::Debug,
        (false, _) => Level::Trace,
    };

    if let Err(e) = simple_logger::init_with_level(level) {
        println!("Failed to initialize logging. {e}");
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Opts::Run(r) => run(&r),
        Opts::Compare(c) => compare(&c),
        Opts::Snapshot(SnapshotCommands::Info { path }) => {
            path.iter().map(String::as_str).for_each(info)
        }
        Opts::Snapshot(SnapshotCommands::Resume(r)) => resume(&r),
    }
}
