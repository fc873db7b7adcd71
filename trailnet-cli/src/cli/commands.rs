//! Command implementations and argument parsing for the trailnet CLI.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::{Span, field, info, instrument};
use trailnet_core::{
    CancellationToken, DEFAULT_MAX_WATER_CROSSINGS, DEFAULT_NEIGHBOURS, DEFAULT_PROXIMITY_LEVELS,
    ExecutionStrategy, Pipeline, PipelineBuilder, TrailnetError,
};
use trailnet_providers_cache::{FsArtifactStore, RefinementCache};
use trailnet_providers_experiment::ExperimentProviderError;

use super::orchestrator::{ExperimentOrchestrator, FileError, FileFailure};
use super::summary::{DEFAULT_SUMMARY_FILE, SummaryError, SummaryRow, render_rows, write_summary};

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "trailnet",
    about = "Extract and score station networks from foraging-trail experiments."
)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Analyse every experiment bundle in a directory and write a summary.
    Run(RunCommand),
    /// Analyse a single experiment bundle and print its rows.
    Analyse(AnalyseCommand),
}

/// Pipeline options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct PipelineArgs {
    /// Neighbourhood size of the proximity mesh, counting the point itself.
    #[arg(long, default_value_t = DEFAULT_NEIGHBOURS)]
    pub neighbours: usize,

    /// Invalid raster cells a mesh edge may cross before it is pruned.
    #[arg(long = "max-water-crossings", default_value_t = DEFAULT_MAX_WATER_CROSSINGS)]
    pub max_water_crossings: usize,

    /// Comma-separated proximity levels to analyse.
    #[arg(
        long = "proximity-levels",
        value_delimiter = ',',
        default_values_t = DEFAULT_PROXIMITY_LEVELS,
    )]
    pub proximity_levels: Vec<usize>,

    /// Recompute refinements without reading or writing cache files.
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Execution strategy: `auto`, `sequential` or `parallel`.
    #[arg(long, default_value = "auto")]
    pub strategy: ExecutionStrategy,
}

impl PipelineArgs {
    fn build(&self) -> Result<Pipeline, TrailnetError> {
        PipelineBuilder::new()
            .with_neighbours(self.neighbours)
            .with_max_water_crossings(self.max_water_crossings)
            .with_proximity_levels(self.proximity_levels.iter().copied())
            .with_execution_strategy(self.strategy)
            .build()
    }

    fn orchestrator(&self) -> Result<ExperimentOrchestrator<FsArtifactStore>, TrailnetError> {
        let cache = (!self.no_cache).then(|| RefinementCache::new(FsArtifactStore));
        Ok(ExperimentOrchestrator::new(self.build()?, cache))
    }
}

/// Options accepted by the `run` command.
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Directory holding the experiment bundles.
    pub dir: PathBuf,

    /// Summary destination (defaults to `<DIR>/summary.parquet`).
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pipeline configuration.
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Options accepted by the `analyse` command.
#[derive(Debug, Args, Clone)]
pub struct AnalyseCommand {
    /// Experiment bundle to analyse.
    pub file: PathBuf,

    /// Pipeline configuration.
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration or a pipeline stage failed, including cancellation.
    #[error(transparent)]
    Core(#[from] TrailnetError),
    /// An experiment bundle or directory could not be read.
    #[error(transparent)]
    Experiment(#[from] ExperimentProviderError),
    /// The summary table could not be written.
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

impl From<FileError> for CliError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::Load(source) => Self::Experiment(source),
            FileError::Pipeline(source) => Self::Core(source),
        }
    }
}

/// Summarises the outcome of executing a CLI command.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    /// Rows in experiment then level order.
    pub rows: Vec<SummaryRow>,
    /// Experiments skipped during a `run`.
    pub failures: Vec<FileFailure>,
    /// Where the summary table was written, if anywhere.
    pub output: Option<PathBuf>,
}

/// Executes the CLI command represented by `cli`, stopping early once
/// `cancel` fires.
///
/// # Errors
/// Returns [`CliError`] when configuration is invalid, a fatal stage fails,
/// or the run is cancelled.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use trailnet_cli::cli::{Cli, run_cli};
/// # use trailnet_core::CancellationToken;
/// # use trailnet_test_support::fixtures::BundleFixture;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// BundleFixture::river_crossing().write(dir.path(), "river.json")?;
/// let cli = Cli::try_parse_from(["trailnet", "run", &dir.path().display().to_string()])?;
/// let summary = run_cli(cli, &CancellationToken::new())?;
/// assert_eq!(summary.rows.len(), 3);
/// assert!(dir.path().join("summary.parquet").is_file());
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli, cancel),
    fields(command = field::Empty),
)]
pub fn run_cli(cli: Cli, cancel: &CancellationToken) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    match cli.command {
        Command::Run(run) => {
            span.record("command", "run");
            run_command(run, cancel)
        }
        Command::Analyse(analyse) => {
            span.record("command", "analyse");
            analyse_command(analyse, cancel)
        }
    }
}

#[instrument(
    name = "cli.execute",
    err,
    skip(command, cancel),
    fields(dir = %command.dir.display(), cache = !command.pipeline.no_cache),
)]
pub(super) fn run_command(
    command: RunCommand,
    cancel: &CancellationToken,
) -> Result<ExecutionSummary, CliError> {
    let orchestrator = command.pipeline.orchestrator()?;
    let outcome = orchestrator.process_directory(&command.dir, cancel)?;
    let output = summary_path(&command.dir, command.output.as_deref());
    write_summary(&output, &outcome.rows)?;
    info!(
        rows = outcome.rows.len(),
        failures = outcome.failures.len(),
        output = %output.display(),
        "command completed"
    );
    Ok(ExecutionSummary {
        rows: outcome.rows,
        failures: outcome.failures,
        output: Some(output),
    })
}

#[instrument(
    name = "cli.analyse",
    err,
    skip(command, cancel),
    fields(path = %command.file.display()),
)]
pub(super) fn analyse_command(
    command: AnalyseCommand,
    cancel: &CancellationToken,
) -> Result<ExecutionSummary, CliError> {
    let orchestrator = command.pipeline.orchestrator()?;
    let rows = orchestrator.process_file(&command.file, cancel)?;
    info!(rows = rows.len(), "command completed");
    Ok(ExecutionSummary {
        rows,
        ..ExecutionSummary::default()
    })
}

pub(super) fn summary_path(dir: &Path, output: Option<&Path>) -> PathBuf {
    output.map_or_else(|| dir.join(DEFAULT_SUMMARY_FILE), Path::to_path_buf)
}

/// Renders `summary` to `writer`: a tab-separated table of rows, then one
/// line per skipped experiment.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use trailnet_cli::cli::{ExecutionSummary, SummaryRow, render_summary};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = ExecutionSummary {
///     rows: vec![SummaryRow {
///         experiment: "a.json".into(),
///         proximity_level: 1,
///         start_x: 2.0,
///         start_y: 3.0,
///         seed: 7,
///         cost: 4.0,
///         mean_travel_time: 4.0,
///         vulnerability: 0.0,
///         connected: true,
///     }],
///     ..ExecutionSummary::default()
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer)?;
/// assert_eq!(text.lines().nth(1), Some("a.json\t1\t2\t3\t7\t4.000000\t4.000000\t0.000000\ttrue"));
/// # Ok(())
/// # }
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    render_rows(&summary.rows, &mut writer)?;
    for failure in &summary.failures {
        writeln!(
            writer,
            "failed\t{}\t{}",
            failure.path.display(),
            failure.error
        )?;
    }
    if let Some(output) = &summary.output {
        writeln!(writer, "summary written to {}", output.display())?;
    }
    Ok(())
}
