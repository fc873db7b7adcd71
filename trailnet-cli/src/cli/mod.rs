//! Command-line interface orchestration for trailnet.
//!
//! `run` analyses a directory of experiment bundles, caching refinements next
//! to each bundle and writing a Parquet summary; `analyse` handles one bundle.

mod commands;
mod orchestrator;
mod summary;

pub use commands::{
    AnalyseCommand, Cli, CliError, Command, ExecutionSummary, PipelineArgs, RunCommand,
    render_summary, run_cli,
};
pub use orchestrator::{BatchOutcome, ExperimentOrchestrator, FileError, FileFailure};
pub use summary::{
    DEFAULT_SUMMARY_FILE, SummaryError, SummaryRow, render_rows, summary_schema, to_record_batch,
    write_summary,
};
