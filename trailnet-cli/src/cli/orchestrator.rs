//! Batch processing of experiment directories.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};
use trailnet_core::{CancellationToken, NodeId, Pipeline, Refinement, TrailnetError};
use trailnet_providers_cache::{ArtifactStore, RefinementCache, RefinementParameters};
use trailnet_providers_experiment::{ExperimentFile, ExperimentProviderError, discover};

use super::summary::SummaryRow;

/// Failure confined to a single experiment file.
#[derive(Debug, Error)]
pub enum FileError {
    /// The bundle could not be loaded.
    #[error(transparent)]
    Load(#[from] ExperimentProviderError),
    /// A pipeline stage failed.
    #[error(transparent)]
    Pipeline(#[from] TrailnetError),
}

/// An experiment that could not be analysed.
#[derive(Debug)]
pub struct FileFailure {
    /// Path of the offending bundle.
    pub path: PathBuf,
    /// Why it failed.
    pub error: FileError,
}

/// Rows and failures gathered over a directory.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One row per analysed (file, level) pair, in path then level order.
    pub rows: Vec<SummaryRow>,
    /// Files skipped because of malformed input or stage failures.
    pub failures: Vec<FileFailure>,
}

/// Drives the pipeline over experiment files, reusing cached refinements
/// where a complete cache exists.
#[derive(Debug)]
pub struct ExperimentOrchestrator<S> {
    pipeline: Pipeline,
    cache: Option<RefinementCache<S>>,
}

impl<S: ArtifactStore> ExperimentOrchestrator<S> {
    /// Creates an orchestrator; `cache` of `None` recomputes everything and
    /// publishes nothing.
    #[must_use]
    pub const fn new(pipeline: Pipeline, cache: Option<RefinementCache<S>>) -> Self {
        Self { pipeline, cache }
    }

    /// Returns the configured pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Analyses every experiment bundle in `dir`, in path order.
    ///
    /// Per-file failures are logged and collected; the batch carries on.
    ///
    /// # Errors
    /// Returns [`ExperimentProviderError`] wrapped in [`FileError::Load`]
    /// when `dir` cannot be listed, and [`TrailnetError::Cancelled`] wrapped
    /// in [`FileError::Pipeline`] once `cancel` fires.
    #[instrument(
        name = "cli.process_directory",
        err,
        skip(self, dir, cancel),
        fields(dir = %dir.display(), files = field::Empty),
    )]
    pub fn process_directory(
        &self,
        dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, FileError> {
        let paths = discover(dir)?;
        Span::current().record("files", paths.len());

        let mut outcome = BatchOutcome::default();
        for path in paths {
            cancel.check()?;
            match self.process_file(&path, cancel) {
                Ok(rows) => outcome.rows.extend(rows),
                Err(FileError::Pipeline(TrailnetError::Cancelled)) => {
                    return Err(TrailnetError::Cancelled.into());
                }
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "experiment skipped");
                    outcome.failures.push(FileFailure { path, error });
                }
            }
        }
        info!(
            rows = outcome.rows.len(),
            failures = outcome.failures.len(),
            "directory processed"
        );
        Ok(outcome)
    }

    /// Analyses one experiment bundle, one row per proximity level.
    ///
    /// # Errors
    /// Returns [`FileError`] when the bundle is unusable, a stage fails, or
    /// `cancel` fires.
    #[instrument(
        name = "cli.process_file",
        err,
        skip(self, path, cancel),
        fields(path = %path.display(), cache = field::Empty),
    )]
    pub fn process_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<SummaryRow>, FileError> {
        let file = ExperimentFile::open(path)?;
        let experiment = file.experiment();
        let stations = experiment.stations();
        let refinement = self.refinement(&file, &stations, cancel)?;

        let metadata = experiment.metadata();
        let mut rows = Vec::with_capacity(refinement.subgraphs().len());
        for subgraph in refinement.subgraphs() {
            let level = self.pipeline.analyse(subgraph, &stations, cancel)?;
            let report = level.report();
            rows.push(SummaryRow {
                experiment: file.name(),
                proximity_level: level.level(),
                start_x: metadata.start_position.x,
                start_y: metadata.start_position.y,
                seed: metadata.seed,
                cost: report.cost,
                mean_travel_time: report.mean_travel_time,
                vulnerability: report.vulnerability,
                connected: report.connected,
            });
        }
        Ok(rows)
    }

    fn refinement(
        &self,
        file: &ExperimentFile,
        stations: &[NodeId],
        cancel: &CancellationToken,
    ) -> Result<Refinement, TrailnetError> {
        let levels = self.pipeline.proximity_levels();
        let parameters = RefinementParameters {
            neighbours: self.pipeline.neighbours().get(),
            max_water_crossings: self.pipeline.max_water_crossings(),
            stations: stations.len(),
        };
        let span = Span::current();
        if let Some(cache) = &self.cache {
            match cache.load(file.path(), &parameters, stations, levels) {
                Ok(Some(refinement)) => {
                    span.record("cache", "hit");
                    return Ok(refinement);
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "cache unreadable; recomputing"),
            }
        }
        span.record("cache", if self.cache.is_some() { "miss" } else { "off" });

        let mesh = self.pipeline.build_mesh(file.experiment())?;
        let refinement = self.pipeline.refine(&mesh, stations, cancel)?;
        if let Some(cache) = &self.cache
            && let Err(err) = cache.store(file.path(), &parameters, &refinement)
        {
            warn!(error = %err, "failed to cache refinement");
        }
        Ok(refinement)
    }
}
