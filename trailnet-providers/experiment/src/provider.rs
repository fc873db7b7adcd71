//! Loading experiment bundles from disk.

use std::{
    fs::{self, File},
    io::{BufReader, Read},
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};
use trailnet_core::ExperimentResult;

use crate::{bundle::ExperimentBundle, errors::ExperimentProviderError};

const BUNDLE_EXTENSION: &str = "json";
const CACHE_SUFFIXES: [&str; 2] = [".distances.json", ".params.json"];

/// An experiment loaded from a bundle file.
#[derive(Debug, Clone)]
pub struct ExperimentFile {
    path: PathBuf,
    experiment: ExperimentResult,
}

impl ExperimentFile {
    /// Reads and validates the bundle at `path`.
    ///
    /// # Errors
    /// Returns [`ExperimentProviderError::Read`] when the file cannot be
    /// opened, [`ExperimentProviderError::Malformed`] when a field is missing
    /// or mistyped, and [`ExperimentProviderError::Invalid`] when the arrays
    /// fail validation.
    #[instrument(
        name = "provider.experiment.open",
        err,
        skip(path),
        fields(path = %path.as_ref().display()),
    )]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExperimentProviderError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ExperimentProviderError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path, BufReader::new(file))
    }

    /// Parses a bundle from `reader`, labelling errors and the result with
    /// `path`.
    ///
    /// # Errors
    /// Returns [`ExperimentProviderError::Malformed`] or
    /// [`ExperimentProviderError::Invalid`] as for [`Self::open`].
    ///
    /// # Examples
    /// ```
    /// use trailnet_providers_experiment::ExperimentFile;
    ///
    /// let json = r#"{
    ///     "all_trails": null,
    ///     "nuclei": [[0.0, 0.0], [3.0, 4.0]],
    ///     "stations": [[1.0, 1.0]],
    ///     "map_with_stations": [[1, 1], [1, 0]],
    ///     "start_pos": [1.0, 1.0],
    ///     "seed": 11
    /// }"#;
    /// let file = ExperimentFile::from_reader("demo.json", json.as_bytes())?;
    /// assert_eq!(file.name(), "demo.json");
    /// assert_eq!(file.experiment().point_count(), 2);
    /// assert_eq!(file.experiment().metadata().seed, 11);
    /// # Ok::<(), trailnet_providers_experiment::ExperimentProviderError>(())
    /// ```
    pub fn from_reader<R: Read>(
        path: impl AsRef<Path>,
        reader: R,
    ) -> Result<Self, ExperimentProviderError> {
        let path = path.as_ref().to_path_buf();
        let bundle: ExperimentBundle = match serde_json::from_reader(reader) {
            Ok(bundle) => bundle,
            Err(source) => return Err(ExperimentProviderError::Malformed { path, source }),
        };
        let experiment = match bundle.into_experiment() {
            Ok(experiment) => experiment,
            Err(source) => return Err(ExperimentProviderError::Invalid { path, source }),
        };
        debug!(
            points = experiment.point_count(),
            stations = experiment.station_indices().len(),
            "experiment bundle loaded"
        );
        Ok(Self { path, experiment })
    }

    /// Returns the bundle's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the bundle's file name, used to label summary rows.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    /// Returns the loaded experiment.
    #[must_use]
    pub fn experiment(&self) -> &ExperimentResult {
        &self.experiment
    }

    /// Consumes the file, returning the experiment.
    #[must_use]
    pub fn into_experiment(self) -> ExperimentResult {
        self.experiment
    }
}

/// Returns `true` for paths that look like experiment bundles: `*.json`
/// files that are neither hidden nor refinement cache artifacts.
#[must_use]
pub fn is_experiment_bundle(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    !name.starts_with('.')
        && !CACHE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        && path.extension().is_some_and(|ext| ext == BUNDLE_EXTENSION)
}

/// Lists the experiment bundles directly inside `dir`, sorted by path.
///
/// # Errors
/// Returns [`ExperimentProviderError::ListDirectory`] when `dir` cannot be
/// read.
#[instrument(name = "provider.experiment.discover", err, skip(dir), fields(dir = %dir.display()))]
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, ExperimentProviderError> {
    let list_error = |source: std::io::Error| ExperimentProviderError::ListDirectory {
        dir: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let path = entry.path();
        if path.is_file() && is_experiment_bundle(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    debug!(found = paths.len(), "experiment bundles discovered");
    Ok(paths)
}
