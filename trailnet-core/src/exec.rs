//! Sequential and Rayon-backed fan-out used by the pipeline stages.
//!
//! Both backends preserve input order in their output so results do not
//! depend on thread scheduling.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Backend {
    Sequential,
    #[cfg(feature = "parallel")]
    Parallel,
}

impl Default for Backend {
    fn default() -> Self {
        #[cfg(feature = "parallel")]
        {
            Self::Parallel
        }
        #[cfg(not(feature = "parallel"))]
        {
            Self::Sequential
        }
    }
}

impl Backend {
    pub(crate) fn map<I, T, F>(self, items: &[I], task: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Send + Sync,
    {
        match self {
            Self::Sequential => items.iter().map(task).collect(),
            #[cfg(feature = "parallel")]
            Self::Parallel => items.par_iter().map(task).collect(),
        }
    }

    /// Like [`Self::map`] but stops at the first error. With the parallel
    /// backend in-flight tasks may still finish, but their output is dropped.
    pub(crate) fn try_map<I, T, F>(self, items: &[I], task: F) -> Result<Vec<T>>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> Result<T> + Send + Sync,
    {
        match self {
            Self::Sequential => items.iter().map(task).collect(),
            #[cfg(feature = "parallel")]
            Self::Parallel => items.par_iter().map(task).collect(),
        }
    }
}
