//! Parallel execution of comparison jobs.
//!
//! A [`ComparisonRunner`] sorts its [`ComparisonJob`]s by (Left name, Right name) and fans
//! them out over a dedicated rayon thread pool. Every job is independent:
//!
//! 1. Load the Left assembly into a fresh [`Universe`] seeded with the Left reference paths
//! 2. Load the Right assembly into a second fresh [`Universe`] seeded with the Right ones
//! 3. Build the [`AssemblyMapper`] tree over the pair
//! 4. Run the [`ApiComparer`] and keep the raw differences in the job's own result slot
//!
//! Suppression filtering happens later and lazily, in [`ComparisonResult`].
//!
//! # Failure and Cancellation
//!
//! A job whose assembly cannot be loaded fails the whole run: jobs that have not started yet
//! are skipped and [`ComparisonRunner::execute`] returns that job's error. A
//! [`CancellationToken`] does the same on request and yields [`Error::Cancelled`]. Jobs
//! already running always finish.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::runner::{ComparisonJob, ComparisonRunner};
//! use dotcompat::symbols::{AssemblyBuilder, MemorySymbolProvider, TypeBuilder};
//! use std::sync::Arc;
//!
//! let provider = MemorySymbolProvider::new();
//! provider.insert(
//!     "v1/Lib.dll",
//!     AssemblyBuilder::new("Lib")
//!         .type_def(TypeBuilder::class("Lib", "Widget").default_constructor())
//!         .build(),
//! );
//! provider.insert(
//!     "v2/Lib.dll",
//!     AssemblyBuilder::new("Lib")
//!         .type_def(TypeBuilder::class("Lib", "Widget").default_constructor().sealed())
//!         .build(),
//! );
//!
//! let result = ComparisonRunner::new(Arc::new(provider))
//!     .job(ComparisonJob::new("v1", "v1/Lib.dll", "v2", "v2/Lib.dll"))
//!     .parallelism(2)
//!     .execute()?;
//!
//! assert_eq!(result.differences(0).len(), 1);
//! # Ok::<(), dotcompat::Error>(())
//! ```

mod job;
mod result;

pub use job::{load_job_list, parse_job_list, ComparisonJob};
pub use result::ComparisonResult;

use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use rayon::{prelude::*, ThreadPoolBuilder};

use crate::{
    comparing::ApiComparer,
    diagnostics::Diagnostics,
    mapping::{AssemblyMapper, MapperSettings},
    runner::result::JobOutput,
    suppressions::SuppressionFile,
    symbols::{SymbolProvider, Universe},
    Error, Result,
};

/// Shared flag asking a run to stop starting new jobs.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once [`CancellationToken::cancel`] was called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Builder and executor for a set of comparison jobs.
pub struct ComparisonRunner {
    provider: Arc<dyn SymbolProvider>,
    jobs: Vec<ComparisonJob>,
    suppressions: Option<SuppressionFile>,
    parallelism: Option<usize>,
    cancellation: CancellationToken,
    settings: MapperSettings,
}

impl ComparisonRunner {
    /// Create a runner that reads assemblies through `provider`.
    pub fn new(provider: Arc<dyn SymbolProvider>) -> Self {
        Self {
            provider,
            jobs: Vec::new(),
            suppressions: None,
            parallelism: None,
            cancellation: CancellationToken::new(),
            settings: MapperSettings::default(),
        }
    }

    /// Add a job.
    #[must_use]
    pub fn job(mut self, job: ComparisonJob) -> Self {
        self.jobs.push(job);
        self
    }

    /// Add several jobs.
    #[must_use]
    pub fn jobs(mut self, jobs: impl IntoIterator<Item = ComparisonJob>) -> Self {
        self.jobs.extend(jobs);
        self
    }

    /// Filter differences through `suppressions`.
    #[must_use]
    pub fn suppressions(mut self, suppressions: SuppressionFile) -> Self {
        self.suppressions = Some(suppressions);
        self
    }

    /// Maximum number of jobs running at once; 0 means one per available core.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Observe `token` before starting each job.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Filter and identity settings used for every job's mapper tree.
    #[must_use]
    pub fn mapper_settings(mut self, settings: MapperSettings) -> Self {
        self.settings = settings;
        self
    }

    fn thread_count(&self) -> usize {
        match self.parallelism {
            Some(threads) if threads > 0 => threads,
            _ => thread::available_parallelism().map_or(1, NonZeroUsize::get),
        }
    }

    /// Run every job.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] if the thread pool cannot be created, the error of the
    /// first failed job in job order, or [`Error::Cancelled`] if cancellation skipped a job.
    pub fn execute(self) -> Result<ComparisonResult> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.thread_count())
            .build()
            .map_err(|error| Error::Configuration(format!("Failed to create thread pool: {}", error)))?;

        let mut jobs = self.jobs;
        jobs.sort_by(|a, b| (&a.left_name, &a.right_name).cmp(&(&b.left_name, &b.right_name)));

        let failed = AtomicBool::new(false);
        let completed = AtomicUsize::new(0);
        let provider = &self.provider;
        let settings = &self.settings;
        let cancellation = &self.cancellation;

        let outcomes: Vec<Option<Result<JobOutput>>> = pool.install(|| {
            jobs.par_iter()
                .map(|job| {
                    if cancellation.is_cancelled() || failed.load(Ordering::Acquire) {
                        return None;
                    }

                    let outcome = run_job(provider, job, settings);
                    match &outcome {
                        Ok(_) => {
                            completed.fetch_add(1, Ordering::AcqRel);
                        }
                        Err(_) => failed.store(true, Ordering::Release),
                    }
                    Some(outcome)
                })
                .collect()
        });

        let total = jobs.len();
        let mut outputs = Vec::with_capacity(total);
        let mut skipped = false;
        for outcome in outcomes {
            match outcome {
                Some(Ok(output)) => outputs.push(output),
                Some(Err(error)) => return Err(error),
                None => skipped = true,
            }
        }

        if skipped {
            return Err(Error::Cancelled {
                completed: completed.load(Ordering::Acquire),
                total,
            });
        }

        Ok(ComparisonResult::new(jobs, outputs, self.suppressions))
    }
}

/// Load, map and compare one job in its own pair of universes.
fn run_job(
    provider: &Arc<dyn SymbolProvider>,
    job: &ComparisonJob,
    settings: &MapperSettings,
) -> Result<JobOutput> {
    let diagnostics = Arc::new(Diagnostics::new());

    let left_universe = Universe::new(
        provider.clone(),
        job.left_references.clone(),
        diagnostics.clone(),
    );
    let left = left_universe.load_primary(&job.left_assembly)?;

    let right_universe = Universe::new(
        provider.clone(),
        job.right_references.clone(),
        diagnostics.clone(),
    );
    let right = right_universe.load_primary(&job.right_assembly)?;

    let mapper = AssemblyMapper::create(left, right, settings.clone(), diagnostics.clone());
    let mut comparer = ApiComparer::new();
    comparer.compare(&mapper);

    Ok(JobOutput {
        differences: comparer.into_differences(),
        diagnostics,
    })
}
