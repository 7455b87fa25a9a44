//! Results of a comparison run, with lazy suppression filtering.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use crate::{
    comparing::CompatDifference,
    diagnostics::{DiagnosticCategory, Diagnostics},
    runner::ComparisonJob,
    suppressions::{Comparison, SuppressionFile},
};

/// What one job produced.
pub(crate) struct JobOutput {
    pub(crate) differences: Vec<CompatDifference>,
    pub(crate) diagnostics: Arc<Diagnostics>,
}

/// The outcome of [`crate::runner::ComparisonRunner::execute`].
///
/// Jobs are ordered by (Left name, Right name). Raw differences are computed eagerly; the
/// suppression-filtered view of each job is computed on first access and cached.
///
/// # Unused Suppressions
///
/// [`ComparisonResult::has_unused_suppressions`] is true when the suppression file names a
/// Left/Right pair no job compares, or when some suppression of a compared pair matched no
/// difference. Answering it filters every job that has not been filtered yet.
///
/// # Thread Safety
///
/// [`ComparisonResult`] is [`Send`] and [`Sync`]; concurrent first reads of the same job
/// compute its filtered list once.
pub struct ComparisonResult {
    jobs: Vec<ComparisonJob>,
    outputs: Vec<JobOutput>,
    suppressions: Option<SuppressionFile>,
    /// `None` once computed means the raw list is returned unchanged
    filtered: Vec<OnceLock<Option<Vec<CompatDifference>>>>,
    has_unused: AtomicBool,
}

impl ComparisonResult {
    pub(crate) fn new(
        jobs: Vec<ComparisonJob>,
        outputs: Vec<JobOutput>,
        suppressions: Option<SuppressionFile>,
    ) -> Self {
        let orphaned = suppressions.as_ref().is_some_and(|file| {
            file.comparisons.iter().any(|comparison| {
                !jobs
                    .iter()
                    .any(|job| job.left_name == comparison.left && job.right_name == comparison.right)
            })
        });

        let filtered = (0..jobs.len()).map(|_| OnceLock::new()).collect();
        Self {
            jobs,
            outputs,
            suppressions,
            filtered,
            has_unused: AtomicBool::new(orphaned),
        }
    }

    /// Number of jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// The jobs, sorted by (Left name, Right name).
    #[must_use]
    pub fn jobs(&self) -> &[ComparisonJob] {
        &self.jobs
    }

    /// Every difference job `index` reported, suppressed or not.
    ///
    /// # Panics
    /// Panics if `index >= self.job_count()`.
    #[must_use]
    pub fn raw_differences(&self, index: usize) -> &[CompatDifference] {
        &self.outputs[index].differences
    }

    /// The differences of job `index` that no suppression covers, in reported order.
    ///
    /// # Panics
    /// Panics if `index >= self.job_count()`.
    #[must_use]
    pub fn differences(&self, index: usize) -> &[CompatDifference] {
        match self.filtered[index].get_or_init(|| self.filter(index)) {
            Some(differences) => differences,
            None => &self.outputs[index].differences,
        }
    }

    /// Resolution and mapping diagnostics of job `index`.
    ///
    /// # Panics
    /// Panics if `index >= self.job_count()`.
    #[must_use]
    pub fn diagnostics(&self, index: usize) -> &Arc<Diagnostics> {
        &self.outputs[index].diagnostics
    }

    /// Total number of unsuppressed differences over all jobs.
    #[must_use]
    pub fn unsuppressed_count(&self) -> usize {
        (0..self.job_count()).map(|i| self.differences(i).len()).sum()
    }

    /// Returns true if the suppression file holds anything this run did not need.
    pub fn has_unused_suppressions(&self) -> bool {
        if self.has_unused.load(Ordering::Acquire) {
            return true;
        }

        for index in 0..self.job_count() {
            let _ = self.differences(index);
        }
        self.has_unused.load(Ordering::Acquire)
    }

    /// A canonical suppression file covering every raw difference of every job.
    #[must_use]
    pub fn suppression_file(&self) -> SuppressionFile {
        SuppressionFile::from_differences(self.jobs.iter().zip(&self.outputs).map(|(job, output)| {
            (
                job.left_name.as_str(),
                job.right_name.as_str(),
                output.differences.as_slice(),
            )
        }))
    }

    fn comparison_for(&self, index: usize) -> Option<&Comparison> {
        let job = &self.jobs[index];
        self.suppressions
            .as_ref()?
            .get_comparison(&job.left_name, &job.right_name)
            .filter(|comparison| !comparison.suppressions.is_empty())
    }

    fn filter(&self, index: usize) -> Option<Vec<CompatDifference>> {
        let comparison = self.comparison_for(index)?;
        let raw = &self.outputs[index].differences;

        let mut used = vec![false; comparison.suppressions.len()];
        let mut remaining = Vec::with_capacity(raw.len());
        for difference in raw {
            match comparison.position_matching(difference) {
                Some(matched) => used[matched] = true,
                None => remaining.push(difference.clone()),
            }
        }

        let diagnostics = &self.outputs[index].diagnostics;
        for (suppression, _) in comparison
            .suppressions
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
        {
            self.has_unused.store(true, Ordering::Release);
            diagnostics.info(
                DiagnosticCategory::Suppression,
                format!(
                    "Unused suppression: {} {} {}",
                    suppression.difference_type,
                    suppression.type_name.as_deref().unwrap_or("<no type name>"),
                    suppression.message.as_deref().unwrap_or("<no message>")
                ),
            );
        }

        Some(remaining)
    }
}
