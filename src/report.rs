//! The command-line workflow: compare, filter through the suppression file, report.
//!
//! [`run`] is everything a command-line host needs besides a [`SymbolProvider`]. [`Cli`] is
//! the argument grammar, parsed with clap:
//!
//! ```text
//! dotcompat <SUPPRESSIONS> <LEFT_ASSEMBLY> <LEFT_REFS> <RIGHT_ASSEMBLY> <RIGHT_REFS> [--write-suppressions]
//! dotcompat <SUPPRESSIONS> <JOB_LIST>... [--write-suppressions]
//! ```
//!
//! Without `--write-suppressions` the suppression file is read (a missing file counts as
//! empty) and every unsuppressed difference is reported:
//!
//! ```text
//! Compatability errors between 'v1/Lib.dll' and 'v2/Lib.dll':
//! error CannotSealType (Changed): Type 'Lib.Widget' has the sealed modifier on right but not on left
//! ---
//! warning: suppression file contains unused suppressions
//! ```
//!
//! With it, the file is rewritten to suppress exactly the differences found, canonically
//! sorted. `--verbose` appends each job's diagnostics summary to the report.
//!
//! # Usage Examples
//!
//! ```rust
//! use clap::Parser;
//! use dotcompat::report::{Cli, JobSource, RunOptions};
//!
//! let cli = Cli::try_parse_from(["dotcompat", "suppressions.xml", "jobs.txt", "--write-suppressions"])?;
//! let options = RunOptions::from(cli);
//! assert!(options.write_suppressions);
//! assert_eq!(options.sources, [JobSource::File("jobs.txt".into())]);
//! # Ok::<(), clap::Error>(())
//! ```

use std::{
    ffi::OsString,
    io::Write,
    iter,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::Parser;

use crate::{
    runner::{load_job_list, ComparisonJob, ComparisonResult, ComparisonRunner},
    suppressions::SuppressionFile,
    symbols::SymbolProvider,
    Error, Result,
};

/// dotcompat - binary API-compatibility check for .NET assemblies
#[derive(Debug, Parser)]
#[command(name = "dotcompat", version, about, long_about = None)]
pub struct Cli {
    /// Suppression file to check against, or to rewrite with --write-suppressions.
    #[arg(value_name = "SUPPRESSIONS")]
    pub suppression_file: PathBuf,

    /// Exactly four paths form one pair: left assembly, left reference file, right assembly,
    /// right reference file. Any other count is a list of job-list files.
    #[arg(value_name = "JOB_SOURCE", required = true, num_args = 1..)]
    pub sources: Vec<PathBuf>,

    /// Rewrite the suppression file to suppress exactly the differences found.
    #[arg(long)]
    pub write_suppressions: bool,

    /// Maximum number of jobs running at once (defaults to one per core).
    #[arg(short = 'j', long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Append each job's resolution and mapping diagnostics to the report.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where jobs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// One explicit pair; reference files list one path per line
    Pair {
        /// Left assembly path, also the Left name
        left_assembly: PathBuf,
        /// File listing the Left reference paths
        left_references: PathBuf,
        /// Right assembly path, also the Right name
        right_assembly: PathBuf,
        /// File listing the Right reference paths
        right_references: PathBuf,
    },
    /// A job-list file
    File(PathBuf),
}

impl JobSource {
    /// Expand into jobs.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] for unreadable files and [`Error::JobList`] for
    /// malformed job lists.
    pub fn load(&self) -> Result<Vec<ComparisonJob>> {
        match self {
            JobSource::Pair {
                left_assembly,
                left_references,
                right_assembly,
                right_references,
            } => Ok(vec![ComparisonJob::from_reference_files(
                left_assembly,
                left_references,
                right_assembly,
                right_references,
            )?]),
            JobSource::File(path) => load_job_list(path),
        }
    }
}

/// Options of one [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Suppression file to read, or to write with `write_suppressions`
    pub suppression_file: PathBuf,
    /// Job sources, expanded in order
    pub sources: Vec<JobSource>,
    /// Rewrite the suppression file instead of reporting
    pub write_suppressions: bool,
    /// Jobs running at once; `None` means one per core
    pub parallelism: Option<usize>,
    /// Append per-job diagnostics to the report
    pub verbose: bool,
}

impl RunOptions {
    /// Options that check `sources` against `suppression_file`.
    pub fn new(suppression_file: impl Into<PathBuf>) -> Self {
        Self {
            suppression_file: suppression_file.into(),
            sources: Vec::new(),
            write_suppressions: false,
            parallelism: None,
            verbose: false,
        }
    }

    /// Add a job source.
    #[must_use]
    pub fn source(mut self, source: JobSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Switch to rewriting the suppression file.
    #[must_use]
    pub fn write_suppressions(mut self, write: bool) -> Self {
        self.write_suppressions = write;
        self
    }

    /// Limit the number of jobs running at once.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Append per-job diagnostics to the report.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parse command-line arguments, program name excluded, through [`Cli`].
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] carrying clap's usage message if the arguments do not
    /// parse.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let program = iter::once(OsString::from("dotcompat"));
        Cli::try_parse_from(program.chain(args.into_iter().map(Into::into)))
            .map(Self::from)
            .map_err(|error| Error::Configuration(error.to_string()))
    }
}

impl From<Cli> for RunOptions {
    fn from(cli: Cli) -> Self {
        let sources = match <[PathBuf; 4]>::try_from(cli.sources) {
            Ok([left_assembly, left_references, right_assembly, right_references]) => {
                vec![JobSource::Pair {
                    left_assembly,
                    left_references,
                    right_assembly,
                    right_references,
                }]
            }
            Err(files) => files.into_iter().map(JobSource::File).collect(),
        };

        Self {
            suppression_file: cli.suppression_file,
            sources,
            write_suppressions: cli.write_suppressions,
            parallelism: cli.parallelism,
            verbose: cli.verbose,
        }
    }
}

/// Process exit status of a [`run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    /// No unsuppressed differences, or the suppression file was written
    Success,
    /// Unsuppressed differences were reported
    Failure,
}

impl ExitStatus {
    /// The conventional process exit code.
    #[must_use]
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

fn load_existing(path: &Path) -> Result<Option<SuppressionFile>> {
    if path.exists() {
        SuppressionFile::load(path).map(Some)
    } else {
        Ok(None)
    }
}

/// Compare, then either report against or rewrite the suppression file.
///
/// # Errors
/// Returns job-list, loading and suppression-file errors; the host maps these to exit
/// code 1.
pub fn run(
    provider: Arc<dyn SymbolProvider>,
    options: &RunOptions,
    out: &mut impl Write,
) -> Result<ExitStatus> {
    let mut jobs = Vec::new();
    for source in &options.sources {
        jobs.extend(source.load()?);
    }

    let mut runner = ComparisonRunner::new(provider).jobs(jobs);
    if let Some(threads) = options.parallelism {
        runner = runner.parallelism(threads);
    }
    if !options.write_suppressions {
        if let Some(existing) = load_existing(&options.suppression_file)? {
            runner = runner.suppressions(existing);
        }
    }

    let result = runner.execute()?;

    if options.write_suppressions {
        result.suppression_file().save(&options.suppression_file)?;
        return Ok(ExitStatus::Success);
    }

    write_report(&result, out)?;
    if options.verbose {
        write_diagnostics(&result, out)?;
    }
    Ok(if result.unsuppressed_count() > 0 {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    })
}

/// Write the unsuppressed differences of `result`, then the unused-suppression warning.
///
/// # Errors
/// Returns [`Error::FileError`] if writing to `out` fails.
pub fn write_report(result: &ComparisonResult, out: &mut impl Write) -> Result<()> {
    for (index, job) in result.jobs().iter().enumerate() {
        let differences = result.differences(index);
        if differences.is_empty() {
            continue;
        }

        writeln!(
            out,
            "Compatability errors between '{}' and '{}':",
            job.left_name, job.right_name
        )?;
        for difference in differences {
            writeln!(out, "error {}", difference)?;
        }
        writeln!(out, "---")?;
    }

    if result.has_unused_suppressions() {
        writeln!(out, "warning: suppression file contains unused suppressions")?;
    }
    Ok(())
}

/// Write the diagnostics summary of every job that collected any.
///
/// # Errors
/// Returns [`Error::FileError`] if writing to `out` fails.
pub fn write_diagnostics(result: &ComparisonResult, out: &mut impl Write) -> Result<()> {
    for (index, job) in result.jobs().iter().enumerate() {
        let diagnostics = result.diagnostics(index);
        if !diagnostics.has_any() {
            continue;
        }

        writeln!(out, "'{}' and '{}':", job.left_name, job.right_name)?;
        write!(out, "{}", diagnostics.summary())?;
    }
    Ok(())
}
