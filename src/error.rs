use std::path::PathBuf;

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Compatibility differences are *not* errors: they are the product of a comparison and are
/// always returned through [`crate::runner::ComparisonResult`]. This enum only covers failures
/// that prevent a comparison from being performed or its inputs/outputs from being read or
/// written.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Malformed`] - A suppression file does not follow the expected XML schema
/// - [`Error::JobList`] - A job-list file is truncated or contains non-numeric counts
///
/// ## Loading Errors
/// - [`Error::AssemblyLoad`] - The symbol provider could not produce an assembly
/// - [`Error::FileError`] - Filesystem I/O errors
///
/// ## Execution Errors
/// - [`Error::Cancelled`] - The run was cancelled before every job started
/// - [`Error::Configuration`] - Invalid runner configuration or command-line arguments
///
/// # Examples
///
/// ```rust,no_run
/// use dotcompat::{Error, suppressions::SuppressionFile};
///
/// match SuppressionFile::load("suppressions.xml") {
///     Ok(file) => println!("{} comparisons", file.comparisons.len()),
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed suppression file: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The input is damaged and could not be parsed.
    ///
    /// Raised for suppression files that violate the expected document structure. The error
    /// includes the source location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A job-list file could not be parsed.
    ///
    /// Carries the origin of the job list (usually its path) and the 1-based line number
    /// at which parsing failed.
    #[error("{origin}:{line}: {message}")]
    JobList {
        /// Where the job list came from
        origin: String,
        /// 1-based line number of the offending line
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The symbol provider failed to load an assembly.
    #[error("Failed to load assembly '{}': {message}", path.display())]
    AssemblyLoad {
        /// Path that was handed to the provider
        path: PathBuf,
        /// Provider supplied reason
        message: String,
    },

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading job lists, reference path
    /// files, or reading and writing suppression files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The comparison run was cancelled.
    ///
    /// Jobs that had already started ran to completion, jobs that had not were skipped.
    #[error("Comparison cancelled after {completed} of {total} jobs")]
    Cancelled {
        /// Number of jobs that finished before cancellation was observed
        completed: usize,
        /// Number of jobs in the run
        total: usize,
    },

    /// Invalid configuration.
    #[error("{0}")]
    Configuration(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
