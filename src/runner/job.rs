//! Comparison jobs and the job-list file format.
//!
//! A job list is a flat text file of repeated blocks, one value per line:
//!
//! ```text
//! LeftName
//! LeftAssemblyPath
//! LeftReferenceCount
//! <LeftReferenceCount reference paths>
//! RightName
//! RightAssemblyPath
//! RightReferenceCount
//! <RightReferenceCount reference paths>
//! ```
//!
//! Blank lines are ignored everywhere. Errors name the origin of the list and the 1-based
//! line at which parsing failed.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// One Left/Right pair to compare.
///
/// The names identify the pair in suppression files and reports; the paths are handed to
/// the [`crate::symbols::SymbolProvider`]. Each side resolves references only against its own
/// reference paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComparisonJob {
    /// Name of the Left side
    pub left_name: String,
    /// Path of the Left assembly
    pub left_assembly: PathBuf,
    /// Reference paths of the Left side
    pub left_references: Vec<PathBuf>,
    /// Name of the Right side
    pub right_name: String,
    /// Path of the Right assembly
    pub right_assembly: PathBuf,
    /// Reference paths of the Right side
    pub right_references: Vec<PathBuf>,
}

impl ComparisonJob {
    /// Create a job without reference paths.
    pub fn new(
        left_name: impl Into<String>,
        left_assembly: impl Into<PathBuf>,
        right_name: impl Into<String>,
        right_assembly: impl Into<PathBuf>,
    ) -> Self {
        Self {
            left_name: left_name.into(),
            left_assembly: left_assembly.into(),
            left_references: Vec::new(),
            right_name: right_name.into(),
            right_assembly: right_assembly.into(),
            right_references: Vec::new(),
        }
    }

    /// Set the Left reference paths.
    #[must_use]
    pub fn left_references<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.left_references = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the Right reference paths.
    #[must_use]
    pub fn right_references<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.right_references = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Build the single-pair job used by the command line form
    /// `<left assembly> <left reference file> <right assembly> <right reference file>`.
    ///
    /// Each side is named after its assembly path; the reference files list one path per
    /// line, blank lines ignored.
    ///
    /// # Errors
    /// Returns [`Error::FileError`] if a reference file cannot be read.
    pub fn from_reference_files(
        left_assembly: impl AsRef<Path>,
        left_reference_file: impl AsRef<Path>,
        right_assembly: impl AsRef<Path>,
        right_reference_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let left_assembly = left_assembly.as_ref();
        let right_assembly = right_assembly.as_ref();

        Ok(Self::new(
            left_assembly.to_string_lossy(),
            left_assembly,
            right_assembly.to_string_lossy(),
            right_assembly,
        )
        .left_references(read_reference_file(left_reference_file.as_ref())?)
        .right_references(read_reference_file(right_reference_file.as_ref())?))
    }
}

fn read_reference_file(path: &Path) -> Result<Vec<PathBuf>> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Non-blank lines with their 1-based line numbers.
struct JobListLines<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    origin: &'a str,
    last_line: usize,
}

impl<'a> JobListLines<'a> {
    fn new(text: &'a str, origin: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
            origin,
            last_line: 0,
        }
    }

    fn next_value(&mut self) -> Option<(usize, &'a str)> {
        for (index, line) in self.lines.by_ref() {
            self.last_line = index + 1;
            let value = line.trim();
            if !value.is_empty() {
                return Some((index + 1, value));
            }
        }
        None
    }

    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::JobList {
            origin: self.origin.to_string(),
            line,
            message: message.into(),
        }
    }

    fn require(&mut self, field: &str) -> Result<(usize, &'a str)> {
        match self.next_value() {
            Some(value) => Ok(value),
            None => Err(self.error(
                self.last_line + 1,
                format!("unexpected end of job list, expected {}", field),
            )),
        }
    }

    fn count(&mut self, field: &str) -> Result<usize> {
        let (line, value) = self.require(field)?;
        value
            .parse::<usize>()
            .map_err(|_| self.error(line, format!("{} '{}' is not a number", field, value)))
    }

    /// The assembly path and references following a side's name.
    fn side(&mut self, side: &str) -> Result<(PathBuf, Vec<PathBuf>)> {
        let (_, assembly) = self.require(&format!("{} assembly path", side))?;
        let count = self.count(&format!("{} reference count", side))?;

        // The count is untrusted; a truncated block fails in `require`
        let mut references = Vec::new();
        for _ in 0..count {
            let (_, reference) = self.require(&format!("{} reference path", side))?;
            references.push(PathBuf::from(reference));
        }

        Ok((PathBuf::from(assembly), references))
    }
}

/// Parse a job list.
///
/// # Arguments
///
/// * `text` - Contents of the job list
/// * `origin` - Where the text came from, used in error messages
///
/// # Errors
/// Returns [`Error::JobList`] for truncated blocks and non-numeric reference counts.
///
/// # Examples
///
/// ```rust
/// use dotcompat::runner::parse_job_list;
///
/// let jobs = parse_job_list("old\nv1/Lib.dll\n0\n\nnew\nv2/Lib.dll\n1\nv2/Core.dll\n", "jobs.txt")?;
/// assert_eq!(jobs.len(), 1);
/// assert_eq!(jobs[0].right_references.len(), 1);
/// # Ok::<(), dotcompat::Error>(())
/// ```
pub fn parse_job_list(text: &str, origin: &str) -> Result<Vec<ComparisonJob>> {
    let mut lines = JobListLines::new(text, origin);
    let mut jobs = Vec::new();

    while let Some((_, left_name)) = lines.next_value() {
        let (left_assembly, left_references) = lines.side("left")?;
        let (_, right_name) = lines.require("right name")?;
        let (right_assembly, right_references) = lines.side("right")?;

        jobs.push(ComparisonJob {
            left_name: left_name.to_string(),
            left_assembly,
            left_references,
            right_name: right_name.to_string(),
            right_assembly,
            right_references,
        });
    }

    Ok(jobs)
}

/// Read and parse a job-list file.
///
/// # Errors
/// Returns [`Error::FileError`] if the file cannot be read, [`Error::JobList`] if it does
/// not parse.
pub fn load_job_list(path: impl AsRef<Path>) -> Result<Vec<ComparisonJob>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_job_list(&text, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks_with_blank_lines() {
        let text = "\
left-a
a/v1.dll
2
a/ref1.dll

a/ref2.dll
right-a
a/v2.dll
0


left-b
b/v1.dll
0
right-b
b/v2.dll
1
b/ref.dll
";
        let jobs = parse_job_list(text, "jobs.txt").unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(
            jobs[0],
            ComparisonJob::new("left-a", "a/v1.dll", "right-a", "a/v2.dll")
                .left_references(["a/ref1.dll", "a/ref2.dll"])
        );
        assert_eq!(jobs[1].left_name, "left-b");
        assert_eq!(jobs[1].right_references, [PathBuf::from("b/ref.dll")]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_job_list("\n\n  \n", "jobs.txt").unwrap().is_empty());
    }

    #[test]
    fn test_parse_non_numeric_count() {
        let error = parse_job_list("l\nl.dll\nmany\n", "jobs.txt").unwrap_err();
        match error {
            Error::JobList {
                origin,
                line,
                message,
            } => {
                assert_eq!(origin, "jobs.txt");
                assert_eq!(line, 3);
                assert!(message.contains("many"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_truncated_block() {
        let error = parse_job_list("l\nl.dll\n1\nref.dll\nr\n", "jobs.txt").unwrap_err();
        match error {
            Error::JobList { line, message, .. } => {
                assert_eq!(line, 6);
                assert!(message.contains("right assembly path"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let error = parse_job_list("l\nl.dll\n3\nref.dll\n", "jobs.txt").unwrap_err();
        assert!(matches!(error, Error::JobList { line: 5, .. }));
    }

    #[test]
    fn test_parse_huge_reference_count() {
        let error = parse_job_list("left\nl.dll\n18446744073709551615\nr.dll\n", "jobs.txt").unwrap_err();
        match error {
            Error::JobList { origin, line, message } => {
                assert_eq!(origin, "jobs.txt");
                assert_eq!(line, 5);
                assert!(message.contains("left reference path"));
            }
            other => panic!("unexpected error {other:?}"),
        }

        let error = parse_job_list("left\nl.dll\n100000000000\n", "jobs.txt").unwrap_err();
        assert!(matches!(error, Error::JobList { line: 4, .. }));

        let error = parse_job_list("left\nl.dll\n99999999999999999999999\n", "jobs.txt").unwrap_err();
        assert!(matches!(error, Error::JobList { line: 3, .. }));
    }

    #[test]
    fn test_from_reference_files() {
        let dir = tempfile::tempdir().unwrap();
        let left_refs = dir.path().join("left.txt");
        let right_refs = dir.path().join("right.txt");
        fs::write(&left_refs, "refs/Core.dll\n\n  refs/Other.dll  \n").unwrap();
        fs::write(&right_refs, "").unwrap();

        let job =
            ComparisonJob::from_reference_files("v1/Lib.dll", &left_refs, "v2/Lib.dll", &right_refs)
                .unwrap();
        assert_eq!(job.left_name, "v1/Lib.dll");
        assert_eq!(job.right_name, "v2/Lib.dll");
        assert_eq!(
            job.left_references,
            [PathBuf::from("refs/Core.dll"), PathBuf::from("refs/Other.dll")]
        );
        assert!(job.right_references.is_empty());

        let missing = dir.path().join("missing.txt");
        assert!(matches!(
            ComparisonJob::from_reference_files("a", &missing, "b", &right_refs),
            Err(Error::FileError(_))
        ));
    }
}
