//! End-to-end tests for the command-line workflow: write, check, report.

use dotcompat::{
    prelude::*,
    report::{run, write_report},
    Result,
};
use std::{fs, path::Path, sync::Arc};

fn library(version: u16, sealed: bool) -> AssemblyDefinition {
    let widget = TypeBuilder::class("Lib", "Widget").default_constructor();
    AssemblyBuilder::new("Lib")
        .version(version, 0, 0, 0)
        .type_def(if sealed { widget.sealed() } else { widget })
        .type_def(TypeBuilder::class("Lib", "Gadget").default_constructor())
        .build()
}

fn provider(sealed_in_v2: bool) -> Arc<MemorySymbolProvider> {
    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", library(1, false));
    provider.insert("v2/Lib.dll", library(2, sealed_in_v2));
    Arc::new(provider)
}

fn pair_source(dir: &Path) -> Result<JobSource> {
    let left_references = dir.join("left.refs");
    let right_references = dir.join("right.refs");
    fs::write(&left_references, "\n")?;
    fs::write(&right_references, "")?;
    Ok(JobSource::Pair {
        left_assembly: "v1/Lib.dll".into(),
        left_references,
        right_assembly: "v2/Lib.dll".into(),
        right_references,
    })
}

fn run_to_string(provider: Arc<MemorySymbolProvider>, options: &RunOptions) -> Result<(ExitStatus, String)> {
    let mut out = Vec::new();
    let status = run(provider, options, &mut out)?;
    Ok((status, String::from_utf8_lossy(&out).into_owned()))
}

/// Accept the current differences, then check again: nothing is left to report.
#[test]
fn test_write_then_check() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let suppressions = dir.path().join("suppressions.xml");
    let source = pair_source(dir.path())?;

    let (status, output) = run_to_string(
        provider(true),
        &RunOptions::new(&suppressions)
            .source(source.clone())
            .write_suppressions(true),
    )?;
    assert_eq!(status, ExitStatus::Success);
    assert!(output.is_empty());

    let written = SuppressionFile::load(&suppressions)?;
    assert_eq!(written.suppression_count(), 1);
    let comparison = written
        .get_comparison("v1/Lib.dll", "v2/Lib.dll")
        .expect("comparison for the pair");
    assert_eq!(comparison.suppressions[0].difference_type, DifferenceType::Changed);

    let (status, output) = run_to_string(provider(true), &RunOptions::new(&suppressions).source(source))?;
    assert_eq!(status, ExitStatus::Success);
    assert!(output.is_empty(), "{output}");
    Ok(())
}

#[test]
fn test_unsuppressed_differences_fail() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let options = RunOptions::new(dir.path().join("missing.xml")).source(pair_source(dir.path())?);

    let (status, output) = run_to_string(provider(true), &options)?;
    assert_eq!(status, ExitStatus::Failure);
    assert_eq!(status.code(), 1);
    assert_eq!(
        output,
        "Compatability errors between 'v1/Lib.dll' and 'v2/Lib.dll':\n\
         error CannotSealType (Changed): Type 'Lib.Widget' has the sealed modifier on right but not on left\n\
         ---\n"
    );
    Ok(())
}

/// Fixing the break makes the accepted suppression stale.
#[test]
fn test_stale_suppressions_warn() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let suppressions = dir.path().join("suppressions.xml");
    let source = pair_source(dir.path())?;

    run_to_string(
        provider(true),
        &RunOptions::new(&suppressions)
            .source(source.clone())
            .write_suppressions(true),
    )?;

    let (status, output) = run_to_string(
        provider(false),
        &RunOptions::new(&suppressions).source(source).parallelism(1),
    )?;
    assert_eq!(status, ExitStatus::Success);
    assert_eq!(output, "warning: suppression file contains unused suppressions\n");
    Ok(())
}

#[test]
fn test_job_list_sources_and_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let jobs = dir.path().join("jobs.txt");
    fs::write(&jobs, "Lib 1.0\nv1/Lib.dll\n0\nLib 2.0\nv2/Lib.dll\n0\n")?;

    let args = [
        dir.path().join("suppressions.xml").display().to_string(),
        jobs.display().to_string(),
    ];
    let options = RunOptions::from_args(args)?;
    let (status, output) = run_to_string(provider(true), &options)?;
    assert_eq!(status, ExitStatus::Failure);
    assert!(output.starts_with("Compatability errors between 'Lib 1.0' and 'Lib 2.0':\n"));

    let broken = dir.path().join("broken.txt");
    fs::write(&broken, "Lib 1.0\nv1/Lib.dll\nmany\n")?;
    let options = RunOptions::new(dir.path().join("suppressions.xml")).source(JobSource::File(broken));
    assert!(matches!(
        run(provider(true), &options, &mut Vec::new()),
        Err(Error::JobList { line: 3, .. })
    ));
    Ok(())
}

#[test]
fn test_malformed_suppression_file_is_an_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let suppressions = dir.path().join("suppressions.xml");
    fs::write(&suppressions, "<ArCompatSuppressions><Comparison Left=\"l\">")?;

    let options = RunOptions::new(&suppressions).source(pair_source(dir.path())?);
    assert!(run(provider(true), &options, &mut Vec::new()).is_err());
    Ok(())
}

#[test]
fn test_report_lists_jobs_in_order() -> Result<()> {
    let result = ComparisonRunner::new(provider(true))
        .job(ComparisonJob::new("b", "v1/Lib.dll", "c", "v2/Lib.dll"))
        .job(ComparisonJob::new("a", "v1/Lib.dll", "c", "v2/Lib.dll"))
        .job(ComparisonJob::new("a", "v1/Lib.dll", "a", "v1/Lib.dll"))
        .execute()?;

    let mut out = Vec::new();
    write_report(&result, &mut out)?;
    let headers: Vec<_> = String::from_utf8_lossy(&out)
        .lines()
        .filter(|line| line.starts_with("Compatability"))
        .map(str::to_string)
        .collect();
    assert_eq!(
        headers,
        [
            "Compatability errors between 'a' and 'c':",
            "Compatability errors between 'b' and 'c':"
        ]
    );
    Ok(())
}

#[test]
fn test_verbose_report_appends_diagnostics() -> Result<()> {
    let missing = AssemblyName::new("Ext", Default::default());
    let gone = TypeSignature::named(TypeRef::reference_in(&missing, "Ext", "IGone"));

    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", library(1, false));
    provider.insert(
        "v2/Lib.dll",
        AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .type_def(TypeBuilder::class("Lib", "Widget").default_constructor())
            .type_def(TypeBuilder::class("Lib", "Gadget").default_constructor())
            .type_def(TypeBuilder::class("Lib", "User`1").generic_param("T", |p| p.constraint(gone)))
            .build(),
    );
    let provider = Arc::new(provider);

    let dir = tempfile::tempdir()?;
    let options = RunOptions::new(dir.path().join("missing.xml")).source(pair_source(dir.path())?);

    let (_, quiet) = run_to_string(provider.clone(), &options)?;
    assert!(!quiet.contains("Diagnostics:"), "{quiet}");

    let (_, output) = run_to_string(provider, &options.verbose(true))?;
    assert!(
        output.contains("'v1/Lib.dll' and 'v2/Lib.dll':\nDiagnostics: "),
        "{output}"
    );
    assert!(
        output.contains("  [WARN] Resolution: Failed to resolve type reference 'Ext.IGone' (assembly: Lib)\n"),
        "{output}"
    );
    Ok(())
}

#[test]
fn test_command_line_drives_run() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let left_references = dir.path().join("left.refs");
    let right_references = dir.path().join("right.refs");
    fs::write(&left_references, "")?;
    fs::write(&right_references, "")?;
    let suppressions = dir.path().join("suppressions.xml");

    let args = [
        suppressions.display().to_string(),
        "v1/Lib.dll".to_string(),
        left_references.display().to_string(),
        "v2/Lib.dll".to_string(),
        right_references.display().to_string(),
        "--write-suppressions".to_string(),
        "-j".to_string(),
        "1".to_string(),
    ];
    let options = RunOptions::from_args(args)?;
    assert_eq!(options.parallelism, Some(1));

    let (status, _) = run_to_string(provider(true), &options)?;
    assert_eq!(status, ExitStatus::Success);
    assert_eq!(SuppressionFile::load(&suppressions)?.suppression_count(), 1);
    Ok(())
}
