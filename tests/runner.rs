//! Integration tests for job execution: resolution isolation, forwarders, job lists,
//! cancellation and the unused-suppression signal.

use dotcompat::{
    prelude::*,
    runner::{load_job_list, parse_job_list},
    Result,
};
use std::{fs, sync::Arc};

fn widget(sealed: bool) -> TypeBuilder {
    let widget = TypeBuilder::class("Lib", "Widget").default_constructor();
    if sealed {
        widget.sealed()
    } else {
        widget
    }
}

/// A type moved into another assembly behind a forwarder is still compared.
#[test]
fn test_forwarded_type_is_correlated() -> Result<()> {
    let core = AssemblyBuilder::new("Lib.Core").type_def(widget(true));
    let core_name = core.name().clone();

    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(false)).build());
    provider.insert(
        "v2/Lib.dll",
        AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .forwarder("Lib", "Widget", &core_name)
            .build(),
    );
    provider.insert("v2/Lib.Core.dll", core.build());

    let result = ComparisonRunner::new(Arc::new(provider))
        .job(
            ComparisonJob::new("v1", "v1/Lib.dll", "v2", "v2/Lib.dll")
                .right_references(["v2/Lib.Core.dll"]),
        )
        .execute()?;

    assert_eq!(result.differences(0).len(), 1);
    assert_eq!(
        result.differences(0)[0].message(),
        "Type 'Lib.Widget' has the sealed modifier on right but not on left"
    );
    Ok(())
}

#[test]
fn test_unresolved_forwarder_is_a_diagnostic() -> Result<()> {
    let missing = AssemblyName::new("Lib.Missing", AssemblyVersion::new(1, 0, 0, 0));

    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(false)).build());
    provider.insert(
        "v2/Lib.dll",
        AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .forwarder("Lib", "Widget", &missing)
            .type_def(widget(true).namespace("Lib.Other"))
            .build(),
    );

    let result = ComparisonRunner::new(Arc::new(provider))
        .job(ComparisonJob::new("v1", "v1/Lib.dll", "v2", "v2/Lib.dll"))
        .execute()?;

    assert!(result.differences(0).is_empty());
    let diagnostics = result.diagnostics(0);
    assert!(diagnostics.has_warnings());
    assert!(diagnostics
        .by_category(DiagnosticCategory::Mapping)
        .iter()
        .any(|d| d.message.contains("Lib.Widget")));
    Ok(())
}

/// Each job side resolves only against its own reference paths.
#[test]
fn test_jobs_resolve_in_isolated_universes() -> Result<()> {
    let core = AssemblyBuilder::new("Core").type_def(TypeBuilder::interface("Core", "IThing"));
    let thing = TypeSignature::named(core.type_ref("Core", "IThing"));

    let provider = MemorySymbolProvider::new();
    provider.insert("x/Core.dll", core.build());
    provider.insert(
        "v1/Lib.dll",
        AssemblyBuilder::new("Lib")
            .type_def(TypeBuilder::class("Lib", "Box`1").default_constructor().generic_param("T", |p| p))
            .build(),
    );
    provider.insert(
        "v2/Lib.dll",
        AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .type_def(
                TypeBuilder::class("Lib", "Box`1")
                    .default_constructor()
                    .generic_param("T", |p| p.constraint(thing)),
            )
            .build(),
    );

    let result = ComparisonRunner::new(Arc::new(provider))
        .job(ComparisonJob::new("resolved-v1", "v1/Lib.dll", "resolved-v2", "v2/Lib.dll").right_references(["x/Core.dll"]))
        .job(ComparisonJob::new("unresolved-v1", "v1/Lib.dll", "unresolved-v2", "v2/Lib.dll"))
        .parallelism(2)
        .execute()?;

    assert_eq!(result.jobs()[0].left_name, "resolved-v1");
    assert_eq!(result.differences(0).len(), 1);
    assert_eq!(result.differences(0)[0].difference_type(), DifferenceType::Added);

    assert!(result.differences(1).is_empty());
    assert!(!result.diagnostics(1).by_category(DiagnosticCategory::Resolution).is_empty());
    assert!(result.diagnostics(0).by_category(DiagnosticCategory::Resolution).is_empty());
    Ok(())
}

#[test]
fn test_job_list_file_drives_runner() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("jobs.txt");
    fs::write(
        &path,
        "Lib 2.0\nv2/Lib.dll\n0\nLib 3.0\nv3/Lib.dll\n0\n\nLib 1.0\nv1/Lib.dll\n0\nLib 2.0\nv2/Lib.dll\n0\n",
    )?;

    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(false)).build());
    provider.insert("v2/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(true)).build());
    provider.insert("v3/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(true)).build());

    let result = ComparisonRunner::new(Arc::new(provider))
        .jobs(load_job_list(&path)?)
        .execute()?;

    assert_eq!(result.job_count(), 2);
    assert_eq!(result.jobs()[0].left_name, "Lib 1.0");
    assert_eq!(result.differences(0).len(), 1);
    assert!(result.differences(1).is_empty());
    Ok(())
}

#[test]
fn test_job_list_errors_carry_origin_and_line() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("jobs.txt");
    fs::write(&path, "left\nleft.dll\n0\nright\nright.dll\ntwo\n")?;

    match load_job_list(&path) {
        Err(Error::JobList { origin, line, .. }) => {
            assert_eq!(origin, path.display().to_string());
            assert_eq!(line, 6);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(matches!(
        parse_job_list("left\n", "inline"),
        Err(Error::JobList { line: 2, .. })
    ));
    Ok(())
}

#[test]
fn test_cancellation_skips_unstarted_jobs() {
    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").build());
    provider.insert("v2/Lib.dll", AssemblyBuilder::new("Lib").build());

    let token = CancellationToken::new();
    token.cancel();

    let outcome = ComparisonRunner::new(Arc::new(provider))
        .jobs((0..4).map(|i| ComparisonJob::new(format!("l{i}"), "v1/Lib.dll", "r", "v2/Lib.dll")))
        .cancellation(token)
        .execute();

    assert!(matches!(outcome, Err(Error::Cancelled { completed: 0, total: 4 })));
}

#[test]
fn test_suppressions_for_unknown_pair_are_unused() -> Result<()> {
    let provider = MemorySymbolProvider::new();
    provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(false)).build());
    provider.insert("v2/Lib.dll", AssemblyBuilder::new("Lib").type_def(widget(false)).build());

    let mut stale = SuppressionFile::new();
    let mut comparison = Comparison::new("v0", "v1");
    comparison
        .suppressions
        .push(Suppression::new(DifferenceType::Changed, "Tag", "Message"));
    stale.comparisons.push(comparison);

    let result = ComparisonRunner::new(Arc::new(provider))
        .job(ComparisonJob::new("v1", "v1/Lib.dll", "v2", "v2/Lib.dll"))
        .suppressions(stale)
        .execute()?;

    assert!(result.differences(0).is_empty());
    assert!(result.has_unused_suppressions());
    Ok(())
}
