//! Shared helpers for unit tests.

use std::{path::PathBuf, sync::Arc};

use crate::{
    comparing::{ApiComparer, CompatDifference},
    diagnostics::Diagnostics,
    mapping::{AssemblyMapper, MapperSettings},
    symbols::{AssemblyBuilder, AssemblyDefinition, MemorySymbolProvider, TypeBuilder, Universe},
};

// Helper function to load an assembly, plus the assemblies it references, into a fresh universe
pub fn load_side(
    primary: AssemblyDefinition,
    references: Vec<AssemblyDefinition>,
    diagnostics: &Arc<Diagnostics>,
) -> (Universe, Arc<AssemblyDefinition>) {
    let provider = MemorySymbolProvider::new();
    let primary_path = PathBuf::from(format!("primary/{}.dll", primary.name.name));

    let mut reference_paths = Vec::new();
    for reference in references {
        let path = PathBuf::from(format!("refs/{}.dll", reference.name.name));
        provider.insert(path.clone(), reference);
        reference_paths.push(path);
    }
    provider.insert(primary_path.clone(), primary);

    let universe = Universe::new(Arc::new(provider), reference_paths, diagnostics.clone());
    let assembly = universe.load_primary(&primary_path).unwrap();
    (universe, assembly)
}

// Helper function to run the default rules over two assemblies loaded into separate universes
pub fn compare_assemblies(
    left: AssemblyDefinition,
    right: AssemblyDefinition,
) -> (Vec<CompatDifference>, Arc<Diagnostics>) {
    let diagnostics = Arc::new(Diagnostics::new());
    let (_left_universe, left) = load_side(left, Vec::new(), &diagnostics);
    let (_right_universe, right) = load_side(right, Vec::new(), &diagnostics);

    let mapper = AssemblyMapper::create(left, right, MapperSettings::default(), diagnostics.clone());
    let mut comparer = ApiComparer::new();
    comparer.compare(&mapper);

    (comparer.into_differences(), diagnostics)
}

// Helper function to compare a single type between version 1 and version 2 of "Lib"
pub fn compare_types_with(
    left: TypeBuilder,
    right: TypeBuilder,
    diagnostics: &Arc<Diagnostics>,
) -> Vec<CompatDifference> {
    let left = AssemblyBuilder::new("Lib").type_def(left).build();
    let right = AssemblyBuilder::new("Lib")
        .version(2, 0, 0, 0)
        .type_def(right)
        .build();
    let (_left_universe, left) = load_side(left, Vec::new(), diagnostics);
    let (_right_universe, right) = load_side(right, Vec::new(), diagnostics);

    let mapper = AssemblyMapper::create(left, right, MapperSettings::default(), diagnostics.clone());
    let mut comparer = ApiComparer::new();
    comparer.compare(&mapper);
    comparer.into_differences()
}

// Helper function to compare a single type, discarding diagnostics
pub fn compare_types(left: TypeBuilder, right: TypeBuilder) -> Vec<CompatDifference> {
    compare_types_with(left, right, &Arc::new(Diagnostics::new()))
}
