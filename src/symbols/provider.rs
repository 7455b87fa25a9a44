//! The boundary to whatever reads assembly files.
//!
//! The comparison engine never parses PE files itself. A [`SymbolProvider`] turns an assembly
//! path into an [`AssemblyDefinition`] tree; a metadata reader backed provider does this by
//! parsing the file, [`MemorySymbolProvider`] by handing out copies of trees registered
//! up front.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::{symbols::assembly::AssemblyDefinition, Error, Result};

/// Source of assembly symbol trees.
///
/// Implementations must return a fresh tree with unbound type references on every call:
/// each job side loads into its own [`crate::symbols::Universe`], and bindings made by one
/// universe must never be visible to another.
pub trait SymbolProvider: Send + Sync {
    /// Read the assembly stored at `path`.
    ///
    /// # Errors
    /// Returns [`Error::AssemblyLoad`] or [`Error::FileError`] if no assembly can be
    /// produced for `path`.
    fn read_assembly(&self, path: &Path) -> Result<AssemblyDefinition>;
}

/// A [`SymbolProvider`] serving assemblies registered in memory, keyed by path.
///
/// # Examples
///
/// ```rust
/// use dotcompat::symbols::{AssemblyBuilder, MemorySymbolProvider, SymbolProvider};
/// use std::path::Path;
///
/// let provider = MemorySymbolProvider::new();
/// provider.insert("v1/Lib.dll", AssemblyBuilder::new("Lib").build());
///
/// let assembly = provider.read_assembly(Path::new("v1/Lib.dll"))?;
/// assert_eq!(assembly.name.name, "Lib");
/// assert!(provider.read_assembly(Path::new("v2/Lib.dll")).is_err());
/// # Ok::<(), dotcompat::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct MemorySymbolProvider {
    assemblies: DashMap<PathBuf, AssemblyDefinition>,
}

impl MemorySymbolProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `assembly` under `path`, replacing any previous registration.
    pub fn insert(&self, path: impl Into<PathBuf>, assembly: AssemblyDefinition) {
        self.assemblies.insert(path.into(), assembly.detached());
    }

    /// Returns true if an assembly is registered under `path`.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.assemblies.contains_key(path)
    }

    /// Number of registered assemblies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assemblies.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }
}

impl SymbolProvider for MemorySymbolProvider {
    fn read_assembly(&self, path: &Path) -> Result<AssemblyDefinition> {
        match self.assemblies.get(path) {
            Some(entry) => Ok(entry.value().detached()),
            None => Err(Error::AssemblyLoad {
                path: path.to_path_buf(),
                message: "no assembly registered for this path".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{AssemblyBuilder, TypeBuilder, TypeSignature};
    use std::sync::Arc;

    #[test]
    fn test_memory_provider_hands_out_independent_copies() {
        let lib = AssemblyBuilder::new("Lib");
        let other = lib.type_ref("Lib", "Other");
        let provider = MemorySymbolProvider::new();
        provider.insert(
            "Lib.dll",
            lib.type_def(TypeBuilder::class("Lib", "Other"))
                .type_def(
                    TypeBuilder::class("Lib", "A")
                        .generic_param("T", |p| p.constraint(TypeSignature::named(other))),
                )
                .build(),
        );

        let first = provider.read_assembly(Path::new("Lib.dll")).unwrap();
        let second = provider.read_assembly(Path::new("Lib.dll")).unwrap();
        let first_a = first.find_type("Lib", "A").unwrap();
        let second_a = second.find_type("Lib", "A").unwrap();
        assert!(!Arc::ptr_eq(first_a, second_a));

        let target = first.find_type("Lib", "Other").unwrap();
        if let TypeSignature::Named(reference) = &first_a.generic_params[0].constraints[0] {
            assert!(reference.bind(target));
        }
        if let TypeSignature::Named(reference) = &second_a.generic_params[0].constraints[0] {
            assert!(!reference.is_bound());
        }
    }

    #[test]
    fn test_memory_provider_missing_path() {
        let provider = MemorySymbolProvider::new();
        assert!(provider.is_empty());
        match provider.read_assembly(Path::new("missing.dll")) {
            Err(Error::AssemblyLoad { path, .. }) => assert_eq!(path, PathBuf::from("missing.dll")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
