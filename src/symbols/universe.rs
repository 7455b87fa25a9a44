//! Isolated resolution context for one side of one comparison job.
//!
//! A [`Universe`] is seeded with a reference-path list, loads a primary assembly through a
//! [`SymbolProvider`] and binds every type reference of every assembly it loads to the
//! matching definition. Assembly references resolve by comparing the requested simple name
//! against the file stems of the reference paths, ASCII case-insensitively; the primary
//! assembly resolves to itself.
//!
//! Because each universe only ever sees its own job's reference paths, two jobs that both
//! reference an assembly called `Contoso.Core` from different directories never cross-resolve.
//!
//! # Resolution
//!
//! Resolving a reference walks its scope:
//! - A nested reference resolves its declaring type first and looks the name up among that
//!   definition's nested types
//! - A top-level reference resolves its assembly, then looks for a definition with the same
//!   namespace and name; failing that, for an exported-type forwarder, which is followed
//!   into the assembly it names (up to [`MAX_FORWARDER_DEPTH`] hops)
//!
//! References that cannot be resolved are marked unresolved, so no later pass retries them,
//! and a `Warning` diagnostic in category [`DiagnosticCategory::Resolution`] is recorded.
//!
//! # Thread Safety
//!
//! [`Universe`] is [`Send`] and [`Sync`]; the assembly cache is a `DashMap`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    symbols::{
        assembly::{AssemblyDefinition, AssemblyName},
        provider::SymbolProvider,
        types::{TypeDefinition, TypeRef, TypeScope},
    },
    Result,
};

/// Maximum number of exported-type forwarders followed while resolving one reference.
pub const MAX_FORWARDER_DEPTH: usize = 16;

/// A job-scoped resolution context.
pub struct Universe {
    provider: Arc<dyn SymbolProvider>,
    reference_paths: Vec<PathBuf>,
    /// Lowercased simple name -> loaded assembly, `None` for names that failed to resolve
    assemblies: DashMap<String, Option<Arc<AssemblyDefinition>>>,
    diagnostics: Arc<Diagnostics>,
}

impl Universe {
    /// Create an empty universe.
    ///
    /// # Arguments
    ///
    /// * `provider` - Reads assemblies from paths
    /// * `reference_paths` - Candidate files for resolving assembly references
    /// * `diagnostics` - Receives resolution warnings
    pub fn new(
        provider: Arc<dyn SymbolProvider>,
        reference_paths: Vec<PathBuf>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            provider,
            reference_paths,
            assemblies: DashMap::new(),
            diagnostics,
        }
    }

    /// The reference paths this universe resolves against.
    #[must_use]
    pub fn reference_paths(&self) -> &[PathBuf] {
        &self.reference_paths
    }

    /// Load the assembly at `path` as the primary assembly of this universe and bind its
    /// references.
    ///
    /// # Errors
    /// Returns the provider's error if the assembly cannot be read.
    pub fn load_primary(&self, path: &Path) -> Result<Arc<AssemblyDefinition>> {
        let assembly = Arc::new(self.provider.read_assembly(path)?);
        self.assemblies
            .insert(cache_key(&assembly.name), Some(assembly.clone()));
        self.bind_assembly(&assembly);

        Ok(assembly)
    }

    /// Resolve an assembly reference, loading it from the reference paths if needed.
    pub fn resolve_assembly(&self, name: &AssemblyName) -> Option<Arc<AssemblyDefinition>> {
        let key = cache_key(name);
        if let Some(cached) = self.assemblies.get(&key).map(|entry| entry.value().clone()) {
            return cached;
        }

        let Some(path) = self
            .reference_paths
            .iter()
            .find(|p| {
                p.file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.eq_ignore_ascii_case(&name.name))
            })
            .cloned()
        else {
            self.report(format!(
                "Failed to resolve assembly reference '{}': not found in reference paths",
                name
            ));
            self.assemblies.insert(key, None);
            return None;
        };

        match self.provider.read_assembly(&path) {
            Ok(assembly) => {
                let assembly = Arc::new(assembly);
                // Cache before binding so reference cycles between assemblies terminate
                self.assemblies.insert(key, Some(assembly.clone()));
                self.bind_assembly(&assembly);
                Some(assembly)
            }
            Err(error) => {
                self.report(format!(
                    "Failed to load reference assembly '{}' from '{}': {}",
                    name,
                    path.display(),
                    error
                ));
                self.assemblies.insert(key, None);
                None
            }
        }
    }

    /// Resolve a type reference to its definition, following forwarders.
    ///
    /// Already bound references return their binding. This does not bind `reference`.
    pub fn resolve_type(&self, reference: &TypeRef) -> Option<Arc<TypeDefinition>> {
        self.resolve_type_at(reference, 0)
    }

    fn resolve_type_at(&self, reference: &TypeRef, depth: usize) -> Option<Arc<TypeDefinition>> {
        if let Some(target) = reference.target() {
            return Some(target);
        }
        if depth > MAX_FORWARDER_DEPTH {
            return None;
        }

        match &reference.scope {
            TypeScope::Nested(declaring) => {
                let declaring = self.resolve_type_at(declaring, depth)?;
                declaring
                    .find_nested(&reference.namespace, &reference.name)
                    .cloned()
            }
            TypeScope::Assembly(name) => {
                let assembly = self.resolve_assembly(name)?;
                if let Some(definition) = assembly.find_type(&reference.namespace, &reference.name) {
                    return Some(definition.clone());
                }

                let forwarder = assembly.find_exported_type(&reference.namespace, &reference.name)?;
                if forwarder.assembly().matches(&assembly.name, true) {
                    // Forwarder pointing back at its own assembly
                    return None;
                }
                self.resolve_type_at(forwarder, depth + 1)
            }
        }
    }

    /// All assemblies loaded so far.
    #[must_use]
    pub fn loaded_assemblies(&self) -> Vec<Arc<AssemblyDefinition>> {
        self.assemblies
            .iter()
            .filter_map(|entry| entry.value().clone())
            .collect()
    }

    fn bind_assembly(&self, assembly: &AssemblyDefinition) {
        for module in &assembly.modules {
            // Visits nested types as well
            for ty in &module.types {
                ty.for_each_type_ref(&mut |reference| self.bind_reference(reference, &assembly.name));
            }
            for exported in &module.exported_types {
                self.bind_reference(exported, &assembly.name);
            }
        }
    }

    fn bind_reference(&self, reference: &TypeRef, origin: &AssemblyName) {
        if reference.is_bound() {
            return;
        }

        match self.resolve_type(reference) {
            Some(definition) => {
                reference.bind(&definition);
            }
            None => {
                reference.mark_unresolved();
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Warning,
                        DiagnosticCategory::Resolution,
                        format!("Failed to resolve type reference '{}'", reference.full_name()),
                    )
                    .with_assembly(origin.name.clone()),
                );
            }
        }
    }

    fn report(&self, message: String) {
        self.diagnostics
            .warning(DiagnosticCategory::Resolution, message);
    }
}

fn cache_key(name: &AssemblyName) -> String {
    name.name.to_ascii_lowercase()
}
