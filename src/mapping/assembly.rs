use std::{ops::Deref, sync::Arc};

use crate::{
    diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics},
    identity::SymbolIdentity,
    mapping::{
        element::{ElementMapper, ElementSide},
        index::MapperIndex,
        settings::MapperSettings,
        typemapper::TypeMapper,
    },
    symbols::{AssemblyDefinition, TypeDefinition},
};

/// Root of the mapper tree: the Left and Right assembly and every correlated type.
///
/// Types are registered per side by visiting every top-level type that passes the filter,
/// recursing into nested types (the filter is tested again at every level), and every
/// exported-type forwarder whose bound target passes the filter. Forwarded types register
/// exactly like top-level types, which is what lets a type that moved into another assembly
/// keep correlating with its previous definition.
///
/// A forwarder whose target could not be resolved is skipped with a
/// [`DiagnosticCategory::Mapping`] warning; the remaining forwarders of the module are still
/// processed.
///
/// Before its types are registered, every type reference of an assembly that no universe
/// has bound yet is resolved against that assembly itself. References that stay unresolved,
/// or whose definition has already been dropped, are reported as
/// [`DiagnosticCategory::Resolution`] warnings. The mapper keeps every bound definition
/// alive for as long as it exists, so dropping a universe after building the tree does not
/// unbind anything.
#[derive(Debug)]
pub struct AssemblyMapper {
    element: ElementMapper<AssemblyDefinition>,
    settings: MapperSettings,
    types: MapperIndex<TypeMapper>,
    diagnostics: Arc<Diagnostics>,
    retained: Vec<Arc<TypeDefinition>>,
}

impl AssemblyMapper {
    /// Start a mapper tree from one side.
    pub fn new(
        assembly: Arc<AssemblyDefinition>,
        side: ElementSide,
        settings: MapperSettings,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let mut mapper = Self {
            element: ElementMapper::new(assembly.clone(), side),
            settings,
            types: MapperIndex::new(),
            diagnostics,
            retained: Vec::new(),
        };
        mapper.register_assembly(&assembly, side);
        mapper
    }

    /// Build the complete tree for a Left/Right pair.
    pub fn create(
        left: Arc<AssemblyDefinition>,
        right: Arc<AssemblyDefinition>,
        settings: MapperSettings,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let mut mapper = Self::new(left, ElementSide::Left, settings, diagnostics);
        mapper.add(right, ElementSide::Right);
        mapper
    }

    /// Record `assembly` on `side` and register its types.
    pub fn add(&mut self, assembly: Arc<AssemblyDefinition>, side: ElementSide) {
        self.element.set(assembly.clone(), side);
        self.register_assembly(&assembly, side);
    }

    fn register_assembly(&mut self, assembly: &AssemblyDefinition, side: ElementSide) {
        self.bind_references(assembly);

        for module in &assembly.modules {
            for ty in &module.types {
                if self.settings.include_type(ty) {
                    self.register_type(ty, side);
                }
            }

            for exported in &module.exported_types {
                let Some(target) = exported.target() else {
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticSeverity::Warning,
                            DiagnosticCategory::Mapping,
                            format!("Failed to resolve exported type: {}", exported.full_name()),
                        )
                        .with_assembly(assembly.name.name.clone()),
                    );
                    continue;
                };

                if self.settings.include_type(&target) {
                    self.register_type(&target, side);
                }
            }
        }
    }

    fn bind_references(&mut self, assembly: &AssemblyDefinition) {
        let diagnostics = &self.diagnostics;
        let retained = &mut self.retained;
        let report = |message: String| {
            diagnostics.push(
                Diagnostic::new(DiagnosticSeverity::Warning, DiagnosticCategory::Resolution, message)
                    .with_assembly(assembly.name.name.clone()),
            );
        };

        for ty in assembly.modules.iter().flat_map(|module| module.types.iter()) {
            // Visits nested types as well
            ty.for_each_type_ref(&mut |reference| {
                if let Some(target) = reference.target() {
                    retained.push(target);
                } else if reference.is_dangling() {
                    report(format!(
                        "Type reference '{}' is bound to a definition that was dropped",
                        reference.full_name()
                    ));
                } else if !reference.is_bound() {
                    match assembly.resolve_local(reference) {
                        Some(target) => {
                            reference.bind(&target);
                            retained.push(target);
                        }
                        None => {
                            reference.mark_unresolved();
                            report(format!(
                                "Failed to resolve type reference '{}'",
                                reference.full_name()
                            ));
                        }
                    }
                }
            });
        }
    }

    fn register_type(&mut self, ty: &Arc<TypeDefinition>, side: ElementSide) {
        let comparer = *self.settings.identity();
        let hash = ty.identity_hash(&comparer);
        let existing = self.types.position(hash, |mapper| {
            mapper.representative().same_identity(ty, &comparer)
        });

        match existing.and_then(|index| self.types.get_mut(index)) {
            Some(mapper) => mapper.add(ty.clone(), side, &self.settings),
            None => self
                .types
                .push(hash, TypeMapper::new(ty.clone(), side, &self.settings)),
        }

        for nested in &ty.nested_types {
            if self.settings.include_type(nested) {
                self.register_type(nested, side);
            }
        }
    }

    /// Correlated types in first-seen order (Left types first, declaring types before their
    /// nested types).
    #[must_use]
    pub fn types(&self) -> &[TypeMapper] {
        self.types.as_slice()
    }

    /// Find a type mapper by full name (`Namespace.Outer+Inner`).
    #[must_use]
    pub fn find_type(&self, full_name: &str) -> Option<&TypeMapper> {
        self.types().iter().find(|mapper| mapper.full_name() == full_name)
    }

    /// The settings this tree was built with.
    #[must_use]
    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    /// Diagnostics sink shared with the rest of the job.
    #[must_use]
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }
}

impl Deref for AssemblyMapper {
    type Target = ElementMapper<AssemblyDefinition>;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comparing::ApiComparer,
        mapping::{MapperState, SymbolRef},
        symbols::{AssemblyBuilder, AssemblyName, MemberAccess, TypeBuilder, TypeRef, TypeSignature},
        test::load_side,
    };

    fn messages(mapper: &AssemblyMapper) -> Vec<String> {
        let mut comparer = ApiComparer::new();
        comparer.compare(mapper);
        comparer.differences().iter().map(|d| d.message()).collect()
    }

    /// Version 1 of "Lib" constrains `C<T>` to `constraint`, version 2 drops the constraint.
    fn dropped_constraint(lib: AssemblyBuilder, constraint: TypeSignature) -> (AssemblyDefinition, AssemblyDefinition) {
        let left = lib
            .type_def(TypeBuilder::interface("Lib", "IA"))
            .type_def(
                TypeBuilder::class("Lib", "C`1")
                    .default_constructor()
                    .generic_param("T", |p| p.constraint(constraint)),
            )
            .build();
        let right = AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .type_def(TypeBuilder::interface("Lib", "IA"))
            .type_def(TypeBuilder::class("Lib", "C`1").default_constructor().generic_param("T", |p| p))
            .build();
        (left, right)
    }

    #[test]
    fn test_mapper_correlates_added_removed_and_kept() {
        let left = AssemblyBuilder::new("Lib")
            .type_def(TypeBuilder::class("Lib", "Kept").default_constructor().method("Old", |m| m))
            .type_def(TypeBuilder::class("Lib", "Gone"))
            .type_def(TypeBuilder::class("Lib", "Hidden").not_public())
            .build();
        let right = AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .type_def(TypeBuilder::class("Lib", "Kept").default_constructor().method("New", |m| m))
            .type_def(TypeBuilder::class("Lib", "Fresh"))
            .build();

        let mapper = AssemblyMapper::create(
            Arc::new(left),
            Arc::new(right),
            MapperSettings::default(),
            Arc::new(Diagnostics::new()),
        );

        let names: Vec<_> = mapper.types().iter().map(TypeMapper::full_name).collect();
        assert_eq!(names, ["Lib.Kept", "Lib.Gone", "Lib.Fresh"]);
        assert!(mapper.both().is_some());

        let kept = mapper.find_type("Lib.Kept").unwrap();
        assert!(kept.both().is_some());
        assert_eq!(kept.members().len(), 3);
        assert!(kept.find_member(".ctor").unwrap().both().is_some());
        assert!(matches!(kept.find_member("Old").unwrap().state(), MapperState::LeftOnly(_)));
        assert!(matches!(kept.find_member("New").unwrap().state(), MapperState::RightOnly(_)));

        assert!(matches!(mapper.find_type("Lib.Gone").unwrap().state(), MapperState::LeftOnly(_)));
        assert!(matches!(mapper.find_type("Lib.Fresh").unwrap().state(), MapperState::RightOnly(_)));
    }

    #[test]
    fn test_mapper_filters_nested_types_per_level() {
        let build = || {
            AssemblyBuilder::new("Lib")
                .type_def(
                    TypeBuilder::class("Lib", "Outer")
                        .nested_type(
                            TypeBuilder::new("Visible")
                                .nested_public()
                                .nested_type(TypeBuilder::new("Deep").nested_family()),
                        )
                        .nested_type(
                            TypeBuilder::new("Private")
                                .nested_private()
                                .nested_type(TypeBuilder::new("UnderPrivate").nested_public()),
                        )
                        .field("secret", MemberAccess::Private, TypeSignature::Var(0)),
                )
                .build()
        };

        let mapper = AssemblyMapper::create(
            Arc::new(build()),
            Arc::new(build()),
            MapperSettings::default(),
            Arc::new(Diagnostics::new()),
        );

        let names: Vec<_> = mapper.types().iter().map(TypeMapper::full_name).collect();
        assert_eq!(names, ["Lib.Outer", "Lib.Outer+Visible", "Lib.Outer+Visible+Deep"]);
        assert!(mapper.types().iter().all(|t| t.both().is_some()));
        assert!(mapper.find_type("Lib.Outer").unwrap().members().is_empty());

        let everything = AssemblyMapper::create(
            Arc::new(build()),
            Arc::new(build()),
            MapperSettings::new().filter(|_: SymbolRef<'_>| true),
            Arc::new(Diagnostics::new()),
        );
        assert_eq!(everything.types().len(), 5);
        assert_eq!(everything.find_type("Lib.Outer").unwrap().members().len(), 1);
    }

    #[test]
    fn test_mapper_correlates_forwarded_type() {
        let diagnostics = Arc::new(Diagnostics::new());
        let core = AssemblyBuilder::new("Core")
            .version(2, 0, 0, 0)
            .type_def(TypeBuilder::class("Lib", "Moved").default_constructor());
        let facade = AssemblyBuilder::new("Lib")
            .version(2, 0, 0, 0)
            .forwarder("Lib", "Moved", core.name())
            .build();

        let (_left_universe, left) = load_side(
            AssemblyBuilder::new("Lib")
                .type_def(TypeBuilder::class("Lib", "Moved").default_constructor())
                .build(),
            Vec::new(),
            &diagnostics,
        );
        let (_right_universe, right) = load_side(facade, vec![core.build()], &diagnostics);

        let mapper = AssemblyMapper::create(left, right, MapperSettings::default(), diagnostics.clone());

        assert_eq!(mapper.types().len(), 1);
        let moved = &mapper.types()[0];
        let (left_type, right_type) = moved.both().unwrap();
        assert_eq!(left_type.descriptor.assembly().name, "Lib");
        assert_eq!(right_type.descriptor.assembly().name, "Core");
        assert!(moved.members()[0].both().is_some());
        assert!(!diagnostics.has_any());
    }

    #[test]
    fn test_mapper_skips_unresolved_forwarder_and_continues() {
        let diagnostics = Arc::new(Diagnostics::new());
        let core = AssemblyBuilder::new("Core").type_def(TypeBuilder::class("Lib", "Found"));
        let missing = AssemblyName::new("Missing", Default::default());
        let facade = AssemblyBuilder::new("Lib")
            .forwarder("Lib", "Lost", &missing)
            .forwarder("Lib", "Found", core.name())
            .build();
        let (_universe, right) = load_side(facade, vec![core.build()], &diagnostics);
        let left = AssemblyBuilder::new("Lib").type_def(TypeBuilder::class("Lib", "Found")).build();

        let mapper = AssemblyMapper::create(
            Arc::new(left),
            right,
            MapperSettings::default(),
            diagnostics.clone(),
        );

        assert_eq!(mapper.types().len(), 1);
        assert!(mapper.find_type("Lib.Found").unwrap().both().is_some());
        let skipped = diagnostics.by_category(DiagnosticCategory::Mapping);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].message, "Failed to resolve exported type: Lib.Lost");
        assert_eq!(skipped[0].assembly.as_deref(), Some("Lib"));
    }

    #[test]
    fn test_mapper_binds_references_within_the_pair() {
        let lib = AssemblyBuilder::new("Lib");
        let constraint = TypeSignature::named(lib.type_ref("Lib", "IA"));
        let (left, right) = dropped_constraint(lib, constraint);
        let diagnostics = Arc::new(Diagnostics::new());

        let mapper = AssemblyMapper::create(
            Arc::new(left),
            Arc::new(right),
            MapperSettings::default(),
            diagnostics.clone(),
        );

        assert_eq!(
            messages(&mapper),
            ["Cannot remove constraint 'Lib.IA' on type parameter 'T' of 'Lib.C`1'"]
        );
        assert!(!diagnostics.has_any());
    }

    #[test]
    fn test_mapper_reports_references_nothing_resolves() {
        let missing = AssemblyName::new("Ext", Default::default());
        let constraint = TypeSignature::named(TypeRef::reference_in(&missing, "Ext", "IGone"));
        let (left, right) = dropped_constraint(AssemblyBuilder::new("Lib"), constraint);
        let diagnostics = Arc::new(Diagnostics::new());

        let mapper = AssemblyMapper::create(
            Arc::new(left),
            Arc::new(right),
            MapperSettings::default(),
            diagnostics.clone(),
        );

        assert!(messages(&mapper).is_empty());
        let unresolved = diagnostics.by_category(DiagnosticCategory::Resolution);
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].message, "Failed to resolve type reference 'Ext.IGone'");
        assert_eq!(unresolved[0].assembly.as_deref(), Some("Lib"));
    }

    #[test]
    fn test_mapper_outlives_universe_bindings() {
        let core = AssemblyBuilder::new("Core").type_def(TypeBuilder::interface("Core", "IThing"));
        let constraint = TypeSignature::named(core.type_ref("Core", "IThing"));
        let (left, right) = dropped_constraint(AssemblyBuilder::new("Lib"), constraint);
        let core = core.build();
        let diagnostics = Arc::new(Diagnostics::new());

        let (left_universe, left) = load_side(left, vec![core.clone()], &diagnostics);
        let mapper = AssemblyMapper::create(left, Arc::new(right), MapperSettings::default(), diagnostics.clone());
        drop(left_universe);

        assert_eq!(
            messages(&mapper),
            ["Cannot remove constraint 'Core.IThing' on type parameter 'T' of 'Lib.C`1'"]
        );
        assert!(!diagnostics.has_any());

        // Building the tree only after the universe is gone leaves nothing to bind to
        let (left, right) = dropped_constraint(
            AssemblyBuilder::new("Lib"),
            TypeSignature::named(TypeRef::reference_in(&core.name, "Core", "IThing")),
        );
        let (left_universe, left) = load_side(left, vec![core], &diagnostics);
        drop(left_universe);
        let mapper = AssemblyMapper::create(left, Arc::new(right), MapperSettings::default(), diagnostics.clone());

        assert!(messages(&mapper).is_empty());
        let dropped = diagnostics.by_category(DiagnosticCategory::Resolution);
        assert_eq!(dropped.len(), 1);
        assert_eq!(
            dropped[0].message,
            "Type reference 'Core.IThing' is bound to a definition that was dropped"
        );
    }
}
