//! Fluent builders for in-memory symbol trees.
//!
//! Hosts that read assemblies with their own metadata reader, as well as tests and
//! benchmarks, describe assemblies with these builders. The builders take care of the
//! bookkeeping that is easy to get wrong by hand: type scopes, declaring-type descriptors of
//! members and nested types, and generic parameter indexes.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::symbols::{
//!     AssemblyBuilder, MemberAccess, MethodAttributes, TypeBuilder, TypeSignature,
//! };
//!
//! let lib = AssemblyBuilder::new("Contoso.Core").version(2, 0, 0, 0);
//! let disposable = lib.type_ref("Contoso", "IResource");
//!
//! let assembly = lib
//!     .type_def(TypeBuilder::interface("Contoso", "IResource"))
//!     .type_def(
//!         TypeBuilder::class("Contoso", "Pool`1")
//!             .generic_param("T", |p| p.class_constraint().constraint(TypeSignature::named(disposable)))
//!             .default_constructor()
//!             .method("Rent", |m| m.attributes(MethodAttributes::VIRTUAL).returns(TypeSignature::Var(0)))
//!             .nested_type(TypeBuilder::new("Lease").nested_public().sealed()),
//!     )
//!     .build();
//!
//! let pool = assembly.find_type("Contoso", "Pool`1").unwrap();
//! assert_eq!(pool.generic_params[0].constraints.len(), 1);
//! assert_eq!(pool.nested_types[0].full_name(), "Contoso.Pool`1+Lease");
//! assert!(pool.members.iter().any(|m| m.access == MemberAccess::Public));
//! ```

use std::sync::Arc;

use crate::symbols::{
    assembly::{AssemblyDefinition, AssemblyName, AssemblyVersion, ModuleDefinition},
    members::{
        MemberAccess, MemberDefinition, MemberKind, MethodAttributes, MethodSignature,
        CONSTRUCTOR_NAME,
    },
    types::{
        GenericParamAttributes, GenericParameter, TypeAttributes, TypeDefinition, TypeRef,
        TypeScope, TypeSignature, Variance,
    },
};

/// Builder for an [`AssemblyDefinition`] with a single module.
#[derive(Debug, Clone)]
pub struct AssemblyBuilder {
    name: AssemblyName,
    types: Vec<TypeBuilder>,
    forwarders: Vec<(String, String, AssemblyName)>,
}

impl AssemblyBuilder {
    /// Start an assembly with version `1.0.0.0`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: AssemblyName::new(name, AssemblyVersion::new(1, 0, 0, 0)),
            types: Vec::new(),
            forwarders: Vec::new(),
        }
    }

    /// Set the assembly version.
    #[must_use]
    pub fn version(mut self, major: u16, minor: u16, build: u16, revision: u16) -> Self {
        self.name.version = AssemblyVersion::new(major, minor, build, revision);
        self
    }

    /// Set the assembly culture.
    #[must_use]
    pub fn culture(mut self, culture: impl Into<String>) -> Self {
        self.name.culture = Some(culture.into());
        self
    }

    /// The name the built assembly will carry.
    #[must_use]
    pub fn name(&self) -> &AssemblyName {
        &self.name
    }

    /// An unbound reference to a top-level type of this assembly.
    #[must_use]
    pub fn type_ref(&self, namespace: &str, name: &str) -> TypeRef {
        TypeRef::reference_in(&self.name, namespace, name)
    }

    /// Add a top-level type.
    #[must_use]
    pub fn type_def(mut self, builder: TypeBuilder) -> Self {
        self.types.push(builder);
        self
    }

    /// Add an exported-type forwarder pointing `namespace.name` at `target`.
    #[must_use]
    pub fn forwarder(mut self, namespace: &str, name: &str, target: &AssemblyName) -> Self {
        self.forwarders
            .push((namespace.to_string(), name.to_string(), target.clone()));
        self
    }

    /// Build the assembly.
    #[must_use]
    pub fn build(self) -> AssemblyDefinition {
        let scope = TypeScope::Assembly(self.name.clone());

        let mut module = ModuleDefinition::new(format!("{}.dll", self.name.name));
        module.types = self
            .types
            .into_iter()
            .map(|builder| builder.build_in(scope.clone()))
            .collect();
        module.exported_types = self
            .forwarders
            .into_iter()
            .map(|(namespace, name, target)| TypeRef::reference_in(&target, namespace, name))
            .collect();

        let mut assembly = AssemblyDefinition::new(self.name);
        assembly.modules.push(module);
        assembly
    }
}

/// Builder for a [`TypeDefinition`].
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    namespace: String,
    name: String,
    flags: u32,
    generic_params: Vec<GenericParameterBuilder>,
    members: Vec<MemberBuilder>,
    nested: Vec<TypeBuilder>,
}

impl TypeBuilder {
    /// Start a non-public class in the global namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
            flags: TypeAttributes::NOT_PUBLIC,
            generic_params: Vec::new(),
            members: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Start a public class.
    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(name).namespace(namespace).public()
    }

    /// Start a public interface.
    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::class(namespace, name).flags(TypeAttributes::PUBLIC | TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT)
    }

    /// Set the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Replace all type flags.
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    fn visibility(mut self, visibility: u32) -> Self {
        self.flags = (self.flags & !TypeAttributes::VISIBILITY_MASK) | visibility;
        self
    }

    /// Top-level public visibility.
    #[must_use]
    pub fn public(self) -> Self {
        self.visibility(TypeAttributes::PUBLIC)
    }

    /// Top-level internal visibility.
    #[must_use]
    pub fn not_public(self) -> Self {
        self.visibility(TypeAttributes::NOT_PUBLIC)
    }

    /// Nested public visibility.
    #[must_use]
    pub fn nested_public(self) -> Self {
        self.visibility(TypeAttributes::NESTED_PUBLIC)
    }

    /// Nested protected visibility.
    #[must_use]
    pub fn nested_family(self) -> Self {
        self.visibility(TypeAttributes::NESTED_FAMILY)
    }

    /// Nested internal visibility.
    #[must_use]
    pub fn nested_assembly(self) -> Self {
        self.visibility(TypeAttributes::NESTED_ASSEMBLY)
    }

    /// Nested private visibility.
    #[must_use]
    pub fn nested_private(self) -> Self {
        self.visibility(TypeAttributes::NESTED_PRIVATE)
    }

    /// Declare the type `sealed`.
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeAttributes::SEALED;
        self
    }

    /// Declare the type `abstract`.
    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.flags |= TypeAttributes::ABSTRACT;
        self
    }

    /// Append a generic parameter, configured by `configure`.
    #[must_use]
    pub fn generic_param(
        mut self,
        name: impl Into<String>,
        configure: impl FnOnce(GenericParameterBuilder) -> GenericParameterBuilder,
    ) -> Self {
        self.generic_params
            .push(configure(GenericParameterBuilder::new(name)));
        self
    }

    /// Add a public parameterless instance constructor.
    #[must_use]
    pub fn default_constructor(self) -> Self {
        self.constructor(MemberAccess::Public)
    }

    /// Add a parameterless instance constructor with the given access.
    #[must_use]
    pub fn constructor(self, access: MemberAccess) -> Self {
        self.method(CONSTRUCTOR_NAME, |m| {
            m.access(access)
                .attributes(MethodAttributes::SPECIAL_NAME | MethodAttributes::HIDE_BY_SIG)
        })
    }

    /// Add a method, configured by `configure`. Methods start out public and non-virtual.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        configure: impl FnOnce(MethodBuilder) -> MethodBuilder,
    ) -> Self {
        self.members
            .push(MemberBuilder::Method(configure(MethodBuilder::new(name))));
        self
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, access: MemberAccess, field_type: TypeSignature) -> Self {
        self.members.push(MemberBuilder::Field {
            name: name.into(),
            access,
            field_type,
        });
        self
    }

    /// Add a property.
    #[must_use]
    pub fn property(
        mut self,
        name: impl Into<String>,
        access: MemberAccess,
        property_type: TypeSignature,
    ) -> Self {
        self.members.push(MemberBuilder::Property {
            name: name.into(),
            access,
            property_type,
        });
        self
    }

    /// Add an event.
    #[must_use]
    pub fn event(mut self, name: impl Into<String>, access: MemberAccess, event_type: TypeSignature) -> Self {
        self.members.push(MemberBuilder::Event {
            name: name.into(),
            access,
            event_type,
        });
        self
    }

    /// Add a nested type.
    #[must_use]
    pub fn nested_type(mut self, builder: TypeBuilder) -> Self {
        self.nested.push(builder);
        self
    }

    /// Build the definition inside `scope`.
    #[must_use]
    pub fn build_in(self, scope: TypeScope) -> Arc<TypeDefinition> {
        let descriptor = TypeRef::definition(self.namespace, self.name, scope);

        let generic_params = build_generic_params(self.generic_params);
        let members = self
            .members
            .into_iter()
            .map(|member| Arc::new(member.build(&descriptor)))
            .collect();
        let nested_types = self
            .nested
            .into_iter()
            .map(|nested| nested.build_in(TypeScope::Nested(Box::new(descriptor.clone()))))
            .collect();

        Arc::new(TypeDefinition {
            descriptor,
            flags: self.flags,
            generic_params,
            members,
            nested_types,
        })
    }
}

#[derive(Debug, Clone)]
enum MemberBuilder {
    Method(MethodBuilder),
    Field {
        name: String,
        access: MemberAccess,
        field_type: TypeSignature,
    },
    Property {
        name: String,
        access: MemberAccess,
        property_type: TypeSignature,
    },
    Event {
        name: String,
        access: MemberAccess,
        event_type: TypeSignature,
    },
}

impl MemberBuilder {
    fn build(self, declaring_type: &TypeRef) -> MemberDefinition {
        let (name, access, kind) = match self {
            MemberBuilder::Method(method) => {
                let signature = MethodSignature {
                    attributes: method.attributes,
                    generic_params: build_generic_params(method.generic_params),
                    parameters: method.parameters,
                    return_type: method.return_type,
                };
                (method.name, method.access, MemberKind::Method(signature))
            }
            MemberBuilder::Field {
                name,
                access,
                field_type,
            } => (
                name,
                access,
                MemberKind::Field {
                    field_type: Some(field_type),
                },
            ),
            MemberBuilder::Property {
                name,
                access,
                property_type,
            } => (
                name,
                access,
                MemberKind::Property {
                    property_type: Some(property_type),
                },
            ),
            MemberBuilder::Event {
                name,
                access,
                event_type,
            } => (
                name,
                access,
                MemberKind::Event {
                    event_type: Some(event_type),
                },
            ),
        };

        MemberDefinition {
            name,
            declaring_type: declaring_type.clone(),
            access,
            kind,
        }
    }
}

fn build_generic_params(builders: Vec<GenericParameterBuilder>) -> Vec<GenericParameter> {
    builders
        .into_iter()
        .zip(0u32..)
        .map(|(builder, index)| builder.build(index))
        .collect()
}

/// Builder for a method member.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    access: MemberAccess,
    attributes: MethodAttributes,
    generic_params: Vec<GenericParameterBuilder>,
    parameters: Vec<TypeSignature>,
    return_type: Option<TypeSignature>,
}

impl MethodBuilder {
    /// Start a public, non-virtual `void` method without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: MemberAccess::Public,
            attributes: MethodAttributes::HIDE_BY_SIG,
            generic_params: Vec::new(),
            parameters: Vec::new(),
            return_type: None,
        }
    }

    /// Set the access.
    #[must_use]
    pub fn access(mut self, access: MemberAccess) -> Self {
        self.access = access;
        self
    }

    /// Shorthand for `access(MemberAccess::Public)`.
    #[must_use]
    pub fn public(self) -> Self {
        self.access(MemberAccess::Public)
    }

    /// Shorthand for `access(MemberAccess::Family)`.
    #[must_use]
    pub fn protected(self) -> Self {
        self.access(MemberAccess::Family)
    }

    /// Shorthand for `access(MemberAccess::Assembly)`.
    #[must_use]
    pub fn internal(self) -> Self {
        self.access(MemberAccess::Assembly)
    }

    /// Add modifier flags.
    #[must_use]
    pub fn attributes(mut self, attributes: MethodAttributes) -> Self {
        self.attributes |= attributes;
        self
    }

    /// Append a method generic parameter, configured by `configure`.
    #[must_use]
    pub fn generic_param(
        mut self,
        name: impl Into<String>,
        configure: impl FnOnce(GenericParameterBuilder) -> GenericParameterBuilder,
    ) -> Self {
        self.generic_params
            .push(configure(GenericParameterBuilder::new(name)));
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn parameter(mut self, parameter: TypeSignature) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns(mut self, return_type: TypeSignature) -> Self {
        self.return_type = Some(return_type);
        self
    }
}

/// Builder for a [`GenericParameter`].
#[derive(Debug, Clone)]
pub struct GenericParameterBuilder {
    name: String,
    flags: u32,
    constraints: Vec<TypeSignature>,
}

impl GenericParameterBuilder {
    /// Start an unconstrained invariant parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            constraints: Vec::new(),
        }
    }

    /// Set the variance.
    #[must_use]
    pub fn variance(mut self, variance: Variance) -> Self {
        self.flags = (self.flags & !GenericParamAttributes::VARIANCE_MASK) | variance.to_flags();
        self
    }

    /// `out T`
    #[must_use]
    pub fn covariant(self) -> Self {
        self.variance(Variance::Covariant)
    }

    /// `in T`
    #[must_use]
    pub fn contravariant(self) -> Self {
        self.variance(Variance::Contravariant)
    }

    /// `where T : class`
    #[must_use]
    pub fn class_constraint(mut self) -> Self {
        self.flags |= GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT;
        self
    }

    /// `where T : struct`
    #[must_use]
    pub fn struct_constraint(mut self) -> Self {
        self.flags |= GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT;
        self
    }

    /// `where T : new()`
    #[must_use]
    pub fn new_constraint(mut self) -> Self {
        self.flags |= GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT;
        self
    }

    /// Add an explicit constraint type.
    #[must_use]
    pub fn constraint(mut self, constraint: TypeSignature) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Build the parameter at position `index`.
    #[must_use]
    pub fn build(self, index: u32) -> GenericParameter {
        GenericParameter {
            name: self.name,
            index,
            flags: self.flags,
            constraints: self.constraints,
        }
    }
}
