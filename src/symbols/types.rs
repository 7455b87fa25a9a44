//! Type descriptors, type signatures, generic parameters and type definitions.
//!
//! # Key Components
//!
//! - [`TypeRef`] - Namespace, name and scope of a type. Either the self-descriptor of a
//!   definition, or a reference that a [`crate::symbols::Universe`] binds to its definition
//! - [`TypeScope`] - Where a [`TypeRef`] lives: an assembly, or a declaring type for nested types
//! - [`TypeSignature`] - A type as it appears in a constraint, parameter or return position
//! - [`GenericParameter`] - Generic type/method parameter with its special constraints,
//!   constraint types and variance
//! - [`TypeDefinition`] - A defined type with its flags, generic parameters, members and
//!   nested types
//!
//! # Reference Binding
//!
//! A reference [`TypeRef`] owns a write-once cell holding either a weak handle to the
//! definition it resolves to, or the fact that resolution failed. The cell is filled by the
//! universe that loaded the owning assembly, so the same reference read into two different
//! universes never shares a binding. References no universe touched are bound within the
//! compared assembly pair by [`crate::mapping::AssemblyMapper`]. Weak handles keep the symbol
//! graph free of reference cycles; a binding reads as unresolved (and
//! [`TypeRef::is_dangling`]) once every strong handle to its definition has been dropped.

use std::{
    borrow::Cow,
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use strum::{Display, EnumIter};

use crate::symbols::{assembly::AssemblyName, members::MemberDefinition};

#[allow(non_snake_case)]
/// Flags of a type definition (ECMA-335 II.23.1.15).
pub mod TypeAttributes {
    /// Mask for extracting type visibility information.
    ///
    /// Use this mask with bitwise AND to isolate the 3 visibility bits,
    /// then compare with specific visibility constants.
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Top-level type without public scope
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Top-level type with public scope
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested type with family (protected) visibility
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested type with assembly (internal) visibility
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested type with family and assembly visibility
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested type with family or assembly visibility
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Type is an interface
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Type is abstract
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type cannot be derived from
    pub const SEALED: u32 = 0x0000_0100;
}

#[allow(non_snake_case)]
/// All possible flags for `GenericParamAttributes`
pub mod GenericParamAttributes {
    /// Mask for the variance bits
    pub const VARIANCE_MASK: u32 = 0x0003;
    /// The generic parameter is covariant
    pub const COVARIANT: u32 = 0x0001;
    /// The generic parameter is contravariant
    pub const CONTRAVARIANT: u32 = 0x0002;
    /// The generic parameter has a special constraint
    pub const SPECIAL_CONSTRAINT_MASK: u32 = 0x001C;
    /// The generic parameter has a reference type constraint
    pub const REFERENCE_TYPE_CONSTRAINT: u32 = 0x0004;
    /// The generic parameter has a value type constraint
    pub const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT: u32 = 0x0008;
    /// The generic parameter has a constructor constraint
    pub const DEFAULT_CONSTRUCTOR_CONSTRAINT: u32 = 0x0010;
}

/// Variance of a generic type parameter.
///
/// The display form is the wording used in variance difference messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Variance {
    /// No variance annotation
    #[strum(serialize = "invariant")]
    Invariant,
    /// `out T`
    #[strum(serialize = "covariant ('out')")]
    Covariant,
    /// `in T`
    #[strum(serialize = "contravariant ('in')")]
    Contravariant,
}

impl Variance {
    /// Extract the variance from raw generic parameter flags.
    ///
    /// The reserved bit pattern `0x3` is treated as invariant.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        match flags & GenericParamAttributes::VARIANCE_MASK {
            GenericParamAttributes::COVARIANT => Variance::Covariant,
            GenericParamAttributes::CONTRAVARIANT => Variance::Contravariant,
            _ => Variance::Invariant,
        }
    }

    /// The raw flag bits for this variance.
    #[must_use]
    pub fn to_flags(self) -> u32 {
        match self {
            Variance::Invariant => 0,
            Variance::Covariant => GenericParamAttributes::COVARIANT,
            Variance::Contravariant => GenericParamAttributes::CONTRAVARIANT,
        }
    }
}

/// The scope a [`TypeRef`] is declared in.
#[derive(Debug, Clone)]
pub enum TypeScope {
    /// Top-level type of the named assembly
    Assembly(AssemblyName),
    /// Nested type, scoped by its declaring type
    Nested(Box<TypeRef>),
}

#[derive(Debug, Clone)]
enum Binding {
    Resolved(Weak<TypeDefinition>),
    Unresolved,
}

#[derive(Debug, Clone)]
enum TypeRefKind {
    Definition,
    Reference(OnceLock<Binding>),
}

/// Descriptor of a type: namespace, name and scope.
///
/// The same structure serves as the self-descriptor of a [`TypeDefinition`] and as a
/// reference to a type from a signature, a constraint or an exported-type forwarder.
/// Only references carry a binding; a definition descriptor always denotes itself.
#[derive(Debug, Clone)]
pub struct TypeRef {
    /// Namespace, empty for the global namespace and usually for nested types
    pub namespace: String,
    /// Simple name, including the generic arity suffix (e.g. "List`1")
    pub name: String,
    /// Declaring scope
    pub scope: TypeScope,
    kind: TypeRefKind,
}

impl TypeRef {
    /// Create an unbound reference.
    pub fn reference(namespace: impl Into<String>, name: impl Into<String>, scope: TypeScope) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            scope,
            kind: TypeRefKind::Reference(OnceLock::new()),
        }
    }

    /// Create an unbound reference to a top-level type of `assembly`.
    pub fn reference_in(
        assembly: &AssemblyName,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self::reference(namespace, name, TypeScope::Assembly(assembly.clone()))
    }

    /// Create the self-descriptor of a definition.
    pub fn definition(namespace: impl Into<String>, name: impl Into<String>, scope: TypeScope) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            scope,
            kind: TypeRefKind::Definition,
        }
    }

    /// Returns true if this is the self-descriptor of a definition.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        matches!(self.kind, TypeRefKind::Definition)
    }

    /// A reference version of this descriptor, unbound.
    ///
    /// Used to refer to a definition from a signature position.
    #[must_use]
    pub fn to_reference(&self) -> TypeRef {
        TypeRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            scope: self.detached_scope(),
            kind: TypeRefKind::Reference(OnceLock::new()),
        }
    }

    /// Deep copy with every binding (including those of declaring scopes) reset.
    #[must_use]
    pub fn detached(&self) -> TypeRef {
        TypeRef {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            scope: self.detached_scope(),
            kind: match self.kind {
                TypeRefKind::Definition => TypeRefKind::Definition,
                TypeRefKind::Reference(_) => TypeRefKind::Reference(OnceLock::new()),
            },
        }
    }

    fn detached_scope(&self) -> TypeScope {
        match &self.scope {
            TypeScope::Assembly(name) => TypeScope::Assembly(name.clone()),
            TypeScope::Nested(declaring) => TypeScope::Nested(Box::new(declaring.detached())),
        }
    }

    /// Bind a reference to its definition.
    ///
    /// Returns false if this is a definition descriptor or the reference was already bound.
    pub(crate) fn bind(&self, target: &Arc<TypeDefinition>) -> bool {
        match &self.kind {
            TypeRefKind::Definition => false,
            TypeRefKind::Reference(cell) => cell.set(Binding::Resolved(Arc::downgrade(target))).is_ok(),
        }
    }

    /// Record that resolving this reference failed, so later passes do not retry it.
    ///
    /// Returns false if this is a definition descriptor or the reference was already bound.
    pub(crate) fn mark_unresolved(&self) -> bool {
        match &self.kind {
            TypeRefKind::Definition => false,
            TypeRefKind::Reference(cell) => cell.set(Binding::Unresolved).is_ok(),
        }
    }

    /// Returns true once resolution of a reference was attempted (successfully or not), and
    /// always for a definition descriptor.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        match &self.kind {
            TypeRefKind::Definition => true,
            TypeRefKind::Reference(cell) => cell.get().is_some(),
        }
    }

    /// Returns true if a reference was bound to a definition that no longer exists.
    #[must_use]
    pub fn is_dangling(&self) -> bool {
        match &self.kind {
            TypeRefKind::Reference(cell) => {
                matches!(cell.get(), Some(Binding::Resolved(target)) if target.strong_count() == 0)
            }
            TypeRefKind::Definition => false,
        }
    }

    /// The definition a bound reference points at.
    ///
    /// Returns `None` for unbound, unresolved and dangling references, and for definition
    /// descriptors (which have no owning handle to themselves; see
    /// [`TypeRef::definition_descriptor`]).
    #[must_use]
    pub fn target(&self) -> Option<Arc<TypeDefinition>> {
        match &self.kind {
            TypeRefKind::Definition => None,
            TypeRefKind::Reference(cell) => match cell.get() {
                Some(Binding::Resolved(target)) => target.upgrade(),
                Some(Binding::Unresolved) | None => None,
            },
        }
    }

    /// The descriptor of the definition this denotes, if it resolves.
    ///
    /// A definition descriptor resolves to itself.
    #[must_use]
    pub fn definition_descriptor(&self) -> Option<Cow<'_, TypeRef>> {
        match &self.kind {
            TypeRefKind::Definition => Some(Cow::Borrowed(self)),
            TypeRefKind::Reference(_) => self
                .target()
                .map(|definition| Cow::Owned(definition.descriptor.clone())),
        }
    }

    /// The declaring type of a nested type.
    #[must_use]
    pub fn declaring_type(&self) -> Option<&TypeRef> {
        match &self.scope {
            TypeScope::Assembly(_) => None,
            TypeScope::Nested(declaring) => Some(declaring),
        }
    }

    /// The assembly this type is scoped to, following declaring types.
    #[must_use]
    pub fn assembly(&self) -> &AssemblyName {
        match &self.scope {
            TypeScope::Assembly(name) => name,
            TypeScope::Nested(declaring) => declaring.assembly(),
        }
    }

    /// Full name in `Namespace.Outer+Inner` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.scope {
            TypeScope::Nested(declaring) => format!("{}+{}", declaring.full_name(), self.name),
            TypeScope::Assembly(_) if self.namespace.is_empty() => self.name.clone(),
            TypeScope::Assembly(_) => format!("{}.{}", self.namespace, self.name),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// A type as it appears in a signature or constraint.
#[derive(Debug, Clone)]
pub enum TypeSignature {
    /// A plain named type
    Named(TypeRef),
    /// A constructed generic type, e.g. `IEquatable<T>`
    GenericInstance {
        /// The generic type definition being instantiated
        generic: TypeRef,
        /// Type arguments
        arguments: Vec<TypeSignature>,
    },
    /// Generic parameter of the enclosing type, by index
    Var(u32),
    /// Generic parameter of the enclosing method, by index
    MVar(u32),
    /// Single-dimensional zero-based array
    SzArray(Box<TypeSignature>),
    /// Managed reference
    ByRef(Box<TypeSignature>),
    /// Unmanaged pointer
    Pointer(Box<TypeSignature>),
}

impl TypeSignature {
    /// Signature of a plain named type.
    #[must_use]
    pub fn named(reference: TypeRef) -> Self {
        TypeSignature::Named(reference)
    }

    /// Signature of a constructed generic type.
    #[must_use]
    pub fn generic_instance(generic: TypeRef, arguments: Vec<TypeSignature>) -> Self {
        TypeSignature::GenericInstance { generic, arguments }
    }

    /// Array of this signature.
    #[must_use]
    pub fn array_of(self) -> Self {
        TypeSignature::SzArray(Box::new(self))
    }

    /// Returns true if the type this signature is built from resolves to a definition.
    ///
    /// Generic parameters always resolve. Type arguments of a generic instance do not
    /// participate, only the generic type itself.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        match self {
            TypeSignature::Named(reference) | TypeSignature::GenericInstance { generic: reference, .. } => {
                reference.definition_descriptor().is_some()
            }
            TypeSignature::Var(_) | TypeSignature::MVar(_) => true,
            TypeSignature::SzArray(inner) | TypeSignature::ByRef(inner) | TypeSignature::Pointer(inner) => {
                inner.is_resolved()
            }
        }
    }

    /// Visit every [`TypeRef`] this signature mentions.
    pub fn for_each_type_ref(&self, visitor: &mut dyn FnMut(&TypeRef)) {
        match self {
            TypeSignature::Named(reference) => visitor(reference),
            TypeSignature::GenericInstance { generic, arguments } => {
                visitor(generic);
                for argument in arguments {
                    argument.for_each_type_ref(visitor);
                }
            }
            TypeSignature::Var(_) | TypeSignature::MVar(_) => {}
            TypeSignature::SzArray(inner) | TypeSignature::ByRef(inner) | TypeSignature::Pointer(inner) => {
                inner.for_each_type_ref(visitor);
            }
        }
    }

    /// Deep copy with every binding reset.
    #[must_use]
    pub fn detached(&self) -> Self {
        match self {
            TypeSignature::Named(reference) => TypeSignature::Named(reference.detached()),
            TypeSignature::GenericInstance { generic, arguments } => TypeSignature::GenericInstance {
                generic: generic.detached(),
                arguments: arguments.iter().map(TypeSignature::detached).collect(),
            },
            TypeSignature::Var(index) => TypeSignature::Var(*index),
            TypeSignature::MVar(index) => TypeSignature::MVar(*index),
            TypeSignature::SzArray(inner) => TypeSignature::SzArray(Box::new(inner.detached())),
            TypeSignature::ByRef(inner) => TypeSignature::ByRef(Box::new(inner.detached())),
            TypeSignature::Pointer(inner) => TypeSignature::Pointer(Box::new(inner.detached())),
        }
    }

    /// Full name of the signature (e.g. `System.IEquatable`1<!0>`, `!!0[]`).
    #[must_use]
    pub fn full_name(&self) -> String {
        match self {
            TypeSignature::Named(reference) => reference.full_name(),
            TypeSignature::GenericInstance { generic, arguments } => {
                let arguments: Vec<String> = arguments.iter().map(TypeSignature::full_name).collect();
                format!("{}<{}>", generic.full_name(), arguments.join(","))
            }
            TypeSignature::Var(index) => format!("!{index}"),
            TypeSignature::MVar(index) => format!("!!{index}"),
            TypeSignature::SzArray(inner) => format!("{}[]", inner.full_name()),
            TypeSignature::ByRef(inner) => format!("{}&", inner.full_name()),
            TypeSignature::Pointer(inner) => format!("{}*", inner.full_name()),
        }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}

/// A generic parameter of a type or method.
#[derive(Debug, Clone)]
pub struct GenericParameter {
    /// Declared name (e.g. "T")
    pub name: String,
    /// Zero-based position in the owner's parameter list
    pub index: u32,
    /// Raw `GenericParamAttributes` flags
    pub flags: u32,
    /// Explicit constraint types (base class and interfaces)
    pub constraints: Vec<TypeSignature>,
}

impl GenericParameter {
    /// Variance of this parameter.
    #[must_use]
    pub fn variance(&self) -> Variance {
        Variance::from_flags(self.flags)
    }

    /// `where T : class`
    #[must_use]
    pub fn has_reference_type_constraint(&self) -> bool {
        self.flags & GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT != 0
    }

    /// `where T : struct`
    #[must_use]
    pub fn has_value_type_constraint(&self) -> bool {
        self.flags & GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT != 0
    }

    /// `where T : new()`
    #[must_use]
    pub fn has_default_constructor_constraint(&self) -> bool {
        self.flags & GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT != 0
    }

    /// Deep copy with every binding reset.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            name: self.name.clone(),
            index: self.index,
            flags: self.flags,
            constraints: self.constraints.iter().map(TypeSignature::detached).collect(),
        }
    }
}

impl fmt::Display for GenericParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A type definition.
///
/// Definitions are shared through `Arc` within one loaded assembly. Nested types hang off
/// their declaring type, members reference their declaring type through a copy of its
/// definition descriptor.
#[derive(Debug)]
pub struct TypeDefinition {
    /// Self-descriptor
    pub descriptor: TypeRef,
    /// Raw [`TypeAttributes`] flags
    pub flags: u32,
    /// Generic parameters, ordered by index
    pub generic_params: Vec<GenericParameter>,
    /// Methods, fields, properties and events
    pub members: Vec<Arc<MemberDefinition>>,
    /// Nested types
    pub nested_types: Vec<Arc<TypeDefinition>>,
}

impl TypeDefinition {
    /// Returns true if this type is an interface.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags & TypeAttributes::INTERFACE != 0
    }

    /// Returns true if this type is declared `sealed`.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags & TypeAttributes::SEALED != 0
    }

    /// Returns true if this type is declared `abstract`.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags & TypeAttributes::ABSTRACT != 0
    }

    /// Returns true if this is a nested type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.descriptor.declaring_type().is_some()
    }

    /// The visibility bits of the flags.
    #[must_use]
    pub fn visibility(&self) -> u32 {
        self.flags & TypeAttributes::VISIBILITY_MASK
    }

    /// Returns true if this type can be named from outside its assembly, considering its own
    /// visibility only.
    ///
    /// Top-level types must be public. Nested types must be public, family or family-or-assembly.
    #[must_use]
    pub fn is_visible_outside_assembly(&self) -> bool {
        let visibility = self.visibility();
        if self.is_nested() {
            matches!(
                visibility,
                TypeAttributes::NESTED_PUBLIC
                    | TypeAttributes::NESTED_FAMILY
                    | TypeAttributes::NESTED_FAM_OR_ASSEM
            )
        } else {
            visibility == TypeAttributes::PUBLIC
        }
    }

    /// Returns true if a non-static instance constructor is visible outside the assembly.
    #[must_use]
    pub fn has_visible_instance_constructor(&self) -> bool {
        self.members
            .iter()
            .any(|member| member.is_instance_constructor() && member.access.is_visible_outside_assembly())
    }

    /// Returns true if this type cannot be subclassed from outside its assembly.
    ///
    /// A type is effectively sealed when it is declared sealed, or when it offers no visible
    /// instance constructor for a derived type to chain to.
    #[must_use]
    pub fn is_effectively_sealed(&self) -> bool {
        self.is_sealed() || !self.has_visible_instance_constructor()
    }

    /// Full name in `Namespace.Outer+Inner` form.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.descriptor.full_name()
    }

    /// Find a nested type by name.
    pub fn find_nested(&self, namespace: &str, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.nested_types
            .iter()
            .find(|t| t.descriptor.namespace == namespace && t.descriptor.name == name)
    }

    /// Find all members with the given name.
    pub fn members_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Arc<MemberDefinition>> + 'a {
        self.members.iter().filter(move |m| m.name == name)
    }

    /// Visit every type reference of this type and its nested types: generic parameter
    /// constraints and member signatures.
    pub fn for_each_type_ref(&self, visitor: &mut dyn FnMut(&TypeRef)) {
        for parameter in &self.generic_params {
            for constraint in &parameter.constraints {
                constraint.for_each_type_ref(visitor);
            }
        }

        for member in &self.members {
            member.for_each_type_ref(visitor);
        }

        for nested in &self.nested_types {
            nested.for_each_type_ref(visitor);
        }
    }

    /// Deep copy with every binding reset.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            descriptor: self.descriptor.detached(),
            flags: self.flags,
            generic_params: self.generic_params.iter().map(GenericParameter::detached).collect(),
            members: self
                .members
                .iter()
                .map(|m| Arc::new(m.detached()))
                .collect(),
            nested_types: self
                .nested_types
                .iter()
                .map(|t| Arc::new(t.detached()))
                .collect(),
        }
    }
}

impl fmt::Display for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
