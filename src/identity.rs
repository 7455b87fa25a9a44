//! Cross-version identity of types and members.
//!
//! The [`IdentityComparer`] decides whether a Left symbol and a Right symbol denote the same
//! declaration, and computes a hash consistent with that decision so symbols can be grouped
//! before the (more expensive) equality test runs.
//!
//! # Type Identity
//!
//! Two type descriptors are equal iff their namespace and name match and either
//! 1. their scopes are equal: the same assembly (version ignored by
//!    [`IdentityComparer::VERSION_AGNOSTIC`]) or equal declaring types, or
//! 2. both resolve to definitions whose declaring types are equal under this comparer.
//!
//! Rule 2 is what lets a type that was moved to another assembly and type-forwarded from
//! its old home still correlate with the original definition.
//!
//! # Member Identity
//!
//! | Kind | Identity |
//! |------|----------|
//! | Method | name, declaring type, generic arity, parameter signatures |
//! | Field | name, declaring type |
//! | Property | name, declaring type, property type when both sides carry one |
//! | Event | name, declaring type, event type when both sides carry one |
//!
//! Return types do not participate: overloads cannot differ by return type alone.
//!
//! # Hashing
//!
//! Hashes only use components that every equality path compares: namespace and name of the
//! type and of each declaring type, member name, member kind, generic arity and parameter
//! count.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::identity::IdentityComparer;
//! use dotcompat::symbols::{AssemblyName, AssemblyVersion, TypeRef};
//!
//! let v1 = AssemblyName::new("Lib", AssemblyVersion::new(1, 0, 0, 0));
//! let v2 = AssemblyName::new("Lib", AssemblyVersion::new(2, 0, 0, 0));
//! let left = TypeRef::reference_in(&v1, "Lib", "Widget");
//! let right = TypeRef::reference_in(&v2, "Lib", "Widget");
//!
//! let comparer = IdentityComparer::VERSION_AGNOSTIC;
//! assert!(comparer.type_equals(&left, &right));
//! assert_eq!(comparer.type_hash(&left), comparer.type_hash(&right));
//! assert!(!IdentityComparer::STRICT.type_equals(&left, &right));
//! ```

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    mem,
};

use crate::symbols::{
    AssemblyName, MemberDefinition, MemberKind, TypeDefinition, TypeRef, TypeScope, TypeSignature,
};

/// Equality and hashing of symbols across assembly versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityComparer {
    version_agnostic: bool,
}

impl Default for IdentityComparer {
    fn default() -> Self {
        Self::VERSION_AGNOSTIC
    }
}

impl IdentityComparer {
    /// Assembly scopes compare by name and culture only.
    pub const VERSION_AGNOSTIC: IdentityComparer = IdentityComparer::new(true);

    /// Assembly scopes additionally compare versions.
    pub const STRICT: IdentityComparer = IdentityComparer::new(false);

    /// Create a comparer.
    #[must_use]
    pub const fn new(version_agnostic: bool) -> Self {
        Self { version_agnostic }
    }

    /// Returns true if assembly versions are ignored.
    #[must_use]
    pub const fn is_version_agnostic(&self) -> bool {
        self.version_agnostic
    }

    /// Compare two assembly scopes.
    #[must_use]
    pub fn assembly_equals(&self, left: &AssemblyName, right: &AssemblyName) -> bool {
        left.matches(right, self.version_agnostic)
    }

    /// Compare two type descriptors.
    #[must_use]
    pub fn type_equals(&self, left: &TypeRef, right: &TypeRef) -> bool {
        if left.namespace != right.namespace || left.name != right.name {
            return false;
        }

        if self.scope_equals(&left.scope, &right.scope) {
            return true;
        }

        // Possibly forwarded: compare where the definitions actually live
        match (left.definition_descriptor(), right.definition_descriptor()) {
            (Some(left_definition), Some(right_definition)) => self.declaring_equals(
                left_definition.declaring_type(),
                right_definition.declaring_type(),
            ),
            _ => false,
        }
    }

    fn scope_equals(&self, left: &TypeScope, right: &TypeScope) -> bool {
        match (left, right) {
            (TypeScope::Assembly(left), TypeScope::Assembly(right)) => {
                self.assembly_equals(left, right)
            }
            (TypeScope::Nested(left), TypeScope::Nested(right)) => self.type_equals(left, right),
            _ => false,
        }
    }

    fn declaring_equals(&self, left: Option<&TypeRef>, right: Option<&TypeRef>) -> bool {
        match (left, right) {
            (None, None) => true,
            (Some(left), Some(right)) => self.type_equals(left, right),
            _ => false,
        }
    }

    /// Hash of a type descriptor, consistent with [`IdentityComparer::type_equals`].
    #[must_use]
    pub fn type_hash(&self, reference: &TypeRef) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_type_ref(reference, &mut hasher);
        hasher.finish()
    }

    /// Compare two type signatures structurally.
    #[must_use]
    pub fn signature_equals(&self, left: &TypeSignature, right: &TypeSignature) -> bool {
        match (left, right) {
            (TypeSignature::Named(left), TypeSignature::Named(right)) => {
                self.type_equals(left, right)
            }
            (
                TypeSignature::GenericInstance {
                    generic: left_generic,
                    arguments: left_arguments,
                },
                TypeSignature::GenericInstance {
                    generic: right_generic,
                    arguments: right_arguments,
                },
            ) => {
                self.type_equals(left_generic, right_generic)
                    && self.signatures_equal(left_arguments, right_arguments)
            }
            (TypeSignature::Var(left), TypeSignature::Var(right))
            | (TypeSignature::MVar(left), TypeSignature::MVar(right)) => left == right,
            (TypeSignature::SzArray(left), TypeSignature::SzArray(right))
            | (TypeSignature::ByRef(left), TypeSignature::ByRef(right))
            | (TypeSignature::Pointer(left), TypeSignature::Pointer(right)) => {
                self.signature_equals(left, right)
            }
            _ => false,
        }
    }

    /// Compare two signature lists element-wise.
    #[must_use]
    pub fn signatures_equal(&self, left: &[TypeSignature], right: &[TypeSignature]) -> bool {
        left.len() == right.len()
            && left
                .iter()
                .zip(right)
                .all(|(left, right)| self.signature_equals(left, right))
    }

    /// Hash of a type signature, consistent with [`IdentityComparer::signature_equals`].
    #[must_use]
    pub fn signature_hash(&self, signature: &TypeSignature) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_signature(signature, &mut hasher);
        hasher.finish()
    }

    /// Compare two members.
    #[must_use]
    pub fn member_equals(&self, left: &MemberDefinition, right: &MemberDefinition) -> bool {
        if left.name != right.name || !self.type_equals(&left.declaring_type, &right.declaring_type) {
            return false;
        }

        match (&left.kind, &right.kind) {
            (MemberKind::Method(left), MemberKind::Method(right)) => {
                left.generic_params.len() == right.generic_params.len()
                    && self.signatures_equal(&left.parameters, &right.parameters)
            }
            (MemberKind::Field { .. }, MemberKind::Field { .. }) => true,
            (
                MemberKind::Property {
                    property_type: left,
                },
                MemberKind::Property {
                    property_type: right,
                },
            )
            | (MemberKind::Event { event_type: left }, MemberKind::Event { event_type: right }) => {
                match (left, right) {
                    (Some(left), Some(right)) => self.signature_equals(left, right),
                    _ => true,
                }
            }
            _ => false,
        }
    }

    /// Hash of a member, consistent with [`IdentityComparer::member_equals`].
    #[must_use]
    pub fn member_hash(&self, member: &MemberDefinition) -> u64 {
        let mut hasher = DefaultHasher::new();
        member.name.hash(&mut hasher);
        hash_type_ref(&member.declaring_type, &mut hasher);
        mem::discriminant(&member.kind).hash(&mut hasher);
        if let MemberKind::Method(signature) = &member.kind {
            signature.generic_params.len().hash(&mut hasher);
            signature.parameters.len().hash(&mut hasher);
        }
        hasher.finish()
    }
}

fn hash_type_ref<H: Hasher>(reference: &TypeRef, state: &mut H) {
    reference.namespace.hash(state);
    reference.name.hash(state);
    if let Some(declaring) = reference.declaring_type() {
        hash_type_ref(declaring, state);
    }
}

fn hash_signature<H: Hasher>(signature: &TypeSignature, state: &mut H) {
    mem::discriminant(signature).hash(state);
    match signature {
        TypeSignature::Named(reference) => hash_type_ref(reference, state),
        TypeSignature::GenericInstance { generic, arguments } => {
            hash_type_ref(generic, state);
            arguments.len().hash(state);
            for argument in arguments {
                hash_signature(argument, state);
            }
        }
        TypeSignature::Var(index) | TypeSignature::MVar(index) => index.hash(state),
        TypeSignature::SzArray(inner) | TypeSignature::ByRef(inner) | TypeSignature::Pointer(inner) => {
            hash_signature(inner, state);
        }
    }
}

/// A symbol that can be correlated across the Left and Right side of a comparison.
pub trait SymbolIdentity {
    /// Returns true if `self` and `other` denote the same declaration.
    fn same_identity(&self, other: &Self, comparer: &IdentityComparer) -> bool;

    /// Hash consistent with [`SymbolIdentity::same_identity`].
    fn identity_hash(&self, comparer: &IdentityComparer) -> u64;
}

impl SymbolIdentity for TypeDefinition {
    fn same_identity(&self, other: &Self, comparer: &IdentityComparer) -> bool {
        comparer.type_equals(&self.descriptor, &other.descriptor)
    }

    fn identity_hash(&self, comparer: &IdentityComparer) -> u64 {
        comparer.type_hash(&self.descriptor)
    }
}

impl SymbolIdentity for MemberDefinition {
    fn same_identity(&self, other: &Self, comparer: &IdentityComparer) -> bool {
        comparer.member_equals(self, other)
    }

    fn identity_hash(&self, comparer: &IdentityComparer) -> u64 {
        comparer.member_hash(self)
    }
}
