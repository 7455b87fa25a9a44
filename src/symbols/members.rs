//! Members of a type: methods, fields, properties and events.

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumIter};

use crate::symbols::types::{GenericParameter, TypeRef, TypeSignature};

/// Bitmask for `ACCESS` extraction
pub const MEMBER_ACCESS_MASK: u32 = 0x0007;

/// Name of instance constructors.
pub const CONSTRUCTOR_NAME: &str = ".ctor";

/// Accessibility of a member (ECMA-335 `MemberAccessMask` values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum MemberAccess {
    /// Member not referenceable
    CompilerControlled,
    /// Accessible only by the parent type
    Private,
    /// Accessible by sub-types only in this assembly
    FamAndAssem,
    /// Accessible by anyone in the assembly
    Assembly,
    /// Accessible only by type and sub-types
    Family,
    /// Accessible by sub-types anywhere, plus anyone in assembly
    FamOrAssem,
    /// Accessible by anyone who has visibility to this scope
    Public,
}

impl MemberAccess {
    /// Extract the access from raw method or field flags.
    #[must_use]
    pub fn from_flags(flags: u32) -> Self {
        match flags & MEMBER_ACCESS_MASK {
            0x1 => MemberAccess::Private,
            0x2 => MemberAccess::FamAndAssem,
            0x3 => MemberAccess::Assembly,
            0x4 => MemberAccess::Family,
            0x5 => MemberAccess::FamOrAssem,
            0x6 => MemberAccess::Public,
            _ => MemberAccess::CompilerControlled,
        }
    }

    /// Returns true if code outside the assembly can reach a member with this access.
    #[must_use]
    pub fn is_visible_outside_assembly(self) -> bool {
        matches!(
            self,
            MemberAccess::Public | MemberAccess::Family | MemberAccess::FamOrAssem
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Method modifier flags
    pub struct MethodAttributes: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
    }
}

/// Signature and modifiers of a method.
#[derive(Debug, Clone)]
pub struct MethodSignature {
    /// Modifier flags
    pub attributes: MethodAttributes,
    /// Method generic parameters
    pub generic_params: Vec<GenericParameter>,
    /// Parameter types in declaration order
    pub parameters: Vec<TypeSignature>,
    /// Return type, `None` for `void`
    pub return_type: Option<TypeSignature>,
}

impl MethodSignature {
    fn detached(&self) -> Self {
        Self {
            attributes: self.attributes,
            generic_params: self.generic_params.iter().map(GenericParameter::detached).collect(),
            parameters: self.parameters.iter().map(TypeSignature::detached).collect(),
            return_type: self.return_type.as_ref().map(TypeSignature::detached),
        }
    }
}

/// What kind of member a [`MemberDefinition`] is.
#[derive(Debug, Clone)]
pub enum MemberKind {
    /// A method or constructor
    Method(MethodSignature),
    /// A field
    Field {
        /// Field type
        field_type: Option<TypeSignature>,
    },
    /// A property
    Property {
        /// Property type
        property_type: Option<TypeSignature>,
    },
    /// An event
    Event {
        /// Delegate type of the event
        event_type: Option<TypeSignature>,
    },
}

impl MemberKind {
    /// Short name of the member kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            MemberKind::Method(_) => "method",
            MemberKind::Field { .. } => "field",
            MemberKind::Property { .. } => "property",
            MemberKind::Event { .. } => "event",
        }
    }

    fn value_type(&self) -> Option<&TypeSignature> {
        match self {
            MemberKind::Method(signature) => signature.return_type.as_ref(),
            MemberKind::Field { field_type } => field_type.as_ref(),
            MemberKind::Property { property_type } => property_type.as_ref(),
            MemberKind::Event { event_type } => event_type.as_ref(),
        }
    }
}

/// A member of a type.
#[derive(Debug, Clone)]
pub struct MemberDefinition {
    /// Member name (`.ctor` for instance constructors)
    pub name: String,
    /// Descriptor of the declaring type
    pub declaring_type: TypeRef,
    /// Accessibility. For properties and events this is the accessibility of the most
    /// accessible accessor.
    pub access: MemberAccess,
    /// Kind and signature
    pub kind: MemberKind,
}

impl MemberDefinition {
    /// The method signature, if this member is a method.
    #[must_use]
    pub fn method(&self) -> Option<&MethodSignature> {
        match &self.kind {
            MemberKind::Method(signature) => Some(signature),
            _ => None,
        }
    }

    /// Returns true if this member is a virtual method.
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.method()
            .is_some_and(|m| m.attributes.contains(MethodAttributes::VIRTUAL))
    }

    /// Returns true if this member is a static method.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.method()
            .is_some_and(|m| m.attributes.contains(MethodAttributes::STATIC))
    }

    /// Returns true if this member is an instance constructor.
    #[must_use]
    pub fn is_instance_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME && self.method().is_some() && !self.is_static()
    }

    /// Returns true if code outside the assembly can reach this member.
    #[must_use]
    pub fn is_visible_outside_assembly(&self) -> bool {
        self.access.is_visible_outside_assembly()
    }

    /// Visit every type reference in this member's signature.
    pub fn for_each_type_ref(&self, visitor: &mut dyn FnMut(&TypeRef)) {
        if let MemberKind::Method(signature) = &self.kind {
            for parameter in &signature.generic_params {
                for constraint in &parameter.constraints {
                    constraint.for_each_type_ref(visitor);
                }
            }
            for parameter in &signature.parameters {
                parameter.for_each_type_ref(visitor);
            }
        }

        if let Some(value_type) = self.kind.value_type() {
            value_type.for_each_type_ref(visitor);
        }
    }

    /// Deep copy with every binding reset.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            name: self.name.clone(),
            declaring_type: self.declaring_type.detached(),
            access: self.access,
            kind: match &self.kind {
                MemberKind::Method(signature) => MemberKind::Method(signature.detached()),
                MemberKind::Field { field_type } => MemberKind::Field {
                    field_type: field_type.as_ref().map(TypeSignature::detached),
                },
                MemberKind::Property { property_type } => MemberKind::Property {
                    property_type: property_type.as_ref().map(TypeSignature::detached),
                },
                MemberKind::Event { event_type } => MemberKind::Event {
                    event_type: event_type.as_ref().map(TypeSignature::detached),
                },
            },
        }
    }

    /// Full name of the member.
    ///
    /// Methods render as `Ret Declaring::Name<T>(P1,P2)` with `System.Void` for methods
    /// without a return type; other members as `Type Declaring::Name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        let declaring = self.declaring_type.full_name();
        match &self.kind {
            MemberKind::Method(signature) => {
                let return_type = signature
                    .return_type
                    .as_ref()
                    .map_or_else(|| "System.Void".to_string(), TypeSignature::full_name);
                let parameters: Vec<String> =
                    signature.parameters.iter().map(TypeSignature::full_name).collect();
                let generics = if signature.generic_params.is_empty() {
                    String::new()
                } else {
                    let names: Vec<&str> =
                        signature.generic_params.iter().map(|p| p.name.as_str()).collect();
                    format!("<{}>", names.join(","))
                };

                format!(
                    "{} {}::{}{}({})",
                    return_type,
                    declaring,
                    self.name,
                    generics,
                    parameters.join(",")
                )
            }
            kind => match kind.value_type() {
                Some(value_type) => format!("{} {}::{}", value_type.full_name(), declaring, self.name),
                None => format!("{}::{}", declaring, self.name),
            },
        }
    }
}

impl fmt::Display for MemberDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
