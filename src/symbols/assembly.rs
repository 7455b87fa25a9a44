//! Assembly identity and the assembly/module containers of the symbol model.
//!
//! An assembly is identified by its [`AssemblyName`]: a simple name, a four-part
//! [`AssemblyVersion`] and an optional culture. Compatibility comparison deliberately looks
//! past version numbers (the Right side of a comparison is usually a newer build of the very
//! same assembly), so [`AssemblyName`] offers both a strict and a version-agnostic equality.
//!
//! # Key Components
//!
//! - [`AssemblyVersion`] - Four-part `major.minor.build.revision` version
//! - [`AssemblyName`] - Name, version and culture of an assembly or assembly reference
//! - [`AssemblyDefinition`] - A loaded assembly: its name and its modules
//! - [`ModuleDefinition`] - Top-level types and exported-type forwarders of one module
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::symbols::{AssemblyName, AssemblyVersion};
//!
//! let v1 = AssemblyName::parse("Contoso.Core, Version=1.0.0.0, Culture=neutral")?;
//! let v2 = AssemblyName::new("contoso.core", AssemblyVersion::new(2, 0, 0, 0));
//!
//! assert_ne!(v1, v2);
//! assert!(v1.matches(&v2, true));
//! assert!(!v1.matches(&v2, false));
//! # Ok::<(), dotcompat::Error>(())
//! ```

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    symbols::types::{TypeDefinition, TypeRef, TypeScope},
    Error, Result,
};

/// Four-part version numbering for .NET assemblies.
///
/// Versions are compared component-wise in order: major, minor, build, revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVersion {
    /// Major version component.
    pub major: u16,
    /// Minor version component.
    pub minor: u16,
    /// Build version component.
    pub build: u16,
    /// Revision version component.
    pub revision: u16,
}

impl AssemblyVersion {
    /// Create a new version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parse a dotted version string.
    ///
    /// Between one and four components are accepted, missing trailing components are zero.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] if the string has more than four components or a
    /// component is not a valid `u16`.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if parts.is_empty() || parts.len() > 4 {
            return Err(malformed_error!("Invalid version format: {}", version_str));
        }

        let mut components = [0u16; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part
                .trim()
                .parse::<u16>()
                .map_err(|_| malformed_error!("Invalid version component: {}", part))?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl fmt::Display for AssemblyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

impl FromStr for AssemblyVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identity of an assembly, as carried by definitions, references and type scopes.
///
/// The derived [`PartialEq`] is strict (exact name, version and culture). Use
/// [`AssemblyName::matches`] for the comparison semantics of the compatibility engine,
/// which compares simple names ASCII case-insensitively and optionally ignores the version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssemblyName {
    /// Simple assembly name (e.g. "System.Runtime").
    pub name: String,

    /// Four-part version.
    pub version: AssemblyVersion,

    /// Culture of a satellite assembly, `None` for culture-neutral assemblies.
    pub culture: Option<String>,
}

impl AssemblyName {
    /// Create a culture-neutral assembly name.
    pub fn new(name: impl Into<String>, version: AssemblyVersion) -> Self {
        Self {
            name: name.into(),
            version,
            culture: None,
        }
    }

    /// Set the culture of this name.
    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = Some(culture.into());
        self
    }

    /// Parse an assembly display name.
    ///
    /// ```text
    /// AssemblyName[, Version=Major.Minor.Build.Revision][, Culture=culture]
    /// ```
    ///
    /// Unknown components (such as `PublicKeyToken`) are ignored, `Culture=neutral`
    /// maps to `None`.
    ///
    /// # Errors
    /// Returns [`Error::Malformed`] for an empty name or an invalid version.
    pub fn parse(display_name: &str) -> Result<Self> {
        let mut parts = display_name.split(',').map(str::trim);

        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(malformed_error!("Assembly name cannot be empty"));
        }

        let mut result = Self::new(name, AssemblyVersion::default());
        for part in parts {
            if let Some(value) = part.strip_prefix("Version=") {
                result.version = AssemblyVersion::parse(value)?;
            } else if let Some(value) = part.strip_prefix("Culture=") {
                if !value.eq_ignore_ascii_case("neutral") {
                    result.culture = Some(value.to_string());
                }
            }
        }

        Ok(result)
    }

    /// Compare two names the way the compatibility engine does.
    ///
    /// Simple names compare ASCII case-insensitively, cultures exactly. The version only
    /// participates when `version_agnostic` is false.
    #[must_use]
    pub fn matches(&self, other: &AssemblyName, version_agnostic: bool) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.culture == other.culture
            && (version_agnostic || self.version == other.version)
    }

    /// Display name in the standard `Name, Version=..., Culture=...` form.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!(
            "{}, Version={}, Culture={}",
            self.name,
            self.version,
            self.culture.as_deref().unwrap_or("neutral")
        )
    }
}

impl fmt::Display for AssemblyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for AssemblyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A module of an assembly.
///
/// Only the parts relevant for API comparison are modelled: the top-level type definitions
/// (nested types hang off their declaring type) and the exported-type entries, which
/// forward a type name to another assembly.
#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    /// Module file name (e.g. "Contoso.Core.dll").
    pub name: String,

    /// Top-level types defined in this module.
    pub types: Vec<Arc<TypeDefinition>>,

    /// Exported-type forwarders. Each entry is a reference scoped to the assembly the type
    /// was forwarded to.
    pub exported_types: Vec<TypeRef>,
}

impl ModuleDefinition {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            exported_types: Vec::new(),
        }
    }

    /// Deep copy of this module whose type references are all unbound.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            name: self.name.clone(),
            types: self
                .types
                .iter()
                .map(|t| Arc::new(t.detached()))
                .collect(),
            exported_types: self.exported_types.iter().map(TypeRef::detached).collect(),
        }
    }

    /// Find a top-level type by namespace and name.
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.types
            .iter()
            .find(|t| t.descriptor.namespace == namespace && t.descriptor.name == name)
    }

    /// Find an exported-type forwarder by namespace and name.
    pub fn find_exported_type(&self, namespace: &str, name: &str) -> Option<&TypeRef> {
        self.exported_types
            .iter()
            .find(|t| t.namespace == namespace && t.name == name)
    }
}

/// A loaded assembly.
#[derive(Debug, Clone)]
pub struct AssemblyDefinition {
    /// Identity of this assembly.
    pub name: AssemblyName,

    /// Modules of this assembly, the manifest module first.
    pub modules: Vec<ModuleDefinition>,
}

impl AssemblyDefinition {
    /// Create an assembly without modules.
    pub fn new(name: AssemblyName) -> Self {
        Self {
            name,
            modules: Vec::new(),
        }
    }

    /// Deep copy of this assembly whose type references are all unbound.
    ///
    /// Symbol providers hand out detached copies so that two resolution universes never
    /// observe each other's bindings.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            name: self.name.clone(),
            modules: self.modules.iter().map(ModuleDefinition::detached).collect(),
        }
    }

    /// Find a top-level type defined in any module of this assembly.
    pub fn find_type(&self, namespace: &str, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.modules
            .iter()
            .find_map(|m| m.find_type(namespace, name))
    }

    /// Find an exported-type forwarder in any module of this assembly.
    pub fn find_exported_type(&self, namespace: &str, name: &str) -> Option<&TypeRef> {
        self.modules
            .iter()
            .find_map(|m| m.find_exported_type(namespace, name))
    }

    /// Resolve a reference against the types defined in this assembly alone.
    ///
    /// The reference must be scoped to this assembly (compared version-agnostically);
    /// forwarders are not followed.
    pub fn resolve_local(&self, reference: &TypeRef) -> Option<Arc<TypeDefinition>> {
        match &reference.scope {
            TypeScope::Assembly(name) if name.matches(&self.name, true) => self
                .find_type(&reference.namespace, &reference.name)
                .cloned(),
            TypeScope::Assembly(_) => None,
            TypeScope::Nested(declaring) => self
                .resolve_local(declaring)?
                .find_nested(&reference.namespace, &reference.name)
                .cloned(),
        }
    }

    /// Every type definition of this assembly, nested types included, in depth-first order.
    pub fn all_types(&self) -> Vec<Arc<TypeDefinition>> {
        let mut result = Vec::new();
        let mut stack: Vec<Arc<TypeDefinition>> = self
            .modules
            .iter()
            .flat_map(|m| m.types.iter())
            .rev()
            .cloned()
            .collect();

        while let Some(ty) = stack.pop() {
            for nested in ty.nested_types.iter().rev() {
                stack.push(nested.clone());
            }
            result.push(ty);
        }

        result
    }
}
