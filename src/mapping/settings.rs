//! Mapper configuration: which symbols take part and how they are identified.

use std::{fmt, sync::Arc};

use crate::{
    identity::IdentityComparer,
    symbols::{MemberDefinition, TypeDefinition},
};

/// A symbol presented to a [`SymbolFilter`].
#[derive(Debug, Clone, Copy)]
pub enum SymbolRef<'a> {
    /// A type, top-level or nested
    Type(&'a TypeDefinition),
    /// A member of a type
    Member(&'a MemberDefinition),
}

impl SymbolRef<'_> {
    /// Returns true if the symbol is reachable from outside its assembly.
    ///
    /// For nested types this only looks at the type's own accessibility; the mapper never
    /// reaches a nested type whose declaring type was filtered out.
    #[must_use]
    pub fn is_visible_outside_assembly(&self) -> bool {
        match self {
            SymbolRef::Type(ty) => ty.is_visible_outside_assembly(),
            SymbolRef::Member(member) => member.is_visible_outside_assembly(),
        }
    }
}

/// Predicate deciding whether a symbol takes part in the comparison.
pub type SymbolFilter = Arc<dyn Fn(SymbolRef<'_>) -> bool + Send + Sync>;

/// Settings handed to [`crate::mapping::AssemblyMapper`].
///
/// # Examples
///
/// ```rust
/// use dotcompat::identity::IdentityComparer;
/// use dotcompat::mapping::{MapperSettings, SymbolRef};
///
/// // Everything, including internal types, compared with exact assembly versions
/// let settings = MapperSettings::new()
///     .filter(|_symbol: SymbolRef<'_>| true)
///     .comparer(IdentityComparer::STRICT);
/// assert!(!settings.identity().is_version_agnostic());
/// ```
#[derive(Clone)]
pub struct MapperSettings {
    filter: SymbolFilter,
    comparer: IdentityComparer,
}

impl Default for MapperSettings {
    fn default() -> Self {
        Self {
            filter: Arc::new(|symbol: SymbolRef<'_>| symbol.is_visible_outside_assembly()),
            comparer: IdentityComparer::VERSION_AGNOSTIC,
        }
    }
}

impl fmt::Debug for MapperSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperSettings")
            .field("comparer", &self.comparer)
            .finish_non_exhaustive()
    }
}

impl MapperSettings {
    /// Visible-outside-assembly filter, version-agnostic identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the symbol filter.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(SymbolRef<'_>) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    /// Replace the identity comparer.
    #[must_use]
    pub fn comparer(mut self, comparer: IdentityComparer) -> Self {
        self.comparer = comparer;
        self
    }

    /// The identity comparer used to correlate symbols.
    #[must_use]
    pub fn identity(&self) -> &IdentityComparer {
        &self.comparer
    }

    /// Returns true if `symbol` takes part in the comparison.
    #[must_use]
    pub fn include(&self, symbol: SymbolRef<'_>) -> bool {
        (self.filter)(symbol)
    }

    /// Shorthand for `include(SymbolRef::Type(ty))`.
    #[must_use]
    pub fn include_type(&self, ty: &TypeDefinition) -> bool {
        self.include(SymbolRef::Type(ty))
    }

    /// Shorthand for `include(SymbolRef::Member(member))`.
    #[must_use]
    pub fn include_member(&self, member: &MemberDefinition) -> bool {
        self.include(SymbolRef::Member(member))
    }
}
