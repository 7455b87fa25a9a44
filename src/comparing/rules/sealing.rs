//! Types that could be subclassed must stay subclassable.
//!
//! A type is *effectively sealed* when it is declared `sealed` or when it has no instance
//! constructor visible outside its assembly: a derived type in another assembly would have
//! no constructor to chain to. Becoming effectively sealed breaks every external subclass,
//! so it is reported; the opposite transition is always safe.
//!
//! Interfaces are exempt, and pairs with a side missing are additions or removals, which are
//! not this rule's concern.

use crate::{
    comparing::{CompatDifference, Rule, RuleContext},
    mapping::TypeMapper,
};

/// Reports types that became effectively sealed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannotSealType;

impl CannotSealType {
    /// Create the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for CannotSealType {
    fn name(&self) -> &'static str {
        "CannotSealType"
    }

    fn run_on_type(
        &self,
        mapper: &TypeMapper,
        _context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        let Some((left, right)) = mapper.both() else {
            return;
        };
        if left.is_interface() || right.is_interface() {
            return;
        }

        if !left.is_effectively_sealed() && right.is_effectively_sealed() {
            differences.push(CompatDifference::CannotSealType {
                type_name: right.full_name(),
                declared_sealed: right.is_sealed(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        comparing::DifferenceType,
        symbols::{MemberAccess, TypeBuilder},
        test::compare_types,
    };

    #[test]
    fn test_sealing_reported() {
        let differences = compare_types(
            TypeBuilder::class("Lib", "Widget").default_constructor(),
            TypeBuilder::class("Lib", "Widget").default_constructor().sealed(),
        );
        assert_eq!(differences.len(), 1);
        assert_eq!(differences[0].difference_type(), DifferenceType::Changed);
        assert_eq!(
            differences[0].message(),
            "Type 'Lib.Widget' has the sealed modifier on right but not on left"
        );
    }

    #[test]
    fn test_hidden_constructor_reported() {
        let differences = compare_types(
            TypeBuilder::class("Lib", "Widget").default_constructor(),
            TypeBuilder::class("Lib", "Widget").constructor(MemberAccess::Assembly),
        );
        assert_eq!(differences.len(), 1);
        assert_eq!(
            differences[0].message(),
            "Type 'Lib.Widget' is sealed because it has no visible constructor on right but it does on left"
        );
    }

    #[test]
    fn test_protected_constructor_keeps_type_open() {
        let differences = compare_types(
            TypeBuilder::class("Lib", "Widget").default_constructor(),
            TypeBuilder::class("Lib", "Widget").constructor(MemberAccess::Family),
        );
        assert!(differences.is_empty());
    }

    #[test]
    fn test_unsealing_and_interfaces_ignored() {
        assert!(compare_types(
            TypeBuilder::class("Lib", "Widget").sealed(),
            TypeBuilder::class("Lib", "Widget").default_constructor(),
        )
        .is_empty());

        assert!(compare_types(
            TypeBuilder::interface("Lib", "IWidget"),
            TypeBuilder::interface("Lib", "IWidget"),
        )
        .is_empty());
    }
}
