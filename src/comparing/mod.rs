//! The rule engine: walks a mapper tree and collects compatibility differences.
//!
//! An [`ApiComparer`] holds a fixed, ordered list of [`Rule`]s. For every
//! [`TypeMapper`] of an [`AssemblyMapper`] (in first-seen order) it runs every rule on the
//! type, then, for each of the type's [`MemberMapper`]s, every rule on the member. All
//! differences land in one ordered list.
//!
//! # Rules
//!
//! - [`CannotSealType`] - a type that could be subclassed must stay subclassable
//! - [`CannotChangeGenericConstraints`] - generic constraints may not be added, may only be
//!   removed where no override chain can observe it, and variance may only be introduced
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::comparing::{ApiComparer, DifferenceType};
//! use dotcompat::diagnostics::Diagnostics;
//! use dotcompat::mapping::{AssemblyMapper, MapperSettings};
//! use dotcompat::symbols::{AssemblyBuilder, TypeBuilder};
//! use std::sync::Arc;
//!
//! let left = AssemblyBuilder::new("Lib")
//!     .type_def(TypeBuilder::class("Lib", "Widget").default_constructor())
//!     .build();
//! let right = AssemblyBuilder::new("Lib")
//!     .type_def(TypeBuilder::class("Lib", "Widget").default_constructor().sealed())
//!     .build();
//!
//! let diagnostics = Arc::new(Diagnostics::new());
//! let mapper = AssemblyMapper::create(Arc::new(left), Arc::new(right), MapperSettings::default(), diagnostics);
//!
//! let mut comparer = ApiComparer::new();
//! comparer.compare(&mapper);
//! assert_eq!(comparer.differences().len(), 1);
//! assert_eq!(comparer.differences()[0].difference_type(), DifferenceType::Changed);
//! ```

mod difference;
mod rules;

pub use difference::{CompatDifference, DifferenceType};
pub use rules::{CannotChangeGenericConstraints, CannotSealType};

use crate::{
    diagnostics::Diagnostics,
    identity::IdentityComparer,
    mapping::{AssemblyMapper, MemberMapper, TypeMapper},
};

/// What a rule may consult besides the mapper node it is run on.
pub struct RuleContext<'a> {
    /// Identity comparer the mapper tree was built with
    pub comparer: &'a IdentityComparer,
    /// Sink for pairs a rule had to skip
    pub diagnostics: &'a Diagnostics,
}

/// A compatibility rule.
///
/// Both visit methods default to doing nothing, so a rule implements only the level it cares
/// about. Rules only ever append to `differences`.
pub trait Rule: Send + Sync {
    /// Name of the rule, used in diagnostics.
    fn name(&self) -> &'static str;

    /// Inspect a correlated type.
    fn run_on_type(
        &self,
        _mapper: &TypeMapper,
        _context: &RuleContext<'_>,
        _differences: &mut Vec<CompatDifference>,
    ) {
    }

    /// Inspect a correlated member of `owner`.
    fn run_on_member(
        &self,
        _owner: &TypeMapper,
        _mapper: &MemberMapper,
        _context: &RuleContext<'_>,
        _differences: &mut Vec<CompatDifference>,
    ) {
    }
}

/// The rules every [`ApiComparer::new`] runs, in order.
#[must_use]
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(CannotSealType::new()),
        Box::new(CannotChangeGenericConstraints::new()),
    ]
}

/// Runs rules over mapper trees and accumulates the differences they report.
pub struct ApiComparer {
    rules: Vec<Box<dyn Rule>>,
    differences: Vec<CompatDifference>,
}

impl Default for ApiComparer {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiComparer {
    /// Create a comparer with [`default_rules`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Create a comparer with an explicit rule list.
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            rules,
            differences: Vec::new(),
        }
    }

    /// Names of the configured rules, in execution order.
    #[must_use]
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Run every rule over every node of `mapper`, appending to the differences collected
    /// so far.
    pub fn compare(&mut self, mapper: &AssemblyMapper) {
        let context = RuleContext {
            comparer: mapper.settings().identity(),
            diagnostics: mapper.diagnostics(),
        };

        for ty in mapper.types() {
            for rule in &self.rules {
                rule.run_on_type(ty, &context, &mut self.differences);
            }

            for member in ty.members() {
                for rule in &self.rules {
                    rule.run_on_member(ty, member, &context, &mut self.differences);
                }
            }
        }
    }

    /// Differences collected so far.
    #[must_use]
    pub fn differences(&self) -> &[CompatDifference] {
        &self.differences
    }

    /// Consume the comparer, returning the collected differences.
    #[must_use]
    pub fn into_differences(self) -> Vec<CompatDifference> {
        self.differences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::MapperSettings,
        symbols::{AssemblyBuilder, TypeBuilder},
    };
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    struct CountingRule {
        types: Arc<AtomicUsize>,
        members: Arc<AtomicUsize>,
    }

    impl Rule for CountingRule {
        fn name(&self) -> &'static str {
            "Counting"
        }

        fn run_on_type(&self, _: &TypeMapper, _: &RuleContext<'_>, _: &mut Vec<CompatDifference>) {
            self.types.fetch_add(1, Ordering::Relaxed);
        }

        fn run_on_member(
            &self,
            _: &TypeMapper,
            _: &MemberMapper,
            _: &RuleContext<'_>,
            _: &mut Vec<CompatDifference>,
        ) {
            self.members.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_comparer_visits_every_node_once_per_rule() {
        let left = AssemblyBuilder::new("Lib")
            .type_def(
                TypeBuilder::class("Lib", "A")
                    .default_constructor()
                    .method("Run", |m| m)
                    .nested_type(TypeBuilder::new("N").nested_public().method("Go", |m| m)),
            )
            .build();
        let right = AssemblyBuilder::new("Lib")
            .type_def(TypeBuilder::class("Lib", "A").default_constructor())
            .type_def(TypeBuilder::class("Lib", "B").method("Other", |m| m))
            .build();
        let mapper = AssemblyMapper::create(
            Arc::new(left),
            Arc::new(right),
            MapperSettings::default(),
            Arc::new(Diagnostics::new()),
        );

        let types = Arc::new(AtomicUsize::new(0));
        let members = Arc::new(AtomicUsize::new(0));
        let counting = || CountingRule {
            types: types.clone(),
            members: members.clone(),
        };
        let mut comparer = ApiComparer::with_rules(vec![Box::new(counting()), Box::new(counting())]);
        comparer.compare(&mapper);

        // A, A+N, B; .ctor, Run, Go, Other
        assert_eq!(types.load(Ordering::Relaxed), 6);
        assert_eq!(members.load(Ordering::Relaxed), 8);
        assert!(comparer.differences().is_empty());
        assert_eq!(comparer.rule_names(), ["Counting", "Counting"]);
    }

    #[test]
    fn test_default_rules() {
        assert_eq!(
            ApiComparer::new().rule_names(),
            ["CannotSealType", "CannotChangeGenericConstraints"]
        );
    }
}
