//! Generic constraints and variance must not change incompatibly.
//!
//! For each pair of generic parameters at the same position, on a type and on a method:
//!
//! | Change | Reported |
//! |--------|----------|
//! | `class`, `struct`, `new()` or a constraint type added | always, as `Added` |
//! | one of them removed | unless removal is permitted, as `Removed` |
//! | variance `out`/`in` changed or dropped | `Changed`, or `Removed` when dropped |
//! | variance introduced on an invariant parameter | never |
//!
//! Removal is permitted on a sealed type and on a non-virtual method: only an override chain
//! could observe the wider set of type arguments.
//!
//! Constraint types are compared under the identity comparer; a constraint type that does not
//! resolve is left out of the comparison. When the two sides have a different number of
//! generic parameters the rule reports nothing for that pair and records a
//! [`DiagnosticCategory::Rule`] diagnostic.

use crate::{
    comparing::{CompatDifference, DifferenceType, Rule, RuleContext},
    diagnostics::DiagnosticCategory,
    identity::IdentityComparer,
    mapping::{MemberMapper, TypeMapper},
    symbols::{GenericParameter, TypeSignature, Variance},
};

/// Reports incompatible changes to generic constraints and variance.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannotChangeGenericConstraints;

impl CannotChangeGenericConstraints {
    /// Create the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for CannotChangeGenericConstraints {
    fn name(&self) -> &'static str {
        "CannotChangeGenericConstraints"
    }

    fn run_on_type(
        &self,
        mapper: &TypeMapper,
        context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        let Some((left, right)) = mapper.both() else {
            return;
        };

        compare_parameters(
            &ParameterOwner {
                display_name: left.full_name(),
                permit_removal: left.is_sealed(),
            },
            &left.generic_params,
            &right.generic_params,
            context,
            differences,
        );
    }

    fn run_on_member(
        &self,
        _owner: &TypeMapper,
        mapper: &MemberMapper,
        context: &RuleContext<'_>,
        differences: &mut Vec<CompatDifference>,
    ) {
        let Some((left, right)) = mapper.both() else {
            return;
        };
        let (Some(left_method), Some(right_method)) = (left.method(), right.method()) else {
            return;
        };

        compare_parameters(
            &ParameterOwner {
                display_name: left.full_name(),
                permit_removal: !left.is_virtual(),
            },
            &left_method.generic_params,
            &right_method.generic_params,
            context,
            differences,
        );
    }
}

struct ParameterOwner {
    display_name: String,
    permit_removal: bool,
}

fn compare_parameters(
    owner: &ParameterOwner,
    left: &[GenericParameter],
    right: &[GenericParameter],
    context: &RuleContext<'_>,
    differences: &mut Vec<CompatDifference>,
) {
    if left.len() != right.len() {
        context.diagnostics.info(
            DiagnosticCategory::Rule,
            format!(
                "Skipped generic constraint comparison of '{}': {} generic parameters on left, {} on right",
                owner.display_name,
                left.len(),
                right.len()
            ),
        );
        return;
    }

    for (left_param, right_param) in left.iter().zip(right) {
        compare_parameter(owner, left_param, right_param, context.comparer, differences);
    }
}

fn compare_parameter(
    owner: &ParameterOwner,
    left: &GenericParameter,
    right: &GenericParameter,
    comparer: &IdentityComparer,
    differences: &mut Vec<CompatDifference>,
) {
    let mut added = Vec::new();
    let mut removed = Vec::new();

    let special_constraints: [(fn(&GenericParameter) -> bool, &str); 3] = [
        (GenericParameter::has_reference_type_constraint, "class"),
        (GenericParameter::has_value_type_constraint, "struct"),
        (GenericParameter::has_default_constructor_constraint, "new()"),
    ];
    for (has_constraint, name) in special_constraints {
        match (has_constraint(left), has_constraint(right)) {
            (false, true) => added.push(name.to_string()),
            (true, false) if !owner.permit_removal => removed.push(name.to_string()),
            _ => {}
        }
    }

    let left_types = constraint_types(&left.constraints, comparer);
    let right_types = constraint_types(&right.constraints, comparer);

    added.extend(
        set_difference(&right_types, &left_types, comparer)
            .into_iter()
            .map(TypeSignature::full_name),
    );
    for constraint in added {
        differences.push(constraint_difference(DifferenceType::Added, owner, left, constraint));
    }

    if !owner.permit_removal {
        removed.extend(
            set_difference(&left_types, &right_types, comparer)
                .into_iter()
                .map(TypeSignature::full_name),
        );
        for constraint in removed {
            differences.push(constraint_difference(DifferenceType::Removed, owner, left, constraint));
        }
    }

    let (from, to) = (left.variance(), right.variance());
    if from != to && from != Variance::Invariant {
        differences.push(CompatDifference::CannotChangeGenericVariance {
            difference_type: if to == Variance::Invariant {
                DifferenceType::Removed
            } else {
                DifferenceType::Changed
            },
            owner: owner.display_name.clone(),
            parameter: left.name.clone(),
            from,
            to,
        });
    }
}

fn constraint_difference(
    difference_type: DifferenceType,
    owner: &ParameterOwner,
    parameter: &GenericParameter,
    constraint: String,
) -> CompatDifference {
    CompatDifference::CannotChangeGenericConstraint {
        difference_type,
        owner: owner.display_name.clone(),
        parameter: parameter.name.clone(),
        constraint,
    }
}

/// Resolvable constraint types, without duplicates, in declaration order.
fn constraint_types<'a>(
    constraints: &'a [TypeSignature],
    comparer: &IdentityComparer,
) -> Vec<&'a TypeSignature> {
    let mut result: Vec<&TypeSignature> = Vec::with_capacity(constraints.len());
    for constraint in constraints.iter().filter(|c| c.is_resolved()) {
        if !result
            .iter()
            .any(|existing| comparer.signature_equals(existing, constraint))
        {
            result.push(constraint);
        }
    }
    result
}

/// Elements of `from` without an equal element in `without`.
fn set_difference<'a>(
    from: &[&'a TypeSignature],
    without: &[&TypeSignature],
    comparer: &IdentityComparer,
) -> Vec<&'a TypeSignature> {
    from.iter()
        .copied()
        .filter(|candidate| {
            !without
                .iter()
                .any(|other| comparer.signature_equals(candidate, other))
        })
        .collect()
}
