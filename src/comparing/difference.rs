//! Compatibility differences produced by rules.

use std::fmt;

use strum::{Display, EnumIter, EnumString};

use crate::symbols::Variance;

/// How a difference affects the Right side relative to the Left side.
///
/// The declaration order is the canonical sort order of suppression entries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter,
)]
pub enum DifferenceType {
    /// Something exists on the Right that did not exist on the Left
    Added,
    /// Something that existed on the Left is gone on the Right
    Removed,
    /// Something exists on both sides but differs
    Changed,
}

const RULES_NAMESPACE: &str = "ArApiCompat.ApiCompatibility.Comparing.Rules";

/// A single compatibility violation between the Left and Right side of a mapper node.
///
/// For suppression purposes a difference is identified by exactly
/// ([`CompatDifference::type_tag`], [`CompatDifference::difference_type`],
/// [`CompatDifference::message`]); the remaining payload only feeds the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompatDifference {
    /// A type that could be subclassed on the Left can no longer be subclassed on the Right.
    CannotSealType {
        /// Full name of the Right type
        type_name: String,
        /// True if the Right type is declared `sealed`, false if it is only sealed because
        /// it has no visible instance constructor
        declared_sealed: bool,
    },
    /// A generic constraint was added, or removed where removal is unsafe.
    CannotChangeGenericConstraint {
        /// `Added` or `Removed`
        difference_type: DifferenceType,
        /// Display name of the Left type or method owning the parameter
        owner: String,
        /// Name of the Left generic parameter
        parameter: String,
        /// `class`, `struct`, `new()` or the display name of a constraint type
        constraint: String,
    },
    /// The variance of a generic parameter was changed or removed.
    CannotChangeGenericVariance {
        /// `Removed` when the Right parameter is invariant, `Changed` otherwise
        difference_type: DifferenceType,
        /// Display name of the Left type or method owning the parameter
        owner: String,
        /// Name of the Left generic parameter
        parameter: String,
        /// Left variance
        from: Variance,
        /// Right variance
        to: Variance,
    },
}

impl CompatDifference {
    /// The kind of change.
    #[must_use]
    pub fn difference_type(&self) -> DifferenceType {
        match self {
            CompatDifference::CannotSealType { .. } => DifferenceType::Changed,
            CompatDifference::CannotChangeGenericConstraint {
                difference_type, ..
            }
            | CompatDifference::CannotChangeGenericVariance {
                difference_type, ..
            } => *difference_type,
        }
    }

    /// Short name of the difference variant.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            CompatDifference::CannotSealType { .. } => "CannotSealType",
            CompatDifference::CannotChangeGenericConstraint { .. } => {
                "CannotChangeGenericConstraint"
            }
            CompatDifference::CannotChangeGenericVariance { .. } => "CannotChangeGenericVariance",
        }
    }

    /// Fully qualified tag of the difference variant, as stored in the `TypeName` element of
    /// suppression files.
    #[must_use]
    pub fn type_tag(&self) -> String {
        format!("{}.{}Difference", RULES_NAMESPACE, self.kind_name())
    }

    /// Human readable description. Suppressions match on this text verbatim.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            CompatDifference::CannotSealType {
                type_name,
                declared_sealed: true,
            } => format!("Type '{type_name}' has the sealed modifier on right but not on left"),
            CompatDifference::CannotSealType {
                type_name,
                declared_sealed: false,
            } => format!(
                "Type '{type_name}' is sealed because it has no visible constructor on right but it does on left"
            ),
            CompatDifference::CannotChangeGenericConstraint {
                difference_type,
                owner,
                parameter,
                constraint,
            } => format!(
                "Cannot {} constraint '{constraint}' on type parameter '{parameter}' of '{owner}'",
                if *difference_type == DifferenceType::Added {
                    "add"
                } else {
                    "remove"
                }
            ),
            CompatDifference::CannotChangeGenericVariance {
                owner,
                parameter,
                from,
                to,
                ..
            } => format!(
                "Cannot change variance of type parameter '{parameter}' on '{owner}' from {from} to {to}"
            ),
        }
    }
}

impl fmt::Display for CompatDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.kind_name(),
            self.difference_type(),
            self.message()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_messages() {
        let sealed = CompatDifference::CannotSealType {
            type_name: "Lib.Widget".to_string(),
            declared_sealed: true,
        };
        assert_eq!(sealed.difference_type(), DifferenceType::Changed);
        assert_eq!(
            sealed.message(),
            "Type 'Lib.Widget' has the sealed modifier on right but not on left"
        );
        assert_eq!(
            sealed.type_tag(),
            "ArApiCompat.ApiCompatibility.Comparing.Rules.CannotSealTypeDifference"
        );

        let constraint = CompatDifference::CannotChangeGenericConstraint {
            difference_type: DifferenceType::Removed,
            owner: "Lib.C`1".to_string(),
            parameter: "T".to_string(),
            constraint: "class".to_string(),
        };
        assert_eq!(
            constraint.to_string(),
            "CannotChangeGenericConstraint (Removed): Cannot remove constraint 'class' on type parameter 'T' of 'Lib.C`1'"
        );

        let variance = CompatDifference::CannotChangeGenericVariance {
            difference_type: DifferenceType::Changed,
            owner: "Lib.I`1".to_string(),
            parameter: "T".to_string(),
            from: Variance::Covariant,
            to: Variance::Contravariant,
        };
        assert_eq!(
            variance.message(),
            "Cannot change variance of type parameter 'T' on 'Lib.I`1' from covariant ('out') to contravariant ('in')"
        );
    }

    #[test]
    fn test_difference_type_order_and_names() {
        assert!(DifferenceType::Added < DifferenceType::Removed);
        assert!(DifferenceType::Removed < DifferenceType::Changed);
        assert_eq!("Changed".parse::<DifferenceType>().unwrap(), DifferenceType::Changed);
        assert!("changed".parse::<DifferenceType>().is_err());
    }
}
