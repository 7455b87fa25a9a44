//! Durable, reviewable exemptions for known compatibility differences.
//!
//! A [`SuppressionFile`] lists, per Left/Right [`Comparison`], the differences maintainers
//! accepted. A [`Suppression`] matches a [`CompatDifference`] when kind, type tag and message
//! are all equal; any change to a rule's message text therefore invalidates the suppressions
//! that referenced it and forces a new review.
//!
//! # File Format
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <ArCompatSuppressions>
//!   <Comparison Left="v1/Lib.dll" Right="v2/Lib.dll">
//!     <Suppression DifferenceType="Changed">
//!       <TypeName>ArApiCompat.ApiCompatibility.Comparing.Rules.CannotSealTypeDifference</TypeName>
//!       <Message>Type 'Lib.Widget' has the sealed modifier on right but not on left</Message>
//!     </Suppression>
//!   </Comparison>
//! </ArCompatSuppressions>
//! ```
//!
//! Serialization is canonical: comparisons sorted by (Left, Right), suppressions by
//! (DifferenceType, TypeName, Message). Logically equal files serialize to identical bytes,
//! which keeps version-control diffs of the file meaningful.
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::comparing::DifferenceType;
//! use dotcompat::suppressions::{Comparison, Suppression, SuppressionFile};
//!
//! let mut accepted = SuppressionFile::new();
//! let mut comparison = Comparison::new("v1/Lib.dll", "v2/Lib.dll");
//! comparison.suppressions.push(Suppression::new(DifferenceType::Changed, "Tag", "Message"));
//! accepted.comparisons.push(comparison);
//!
//! let xml = accepted.to_xml()?;
//! assert_eq!(SuppressionFile::from_xml(&xml)?, accepted);
//!
//! let (unsuppressed, stale) = accepted.remove_suppressions_from(&accepted);
//! assert!(unsuppressed.is_empty());
//! assert!(!stale);
//! # Ok::<(), dotcompat::Error>(())
//! ```

mod xml;

use std::{fs, path::Path};

use crate::{
    comparing::{CompatDifference, DifferenceType},
    Result,
};

/// An accepted difference.
///
/// Field order is the canonical sort order; absent values sort before present ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Suppression {
    /// Kind of the suppressed difference
    pub difference_type: DifferenceType,
    /// Type tag of the suppressed difference
    pub type_name: Option<String>,
    /// Exact message of the suppressed difference
    pub message: Option<String>,
}

impl Suppression {
    /// Create a suppression with both tag and message.
    pub fn new(
        difference_type: DifferenceType,
        type_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            difference_type,
            type_name: Some(type_name.into()),
            message: Some(message.into()),
        }
    }

    /// The suppression that exactly matches `difference`.
    #[must_use]
    pub fn from_difference(difference: &CompatDifference) -> Self {
        Self::new(
            difference.difference_type(),
            difference.type_tag(),
            difference.message(),
        )
    }

    /// Returns true if this suppression covers `difference`.
    ///
    /// A suppression lacking a type tag or a message matches nothing.
    #[must_use]
    pub fn matches(&self, difference: &CompatDifference) -> bool {
        self.difference_type == difference.difference_type()
            && self.type_name.as_deref() == Some(difference.type_tag().as_str())
            && self.message.as_deref() == Some(difference.message().as_str())
    }
}

/// Suppressions of one Left/Right comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comparison {
    /// Name of the Left side, as given in the job
    pub left: String,
    /// Name of the Right side, as given in the job
    pub right: String,
    /// Accepted differences
    pub suppressions: Vec<Suppression>,
}

impl Comparison {
    /// Create a comparison without suppressions.
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            suppressions: Vec::new(),
        }
    }

    /// Index of the first suppression structurally equal to `suppression`.
    #[must_use]
    pub fn position_of(&self, suppression: &Suppression) -> Option<usize> {
        self.suppressions.iter().position(|s| s == suppression)
    }

    /// Index of the first suppression covering `difference`.
    #[must_use]
    pub fn position_matching(&self, difference: &CompatDifference) -> Option<usize> {
        self.suppressions.iter().position(|s| s.matches(difference))
    }
}

/// The persisted set of accepted differences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SuppressionFile {
    /// Comparisons, in file order
    pub comparisons: Vec<Comparison>,
}

impl SuppressionFile {
    /// Create an empty file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no comparison holds a suppression.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comparisons.iter().all(|c| c.suppressions.is_empty())
    }

    /// Total number of suppressions across all comparisons.
    #[must_use]
    pub fn suppression_count(&self) -> usize {
        self.comparisons.iter().map(|c| c.suppressions.len()).sum()
    }

    /// The first comparison with exactly these names.
    #[must_use]
    pub fn get_comparison(&self, left: &str, right: &str) -> Option<&Comparison> {
        self.comparisons
            .iter()
            .find(|c| c.left == left && c.right == right)
    }

    /// Canonical file suppressing every difference of every `(left, right, differences)` entry.
    pub fn from_differences<'a, I>(comparisons: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a [CompatDifference])>,
    {
        let mut file = Self::new();
        for (left, right, differences) in comparisons {
            file.add_differences(left, right, differences);
        }
        file.sort();
        file
    }

    /// Append a comparison suppressing every entry of `differences`, unless there are none.
    pub fn add_differences(&mut self, left: &str, right: &str, differences: &[CompatDifference]) {
        if differences.is_empty() {
            return;
        }

        let mut comparison = Comparison::new(left, right);
        comparison
            .suppressions
            .extend(differences.iter().map(Suppression::from_difference));
        self.comparisons.push(comparison);
    }

    /// Sort into canonical order.
    pub fn sort(&mut self) {
        self.comparisons
            .sort_by(|a, b| (&a.left, &a.right).cmp(&(&b.left, &b.right)));
        for comparison in &mut self.comparisons {
            comparison.suppressions.sort();
        }
    }

    /// Set difference `self − other`.
    ///
    /// Returns the suppressions of `self` without a structurally equal counterpart in the
    /// matching comparison of `other` (comparisons that end up empty are dropped), and
    /// whether `other` holds any suppression that no suppression of `self` matched.
    #[must_use]
    pub fn remove_suppressions_from(&self, other: &SuppressionFile) -> (SuppressionFile, bool) {
        let mut used: Vec<Vec<bool>> = other
            .comparisons
            .iter()
            .map(|c| vec![false; c.suppressions.len()])
            .collect();

        let mut result = SuppressionFile::new();
        for comparison in &self.comparisons {
            let mut remaining = Comparison::new(comparison.left.clone(), comparison.right.clone());

            let counterpart = other
                .comparisons
                .iter()
                .position(|c| c.left == comparison.left && c.right == comparison.right);

            match counterpart {
                None => remaining
                    .suppressions
                    .extend(comparison.suppressions.iter().cloned()),
                Some(other_index) => {
                    for suppression in &comparison.suppressions {
                        match other.comparisons[other_index].position_of(suppression) {
                            Some(matched) => used[other_index][matched] = true,
                            None => remaining.suppressions.push(suppression.clone()),
                        }
                    }
                }
            }

            if !remaining.suppressions.is_empty() {
                result.comparisons.push(remaining);
            }
        }

        let other_has_unused = used.iter().flatten().any(|used| !used);
        (result, other_has_unused)
    }

    /// Read a suppression file.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be read and
    /// [`crate::Error::Malformed`] if it does not follow the schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_xml(&text)
    }

    /// Write the canonical serialization to `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_xml()?)?;
        Ok(())
    }

    /// Canonical XML serialization.
    ///
    /// # Errors
    /// Returns an error if the XML writer fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut sorted = self.clone();
        sorted.sort();
        xml::write(&sorted)
    }

    /// Parse the XML serialization.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for documents that are not well-formed or do not
    /// follow the schema.
    pub fn from_xml(text: &str) -> Result<Self> {
        xml::read(text)
    }
}
