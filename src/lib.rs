// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # dotcompat
//!
//! Binary API-compatibility comparison for .NET assemblies.
//!
//! `dotcompat` compares two versions of a library (Left, the baseline, and Right, the
//! candidate), correlates their public symbols by identity and runs a fixed set of
//! compatibility rules over every correlated pair. Differences that maintainers accepted are
//! recorded in a durable, canonically sorted XML suppression file; everything else is
//! reported.
//!
//! ## Quick Start
//!
//! ```rust
//! use dotcompat::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = MemorySymbolProvider::new();
//! provider.insert(
//!     "v1/Lib.dll",
//!     AssemblyBuilder::new("Lib")
//!         .type_def(TypeBuilder::class("Lib", "Widget").default_constructor())
//!         .build(),
//! );
//! provider.insert(
//!     "v2/Lib.dll",
//!     AssemblyBuilder::new("Lib")
//!         .version(2, 0, 0, 0)
//!         .type_def(TypeBuilder::class("Lib", "Widget").constructor(MemberAccess::Assembly))
//!         .build(),
//! );
//!
//! let result = ComparisonRunner::new(Arc::new(provider))
//!     .job(ComparisonJob::new("v1/Lib.dll", "v1/Lib.dll", "v2/Lib.dll", "v2/Lib.dll"))
//!     .execute()?;
//!
//! for difference in result.differences(0) {
//!     println!("error {difference}");
//! }
//!
//! // Accept everything found so far
//! let accepted = result.suppression_file();
//! assert_eq!(accepted.suppression_count(), 1);
//! # Ok::<(), dotcompat::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`symbols`] - The symbol model, the [`symbols::SymbolProvider`] boundary and
//!   job-scoped resolution [`symbols::Universe`]s
//! - [`identity`] - Version-agnostic structural identity of types and members
//! - [`mapping`] - The Left/Right mapper tree
//! - [`comparing`] - The rule engine and the built-in rules
//! - [`suppressions`] - The suppression file: matching, set difference, XML
//! - [`runner`] - Parallel job execution with lazily filtered results
//! - [`report`] - The command-line workflow and report format
//! - [`diagnostics`] - Non-fatal findings collected per job
//!
//! ## Error Handling
//!
//! Compatibility differences are results, not errors. [`Error`] covers what prevents a
//! comparison from running: malformed suppression files and job lists, assemblies that cannot
//! be loaded, I/O failures and cancellation.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotcompat::prelude::*;
///
/// let comparer = ApiComparer::new();
/// assert_eq!(comparer.rule_names(), ["CannotSealType", "CannotChangeGenericConstraints"]);
/// ```
pub mod prelude;

pub mod comparing;
pub mod diagnostics;
pub mod identity;
pub mod mapping;
pub mod report;
pub mod runner;
pub mod suppressions;
pub mod symbols;

/// `dotcompat` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotcompat` Error type
///
/// The main error type for all operations in this crate.
///
/// # Examples
///
/// ```rust
/// use dotcompat::{Error, runner::parse_job_list};
///
/// match parse_job_list("Lib\nv1/Lib.dll\nsome\n", "jobs.txt") {
///     Err(Error::JobList { line, .. }) => assert_eq!(line, 3),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;
