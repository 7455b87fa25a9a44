//! # dotcompat Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotcompat library. Import this module to get quick access to everything needed
//! to build, run and report a comparison.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotcompat operations
pub use crate::Error;

/// The result type used throughout dotcompat
pub use crate::Result;

/// Per-job non-fatal findings
pub use crate::diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

// ================================================================================================
// Symbol Model
// ================================================================================================

/// Assemblies, types and members
pub use crate::symbols::{
    AssemblyDefinition, AssemblyName, AssemblyVersion, GenericParameter, MemberAccess,
    MemberDefinition, MemberKind, MethodAttributes, TypeDefinition, TypeRef, TypeSignature,
    Variance,
};

/// In-memory construction of symbol trees
pub use crate::symbols::{AssemblyBuilder, GenericParameterBuilder, MethodBuilder, TypeBuilder};

/// Where symbol trees come from, and where they are resolved
pub use crate::symbols::{MemorySymbolProvider, SymbolProvider, Universe};

// ================================================================================================
// Mapping and Comparing
// ================================================================================================

/// Structural identity
pub use crate::identity::{IdentityComparer, SymbolIdentity};

/// The mapper tree
pub use crate::mapping::{AssemblyMapper, ElementSide, MapperSettings, MemberMapper, TypeMapper};

/// The rule engine
pub use crate::comparing::{ApiComparer, CompatDifference, DifferenceType, Rule, RuleContext};

// ================================================================================================
// Suppressions, Execution and Reporting
// ================================================================================================

/// The suppression file
pub use crate::suppressions::{Comparison, Suppression, SuppressionFile};

/// Job execution
pub use crate::runner::{CancellationToken, ComparisonJob, ComparisonResult, ComparisonRunner};

/// The command-line workflow
pub use crate::report::{Cli, ExitStatus, JobSource, RunOptions};
