//! The symbol model the comparison engine operates on.
//!
//! This module is the boundary between assembly reading and API comparison. It describes the
//! public surface of an assembly as a navigable tree: assembly → modules → top-level types
//! (with nested types, generic parameters, members) → exported-type forwarders. Trees are
//! produced by a [`SymbolProvider`] and loaded into a [`Universe`], which binds the type
//! references inside them to their definitions.
//!
//! # Architecture
//!
//! ```text
//! SymbolProvider ──read_assembly──▶ AssemblyDefinition (unbound)
//!                                          │
//!                                   Universe::load_primary
//!                                          │ binds TypeRefs, follows forwarders,
//!                                          ▼ loads referenced assemblies on demand
//!                                   AssemblyDefinition (bound, Arc-shared)
//! ```
//!
//! # Key Components
//!
//! - [`AssemblyName`], [`AssemblyVersion`] - Assembly identity
//! - [`AssemblyDefinition`], [`ModuleDefinition`] - Containers
//! - [`TypeDefinition`], [`TypeRef`], [`TypeSignature`], [`GenericParameter`] - Types
//! - [`MemberDefinition`], [`MemberKind`], [`MemberAccess`] - Members
//! - [`AssemblyBuilder`], [`TypeBuilder`], [`MethodBuilder`], [`GenericParameterBuilder`] -
//!   Construction of in-memory trees
//! - [`SymbolProvider`], [`MemorySymbolProvider`] - Where trees come from
//! - [`Universe`] - Job-scoped resolution context
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::diagnostics::Diagnostics;
//! use dotcompat::symbols::{AssemblyBuilder, MemorySymbolProvider, TypeBuilder, Universe};
//! use std::{path::Path, sync::Arc};
//!
//! let provider = Arc::new(MemorySymbolProvider::new());
//! provider.insert("Lib.dll", AssemblyBuilder::new("Lib").type_def(TypeBuilder::class("Lib", "Widget")).build());
//!
//! let universe = Universe::new(provider, Vec::new(), Arc::new(Diagnostics::new()));
//! let lib = universe.load_primary(Path::new("Lib.dll"))?;
//! assert!(lib.find_type("Lib", "Widget").is_some());
//! # Ok::<(), dotcompat::Error>(())
//! ```

mod assembly;
mod builder;
mod members;
mod provider;
mod types;
mod universe;

pub use assembly::{AssemblyDefinition, AssemblyName, AssemblyVersion, ModuleDefinition};
pub use builder::{AssemblyBuilder, GenericParameterBuilder, MethodBuilder, TypeBuilder};
pub use members::{
    MemberAccess, MemberDefinition, MemberKind, MethodAttributes, MethodSignature,
    CONSTRUCTOR_NAME, MEMBER_ACCESS_MASK,
};
pub use provider::{MemorySymbolProvider, SymbolProvider};
pub use types::{
    GenericParamAttributes, GenericParameter, TypeAttributes, TypeDefinition, TypeRef, TypeScope,
    TypeSignature, Variance,
};
pub use universe::{Universe, MAX_FORWARDER_DEPTH};
