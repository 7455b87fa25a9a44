//! Correlation of Left and Right symbols into a mapper tree.
//!
//! Comparing two versions of a library starts by pairing every visible declaration of the
//! Left version with its counterpart in the Right version. The result is a three level tree:
//!
//! ```text
//! AssemblyMapper (Left assembly, Right assembly)
//!   └── TypeMapper (one per distinct type identity, nested types included)
//!         └── MemberMapper (one per distinct member identity)
//! ```
//!
//! Every node is an [`ElementMapper`]: a pair where at least one side is present. A node with
//! only a Left side denotes a removal, a node with only a Right side an addition.
//!
//! Identity is decided by the [`crate::identity::IdentityComparer`] carried in
//! [`MapperSettings`], which also carries the filter deciding which symbols take part
//! (by default, everything visible outside its assembly).
//!
//! # Usage Examples
//!
//! ```rust
//! use dotcompat::diagnostics::Diagnostics;
//! use dotcompat::mapping::{AssemblyMapper, MapperSettings};
//! use dotcompat::symbols::{AssemblyBuilder, TypeBuilder};
//! use std::sync::Arc;
//!
//! let left = AssemblyBuilder::new("Lib")
//!     .type_def(TypeBuilder::class("Lib", "Kept"))
//!     .type_def(TypeBuilder::class("Lib", "Removed"))
//!     .build();
//! let right = AssemblyBuilder::new("Lib")
//!     .version(2, 0, 0, 0)
//!     .type_def(TypeBuilder::class("Lib", "Kept"))
//!     .build();
//!
//! let mapper = AssemblyMapper::create(
//!     Arc::new(left),
//!     Arc::new(right),
//!     MapperSettings::default(),
//!     Arc::new(Diagnostics::new()),
//! );
//!
//! assert_eq!(mapper.types().len(), 2);
//! assert!(mapper.find_type("Lib.Kept").unwrap().both().is_some());
//! assert!(mapper.find_type("Lib.Removed").unwrap().right().is_none());
//! ```

mod assembly;
mod element;
mod index;
mod member;
mod settings;
mod typemapper;

pub use assembly::AssemblyMapper;
pub use element::{ElementMapper, ElementSide, MapperState};
pub use member::MemberMapper;
pub use settings::{MapperSettings, SymbolFilter, SymbolRef};
pub use typemapper::TypeMapper;
