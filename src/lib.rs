//! # edml-base
//!
//! Core library for Entity Data Model editing: loads the three coupled EDM
//! XML documents (conceptual CSDL, storage SSDL, mapping MSL), keeps every
//! textual cross-reference between them bound to a concrete model element
//! while the model is edited, and validates the bound graph into runtime
//! metadata with source-mapped errors.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! validate  → runtime metadata compilation, error classes, rewrites
//!   ↓
//! xml       → quick-xml document loader (CSDL/SSDL/MSL)
//!   ↓
//! artifact  → document set, transactions, commit-time resolution
//!   ↓
//! resolve   → reference contexts, name normalizers, bindings, scheduler
//!   ↓
//! symbols   → Symbol paths, NormalizedName, SymbolTable
//!   ↓
//! model     → element tree (spaces, kinds, spans)
//!   ↓
//! base      → primitives (Position, Span, LineIndex, events)
//! ```

/// Foundation types: Position, Span, LineIndex, EventEmitter
pub mod base;

/// Element tree: spaces, kinds, arena, span lookup
pub mod model;

/// Symbols: case-insensitive paths, normalized names, symbol table
pub mod symbols;

/// Reference resolution: contexts, normalizers, bindings, scheduler
pub mod resolve;

/// Artifact: per-document-set state, transactions, events
pub mod artifact;

/// XML document loader for CSDL, SSDL and MSL
pub mod xml;

/// Validation: runtime metadata compilation and error reporting
pub mod validate;

// Re-export foundation types
pub use base::{EventEmitter, LineIndex, Position, Span};

// Re-export the commonly needed model/resolution surface
pub use artifact::{Artifact, ArtifactEvent, SchemaVersion, Transaction};
pub use model::{Element, ElementId, ElementKind, ModelSpace, ModelTree};
pub use resolve::{BindingId, BindingStatus, ReferenceContext, SingleItemBinding};
pub use symbols::{NormalizedName, Symbol, SymbolTable};
pub use validate::{CompiledRuntimeModel, ErrorClass, ErrorInfo, Severity, Validator};
pub use xml::LoadError;
