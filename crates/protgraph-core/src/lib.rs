//! # protgraph Core Library
//!
//! Builds deterministic, annotated graph representations of protein structures for
//! downstream graph-learning models.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models: the validated, read-only
//!   [`Structure`](core::models::structure::Structure) record, residue chemistry tables,
//!   geometry helpers, structure readers and the final
//!   [`ProteinGraph`](core::graph::ProteinGraph) model.
//!
//! - **[`engine`]: The Logic Core.** Annotation providers, edge construction strategies,
//!   the explicit provider/strategy registry, configuration and the
//!   [`Assembler`](engine::assembler::Assembler) that merges everything into one graph.
//!
//! - **[`workflows`]: The Public API.** Single-structure construction and bounded,
//!   failure-isolated batch construction over many structures.

pub mod core;
pub mod engine;
pub mod workflows;
