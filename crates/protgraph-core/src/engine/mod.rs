//! # Engine Module
//!
//! Turns a validated [`Structure`](crate::core::models::structure::Structure) into a
//! [`ProteinGraph`](crate::core::graph::ProteinGraph).
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Granularity, node positions, enabled providers and edge rules
//! - **Annotations** ([`annotations`]) - Providers that turn tool output into per-residue,
//!   per-chain or per-structure attribute layers
//! - **Edges** ([`edges`]) - Independent strategies that propose edge candidates
//! - **Nodes** ([`nodes`]) - The node layout and its positions
//! - **Assembly** ([`assembler`]) - Validation, fan-out and the single-writer merge
//! - **Registry** ([`registry`]) - Explicit provider and strategy registration
//! - **Caching** ([`cache`]) - Content-addressed tool output cache shared across workers
//! - **Progress Monitoring** ([`progress`]) - Phase and task callbacks
//! - **Error Handling** ([`error`]) - The [`GraphError`](error::GraphError) taxonomy

pub mod annotations;
pub mod assembler;
pub mod cache;
pub mod config;
pub mod edges;
pub mod error;
pub mod nodes;
pub mod progress;
pub mod registry;
