//! # Core Module
//!
//! Stateless building blocks shared by the construction engine.
//!
//! - **Molecular Representation** ([`models`]) - Chains, residues, atoms and the validated
//!   [`Structure`](models::structure::Structure) record
//! - **Residue Chemistry** ([`chemistry`]) - Lookup tables for residue codes and properties
//! - **Structure Processing** ([`processing`]) - Hydrogen removal, alt-loc and insertion
//!   filtering, chain and hetero-residue selection
//! - **File I/O** ([`io`]) - Structure readers and external tool output parsers
//! - **Graph Model** ([`graph`]) - The assembled graph exposed to consumers
//! - **Utilities** ([`utils`]) - Geometry helpers

pub mod chemistry;
pub mod graph;
pub mod io;
pub mod models;
pub mod processing;
pub mod utils;
