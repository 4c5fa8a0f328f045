//! # Core Models Module
//!
//! The in-memory Structure Record: an immutable, validated description of a
//! parsed molecular structure.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms with coordinates, roles and per-atom metadata
//! - [`residue`] - Residues and the stable [`ResidueKey`](residue::ResidueKey) used to address them
//! - [`chain`] - Polymer chains and their classification
//! - [`structure`] - The read-only [`Structure`](structure::Structure) record and coordinate lookup
//! - [`builder`] - [`StructureBuilder`](builder::StructureBuilder), the only way to create a record
//! - [`ids`] - Slot map keys for atoms, residues and chains
//!
//! ## Usage
//!
//! ```ignore
//! use protgraph::core::models::builder::StructureBuilder;
//! use protgraph::core::models::chain::ChainType;
//!
//! let mut builder = StructureBuilder::new("1abc");
//! builder
//!     .start_chain('A', ChainType::Protein)
//!     .start_residue(1, None, "ALA", false)
//!     .add_atom(AtomRecord::new("CA", Point3::new(0.0, 0.0, 0.0)));
//! let structure = builder.build()?;
//! ```

pub mod atom;
pub mod builder;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod structure;
