//! # Workflows Module
//!
//! Top-level entry points for building graphs from protein structures.
//!
//! ## Overview
//!
//! A workflow takes a parsed [`Structure`](crate::core::models::structure::Structure), the
//! external tool outputs available for it and a
//! [`GraphConfig`](crate::engine::config::GraphConfig), and returns a
//! [`ProteinGraph`](crate::core::graph::ProteinGraph). Configuration is validated against
//! the [`Registry`](crate::engine::registry::Registry) before any structure is touched.
//!
//! ## Architecture
//!
//! - **Construction Workflow** ([`construct`]) - Processing and assembly of one structure
//! - **Batch Workflow** ([`batch`]) - Many structures on a bounded worker pool, with
//!   per-structure error capture

pub mod batch;
pub mod construct;
