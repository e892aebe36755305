//! Utilities
//!
//! Cross-cutting helpers for inherited descriptors and fatal exits.

pub mod fatal;
pub mod fd;
