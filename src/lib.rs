//! Online Support Vector Machine training with the LaSVM algorithm
//!
//! Based on "Fast Kernel Classifiers with Online and Active Learning"
//! by Antoine Bordes, Seyda Ertekin, Jason Weston and Léon Bottou

pub mod api;
pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod model;
pub mod persistence;
pub mod solver;

// Re-export main types for convenience
pub use crate::api::{EvaluationMetrics, LaSVM};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::core::config::*;
pub use crate::core::error::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::LibSVMDataset;
pub use crate::kernel::{Kernel, KernelFunction};
pub use crate::model::Model;
pub use crate::persistence::SerializableModel;
pub use crate::solver::{FitReport, Session, TerminationReason};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
