//! LaSVM dual solver
//!
//! Online solver for the SVM dual problem following "Fast Kernel Classifiers
//! with Online and Active Learning" (Bordes, Ertekin, Weston, Bottou). Each
//! example is seen through PROCESS, which may make it a support vector, and
//! REPROCESS, which revisits the current support vectors and drops those
//! that no longer contribute.

pub mod kernel_matrix;
pub mod selection;
pub mod session;
pub mod state;
pub mod termination;
pub mod update;

pub use self::kernel_matrix::KernelMatrix;
pub use self::selection::{Selector, ViolatingPair};
pub use self::session::{FitReport, ReprocessOutcome, Session, SessionPhase};
pub use self::state::GradientState;
pub use self::termination::{TerminationController, TerminationReason};
pub use self::update::{pairwise_step, StepOutcome};
