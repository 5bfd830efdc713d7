//! Data loading and dataset implementations
//!
//! Training data is read from LibSVM text files. Any other source can be fed
//! to the estimator by implementing [`Dataset`](crate::core::Dataset) or by
//! passing feature vectors directly to `fit`.

pub mod libsvm;

pub use self::libsvm::*;
