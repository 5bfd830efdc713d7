//! Core type definitions for the solver

use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (one of the two classes seen during fit)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Build a sparse vector from a dense slice, dropping exact zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Smallest dense length able to hold every stored index
    pub fn dim(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }
}

/// A feature vector in either dense or sparse layout.
///
/// Both layouts produce identical kernel values: products and squared
/// differences are accumulated in feature-index order and implicit zeros of the
/// sparse layout contribute nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureVector {
    Dense(Vec<f64>),
    Sparse(SparseVector),
}

impl FeatureVector {
    /// Dimensionality implied by this vector
    pub fn dim(&self) -> usize {
        match self {
            FeatureVector::Dense(values) => values.len(),
            FeatureVector::Sparse(sv) => sv.dim(),
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, FeatureVector::Dense(_))
    }

    /// Inner product `<self, other>`
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        match (self, other) {
            (FeatureVector::Dense(a), FeatureVector::Dense(b)) => {
                a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
            }
            (FeatureVector::Sparse(a), FeatureVector::Sparse(b)) => dot_sparse(a, b),
            (FeatureVector::Dense(d), FeatureVector::Sparse(s))
            | (FeatureVector::Sparse(s), FeatureVector::Dense(d)) => dot_dense_sparse(d, s),
        }
    }

    /// Squared Euclidean distance `||self - other||²`
    pub fn squared_distance(&self, other: &FeatureVector) -> f64 {
        match (self, other) {
            (FeatureVector::Dense(a), FeatureVector::Dense(b)) => squared_distance_dense(a, b),
            (FeatureVector::Sparse(a), FeatureVector::Sparse(b)) => squared_distance_sparse(a, b),
            (FeatureVector::Dense(d), FeatureVector::Sparse(s))
            | (FeatureVector::Sparse(s), FeatureVector::Dense(d)) => {
                squared_distance_dense_sparse(d, s)
            }
        }
    }

    /// Convert to the sparse layout
    pub fn to_sparse(&self) -> SparseVector {
        match self {
            FeatureVector::Dense(values) => SparseVector::from_dense(values),
            FeatureVector::Sparse(sv) => sv.clone(),
        }
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        FeatureVector::Dense(values)
    }
}

impl From<SparseVector> for FeatureVector {
    fn from(sv: SparseVector) -> Self {
        FeatureVector::Sparse(sv)
    }
}

/// Dot product of two sparse vectors in O(nnz(x) + nnz(y)) by merging the
/// sorted index lists.
fn dot_sparse(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut result = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            result += x.values[i] * y.values[j];
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            i += 1;
        } else {
            j += 1;
        }
    }

    result
}

fn dot_dense_sparse(dense: &[f64], sparse: &SparseVector) -> f64 {
    sparse
        .indices
        .iter()
        .zip(sparse.values.iter())
        .take_while(|(&idx, _)| idx < dense.len())
        .map(|(&idx, &v)| dense[idx] * v)
        .sum()
}

fn squared_distance_dense(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().max(b.len());
    let mut distance_sq = 0.0;
    for k in 0..n {
        let diff = a.get(k).copied().unwrap_or(0.0) - b.get(k).copied().unwrap_or(0.0);
        distance_sq += diff * diff;
    }
    distance_sq
}

/// Squared Euclidean distance between two sparse vectors.
///
/// Indices present in only one vector contribute the square of that value.
fn squared_distance_sparse(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance_sq = 0.0;
    let mut i = 0;
    let mut j = 0;

    while i < x.indices.len() && j < y.indices.len() {
        let x_idx = x.indices[i];
        let y_idx = y.indices[j];

        if x_idx == y_idx {
            let diff = x.values[i] - y.values[j];
            distance_sq += diff * diff;
            i += 1;
            j += 1;
        } else if x_idx < y_idx {
            distance_sq += x.values[i] * x.values[i];
            i += 1;
        } else {
            distance_sq += y.values[j] * y.values[j];
            j += 1;
        }
    }

    while i < x.indices.len() {
        distance_sq += x.values[i] * x.values[i];
        i += 1;
    }

    while j < y.indices.len() {
        distance_sq += y.values[j] * y.values[j];
        j += 1;
    }

    distance_sq
}

fn squared_distance_dense_sparse(dense: &[f64], sparse: &SparseVector) -> f64 {
    let mut distance_sq = 0.0;
    let mut j = 0;

    for (k, &d) in dense.iter().enumerate() {
        let s = if j < sparse.indices.len() && sparse.indices[j] == k {
            j += 1;
            sparse.values[j - 1]
        } else {
            0.0
        };
        let diff = d - s;
        distance_sq += diff * diff;
    }

    // Entries stored past the end of the dense vector
    while j < sparse.indices.len() {
        distance_sq += sparse.values[j] * sparse.values[j];
        j += 1;
    }

    distance_sq
}

/// Training sample with features and label
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub features: FeatureVector,
    /// Class label as given by the caller
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: impl Into<FeatureVector>, label: f64) -> Self {
        Self {
            features: features.into(),
            label,
        }
    }
}
