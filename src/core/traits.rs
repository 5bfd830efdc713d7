//! Core traits shared by datasets and fitted models

use crate::core::{FeatureVector, Prediction, Sample};

/// Dataset abstraction for efficient data access
pub trait Dataset: Send + Sync {
    /// Number of samples in the dataset
    fn len(&self) -> usize;

    /// Number of features (dimensionality)
    fn dim(&self) -> usize;

    /// Get a single sample by index
    ///
    /// # Panics
    /// Panics if index >= len()
    fn get_sample(&self, i: usize) -> Sample;

    /// Get all labels as a vector
    fn get_labels(&self) -> Vec<f64>;

    /// Check if the dataset is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split into feature vectors and labels, the shape `fit` expects
    fn to_parts(&self) -> (Vec<FeatureVector>, Vec<f64>) {
        (0..self.len())
            .map(|i| {
                let sample = self.get_sample(i);
                (sample.features, sample.label)
            })
            .unzip()
    }
}

/// Trained SVM model
pub trait SVMModel: Send + Sync {
    /// Predict a single feature vector
    fn predict(&self, x: &FeatureVector) -> Prediction;

    /// Predict multiple feature vectors
    fn predict_batch(&self, xs: &[FeatureVector]) -> Vec<Prediction> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// Get the number of support vectors
    fn n_support_vectors(&self) -> usize;

    /// Get the bias term
    fn bias(&self) -> f64;
}
