//! Model serialization and persistence
//!
//! Fitted models are stored as pretty-printed JSON together with the
//! configuration they were trained with, so the CLI can load a model in a
//! later invocation and report how it was built.

use crate::core::{FeatureVector, LaSvmConfig, Result};
use crate::kernel::{Kernel, KernelFunction};
use crate::model::Model;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Serializable representation of a fitted model
#[derive(Debug, Serialize, Deserialize)]
pub struct SerializableModel {
    /// Support vectors
    pub support_vectors: Vec<FeatureVector>,
    /// Signed dual coefficients (alpha_i already carries y_i)
    pub coefficients: Vec<f64>,
    /// Bias term
    pub bias: f64,
    /// Resolved kernel with its parameters
    pub kernel: KernelFunction,
    /// `[negative, positive]` class labels
    pub classes: [f64; 2],
    /// Width of the training data
    pub n_features: usize,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Model metadata for tracking and validation
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Library version used to create the model
    pub library_version: String,
    /// Number of support vectors
    pub n_support_vectors: usize,
    /// Training parameters used
    pub training_params: LaSvmConfig,
    /// Creation timestamp
    pub created_at: String,
}

impl SerializableModel {
    /// Create a serializable model from a fitted model and its configuration
    pub fn from_model(model: &Model, config: &LaSvmConfig) -> Self {
        Self {
            support_vectors: model.support_vectors().to_vec(),
            coefficients: model.coefficients().to_vec(),
            bias: crate::core::SVMModel::bias(model),
            kernel: model.kernel().clone(),
            classes: model.classes(),
            n_features: model.n_features(),
            metadata: ModelMetadata {
                library_version: env!("CARGO_PKG_VERSION").to_string(),
                n_support_vectors: model.n_support(),
                training_params: config.clone(),
                created_at: chrono::Utc::now().to_rfc3339(),
            },
        }
    }

    /// Save model to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load model from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let model = serde_json::from_reader(reader)?;
        Ok(model)
    }

    /// Convert back to a model ready for prediction
    pub fn to_model(&self) -> Result<Model> {
        Model::new(
            self.kernel.clone(),
            self.bias,
            self.support_vectors.clone(),
            self.coefficients.clone(),
            self.classes,
            self.n_features,
        )
    }

    /// Print model summary
    pub fn print_summary(&self) {
        let params = &self.metadata.training_params;
        println!("=== LaSVM Model Summary ===");
        println!("Kernel: {} ({:?})", self.kernel.name(), self.kernel);
        println!("Classes: {} / {}", self.classes[0], self.classes[1]);
        println!("Features: {}", self.n_features);
        println!("Support Vectors: {}", self.metadata.n_support_vectors);
        println!("Bias: {:.6}", self.bias);
        println!("Library Version: {}", self.metadata.library_version);
        println!("Created: {}", self.metadata.created_at);
        println!("Training Parameters:");
        println!("  C: {}", params.c);
        println!("  Tau: {}", params.tau);
        println!("  Max Iterations: {}", params.max_iter);
        println!("  Selection: {}", params.selection);
        println!("  Termination: {}", params.termination);
        if let Some(k) = params.n_components {
            println!("  Target Components: {k}");
        }
    }
}
