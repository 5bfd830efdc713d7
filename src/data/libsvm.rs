//! LibSVM format dataset implementation
//!
//! Supports loading datasets in the libsvm format:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! -1 2:0.3 5:2.1
//!
//! Labels are kept as written; mapping them onto the two solver classes is
//! left to the estimator.

use crate::core::{Dataset, FeatureVector, Result, SVMError, Sample, SparseVector};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Dataset implementation for LibSVM format files
#[derive(Debug, Clone)]
pub struct LibSVMDataset {
    samples: Vec<Sample>,
    dimensions: usize,
}

impl LibSVMDataset {
    /// Load a dataset from a LibSVM format file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load a dataset from a reader (for testing and flexibility)
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        let mut max_dimension = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            // Everything after '#' is a comment
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            match Self::parse_line(line) {
                Ok((features, label)) => {
                    max_dimension = max_dimension.max(features.dim());
                    samples.push(Sample::new(features, label));
                }
                Err(e) => {
                    return Err(SVMError::ParseError(format!(
                        "Error parsing line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }

        if samples.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(LibSVMDataset {
            samples,
            dimensions: max_dimension,
        })
    }

    /// Parse a single line in libsvm format
    fn parse_line(line: &str) -> Result<(SparseVector, f64)> {
        let mut parts = line.split_whitespace();

        let label_str = parts
            .next()
            .ok_or_else(|| SVMError::ParseError("Empty line".to_string()))?;
        let label = label_str
            .parse::<f64>()
            .map_err(|_| SVMError::ParseError(format!("Invalid label: {label_str}")))?;
        if !label.is_finite() {
            return Err(SVMError::ParseError(format!("Invalid label: {label_str}")));
        }

        let mut indices = Vec::new();
        let mut values = Vec::new();

        for feature_str in parts {
            let (index_str, value_str) = feature_str.split_once(':').ok_or_else(|| {
                SVMError::ParseError(format!("Invalid feature format: {feature_str}"))
            })?;

            let index = index_str.parse::<usize>().map_err(|_| {
                SVMError::ParseError(format!("Invalid feature index: {index_str}"))
            })?;

            let value = value_str.parse::<f64>().map_err(|_| {
                SVMError::ParseError(format!("Invalid feature value: {value_str}"))
            })?;

            // libsvm uses 1-based indexing, convert to 0-based
            if index == 0 {
                return Err(SVMError::ParseError(format!(
                    "Feature index must be positive: {index}"
                )));
            }

            indices.push(index - 1);
            values.push(value);
        }

        Ok((SparseVector::new(indices, values), label))
    }

    /// Split into feature vectors and labels
    pub fn into_parts(self) -> (Vec<FeatureVector>, Vec<f64>) {
        self.samples
            .into_iter()
            .map(|sample| (sample.features, sample.label))
            .unzip()
    }
}

impl Dataset for LibSVMDataset {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn dim(&self) -> usize {
        self.dimensions
    }

    fn get_sample(&self, i: usize) -> Sample {
        self.samples[i].clone()
    }

    fn get_labels(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.label).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sparse(sample: &Sample) -> SparseVector {
        sample.features.to_sparse()
    }

    #[test]
    fn test_parse_line_basic() {
        let (features, label) = LibSVMDataset::parse_line("+1 1:0.5 3:1.2").unwrap();

        assert_eq!(label, 1.0);
        assert_eq!(features.indices, vec![0, 2]); // 1-based to 0-based
        assert_eq!(features.values, vec![0.5, 1.2]);
        assert_eq!(features.dim(), 3);
    }

    #[test]
    fn test_parse_line_keeps_label() {
        let (_, label) = LibSVMDataset::parse_line("2 1:1.0").unwrap();
        assert_eq!(label, 2.0);

        let (_, label) = LibSVMDataset::parse_line("-3 1:1.0").unwrap();
        assert_eq!(label, -3.0);

        let (features, label) = LibSVMDataset::parse_line("0").unwrap();
        assert_eq!(label, 0.0);
        assert!(features.is_empty());
    }

    #[test]
    fn test_parse_line_unsorted_indices() {
        let (features, _) = LibSVMDataset::parse_line("-1 5:2.1 2:0.3").unwrap();
        assert_eq!(features.indices, vec![1, 4]);
        assert_eq!(features.values, vec![0.3, 2.1]);
    }

    #[test]
    fn test_parse_line_invalid_format() {
        // Invalid feature format
        assert!(LibSVMDataset::parse_line("+1 1").is_err());

        // Invalid index
        assert!(LibSVMDataset::parse_line("+1 abc:1.0").is_err());

        // Invalid value
        assert!(LibSVMDataset::parse_line("+1 1:abc").is_err());

        // Invalid label
        assert!(LibSVMDataset::parse_line("yes 1:1.0").is_err());
        assert!(LibSVMDataset::parse_line("nan 1:1.0").is_err());

        // Zero index (libsvm is 1-based)
        assert!(LibSVMDataset::parse_line("+1 0:1.0").is_err());
    }

    #[test]
    fn test_from_reader_basic() {
        let data = "+1 1:0.5 3:1.2\n-1 2:0.3 5:2.1\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 5); // max index is 4 (0-based), so dimension is 5

        let sample1 = dataset.get_sample(0);
        assert_eq!(sample1.label, 1.0);
        assert_eq!(sparse(&sample1).indices, vec![0, 2]);

        let sample2 = dataset.get_sample(1);
        assert_eq!(sample2.label, -1.0);
        assert_eq!(sparse(&sample2).indices, vec![1, 4]);
    }

    #[test]
    fn test_from_reader_empty_lines_and_comments() {
        let data = "# Comment line\n+1 1:0.5 # trailing\n\n# Another comment\n-1 2:0.3\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_from_reader_reports_line_number() {
        let data = "+1 1:0.5\n-1 2:oops\n";
        let err = LibSVMDataset::from_reader(Cursor::new(data)).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_from_reader_empty_dataset() {
        let data = "# Only comments\n\n";
        let result = LibSVMDataset::from_reader(Cursor::new(data));
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_dataset_trait_implementation() {
        let data = "+1 1:0.5 3:1.2\n-1 2:0.3\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 3); // max index is 2, so dimension is 3
        assert!(!dataset.is_empty());
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);

        let (x, y) = dataset.to_parts();
        assert_eq!(x.len(), 2);
        assert_eq!(y, vec![1.0, -1.0]);
        assert_eq!(x, dataset.clone().into_parts().0);
    }

    #[test]
    fn test_training_on_loaded_data() {
        use crate::api::LaSVM;
        use crate::core::KernelType;

        let data = "+1 1:2.0\n-1 1:-2.0\n+1 1:1.5\n-1 1:-1.5\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        let mut svm = LaSVM::new().with_kernel(KernelType::Linear);
        let report = svm.fit_dataset(&dataset).expect("Should train successfully");
        assert!(report.n_support > 0);

        let (x, y) = dataset.into_parts();
        assert_eq!(svm.score(&x, &y).unwrap(), 1.0);
        let alpha_sum: f64 = svm.model().unwrap().coefficients().iter().sum();
        assert!(alpha_sum.abs() < 1e-9, "Coefficient sum drifted: {alpha_sum}");
    }

    #[test]
    fn test_large_dimension_handling() {
        let data = "+1 1:1.0 1000:2.0 5000:3.0\n-1 2:1.0 500:2.0\n";
        let dataset = LibSVMDataset::from_reader(Cursor::new(data)).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 5000); // max index is 4999 (0-based), so dimension is 5000

        let sample = dataset.get_sample(0);
        assert_eq!(sparse(&sample).indices, vec![0, 999, 4999]); // 0-based indices
        assert_eq!(sparse(&sample).values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:0.5 3:1.2").expect("Failed to write");
        writeln!(temp_file, "-1 2:0.3 5:2.1").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let dataset = LibSVMDataset::from_file(temp_file.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.dim(), 5);
        assert_eq!(dataset.get_labels(), vec![1.0, -1.0]);
    }

    #[test]
    fn test_from_file_io_error() {
        let result = LibSVMDataset::from_file("/non/existent/file.libsvm");
        assert!(matches!(result.unwrap_err(), SVMError::IoError(_)));
    }
}
