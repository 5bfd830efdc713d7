//! LaSVM Command Line Interface
//!
//! A command-line interface for training, evaluating, and using LaSVM models
//! with LibSVM data files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use lasvm::api::EvaluationMetrics;
use lasvm::core::{KernelType, LaSvmConfig, Result, SVMError, Selection, Termination};
use lasvm::persistence::SerializableModel;
use lasvm::{Dataset, LaSVM, LibSVMDataset};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "lasvm")]
#[command(about = "Online Support Vector Machine training with LaSVM")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model
    Train(TrainArgs),
    /// Make predictions using a trained model
    Predict(PredictArgs),
    /// Evaluate a model on test data
    Evaluate(EvaluateArgs),
    /// Display model information
    Info(InfoArgs),
}

#[derive(Args)]
struct TrainArgs {
    /// Training data file (LibSVM format)
    #[arg(long)]
    data: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Kernel function
    #[arg(short, long, default_value = "rbf")]
    kernel: CliKernel,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value = "1.0")]
    c: f64,

    /// Kernel width (default: 1 / number of features)
    #[arg(short, long)]
    gamma: Option<f64>,

    /// Polynomial degree
    #[arg(long, default_value = "3")]
    degree: u32,

    /// Independent kernel term for poly and sigmoid
    #[arg(long, default_value = "0.0")]
    coef0: f64,

    /// Tolerance on the KKT gap
    #[arg(short, long, default_value = "0.001")]
    tau: f64,

    /// Maximum number of passes over the data
    #[arg(short, long, default_value = "10")]
    max_iter: usize,

    /// Candidate selection policy
    #[arg(short, long, default_value = "cyclic")]
    selection: CliSelection,

    /// Stopping rule
    #[arg(long, default_value = "gap")]
    termination: CliTermination,

    /// Target number of support vectors (implies --termination n-components)
    #[arg(long)]
    n_components: Option<usize>,

    /// Skip the final REPROCESS loop
    #[arg(long)]
    no_finish_step: bool,

    /// Kernel cache size in MB
    #[arg(long, default_value = "100")]
    cache_size: usize,

    /// Seed for candidate sampling
    #[arg(long, default_value = "0")]
    random_state: u64,

    /// Train incrementally over this many chunks of the shuffled data
    #[arg(long, default_value = "1")]
    chunks: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl From<CliKernel> for KernelType {
    fn from(kernel: CliKernel) -> Self {
        match kernel {
            CliKernel::Linear => KernelType::Linear,
            CliKernel::Rbf => KernelType::Rbf,
            CliKernel::Poly => KernelType::Poly,
            CliKernel::Sigmoid => KernelType::Sigmoid,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliSelection {
    /// Sweep the data in order
    Cyclic,
    /// Largest KKT violation among a random pool
    Active,
    /// Largest margin loss among a random pool
    Loss,
}

impl From<CliSelection> for Selection {
    fn from(selection: CliSelection) -> Self {
        match selection {
            CliSelection::Cyclic => Selection::Cyclic,
            CliSelection::Active => Selection::Active,
            CliSelection::Loss => Selection::Loss,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliTermination {
    /// Stop when the duality gap is below tau
    Gap,
    /// Stop at a fixed number of support vectors
    #[value(name = "n-components")]
    NComponents,
    /// Run every pass
    #[value(name = "max-iter")]
    MaxIter,
}

impl From<CliTermination> for Termination {
    fn from(termination: CliTermination) -> Self {
        match termination {
            CliTermination::Gap => Termination::Gap,
            CliTermination::NComponents => Termination::NComponents,
            CliTermination::MaxIter => Termination::MaxIter,
        }
    }
}

#[derive(Args)]
struct PredictArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Input data file
    #[arg(long)]
    data: PathBuf,

    /// Output predictions file (optional, prints to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show confidence scores
    #[arg(long)]
    confidence: bool,
}

#[derive(Args)]
struct EvaluateArgs {
    /// Trained model file
    #[arg(short, long)]
    model: PathBuf,

    /// Test data file
    #[arg(long)]
    data: PathBuf,

    /// Show detailed metrics
    #[arg(long)]
    detailed: bool,
}

#[derive(Args)]
struct InfoArgs {
    /// Model file
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Train(args) => train_command(args),
        Commands::Predict(args) => predict_command(args),
        Commands::Evaluate(args) => evaluate_command(args),
        Commands::Info(args) => info_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn config_from_args(args: &TrainArgs) -> Result<LaSvmConfig> {
    let cache_size = args.cache_size.checked_mul(1024 * 1024).ok_or_else(|| {
        SVMError::InvalidParameter(format!(
            "--cache-size of {} MB does not fit in the address space",
            args.cache_size
        ))
    })?;
    let termination = if args.n_components.is_some() {
        Termination::NComponents
    } else {
        args.termination.into()
    };
    Ok(LaSvmConfig {
        kernel: args.kernel.into(),
        c: args.c,
        gamma: args.gamma,
        degree: args.degree,
        coef0: args.coef0,
        tau: args.tau,
        max_iter: args.max_iter,
        selection: args.selection.into(),
        termination,
        n_components: args.n_components,
        finish_step: !args.no_finish_step,
        warm_start: args.chunks > 1,
        cache_size,
        random_state: args.random_state,
        ..Default::default()
    })
}

fn train_command(args: TrainArgs) -> Result<()> {
    info!("Training LaSVM model...");
    info!("Data file: {:?}", args.data);
    info!(
        "Parameters: kernel={:?}, C={}, tau={}, max_iter={}",
        args.kernel, args.c, args.tau, args.max_iter
    );

    check_format(&args.data);
    let dataset = LibSVMDataset::from_file(&args.data)?;
    info!(
        "Loaded {} samples with {} dimensions",
        dataset.len(),
        dataset.dim()
    );

    if dataset.len() < 2 {
        return Err(SVMError::InvalidDataset(
            "Dataset must contain at least 2 samples".to_string(),
        ));
    }
    if args.chunks == 0 || args.chunks > dataset.len() {
        return Err(SVMError::InvalidParameter(format!(
            "--chunks must be between 1 and the number of samples ({}), got: {}",
            dataset.len(),
            args.chunks
        )));
    }

    let config = config_from_args(&args)?;
    let (x, y) = dataset.into_parts();
    let mut svm = LaSVM::with_config(config.clone());

    if args.chunks == 1 {
        let report = svm.fit(&x, &y)?;
        info!(
            "Training stopped ({}) after {} passes in {:.2?}",
            report.reason, report.passes, report.elapsed
        );
        info!("Kernel cache hit rate: {:.1}%", report.cache.hit_rate() * 100.0);
    } else {
        train_in_chunks(&mut svm, &x, &y, args.chunks, args.random_state)?;
    }

    info!("Training completed successfully");
    info!("Support vectors: {}", svm.n_support());

    let accuracy = svm.score(&x, &y)?;
    info!("Training accuracy: {:.2}%", accuracy * 100.0);

    let model = svm.into_model().ok_or(SVMError::ModelNotTrained)?;
    let serializable = SerializableModel::from_model(&model, &config);
    serializable.save_to_file(&args.output)?;
    info!("Model saved to: {:?}", args.output);

    Ok(())
}

/// Fit over `chunks` slices of the shuffled data, continuing the same
/// session, and log the F1 score on everything seen so far
fn train_in_chunks(
    svm: &mut LaSVM,
    x: &[lasvm::FeatureVector],
    y: &[f64],
    chunks: usize,
    random_state: u64,
) -> Result<()> {
    let chunk_size = x.len().div_ceil(chunks);
    let mut order: Vec<usize> = (0..x.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(random_state));

    // The first chunk must hold both classes for the estimator to start
    let first = y[order[0]];
    if order[..chunk_size].iter().all(|&s| y[s] == first) {
        if let Some(pos) = order[chunk_size..].iter().position(|&s| y[s] != first) {
            order.swap(chunk_size - 1, chunk_size + pos);
        }
    }
    let x: Vec<lasvm::FeatureVector> = order.iter().map(|&s| x[s].clone()).collect();
    let y: Vec<f64> = order.iter().map(|&s| y[s]).collect();

    let mut seen = 0;
    for (k, (xs, ys)) in x.chunks(chunk_size).zip(y.chunks(chunk_size)).enumerate() {
        let report = if seen == 0 {
            svm.fit(xs, ys)?
        } else {
            svm.partial_fit(xs, ys)?
        };
        seen += xs.len();

        let metrics = svm.evaluate_detailed(&x[..seen], &y[..seen])?;
        info!(
            "Chunk {}/{}: {} samples seen, {} support vectors, F1 = {:.4} ({})",
            k + 1,
            chunks,
            seen,
            report.n_support,
            metrics.f1_score(),
            report.reason
        );
    }
    Ok(())
}

fn load_model(path: &Path) -> Result<(SerializableModel, lasvm::Model)> {
    info!("Loading model from: {path:?}");
    let serializable_model = SerializableModel::load_from_file(path)?;
    let model = serializable_model.to_model()?;
    Ok((serializable_model, model))
}

fn predict_command(args: PredictArgs) -> Result<()> {
    let (serializable_model, model) = load_model(&args.model)?;

    info!("Loading prediction data from: {:?}", args.data);
    check_format(&args.data);
    let (x, _) = LibSVMDataset::from_file(&args.data)?.into_parts();

    info!(
        "Making predictions using model with {} support vectors",
        serializable_model.metadata.n_support_vectors
    );
    model.check_dimensions(&x)?;
    let decisions = model.decision_function(&x);

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };

    writeln!(out, "# Predictions for {} samples", decisions.len())?;
    writeln!(
        out,
        "# Format: sample_index predicted_label{}",
        if args.confidence { " confidence" } else { "" }
    )?;
    for (i, &decision) in decisions.iter().enumerate() {
        let label = model.label_for(decision);
        if args.confidence {
            writeln!(out, "{} {} {:.6}", i, label, decision.abs())?;
        } else {
            writeln!(out, "{} {}", i, label)?;
        }
    }
    out.flush()?;

    if let Some(output_path) = args.output {
        info!("Predictions saved to: {output_path:?}");
    }
    Ok(())
}

fn evaluate_command(args: EvaluateArgs) -> Result<()> {
    let (serializable_model, model) = load_model(&args.model)?;

    info!("Loading test data from: {:?}", args.data);
    check_format(&args.data);
    let (x, y) = LibSVMDataset::from_file(&args.data)?.into_parts();

    info!(
        "Evaluating model with {} support vectors",
        serializable_model.metadata.n_support_vectors
    );
    model.check_dimensions(&x)?;
    let predictions: Vec<f64> = x.iter().map(|xi| model.predict_label(xi)).collect();
    let metrics = EvaluationMetrics::from_labels(&predictions, &y, model.classes()[1]);

    // Show evaluation results
    println!("=== Model Evaluation ===");
    serializable_model.print_summary();

    println!("\nTest Results:");
    println!("  Accuracy: {:.2}%", metrics.accuracy() * 100.0);

    if args.detailed {
        println!("\nDetailed Metrics:");
        println!("  True Positives:  {}", metrics.true_positives);
        println!("  True Negatives:  {}", metrics.true_negatives);
        println!("  False Positives: {}", metrics.false_positives);
        println!("  False Negatives: {}", metrics.false_negatives);
        println!("  Precision:       {:.4}", metrics.precision());
        println!("  Recall:          {:.4}", metrics.recall());
        println!("  F1 Score:        {:.4}", metrics.f1_score());
        println!("  Specificity:     {:.4}", metrics.specificity());
    }

    Ok(())
}

fn info_command(args: InfoArgs) -> Result<()> {
    let (serializable_model, _) = load_model(&args.model)?;

    serializable_model.print_summary();

    println!("\nSupport Vector Details:");
    println!("  Total: {}", serializable_model.support_vectors.len());

    if let Some(first_sv) = serializable_model.support_vectors.first() {
        let sparse = first_sv.to_sparse();
        println!("  First SV non-zeros: {}", sparse.nnz());
        println!(
            "  First SV indices: {:?}",
            &sparse.indices[..sparse.nnz().min(5)]
        );

        if sparse.nnz() > 5 {
            println!("    ... ({} more)", sparse.nnz() - 5);
        }
    }

    println!("\nCoefficients:");
    let coefficients = &serializable_model.coefficients;
    let n_show = coefficients.len().min(10);
    for (i, &alpha) in coefficients.iter().enumerate().take(n_show) {
        println!("  α{i}: {alpha:.6}");
    }
    if coefficients.len() > n_show {
        println!("  ... ({} more)", coefficients.len() - n_show);
    }

    Ok(())
}

/// Only LibSVM text files are read; warn when the extension suggests otherwise
fn check_format(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("libsvm") | Some("svm") | Some("txt") | Some("dat") => true,
        Some(_) => {
            warn!("Unknown file extension, assuming LibSVM format");
            false
        }
        None => {
            warn!("No file extension, assuming LibSVM format");
            false
        }
    }
}
