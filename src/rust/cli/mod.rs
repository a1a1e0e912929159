//! Command-line dispatch for training and evaluation.
//!
//! `main` parses [`Cli`], hands the command to [`run`] and decides the exit
//! status; nothing in here terminates the process.

mod evaluate;
mod flags;
mod train;

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::autotune::AutotuneError;
use crate::engine::{Backend, EngineError, ModelKind};

pub use evaluate::{run_with_input, write_report, InputSource, TestOptions};
pub use flags::{parse_train_flags, FlagError};
pub use train::TrainOutcome;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Flags(#[from] FlagError),
    #[error("{} cannot be opened for saving.", .path.display())]
    OutputNotWritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Test file cannot be opened!")]
    TestFileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Model file does not exist: {0:?}")]
    ModelNotFound(PathBuf),
    #[error(transparent)]
    Autotune(#[from] AutotuneError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "ftbridge", author, version, about = "Train and evaluate fastText models", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Train a skipgram word embedding model
    Skipgram(TrainArgs),
    /// Train a cbow word embedding model
    Cbow(TrainArgs),
    /// Train a supervised classifier
    Supervised(TrainArgs),
    /// Evaluate a supervised classifier
    Test(TestArgs),
    /// Evaluate a supervised classifier and print per-label metrics
    TestLabel(TestArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Training flags, e.g. `-input train.txt -output model -epoch 25`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub flags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct TestArgs {
    /// Model filename
    pub model: PathBuf,
    /// Test data filename (if -, read from stdin)
    pub data: String,
    /// Predict top k labels
    #[arg(default_value_t = 1)]
    pub k: i32,
    /// Probability threshold
    #[arg(default_value_t = 0.0)]
    pub threshold: f32,
}

impl TestArgs {
    pub fn into_options(self, per_label: bool) -> TestOptions {
        TestOptions {
            model: self.model,
            input: InputSource::parse(&self.data),
            k: self.k,
            threshold: self.threshold,
            per_label,
        }
    }
}

/// Runs one command. Reports go to `out`.
pub fn run<B: Backend, W: Write>(command: Command, backend: &B, out: &mut W) -> Result<(), CliError> {
    match command {
        Command::Skipgram(args) => train_with(ModelKind::Skipgram, &args, backend),
        Command::Cbow(args) => train_with(ModelKind::Cbow, &args, backend),
        Command::Supervised(args) => train_with(ModelKind::Supervised, &args, backend),
        Command::Test(args) => evaluate::run(backend, &args.into_options(false), out).map(drop),
        Command::TestLabel(args) => evaluate::run(backend, &args.into_options(true), out).map(drop),
    }
}

/// Parses training flags for `model` and runs the train path.
pub fn train<B: Backend>(
    model: ModelKind,
    flags: &[String],
    backend: &B,
) -> Result<TrainOutcome, CliError> {
    let config = parse_train_flags(model, flags)?;
    train::run(backend, &config)
}

fn train_with<B: Backend>(model: ModelKind, args: &TrainArgs, backend: &B) -> Result<(), CliError> {
    train(model, &args.flags, backend).map(drop)
}
