use std::fs::File;
use std::path::{Path, PathBuf};

use log::info;

use super::CliError;
use crate::engine::{Backend, Engine, TrainConfig};

/// Files written by a training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOutcome {
    pub model: PathBuf,
    pub vectors: PathBuf,
    /// Raw output layer, written only with `-saveOutput`
    pub output_layer: Option<PathBuf>,
}

/// Trains a model (directly or through autotune) and saves its artifacts.
///
/// The model file is opened for writing before training starts so an
/// unwritable destination fails fast without running the trainer.
pub fn run<B: Backend>(backend: &B, config: &TrainConfig) -> Result<TrainOutcome, CliError> {
    let model_path = config.model_file_name();
    ensure_writable(&model_path)?;

    let model = if config.has_autotune() {
        info!("Autotuning {} model", config.model);
        backend.autotune(config)?
    } else {
        info!("Training {} model", config.model);
        backend.train(config)?
    };

    model.save_model(&model_path)?;
    let vectors = config.vectors_file_name();
    model.save_vectors(&vectors)?;
    let output_layer = if config.save_output {
        let path = config.output_layer_file_name();
        model.save_output(&path)?;
        Some(path)
    } else {
        None
    };

    info!("Saved model to {:?}", model_path);
    Ok(TrainOutcome {
        model: model_path,
        vectors,
        output_layer,
    })
}

fn ensure_writable(path: &Path) -> Result<(), CliError> {
    File::create(path)
        .map(drop)
        .map_err(|source| CliError::OutputNotWritable {
            path: path.to_path_buf(),
            source,
        })
}
