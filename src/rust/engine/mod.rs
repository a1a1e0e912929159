//! The contract between this crate and the native text classification library.
//!
//! Everything numeric (tokenization, training, softmax inference, sentence
//! vector arithmetic) happens behind these two traits. [`Backend`] builds
//! models, [`Engine`] queries one.

mod config;
mod error;
#[cfg(feature = "fasttext")]
mod fasttext;
mod meter;
mod unavailable;

use std::io::BufRead;
use std::path::Path;

use crate::autotune::{AutotuneError, Autotuner};

pub use config::{
    parse_model_size, AutotuneMetric, AutotuneOptions, LossKind, ModelKind, QuantizeOptions,
    TrainConfig, DEFAULT_SAMPLING_THRESHOLD,
};
pub use error::EngineError;
#[cfg(feature = "fasttext")]
pub use self::fasttext::{FastTextBackend, FastTextModel};
pub use meter::{Meter, Metrics, Notation, NON_FINITE_PLACEHOLDER};
pub use unavailable::{NoModel, UnavailableBackend};

/// Backend used by the C ABI and the command-line tool.
#[cfg(feature = "fasttext")]
pub type DefaultBackend = FastTextBackend;
/// Backend used by the C ABI and the command-line tool.
#[cfg(not(feature = "fasttext"))]
pub type DefaultBackend = UnavailableBackend;

/// Prefix that marks a token as a label in training and test data.
pub const DEFAULT_LABEL_PREFIX: &str = "__label__";

/// A single label predicted for a line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub probability: f32,
    pub label: String,
}

/// A loaded or freshly trained model.
pub trait Engine: Send + Sync {
    /// Returns up to `k` labels whose probability is at least `threshold`,
    /// most probable first. `text` is one line of input.
    fn predict(&self, text: &str, k: i32, threshold: f32) -> Result<Vec<Prediction>, EngineError>;

    /// Width of the embedding vectors.
    fn dimension(&self) -> usize;

    fn sentence_vector(&self, text: &str) -> Result<Vec<f32>, EngineError>;

    /// Labels in label-table order. Empty for unsupervised models.
    fn labels(&self) -> Result<Vec<String>, EngineError>;

    fn label_prefix(&self) -> &str {
        DEFAULT_LABEL_PREFIX
    }

    /// Predicts every labelled line of `input` and tallies the results.
    ///
    /// Lines without a known gold label are skipped. A line holding only
    /// labels is still predicted, on the bare line terminator.
    fn evaluate(
        &self,
        input: &mut dyn BufRead,
        k: i32,
        threshold: f32,
    ) -> Result<Meter, EngineError> {
        let mut meter = Meter::new(self.labels()?);
        let prefix = self.label_prefix();

        for line in input.lines() {
            let line = line?;
            let mut gold = Vec::new();
            let mut words = Vec::new();
            for token in line.split_whitespace() {
                if token.starts_with(prefix) {
                    gold.extend(meter.label_id(token));
                } else {
                    words.push(token);
                }
            }
            if gold.is_empty() {
                continue;
            }

            let mut text = words.join(" ");
            text.push('\n');
            let predicted: Vec<usize> = self
                .predict(&text, k, threshold)?
                .iter()
                .filter_map(|prediction| meter.label_id(&prediction.label))
                .collect();
            meter.log(&gold, &predicted);
        }
        Ok(meter)
    }

    fn save_model(&self, path: &Path) -> Result<(), EngineError>;

    /// Writes the word vectors in the plain-text `.vec` format.
    fn save_vectors(&self, path: &Path) -> Result<(), EngineError>;

    /// Writes the raw output layer.
    fn save_output(&self, path: &Path) -> Result<(), EngineError>;
}

/// Factory for models: loads serialized ones and trains new ones.
pub trait Backend: Send + Sync {
    type Model: Engine;

    fn load(&self, path: &Path) -> Result<Self::Model, EngineError>;

    fn train(&self, config: &TrainConfig) -> Result<Self::Model, EngineError>;

    /// Compresses a trained classifier in place.
    fn quantize(&self, model: &mut Self::Model, config: &TrainConfig) -> Result<(), EngineError>;

    /// Searches hyperparameters against `config.autotune.validation` and
    /// returns the best model, quantized when a size cap is set.
    ///
    /// Backends without a native search use the [`Autotuner`] grid.
    fn autotune(&self, config: &TrainConfig) -> Result<Self::Model, AutotuneError>
    where
        Self: Sized,
    {
        Ok(Autotuner::new(self, config).run()?.model)
    }
}
