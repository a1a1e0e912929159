//! Grid search for supervised hyperparameters, the default
//! [`Backend::autotune`](crate::engine::Backend::autotune).
//!
//! Candidates are derived from the user's configuration by varying learning
//! rate, epochs and word n-grams. Each one is trained, scored on the
//! validation file, and the best model is kept. The search stops early once
//! the time budget is spent; at least one candidate is always trained.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Instant;

use log::info;

use crate::engine::{AutotuneMetric, Backend, Engine, EngineError, Meter, TrainConfig};

const CANDIDATE_LRS: [f64; 2] = [0.5, 1.0];
const CANDIDATE_EPOCHS: [i32; 1] = [25];
const CANDIDATE_WORD_NGRAMS: [i32; 1] = [2];
const NGRAM_BUCKETS: i32 = 2_000_000;

#[derive(Debug, thiserror::Error)]
pub enum AutotuneError {
    #[error("Autotune requires a validation file")]
    NoValidationFile,
    #[error("Validation file {path:?} cannot be opened: {source}")]
    Validation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A trained candidate and its validation score.
pub struct Trial<M> {
    pub config: TrainConfig,
    pub model: M,
    pub score: f64,
}

pub struct Autotuner<'a, B: Backend> {
    backend: &'a B,
    base: &'a TrainConfig,
}

impl<'a, B: Backend> Autotuner<'a, B> {
    pub fn new(backend: &'a B, base: &'a TrainConfig) -> Self {
        Self { backend, base }
    }

    /// Configurations to try, the user's own first, without duplicates.
    pub fn candidates(&self) -> Vec<TrainConfig> {
        let base = self.base;
        let lrs = std::iter::once(base.lr).chain(CANDIDATE_LRS);
        let mut candidates: Vec<TrainConfig> = Vec::new();

        for lr in lrs {
            for epoch in std::iter::once(base.epoch).chain(CANDIDATE_EPOCHS) {
                for word_ngrams in std::iter::once(base.word_ngrams).chain(CANDIDATE_WORD_NGRAMS) {
                    let mut candidate = base.clone();
                    candidate.lr = lr;
                    candidate.epoch = epoch;
                    candidate.word_ngrams = word_ngrams;
                    if word_ngrams > 1 && candidate.bucket == 0 {
                        candidate.bucket = NGRAM_BUCKETS;
                    }
                    if !candidates.contains(&candidate) {
                        candidates.push(candidate);
                    }
                }
            }
        }
        candidates
    }

    /// Runs the search and returns the best trial, quantized when the
    /// configuration caps the model size.
    pub fn run(&self) -> Result<Trial<B::Model>, AutotuneError> {
        let options = &self.base.autotune;
        let validation = options
            .validation
            .as_ref()
            .ok_or(AutotuneError::NoValidationFile)?;
        let started = Instant::now();
        let mut best: Option<Trial<B::Model>> = None;

        for (index, candidate) in self.candidates().into_iter().enumerate() {
            if best.is_some() && started.elapsed() >= options.duration {
                info!("Autotune budget of {:?} spent after {} trials", options.duration, index);
                break;
            }

            let model = self.backend.train(&candidate)?;
            let file = File::open(validation).map_err(|source| AutotuneError::Validation {
                path: validation.clone(),
                source,
            })?;
            let meter = model.evaluate(&mut BufReader::new(file), options.predictions, 0.0)?;
            let score = score(&meter, &options.metric);
            info!(
                "Trial {}: lr {} epoch {} wordNgrams {} -> score {:.6}",
                index + 1,
                candidate.lr,
                candidate.epoch,
                candidate.word_ngrams,
                score
            );

            if best.as_ref().map_or(true, |trial| score > trial.score) {
                best = Some(Trial { config: candidate, model, score });
            }
        }

        let mut best = best.ok_or(AutotuneError::NoValidationFile)?;
        if let Some(limit) = options.model_size {
            info!("Quantizing best model to fit {} bytes", limit);
            self.backend.quantize(&mut best.model, &best.config)?;
        }
        Ok(best)
    }
}

/// Validation score of a meter; non-finite values rank below every real score.
pub fn score(meter: &Meter, metric: &AutotuneMetric) -> f64 {
    let value = match metric {
        AutotuneMetric::F1 => meter.f1_score(),
        AutotuneMetric::LabelF1(label) => meter
            .label_id(label)
            .and_then(|id| meter.label_metrics(id))
            .map_or(f64::NAN, |metrics| metrics.f1_score()),
    };
    if value.is_finite() {
        value
    } else {
        f64::NEG_INFINITY
    }
}
