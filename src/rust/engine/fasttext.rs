use std::fs::File;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use fasttext::{Args, FastText, LossName, ModelName};
use log::{info, warn};

use super::{
    AutotuneMetric, Backend, Engine, EngineError, LossKind, ModelKind, Prediction, TrainConfig,
    DEFAULT_LABEL_PREFIX, DEFAULT_SAMPLING_THRESHOLD,
};
use crate::autotune::{AutotuneError, Autotuner};

/// Backend linking the native fastText library.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastTextBackend;

/// A native fastText model.
///
/// Dimension and label table are read once when the model is created; every
/// other call goes through the mutex guarding the native handle.
pub struct FastTextModel {
    inner: Mutex<FastText>,
    dimension: usize,
    labels: Vec<String>,
    label_prefix: String,
}

// SAFETY: the native handle is only reached through `inner`, which
// serializes every call into the library.
unsafe impl Send for FastTextModel {}
unsafe impl Sync for FastTextModel {}

impl FastTextModel {
    fn from_native(inner: FastText, label_prefix: &str) -> Result<Self, EngineError> {
        let dimension = usize::try_from(inner.get_dimension())
            .map_err(|_| EngineError::Backend("model reported a negative dimension".into()))?;
        let (labels, _counts) = inner.get_labels().map_err(EngineError::Backend)?;
        Ok(Self {
            inner: Mutex::new(inner),
            dimension,
            labels,
            label_prefix: label_prefix.to_string(),
        })
    }

    fn native(&self) -> Result<MutexGuard<'_, FastText>, EngineError> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Backend("fastText handle lock was poisoned".into()))
    }
}

impl Engine for FastTextModel {
    fn predict(&self, text: &str, k: i32, threshold: f32) -> Result<Vec<Prediction>, EngineError> {
        let predictions = self
            .native()?
            .predict(text, k, threshold)
            .map_err(EngineError::Backend)?;
        Ok(predictions
            .into_iter()
            .map(|p| Prediction { probability: p.prob, label: p.label })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn sentence_vector(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        self.native()?.get_sentence_vector(text).map_err(EngineError::Backend)
    }

    fn labels(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.labels.clone())
    }

    fn label_prefix(&self) -> &str {
        &self.label_prefix
    }

    fn save_model(&self, path: &Path) -> Result<(), EngineError> {
        self.native()?.save_model(path_str(path)?).map_err(EngineError::Backend)
    }

    fn save_vectors(&self, path: &Path) -> Result<(), EngineError> {
        self.native()?.save_vectors(path_str(path)?).map_err(EngineError::Backend)
    }

    fn save_output(&self, path: &Path) -> Result<(), EngineError> {
        self.native()?.save_output(path_str(path)?).map_err(EngineError::Backend)
    }
}

impl Backend for FastTextBackend {
    type Model = FastTextModel;

    fn load(&self, path: &Path) -> Result<FastTextModel, EngineError> {
        let mut inner = FastText::new();
        inner.load_model(path_str(path)?).map_err(EngineError::Backend)?;
        FastTextModel::from_native(inner, DEFAULT_LABEL_PREFIX)
    }

    fn train(&self, config: &TrainConfig) -> Result<FastTextModel, EngineError> {
        info!("Training {} model on {:?}", config.model, config.input);
        let args = native_args(config)?;
        let mut inner = FastText::new();
        inner.train(&args).map_err(EngineError::Backend)?;
        FastTextModel::from_native(inner, &config.label)
    }

    fn quantize(&self, model: &mut FastTextModel, config: &TrainConfig) -> Result<(), EngineError> {
        let args = native_args(config)?;
        model.native()?.quantize(&args).map_err(EngineError::Backend)
    }

    /// Runs fastText's own hyperparameter search. The native search only
    /// optimizes overall F1, so `f1:<label>` goes through [`Autotuner`].
    fn autotune(&self, config: &TrainConfig) -> Result<FastTextModel, AutotuneError> {
        let options = &config.autotune;
        let validation = options
            .validation
            .as_ref()
            .ok_or(AutotuneError::NoValidationFile)?;
        if let AutotuneMetric::LabelF1(label) = &options.metric {
            info!("Native autotune cannot target {}; using the candidate grid", label);
            return Ok(Autotuner::new(self, config).run()?.model);
        }
        File::open(validation).map_err(|source| AutotuneError::Validation {
            path: validation.clone(),
            source,
        })?;

        let mut args = native_args(config)?;
        args.set_autotune_validation_file(path_str(validation)?)
            .map_err(EngineError::Backend)?;
        args.set_autotune_duration(i32::try_from(options.duration.as_secs()).unwrap_or(i32::MAX));
        args.set_autotune_predictions(options.predictions);

        info!("Autotuning on {:?} for {:?}", validation, options.duration);
        let mut inner = FastText::new();
        inner.train(&args).map_err(EngineError::Backend)?;
        let mut model = FastTextModel::from_native(inner, &config.label)?;
        if let Some(limit) = options.model_size {
            info!("Quantizing autotuned model to fit {} bytes", limit);
            self.quantize(&mut model, config)?;
        }
        Ok(model)
    }
}

fn native_args(config: &TrainConfig) -> Result<Args, EngineError> {
    let mut args = Args::new();
    args.set_input(path_str(&config.input)?).map_err(EngineError::Backend)?;
    args.set_output(path_str(&config.output)?).map_err(EngineError::Backend)?;
    args.set_model(match config.model {
        ModelKind::Cbow => ModelName::CBOW,
        ModelKind::Skipgram => ModelName::SG,
        ModelKind::Supervised => ModelName::SUP,
    });
    args.set_loss(match config.loss {
        LossKind::HierarchicalSoftmax => LossName::HS,
        LossKind::NegativeSampling => LossName::NS,
        LossKind::Softmax => LossName::SOFTMAX,
        LossKind::OneVsAll => LossName::OVA,
    });
    args.set_lr(config.lr);
    args.set_lr_update_rate(config.lr_update_rate);
    args.set_dim(config.dim);
    args.set_ws(config.ws);
    args.set_epoch(config.epoch);
    args.set_min_count(config.min_count);
    args.set_min_count_label(config.min_count_label);
    args.set_neg(config.neg);
    args.set_word_ngrams(config.word_ngrams);
    args.set_bucket(config.bucket);
    args.set_minn(config.minn);
    args.set_maxn(config.maxn);
    args.set_thread(config.thread);
    args.set_label(&config.label).map_err(EngineError::Backend)?;
    args.set_verbose(config.verbose);
    if let Some(vectors) = &config.pretrained_vectors {
        args.set_pretrained_vectors(path_str(vectors)?)
            .map_err(EngineError::Backend)?;
    }
    args.set_save_output(config.save_output);
    args.set_cutoff(config.quantize.cutoff);
    args.set_retrain(config.quantize.retrain);
    args.set_qnorm(config.quantize.qnorm);
    args.set_qout(config.quantize.qout);
    args.set_dsub(config.quantize.dsub);
    if config.t != DEFAULT_SAMPLING_THRESHOLD {
        warn!(
            "The linked fastText library only accepts an integer -t; keeping {}",
            DEFAULT_SAMPLING_THRESHOLD
        );
    }
    if config.seed != 0 {
        warn!("The linked fastText library does not expose -seed; ignoring {}", config.seed);
    }
    Ok(args)
}

fn path_str(path: &Path) -> Result<&str, EngineError> {
    path.to_str()
        .ok_or_else(|| EngineError::InvalidPath(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_native_args_carry_config() {
        let mut config = TrainConfig::new(ModelKind::Supervised);
        config.input = PathBuf::from("train.txt");
        config.output = PathBuf::from("model");
        config.lr = 0.5;
        config.dim = 16;
        config.word_ngrams = 2;
        config.loss = LossKind::OneVsAll;
        config.label = "__tag__".to_string();

        let args = native_args(&config).unwrap();
        assert_eq!(args.input(), "train.txt");
        assert_eq!(args.output(), "model");
        assert_eq!(args.model(), ModelName::SUP);
        assert_eq!(args.loss(), LossName::OVA);
        assert_eq!(args.lr(), 0.5);
        assert_eq!(args.dim(), 16);
        assert_eq!(args.word_ngrams(), 2);
        assert_eq!(args.label(), "__tag__");
        assert!(!args.has_autotune());
    }
}
