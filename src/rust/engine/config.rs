use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use super::DEFAULT_LABEL_PREFIX;

/// fastText's word subsampling threshold (`-t`).
pub const DEFAULT_SAMPLING_THRESHOLD: f64 = 1e-4;

/// The training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Cbow,
    Skipgram,
    Supervised,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cbow => write!(f, "cbow"),
            Self::Skipgram => write!(f, "skipgram"),
            Self::Supervised => write!(f, "supervised"),
        }
    }
}

/// Loss function used while training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    HierarchicalSoftmax,
    NegativeSampling,
    Softmax,
    OneVsAll,
}

impl FromStr for LossKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hs" => Ok(Self::HierarchicalSoftmax),
            "ns" => Ok(Self::NegativeSampling),
            "softmax" => Ok(Self::Softmax),
            "ova" => Ok(Self::OneVsAll),
            other => Err(format!("unknown loss: {}", other)),
        }
    }
}

/// Objective maximized by the autotuner on the validation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutotuneMetric {
    /// Overall F1 score
    F1,
    /// F1 score of a single label
    LabelF1(String),
}

impl FromStr for AutotuneMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "f1" => Ok(Self::F1),
            Some(("f1", label)) if !label.is_empty() => Ok(Self::LabelF1(label.to_string())),
            _ => Err(format!("unknown metric: {}", s)),
        }
    }
}

/// Options for product quantization of a trained classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeOptions {
    pub cutoff: usize,
    pub retrain: bool,
    pub qnorm: bool,
    pub qout: bool,
    pub dsub: usize,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            cutoff: 0,
            retrain: false,
            qnorm: false,
            qout: false,
            dsub: 2,
        }
    }
}

/// Options for automatic hyperparameter search.
#[derive(Debug, Clone, PartialEq)]
pub struct AutotuneOptions {
    /// Validation file; autotune is enabled when set
    pub validation: Option<PathBuf>,
    pub metric: AutotuneMetric,
    /// Number of predictions used when scoring on the validation file
    pub predictions: i32,
    pub duration: Duration,
    /// Upper bound on the final model size in bytes; `None` means unlimited
    pub model_size: Option<u64>,
}

impl Default for AutotuneOptions {
    fn default() -> Self {
        Self {
            validation: None,
            metric: AutotuneMetric::F1,
            predictions: 1,
            duration: Duration::from_secs(300),
            model_size: None,
        }
    }
}

/// Training configuration handed to a [`Backend`](super::Backend).
///
/// [`TrainConfig::new`] fills in the same defaults fastText uses for each
/// objective; the command-line flag parser then overrides individual fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub model: ModelKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub lr: f64,
    pub lr_update_rate: i32,
    pub dim: i32,
    pub ws: i32,
    pub epoch: i32,
    pub min_count: i32,
    pub min_count_label: i32,
    pub neg: i32,
    pub word_ngrams: i32,
    pub loss: LossKind,
    pub bucket: i32,
    pub minn: i32,
    pub maxn: i32,
    pub thread: i32,
    pub t: f64,
    pub label: String,
    pub verbose: i32,
    pub pretrained_vectors: Option<PathBuf>,
    pub save_output: bool,
    pub seed: i32,
    pub quantize: QuantizeOptions,
    pub autotune: AutotuneOptions,
}

impl TrainConfig {
    pub fn new(model: ModelKind) -> Self {
        let mut config = Self {
            model,
            input: PathBuf::new(),
            output: PathBuf::new(),
            lr: 0.05,
            lr_update_rate: 100,
            dim: 100,
            ws: 5,
            epoch: 5,
            min_count: 5,
            min_count_label: 0,
            neg: 5,
            word_ngrams: 1,
            loss: LossKind::NegativeSampling,
            bucket: 2_000_000,
            minn: 3,
            maxn: 6,
            thread: 12,
            t: DEFAULT_SAMPLING_THRESHOLD,
            label: DEFAULT_LABEL_PREFIX.to_string(),
            verbose: 2,
            pretrained_vectors: None,
            save_output: false,
            seed: 0,
            quantize: QuantizeOptions::default(),
            autotune: AutotuneOptions::default(),
        };
        if model == ModelKind::Supervised {
            config.lr = 0.1;
            config.min_count = 1;
            config.loss = LossKind::Softmax;
            config.minn = 0;
            config.maxn = 0;
        }
        config
    }

    pub fn has_autotune(&self) -> bool {
        self.autotune.validation.is_some()
    }

    /// Path of the serialized model: compressed (`.ftz`) when autotune runs
    /// under a size cap, `.bin` otherwise.
    pub fn model_file_name(&self) -> PathBuf {
        if self.has_autotune() && self.autotune.model_size.is_some() {
            self.output_with_suffix(".ftz")
        } else {
            self.output_with_suffix(".bin")
        }
    }

    pub fn vectors_file_name(&self) -> PathBuf {
        self.output_with_suffix(".vec")
    }

    pub fn output_layer_file_name(&self) -> PathBuf {
        self.output_with_suffix(".output")
    }

    fn output_with_suffix(&self, suffix: &str) -> PathBuf {
        append_suffix(&self.output, suffix)
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Parses a model size such as `2M` or `500k` into bytes.
///
/// Accepted suffixes are `k`, `m` and `g` (either case), decimal multiples.
pub fn parse_model_size(value: &str) -> Option<u64> {
    let (digits, multiplier) = match value.chars().last()? {
        'k' | 'K' => (&value[..value.len() - 1], 1_000),
        'm' | 'M' => (&value[..value.len() - 1], 1_000_000),
        'g' | 'G' => (&value[..value.len() - 1], 1_000_000_000),
        _ => (value, 1),
    };
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}
