use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::{parse_model_size, ModelKind, TrainConfig};

/// Errors in a training flag list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlagError {
    #[error("Provided argument without a dash: {0}")]
    MissingDash(String),
    #[error("Unknown argument: {0}")]
    Unknown(String),
    #[error("Missing value for {0}")]
    MissingValue(String),
    #[error("Invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },
    #[error("Empty input or output path.")]
    MissingPaths,
    #[error("Autotune is only supported for supervised models")]
    AutotuneUnsupported,
}

/// Parses fastText-style training flags (`-input data.txt -dim 50 -saveOutput`).
///
/// Every flag takes exactly one value except the switches `-saveOutput`,
/// `-retrain`, `-qnorm` and `-qout`.
pub fn parse_train_flags<S: AsRef<str>>(
    model: ModelKind,
    tokens: &[S],
) -> Result<TrainConfig, FlagError> {
    let mut config = TrainConfig::new(model);
    let mut tokens = tokens.iter().map(|token| AsRef::<str>::as_ref(token));

    while let Some(flag) = tokens.next() {
        let name = flag
            .strip_prefix('-')
            .ok_or_else(|| FlagError::MissingDash(flag.to_string()))?;
        match name {
            "saveOutput" => config.save_output = true,
            "retrain" => config.quantize.retrain = true,
            "qnorm" => config.quantize.qnorm = true,
            "qout" => config.quantize.qout = true,
            _ => {
                let value = tokens
                    .next()
                    .ok_or_else(|| FlagError::MissingValue(flag.to_string()))?;
                apply(&mut config, flag, name, value)?;
            }
        }
    }

    if config.input.as_os_str().is_empty() || config.output.as_os_str().is_empty() {
        return Err(FlagError::MissingPaths);
    }
    if config.has_autotune() && model != ModelKind::Supervised {
        return Err(FlagError::AutotuneUnsupported);
    }
    if config.word_ngrams <= 1 && config.maxn == 0 && !config.has_autotune() {
        config.bucket = 0;
    }
    Ok(config)
}

fn apply(config: &mut TrainConfig, flag: &str, name: &str, value: &str) -> Result<(), FlagError> {
    match name {
        "input" => config.input = PathBuf::from(value),
        "output" => config.output = PathBuf::from(value),
        "lr" => config.lr = parse_value(flag, value)?,
        "lrUpdateRate" => config.lr_update_rate = parse_value(flag, value)?,
        "dim" => config.dim = parse_value(flag, value)?,
        "ws" => config.ws = parse_value(flag, value)?,
        "epoch" => config.epoch = parse_value(flag, value)?,
        "minCount" => config.min_count = parse_value(flag, value)?,
        "minCountLabel" => config.min_count_label = parse_value(flag, value)?,
        "neg" => config.neg = parse_value(flag, value)?,
        "wordNgrams" => config.word_ngrams = parse_value(flag, value)?,
        "loss" => config.loss = parse_value(flag, value)?,
        "bucket" => config.bucket = parse_value(flag, value)?,
        "minn" => config.minn = parse_value(flag, value)?,
        "maxn" => config.maxn = parse_value(flag, value)?,
        "thread" => config.thread = parse_value(flag, value)?,
        "t" => config.t = parse_value(flag, value)?,
        "label" => config.label = value.to_string(),
        "verbose" => config.verbose = parse_value(flag, value)?,
        "pretrainedVectors" => config.pretrained_vectors = Some(PathBuf::from(value)),
        "seed" => config.seed = parse_value(flag, value)?,
        "cutoff" => config.quantize.cutoff = parse_value(flag, value)?,
        "dsub" => config.quantize.dsub = parse_value(flag, value)?,
        "autotune-validation" => config.autotune.validation = Some(PathBuf::from(value)),
        "autotune-metric" => config.autotune.metric = parse_value(flag, value)?,
        "autotune-predictions" => config.autotune.predictions = parse_value(flag, value)?,
        "autotune-duration" => {
            config.autotune.duration = Duration::from_secs(parse_value(flag, value)?)
        }
        "autotune-modelsize" => {
            config.autotune.model_size =
                Some(parse_model_size(value).ok_or_else(|| invalid(flag, value))?)
        }
        _ => return Err(FlagError::Unknown(flag.to_string())),
    }
    Ok(())
}

fn parse_value<T: FromStr>(flag: &str, value: &str) -> Result<T, FlagError> {
    value.parse().map_err(|_| invalid(flag, value))
}

fn invalid(flag: &str, value: &str) -> FlagError {
    FlagError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    }
}
