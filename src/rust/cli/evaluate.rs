use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use log::info;

use super::CliError;
use crate::engine::{Backend, Engine, Meter, Notation};

/// Where test examples are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// `-` selects standard input; anything else names a file.
    pub fn parse(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// Options of the `test` and `test-label` commands.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOptions {
    pub model: PathBuf,
    pub input: InputSource,
    pub k: i32,
    pub threshold: f32,
    /// Print F1, precision and recall for every label
    pub per_label: bool,
}

/// Loads a fresh model, evaluates it on the configured input and writes the
/// report to `out`.
pub fn run<B: Backend, W: Write>(
    backend: &B,
    options: &TestOptions,
    out: &mut W,
) -> Result<Meter, CliError> {
    match &options.input {
        InputSource::Stdin => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            run_with_input(backend, options, &mut input, out)
        }
        InputSource::File(path) => {
            let file = File::open(path).map_err(|source| CliError::TestFileUnavailable {
                path: path.clone(),
                source,
            })?;
            run_with_input(backend, options, &mut BufReader::new(file), out)
        }
    }
}

/// Like [`run`], reading examples from `input` regardless of
/// [`TestOptions::input`].
pub fn run_with_input<B: Backend, W: Write>(
    backend: &B,
    options: &TestOptions,
    input: &mut dyn BufRead,
    out: &mut W,
) -> Result<Meter, CliError> {
    if !options.model.exists() {
        return Err(CliError::ModelNotFound(options.model.clone()));
    }
    info!("Evaluating {:?} at k={} threshold={}", options.model, options.k, options.threshold);
    let model = backend.load(&options.model)?;
    let meter = model.evaluate(input, options.k, options.threshold)?;
    write_report(&meter, options, out)?;
    Ok(meter)
}

/// Per-label lines (for `test-label`) followed by the aggregate metrics.
///
/// The aggregate lines use three decimals after a per-label report and three
/// significant digits otherwise.
pub fn write_report<W: Write>(meter: &Meter, options: &TestOptions, out: &mut W) -> io::Result<()> {
    let notation = if options.per_label {
        meter.write_label_metrics(out)?;
        Notation::Fixed
    } else {
        Notation::Significant
    };
    meter.write_general_metrics(out, options.k, notation)?;
    out.flush()
}
