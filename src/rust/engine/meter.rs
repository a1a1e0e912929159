use std::collections::HashMap;
use std::io::{self, Write};

/// Placeholder printed in place of a metric that is not a finite number.
pub const NON_FINITE_PLACEHOLDER: &str = "--------";

/// Counters shared by the aggregate and the per-label statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub gold: u64,
    pub predicted: u64,
    pub predicted_gold: u64,
}

impl Metrics {
    /// NaN when nothing was predicted.
    pub fn precision(&self) -> f64 {
        self.predicted_gold as f64 / self.predicted as f64
    }

    /// NaN when nothing was expected.
    pub fn recall(&self) -> f64 {
        self.predicted_gold as f64 / self.gold as f64
    }

    pub fn f1_score(&self) -> f64 {
        2.0 * self.predicted_gold as f64 / (self.predicted + self.gold) as f64
    }
}

/// Evaluation meter filled while a model is tested against labelled data.
///
/// Label ids are positions in the model's label table, so iterating
/// [`Meter::labels`] walks the table in its native order.
#[derive(Debug, Clone)]
pub struct Meter {
    labels: Vec<String>,
    index: HashMap<String, usize>,
    examples: u64,
    overall: Metrics,
    per_label: Vec<Metrics>,
}

impl Meter {
    pub fn new(labels: Vec<String>) -> Self {
        let index = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id))
            .collect();
        let per_label = vec![Metrics::default(); labels.len()];
        Self {
            labels,
            index,
            examples: 0,
            overall: Metrics::default(),
            per_label,
        }
    }

    pub fn label_id(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Records one example given its gold label ids and predicted label ids.
    pub fn log(&mut self, gold: &[usize], predicted: &[usize]) {
        self.examples += 1;
        self.overall.gold += gold.len() as u64;
        self.overall.predicted += predicted.len() as u64;

        for &label in predicted {
            let metrics = &mut self.per_label[label];
            metrics.predicted += 1;
            if gold.contains(&label) {
                metrics.predicted_gold += 1;
                self.overall.predicted_gold += 1;
            }
        }
        for &label in gold {
            self.per_label[label].gold += 1;
        }
    }

    pub fn examples(&self) -> u64 {
        self.examples
    }

    pub fn overall(&self) -> &Metrics {
        &self.overall
    }

    pub fn label_metrics(&self, label_id: usize) -> Option<&Metrics> {
        self.per_label.get(label_id)
    }

    pub fn precision(&self) -> f64 {
        self.overall.precision()
    }

    pub fn recall(&self) -> f64 {
        self.overall.recall()
    }

    pub fn f1_score(&self) -> f64 {
        self.overall.f1_score()
    }

    /// Writes one line per label, in label-table order.
    pub fn write_label_metrics<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for (label, metrics) in self.labels.iter().zip(&self.per_label) {
            write_metric(out, "F1-Score", metrics.f1_score())?;
            write_metric(out, "Precision", metrics.precision())?;
            write_metric(out, "Recall", metrics.recall())?;
            writeln!(out, " {}", label)?;
        }
        Ok(())
    }

    /// Writes the example count and precision/recall at `k`.
    pub fn write_general_metrics<W: Write>(
        &self,
        out: &mut W,
        k: i32,
        notation: Notation,
    ) -> io::Result<()> {
        writeln!(out, "N\t{}", self.examples)?;
        writeln!(out, "P@{}\t{}", k, notation.format(self.precision()))?;
        writeln!(out, "R@{}\t{}", k, notation.format(self.recall()))?;
        Ok(())
    }
}

/// Number style of the aggregate `P@k`/`R@k` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// Three decimals, as printed after per-label metrics (`0.500`)
    Fixed,
    /// Three significant digits with trailing zeros dropped (`0.5`, `1`)
    Significant,
}

impl Notation {
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Fixed => format!("{:.3}", value),
            Self::Significant => significant(value, 3),
        }
    }
}

fn significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    // Round first so the exponent reflects carries like 0.9996 -> 1.00.
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

fn write_metric<W: Write>(out: &mut W, name: &str, value: f64) -> io::Result<()> {
    if value.is_finite() {
        write!(out, "{} : {:.6}  ", name, value)
    } else {
        write!(out, "{} : {}  ", name, NON_FINITE_PLACEHOLDER)
    }
}
