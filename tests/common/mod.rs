//! A small keyword model standing in for fastText in integration tests.
//!
//! Model files are plain text:
//!
//! ```text
//! dim 4
//! __label__sports ball goal
//! __label__tech code rust
//! ```
//!
//! Each label line lists the words that vote for that label.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ftbridge::engine::{Backend, Engine, EngineError, Prediction, TrainConfig};

pub const SPORTS_TECH_MODEL: &str = "dim 4\n__label__sports ball goal match\n__label__tech code rust compiler\n";

#[derive(Debug, Clone)]
pub struct KeywordModel {
    pub dim: usize,
    pub labels: Vec<String>,
    pub keywords: HashMap<String, usize>,
    pub quantized: bool,
    queries: Arc<Mutex<Vec<String>>>,
}

impl KeywordModel {
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        let mut dim = 0;
        let mut labels = Vec::new();
        let mut keywords = HashMap::new();
        for line in text.lines() {
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                Some("dim") => {
                    dim = tokens
                        .next()
                        .and_then(|d| d.parse().ok())
                        .ok_or_else(|| EngineError::Backend("bad dim line".into()))?;
                }
                Some(label) => {
                    for word in tokens {
                        keywords.insert(word.to_string(), labels.len());
                    }
                    labels.push(label.to_string());
                }
                None => {}
            }
        }
        if dim == 0 {
            return Err(EngineError::Backend("model has no dimension".into()));
        }
        Ok(Self { dim, labels, keywords, quantized: false, queries: Arc::default() })
    }

    /// Builds a model from labelled training lines.
    pub fn from_training_data(text: &str, dim: usize) -> Self {
        let mut labels: Vec<String> = Vec::new();
        let mut keywords = HashMap::new();
        for line in text.lines() {
            let (tagged, words): (Vec<&str>, Vec<&str>) =
                line.split_whitespace().partition(|t| t.starts_with("__label__"));
            for label in tagged {
                let id = match labels.iter().position(|l| l == label) {
                    Some(id) => id,
                    None => {
                        labels.push(label.to_string());
                        labels.len() - 1
                    }
                };
                for word in &words {
                    keywords.insert(word.to_string(), id);
                }
            }
        }
        Self { dim, labels, keywords, quantized: false, queries: Arc::default() }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("dim {}\n", self.dim);
        for (id, label) in self.labels.iter().enumerate() {
            let mut words: Vec<&str> = self
                .keywords
                .iter()
                .filter(|(_, owner)| **owner == id)
                .map(|(w, _)| w.as_str())
                .collect();
            words.sort_unstable();
            text.push_str(&format!("{} {}\n", label, words.join(" ")));
        }
        text
    }

    fn record(&self, text: &str) {
        self.queries.lock().unwrap().push(text.to_string());
    }
}

impl Engine for KeywordModel {
    fn predict(&self, text: &str, k: i32, threshold: f32) -> Result<Vec<Prediction>, EngineError> {
        self.record(text);
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() || self.labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut votes = vec![0usize; self.labels.len()];
        for word in &words {
            if let Some(&id) = self.keywords.get(*word) {
                votes[id] += 1;
            }
        }
        let total = votes.iter().sum::<usize>() + self.labels.len();
        let mut predictions: Vec<Prediction> = votes
            .iter()
            .enumerate()
            .map(|(id, &v)| Prediction {
                probability: (v + 1) as f32 / total as f32,
                label: self.labels[id].clone(),
            })
            .collect();
        predictions.sort_by(|a, b| b.probability.partial_cmp(&a.probability).unwrap());
        predictions.retain(|p| p.probability >= threshold);
        predictions.truncate(k.max(0) as usize);
        Ok(predictions)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn sentence_vector(&self, text: &str) -> Result<Vec<f32>, EngineError> {
        self.record(text);
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut vector = vec![0.0f32; self.dim];
        for word in &words {
            let seed: u32 = word.bytes().map(u32::from).sum();
            for (i, value) in vector.iter_mut().enumerate() {
                *value += ((seed + i as u32) % 7) as f32;
            }
        }
        if !words.is_empty() {
            for value in &mut vector {
                *value /= words.len() as f32;
            }
        }
        Ok(vector)
    }

    fn labels(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.labels.clone())
    }

    fn save_model(&self, path: &Path) -> Result<(), EngineError> {
        Ok(fs::write(path, self.to_text())?)
    }

    fn save_vectors(&self, path: &Path) -> Result<(), EngineError> {
        let mut text = format!("{} {}\n", self.keywords.len(), self.dim);
        let mut words: Vec<&String> = self.keywords.keys().collect();
        words.sort();
        for word in words {
            let vector = self.sentence_vector(word)?;
            let values: Vec<String> = vector.iter().map(|v| format!("{:.5}", v)).collect();
            text.push_str(&format!("{} {}\n", word, values.join(" ")));
        }
        Ok(fs::write(path, text)?)
    }

    fn save_output(&self, path: &Path) -> Result<(), EngineError> {
        Ok(fs::write(path, self.labels.join("\n"))?)
    }
}

/// Backend over [`KeywordModel`] that counts how often it is asked to work.
#[derive(Debug, Clone, Default)]
pub struct KeywordBackend {
    pub loads: Arc<AtomicUsize>,
    pub trains: Arc<AtomicUsize>,
    pub quantizations: Arc<AtomicUsize>,
    pub trained_configs: Arc<Mutex<Vec<TrainConfig>>>,
    /// Shared with every model this backend creates
    pub queries: Arc<Mutex<Vec<String>>>,
}

impl KeywordBackend {
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn train_count(&self) -> usize {
        self.trains.load(Ordering::SeqCst)
    }

    pub fn quantize_count(&self) -> usize {
        self.quantizations.load(Ordering::SeqCst)
    }

    /// Every text its models were asked about, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Backend for KeywordBackend {
    type Model = KeywordModel;

    fn load(&self, path: &Path) -> Result<KeywordModel, EngineError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut model = KeywordModel::parse(&fs::read_to_string(path)?)?;
        model.queries = Arc::clone(&self.queries);
        Ok(model)
    }

    fn train(&self, config: &TrainConfig) -> Result<KeywordModel, EngineError> {
        self.trains.fetch_add(1, Ordering::SeqCst);
        self.trained_configs.lock().unwrap().push(config.clone());
        let data = fs::read_to_string(&config.input)?;
        let mut model = KeywordModel::from_training_data(&data, config.dim.max(1) as usize);
        model.queries = Arc::clone(&self.queries);
        Ok(model)
    }

    fn quantize(&self, model: &mut KeywordModel, _config: &TrainConfig) -> Result<(), EngineError> {
        self.quantizations.fetch_add(1, Ordering::SeqCst);
        model.quantized = true;
        Ok(())
    }
}

/// Writes `contents` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
