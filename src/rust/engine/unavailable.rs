use std::path::Path;

use super::{Backend, Engine, EngineError, Prediction, TrainConfig};

/// Backend compiled in when the native library is not linked.
///
/// Every load and training request fails with [`EngineError::Unavailable`],
/// so callers observe an unloaded model rather than a link error.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

/// Model type of [`UnavailableBackend`]; it has no values.
#[derive(Debug)]
pub enum NoModel {}

impl Engine for NoModel {
    fn predict(&self, _text: &str, _k: i32, _threshold: f32) -> Result<Vec<Prediction>, EngineError> {
        match *self {}
    }

    fn dimension(&self) -> usize {
        match *self {}
    }

    fn sentence_vector(&self, _text: &str) -> Result<Vec<f32>, EngineError> {
        match *self {}
    }

    fn labels(&self) -> Result<Vec<String>, EngineError> {
        match *self {}
    }

    fn save_model(&self, _path: &Path) -> Result<(), EngineError> {
        match *self {}
    }

    fn save_vectors(&self, _path: &Path) -> Result<(), EngineError> {
        match *self {}
    }

    fn save_output(&self, _path: &Path) -> Result<(), EngineError> {
        match *self {}
    }
}

impl Backend for UnavailableBackend {
    type Model = NoModel;

    fn load(&self, _path: &Path) -> Result<NoModel, EngineError> {
        Err(EngineError::Unavailable)
    }

    fn train(&self, _config: &TrainConfig) -> Result<NoModel, EngineError> {
        Err(EngineError::Unavailable)
    }

    fn quantize(&self, model: &mut NoModel, _config: &TrainConfig) -> Result<(), EngineError> {
        match *model {}
    }
}
