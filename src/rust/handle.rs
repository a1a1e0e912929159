use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{debug, info};

use crate::engine::{Backend, Engine, EngineError, Prediction};

/// Number of labels requested per prediction.
pub const PREDICT_TOP_K: i32 = 1;
/// Minimum probability accepted for a prediction.
pub const PREDICT_THRESHOLD: f32 = 0.0;

/// Errors reported by [`ModelHandle`].
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("Model file does not exist: {0:?}")]
    ModelNotFound(PathBuf),
    #[error("No model has been loaded")]
    NotLoaded,
    #[error("Model produced no prediction for the query")]
    NoPrediction,
    #[error("Buffer holds {actual} floats but the model dimension is {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Model lock was poisoned")]
    LockPoisoned,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Outcome of a successful [`ModelHandle::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The model was read from disk by this call
    Loaded,
    /// A model was already resident; the call changed nothing
    AlreadyLoaded,
}

/// Owns at most one model for its whole lifetime.
///
/// The first successful [`load`](Self::load) installs the model; every later
/// call is a no-op that reports success, even for a different path. Loads hold
/// the write lock while they run, so concurrent callers cannot both load, and
/// queries share the read lock.
///
/// ```rust
/// use ftbridge::{HandleError, ModelHandle, UnavailableBackend};
///
/// let handle = ModelHandle::new(UnavailableBackend);
/// assert!(!handle.is_loaded());
/// assert_eq!(handle.dimension(), None);
/// assert!(matches!(handle.predict("hello"), Err(HandleError::NotLoaded)));
/// ```
pub struct ModelHandle<B: Backend> {
    backend: B,
    model: RwLock<Option<B::Model>>,
}

impl<B: Backend + Default> Default for ModelHandle<B> {
    fn default() -> Self {
        Self::new(B::default())
    }
}

impl<B: Backend> ModelHandle<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            model: RwLock::new(None),
        }
    }

    /// Loads the model at `path` unless a model is already resident.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadStatus, HandleError> {
        let path = path.as_ref();
        let mut slot = self.model.write().map_err(|_| HandleError::LockPoisoned)?;
        if slot.is_some() {
            debug!("Model already loaded, ignoring load of {:?}", path);
            return Ok(LoadStatus::AlreadyLoaded);
        }
        if !path.exists() {
            return Err(HandleError::ModelNotFound(path.to_path_buf()));
        }

        info!("Loading model from {:?}", path);
        let model = self.backend.load(path)?;
        info!("Model loaded (dimension {})", model.dimension());
        *slot = Some(model);
        Ok(LoadStatus::Loaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.model.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Embedding width of the resident model.
    pub fn dimension(&self) -> Option<usize> {
        self.with_model(|model| Ok(model.dimension())).ok()
    }

    /// Most probable label for `query`.
    ///
    /// The query is newline-terminated before it reaches the model. When the
    /// model returns several predictions only the last one is kept.
    pub fn predict(&self, query: &str) -> Result<Prediction, HandleError> {
        self.with_model(|model| {
            let query = normalize_query(query);
            model
                .predict(&query, PREDICT_TOP_K, PREDICT_THRESHOLD)?
                .into_iter()
                .last()
                .ok_or(HandleError::NoPrediction)
        })
    }

    pub fn sentence_vector(&self, query: &str) -> Result<Vec<f32>, HandleError> {
        self.with_model(|model| Ok(model.sentence_vector(&normalize_query(query))?))
    }

    /// Writes the sentence vector of `query` into `out`.
    ///
    /// `out` must be exactly as long as the model dimension; otherwise nothing
    /// is written.
    pub fn sentence_vector_into(&self, query: &str, out: &mut [f32]) -> Result<(), HandleError> {
        let vector = self.sentence_vector(query)?;
        if vector.len() != out.len() {
            return Err(HandleError::DimensionMismatch {
                expected: vector.len(),
                actual: out.len(),
            });
        }
        out.copy_from_slice(&vector);
        Ok(())
    }

    fn with_model<T>(
        &self,
        f: impl FnOnce(&B::Model) -> Result<T, HandleError>,
    ) -> Result<T, HandleError> {
        let slot = self.model.read().map_err(|_| HandleError::LockPoisoned)?;
        let model = slot.as_ref().ok_or(HandleError::NotLoaded)?;
        f(model)
    }
}

/// Appends the line terminator the model's line-based tokenizer expects.
pub fn normalize_query(query: &str) -> Cow<'_, str> {
    if query.ends_with('\n') {
        Cow::Borrowed(query)
    } else {
        Cow::Owned(format!("{}\n", query))
    }
}
