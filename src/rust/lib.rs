//! A C-linkage bridge and command-line shim over fastText models.
//!
//! The library exposes four operations on one process-wide model through a
//! flat C ABI (see [`ffi`]): load, top-1 prediction, dimension query and
//! sentence vectors. The same operations are available to Rust callers as an
//! explicit [`ModelHandle`] value.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ftbridge::{DefaultBackend, ModelHandle};
//!
//! let handle = ModelHandle::new(DefaultBackend::default());
//! handle.load("model.bin")?;
//!
//! let prediction = handle.predict("Which baking dish is best to bake a banana bread?")?;
//! println!("{} ({:.2})", prediction.label, prediction.probability);
//!
//! let mut vector = vec![0.0f32; handle.dimension().unwrap_or(0)];
//! handle.sentence_vector_into("banana bread", &mut vector)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! Numeric work is delegated to a [`Backend`]. With the `fasttext` feature the
//! default backend links the native fastText library; without it every load
//! fails cleanly with [`EngineError::Unavailable`].
//!
//! # Thread Safety
//!
//! [`ModelHandle`] guards its one-time load with a lock, so it can be shared
//! across threads with `Arc` or used as a `static`.

pub mod autotune;
pub mod cli;
pub mod engine;
pub mod ffi;
mod handle;

pub use autotune::{Autotuner, AutotuneError};
pub use engine::{
    Backend, DefaultBackend, Engine, EngineError, Meter, ModelKind, Prediction, TrainConfig,
    UnavailableBackend,
};
pub use handle::{normalize_query, HandleError, LoadStatus, ModelHandle};

/// Installs `env_logger`, filtered by `RUST_LOG`.
pub fn init_logger() {
    env_logger::init();
}
