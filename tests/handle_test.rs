mod common;

use std::sync::Arc;
use std::thread;

use common::{write_file, KeywordBackend, SPORTS_TECH_MODEL};
use ftbridge::{HandleError, LoadStatus, ModelHandle};
use tempfile::TempDir;

fn loaded_handle() -> (TempDir, KeywordBackend, ModelHandle<KeywordBackend>) {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "model.bin", SPORTS_TECH_MODEL);
    let backend = KeywordBackend::default();
    let handle = ModelHandle::new(backend.clone());
    assert_eq!(handle.load(&path).unwrap(), LoadStatus::Loaded);
    (dir, backend, handle)
}

#[test]
fn test_repeated_load_is_a_noop() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let first = write_file(dir.path(), "first.bin", SPORTS_TECH_MODEL);
    let second = write_file(dir.path(), "second.bin", "dim 8\n__label__other thing\n");
    let backend = KeywordBackend::default();
    let handle = ModelHandle::new(backend.clone());

    assert_eq!(handle.load(&first)?, LoadStatus::Loaded);
    assert_eq!(handle.load(&first)?, LoadStatus::AlreadyLoaded);
    assert_eq!(handle.load(&second)?, LoadStatus::AlreadyLoaded);
    assert_eq!(backend.load_count(), 1);
    assert_eq!(handle.dimension(), Some(4));
    Ok(())
}

#[test]
fn test_missing_file_leaves_handle_unloaded() {
    let backend = KeywordBackend::default();
    let handle = ModelHandle::new(backend.clone());

    let result = handle.load("/nonexistent/ftbridge/model.bin");
    assert!(matches!(result, Err(HandleError::ModelNotFound(_))));
    assert!(!handle.is_loaded());
    assert_eq!(handle.dimension(), None);
    assert_eq!(backend.load_count(), 0);
}

#[test]
fn test_corrupt_model_can_be_retried() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let broken = write_file(dir.path(), "broken.bin", "not a model\n");
    let good = write_file(dir.path(), "good.bin", SPORTS_TECH_MODEL);
    let handle = ModelHandle::new(KeywordBackend::default());

    assert!(matches!(handle.load(&broken), Err(HandleError::Engine(_))));
    assert!(!handle.is_loaded());
    assert_eq!(handle.load(&good)?, LoadStatus::Loaded);
    Ok(())
}

#[test]
fn test_dimension_after_load() {
    let (_dir, _backend, handle) = loaded_handle();
    assert!(handle.is_loaded());
    assert_eq!(handle.dimension(), Some(4));
}

#[test]
fn test_predict_top_label() -> Result<(), HandleError> {
    let (_dir, _backend, handle) = loaded_handle();
    let prediction = handle.predict("I write rust code")?;
    assert_eq!(prediction.label, "__label__tech");
    assert!((prediction.probability - 0.75).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_queries_reach_model_newline_terminated() -> Result<(), HandleError> {
    let (_dir, backend, handle) = loaded_handle();

    handle.predict("hello")?;
    handle.predict("hello\n")?;
    handle.sentence_vector("hello")?;
    handle.sentence_vector("hello\n")?;

    assert_eq!(backend.queries(), vec!["hello\n"; 4]);
    Ok(())
}

#[test]
fn test_predict_without_words_fails() {
    let (_dir, _backend, handle) = loaded_handle();
    assert!(matches!(handle.predict(""), Err(HandleError::NoPrediction)));
    assert!(matches!(handle.predict("   \t"), Err(HandleError::NoPrediction)));
}

#[test]
fn test_sentence_vector_requires_exact_size() -> Result<(), HandleError> {
    let (_dir, _backend, handle) = loaded_handle();
    let expected = handle.sentence_vector("goal match")?;
    assert_eq!(expected.len(), 4);

    let mut short = [9.0f32; 3];
    assert!(matches!(
        handle.sentence_vector_into("goal match", &mut short),
        Err(HandleError::DimensionMismatch { expected: 4, actual: 3 })
    ));
    assert_eq!(short, [9.0; 3]);

    let mut long = [9.0f32; 5];
    assert!(handle.sentence_vector_into("goal match", &mut long).is_err());
    assert_eq!(long, [9.0; 5]);

    let mut exact = [0.0f32; 4];
    handle.sentence_vector_into("goal match", &mut exact)?;
    assert_eq!(exact.to_vec(), expected);
    assert_eq!(handle.sentence_vector("goal match\n")?, expected);
    Ok(())
}

#[test]
fn test_concurrent_loads_load_once() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "model.bin", SPORTS_TECH_MODEL);
    let backend = KeywordBackend::default();
    let handle = Arc::new(ModelHandle::new(backend.clone()));

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let path = path.clone();
            thread::spawn(move || handle.load(&path).unwrap())
        })
        .collect();
    let statuses: Vec<LoadStatus> = threads.into_iter().map(|t| t.join().unwrap()).collect();

    assert_eq!(statuses.iter().filter(|s| **s == LoadStatus::Loaded).count(), 1);
    assert_eq!(backend.load_count(), 1);
    assert!(handle.predict("ball").is_ok());
}
