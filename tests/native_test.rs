#![cfg(feature = "fasttext")]

use std::fs;

use ftbridge::cli;
use ftbridge::engine::FastTextBackend;
use ftbridge::{ModelHandle, ModelKind};
use tempfile::TempDir;

const CORPUS: &str = "__label__tech rust code compiler borrow checker\n\
__label__tech cargo crate build code\n\
__label__sports ball goal match referee\n\
__label__sports team score goal ball\n";

#[test]
fn test_train_load_and_query_native_model() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("train.txt");
    fs::write(&input, CORPUS.repeat(20))?;
    let output = dir.path().join("model");

    let outcome = cli::train(
        ModelKind::Supervised,
        &[
            "-input", input.to_str().unwrap(),
            "-output", output.to_str().unwrap(),
            "-dim", "10",
            "-epoch", "5",
            "-thread", "1",
            "-verbose", "0",
        ]
        .map(String::from),
        &FastTextBackend,
    )?;
    assert!(outcome.model.exists());
    assert!(outcome.vectors.exists());

    let handle = ModelHandle::new(FastTextBackend);
    handle.load(&outcome.model)?;
    assert_eq!(handle.dimension(), Some(10));

    let bare = handle.predict("rust code")?;
    let terminated = handle.predict("rust code\n")?;
    assert_eq!(bare, terminated);
    assert!(bare.label.starts_with("__label__"));

    let mut vector = [0.0f32; 10];
    handle.sentence_vector_into("rust code", &mut vector)?;
    assert!(vector.iter().all(|v| v.is_finite()));
    Ok(())
}
