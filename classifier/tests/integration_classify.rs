use classifier::{Classifier, Evaluation};
use indexer::Indexer;
use std::fs;
use tempfile::tempdir;
use textcat_core::{
    ClassDir, IndexConfig, IndexError, Language, MemoryStore, Normalizer, RecordKey, StorageBackend, Store,
    TrainingClass, WeightParams,
};

fn english() -> Normalizer {
    Normalizer::new(Language::English)
}

fn train(corpus: Vec<TrainingClass>, train_size: usize) -> MemoryStore {
    let store = MemoryStore::new();
    let mut indexer = Indexer::new(store.clone(), WeightParams { train_size, champion_size: 5 }, english());
    indexer.rebuild(&corpus).unwrap();
    store
}

fn class(label: &str, docs: &[&str]) -> TrainingClass {
    TrainingClass { label: label.into(), documents: docs.iter().map(|d| d.to_string()).collect() }
}

/// Class 1 leans on alpha (1-1 has it at positions 1 and 3), class 2 on beta.
fn alpha_beta_store() -> MemoryStore {
    train(vec![class("1", &["alpha the alpha", "the beta"]), class("2", &["beta beta", "gamma"])], 3)
}

#[test]
fn alpha_query_prefers_alpha_class() {
    let classifier = Classifier::open(alpha_beta_store()).unwrap();
    let dict = classifier.dictionary();
    assert_eq!(dict.document_frequency("alpha").unwrap(), 1);
    assert_eq!(dict.term_frequency("alpha", "1-1").unwrap(), 2);

    let result = classifier.classify("alpha alpha").unwrap();
    assert_eq!(result.best, vec!["1"]);
    let score = |label: &str| result.scores.iter().find(|(l, _)| l == label).unwrap().1;
    assert!(score("1") > score("2"));

    let result = classifier.classify("beta beta").unwrap();
    assert_eq!(result.best, vec!["2"]);
}

#[test]
fn scores_are_cosines() {
    let classifier = Classifier::open(alpha_beta_store()).unwrap();
    let result = classifier.classify("alpha beta gamma").unwrap();
    for (_, score) in &result.scores {
        assert!((0.0..=1.0).contains(score));
    }
}

#[test]
fn classifying_does_not_touch_the_index() {
    let store = alpha_beta_store();
    let records = store.len();
    let classifier = Classifier::open(store.clone()).unwrap();
    classifier.classify("alpha omega omega").unwrap();

    assert_eq!(store.len(), records);
    assert_eq!(classifier.dictionary().document_frequency("omega").unwrap(), 0);
}

#[test]
fn equal_scores_return_every_label() {
    let store = train(vec![class("1", &["alpha beta"]), class("2", &["alpha gamma"])], 4);
    let classifier = Classifier::open(store).unwrap();

    let result = classifier.classify("alpha").unwrap();
    assert_eq!(result.best, vec!["1", "2"]);
    assert_eq!(result.scores[0].1, result.scores[1].1);
    assert!(result.scores[0].1 > 0.0);

    let eval = classifier.evaluate(vec![("2".to_string(), "alpha".to_string())]);
    assert_eq!(eval.correct, 1);
}

#[test]
fn unknown_words_tie_every_class_at_zero() {
    let classifier = Classifier::open(alpha_beta_store()).unwrap();
    let result = classifier.classify("omega").unwrap();
    assert_eq!(result.best, vec!["1", "2"]);
    assert!(result.scores.iter().all(|(_, s)| *s == 0.0));
}

#[test]
fn evaluation_counts_hits_and_misses() {
    let classifier = Classifier::open(alpha_beta_store()).unwrap();
    let eval = classifier.evaluate(vec![
        ("1".to_string(), "alpha alpha".to_string()),
        ("2".to_string(), "beta beta".to_string()),
        ("2".to_string(), "alpha".to_string()),
    ]);
    assert_eq!(eval, Evaluation { correct: 2, incorrect: 1, failed: 0 });
    assert!((eval.accuracy() - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn broken_centroid_fails_documents_without_stopping() {
    let store = alpha_beta_store();
    store.put(&RecordKey::Centroid("2".into()), b"{\"gam").unwrap();
    let classifier = Classifier::open(store).unwrap();

    assert!(matches!(classifier.classify("alpha"), Err(IndexError::Store(e)) if e.is_decode()));
    let eval = classifier.evaluate(vec![("1".to_string(), "alpha".to_string()), ("2".to_string(), "gamma".to_string())]);
    assert_eq!(eval, Evaluation { correct: 0, incorrect: 0, failed: 2 });
    assert_eq!(eval.accuracy(), 0.0);
}

#[test]
fn queries_use_the_trained_normalizer() {
    let store = train(vec![class("1", &["running runners"]), class("2", &["matrices"])], 2);
    let classifier = Classifier::open(store.clone()).unwrap();
    assert_eq!(classifier.normalizer().language(), Language::English);
    assert_eq!(classifier.classify("Running").unwrap().best, vec!["1"]);

    let err = Classifier::open_with(store.clone(), Normalizer::new(Language::Persian)).err().unwrap();
    assert!(matches!(
        err,
        IndexError::NormalizerMismatch { trained: Language::English, given: Language::Persian }
    ));
    assert!(Classifier::open_with(store, english()).is_ok());
}

#[test]
fn negative_query_weights_count_toward_the_norm() {
    // "common" sits in 3 documents with train_size 2, so its weight is ln(2/3) < 0
    let store = train(vec![class("1", &["common alpha", "common"]), class("2", &["common beta"])], 2);
    let classifier = Classifier::open(store).unwrap();
    let query = classifier.query_vector("alpha common").unwrap();
    assert!(query["common"] < 0.0);
    assert!(query["alpha"] > 0.0);

    let result = classifier.classify("alpha common").unwrap();
    assert_eq!(result.best, vec!["1"]);
    let expected = query["alpha"] / (query["alpha"].powi(2) + query["common"].powi(2)).sqrt();
    assert!((result.scores[0].1 - expected).abs() < 1e-12);
}

#[test]
fn untrained_index_is_reported() {
    let err = Classifier::open(MemoryStore::new()).err().unwrap();
    assert!(matches!(err, IndexError::NotBuilt(_)));
}

#[test]
fn file_backed_train_and_evaluate() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let docs = [
        ("train/math", ["integral of the function", "matrix and integral"]),
        ("train/history", ["the empire fell", "an empire and its dynasty"]),
        ("test/math", ["an integral", "the matrix"]),
        ("test/history", ["dynasty", "empire"]),
    ];
    for (dir, texts) in docs {
        let path = data.path().join(dir);
        fs::create_dir_all(&path).unwrap();
        for (i, text) in texts.iter().enumerate() {
            fs::write(path.join(format!("doc{i}.txt")), text).unwrap();
        }
    }
    let config = IndexConfig {
        storage_root: out.path().to_path_buf(),
        storage_backend: StorageBackend::Files,
        dataset_root: data.path().to_path_buf(),
        classes: vec![ClassDir::new("math", "math"), ClassDir::new("history", "history")],
        // larger than the two documents per class, so shared terms keep a positive weight
        train_size_per_class: 3,
        champion_size: 5,
        language: Language::English,
        stopwords_path: None,
    };
    indexer::train(&config).unwrap();

    // the trained language wins over a config that forgot it
    let persian = IndexConfig { language: Language::Persian, ..config.clone() };
    let classifier = classifier::open_from_config(&persian).unwrap();
    assert_eq!(classifier.normalizer().language(), Language::English);
    assert_eq!(classifier.labels(), &["math".to_string(), "history".to_string()]);
    assert_eq!(classifier.classify("integral").unwrap().best, vec!["math"]);

    let eval = classifier::evaluate_dataset(&classifier, &config).unwrap();
    assert_eq!(eval, Evaluation { correct: 4, incorrect: 0, failed: 0 });
}
