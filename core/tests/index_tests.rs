use lemma_core::{
    BuildOutcome, Document, DocumentSource, DocumentStore, IndexBuilder, IndexError, IndexStore, LemmatizeError,
    NormalizationPipeline, QueryEngine, ReindexPolicy,
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

fn setup(pipeline: NormalizationPipeline) -> (Arc<IndexStore>, IndexBuilder, QueryEngine) {
    let store = Arc::new(IndexStore::temporary().unwrap());
    let builder = IndexBuilder::new(Arc::clone(&store), pipeline.clone());
    let engine = QueryEngine::new(Arc::clone(&store), pipeline);
    (store, builder, engine)
}

/// Dictionary lemmatizer: unknown words come back unchanged.
fn dictionary(pairs: &[(&str, &str)]) -> NormalizationPipeline {
    let map: HashMap<String, String> = pairs.iter().map(|(w, l)| (w.to_string(), l.to_string())).collect();
    let lemmatize = move |w: &str| -> Result<String, LemmatizeError> { Ok(map.get(w).cloned().unwrap_or_else(|| w.to_string())) };
    NormalizationPipeline::new(Arc::new(lemmatize))
}

#[test]
fn elephant_photo_scenario() {
    let (_store, builder, engine) = setup(NormalizationPipeline::default());
    let outcome = builder
        .build_index(vec![Document::new(1, "Фотография слона", "слона видели в Африке")])
        .unwrap();
    assert_eq!(outcome, BuildOutcome::Indexed { documents: 1, postings: 5 });
    assert_eq!(engine.search(&["слон"]).unwrap(), vec![(1, 2)]);
}

#[test]
fn cross_document_ranking() {
    let pipeline = dictionary(&[("тестовыми", "тест"), ("тесты", "тест"), ("тест", "тест")]);
    let (_store, builder, engine) = setup(pipeline);
    builder
        .build_index(vec![
            Document::new(2, "Архив", "тест"),
            Document::new(1, "Тесты", "архив с тестовыми заданиями"),
        ])
        .unwrap();
    assert_eq!(engine.search(&["тест"]).unwrap(), vec![(1, 2), (2, 1)]);
    assert_eq!(engine.search(&["тесты"]).unwrap(), engine.search(&["тест"]).unwrap());
}

#[test]
fn query_words_are_normalized_like_documents() {
    let pipeline = dictionary(&[("фотографии", "фотография")]);
    let (_store, builder, engine) = setup(pipeline);
    builder.build_index(vec![Document::new(4, "Фотографии", "старые фотографии")]).unwrap();
    assert_eq!(engine.search(&["Фотография"]).unwrap(), vec![(4, 2)]);
    assert_eq!(engine.search(&["ФОТОГРАФИИ"]).unwrap(), vec![(4, 2)]);
}

#[test]
fn multi_term_counts_are_summed() {
    let (_store, builder, engine) = setup(NormalizationPipeline::default());
    builder
        .build_index(vec![
            Document::new(1, "Фотография слона", "Фотография слона в Африке летом 2019 года."),
            Document::new(5, "key_2020", "ключи для айдеи за 20 год"),
        ])
        .unwrap();
    // "2019" and "key_2020" are not alphabetic and pass through verbatim.
    assert_eq!(engine.search(&["слон", "2019"]).unwrap(), vec![(1, 3)]);
    assert_eq!(engine.search(&["key_2020"]).unwrap(), vec![(5, 1)]);
    assert!(engine.search(&["дятел"]).unwrap().is_empty());
}

#[test]
fn builds_from_the_document_store() {
    let docs = DocumentStore::temporary().unwrap();
    docs.insert("дятел", "дятел вуди для комикса", Some("/home/wudi.png")).unwrap();
    docs.insert("текст faint", "Linkin Park - Faint", Some("/home/faint.txt")).unwrap();
    let (store, builder, engine) = setup(NormalizationPipeline::default());
    let outcome = builder.build_from(&docs).unwrap();
    assert!(matches!(outcome, BuildOutcome::Indexed { documents: 2, .. }));
    assert_eq!(engine.search(&["faint"]).unwrap(), vec![(2, 2)]);
    assert_eq!(engine.search(&["дятел"]).unwrap(), vec![(1, 2)]);
    assert_eq!(store.stats().documents, 2);
    assert_eq!(store.build_info().unwrap().map(|i| i.documents), Some(2));
}

#[test]
fn empty_document_store_is_reported() {
    let docs = DocumentStore::temporary().unwrap();
    let (store, builder, _engine) = setup(NormalizationPipeline::default());
    assert_eq!(builder.build_from(&docs).unwrap(), BuildOutcome::Empty);
    assert_eq!(store.stats().postings, 0);
}

#[test]
fn index_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.db");
    {
        let store = Arc::new(IndexStore::open_path(&path).unwrap());
        IndexBuilder::new(Arc::clone(&store), NormalizationPipeline::default())
            .with_policy(ReindexPolicy::Reject)
            .build_index(vec![Document::new(3, "Слон", "слон")])
            .unwrap();
    }
    let store = Arc::new(IndexStore::open_path(&path).unwrap());
    store.ensure_schema().unwrap();
    let engine = QueryEngine::new(Arc::clone(&store), NormalizationPipeline::default());
    assert_eq!(engine.search(&["слона"]).unwrap(), vec![(3, 2)]);
    let next = store.intern_terms(&["новый".to_string()].into_iter().collect()).unwrap();
    assert_eq!(next["новый"], 2);
}

#[test]
fn vec_is_a_document_source() {
    let docs = vec![Document::new(1, "a", "b")];
    assert_eq!(docs.list_documents().unwrap(), docs);
}

#[test]
fn unusable_index_path_fails_schema_initialization() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("not_a_dir");
    std::fs::write(&path, b"plain file").unwrap();
    let err = IndexStore::open_path(&path).unwrap_err();
    assert!(matches!(err, IndexError::SchemaInitialization { .. }), "got {err:?}");
    let err = DocumentStore::open_path(&path).unwrap_err();
    assert!(matches!(err, IndexError::SchemaInitialization { .. }), "got {err:?}");
}
