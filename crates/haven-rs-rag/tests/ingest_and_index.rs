use haven_rs_rag::{
    ChunkingParams, DocumentIngestor, Embedder, HashingEmbedder, IndexError, IngestOptions,
    VectorIndex,
};
use haven_rs_test_utils::{CALMING_TEXT, seed_support_corpus};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn text_ingestor(chunk_size: usize, chunk_overlap: usize) -> DocumentIngestor {
    DocumentIngestor::new(IngestOptions {
        extensions: vec!["txt".to_string()],
        recursive: false,
        chunk_size,
        chunk_overlap,
    })
    .expect("ingestor")
}

#[tokio::test]
async fn corpus_round_trips_through_build_and_load() {
    let temp = TempDir::new().expect("tmp");
    let data = temp.path().join("data");
    fs::create_dir_all(&data).expect("data");
    fs::write(
        data.join("coping.txt"),
        "Breathing exercises can help reduce anxiety.\n\nTry breathing in for four counts and out for six.",
    )
    .expect("write");
    fs::write(
        data.join("sleep.txt"),
        "Keeping a regular sleep schedule supports mood.",
    )
    .expect("write");

    let ingestor = text_ingestor(60, 10);
    let chunks = ingestor.ingest(&data).expect("chunks");
    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|chunk| chunk.text.chars().count() <= 60));

    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(256));
    let location = temp.path().join("index");
    let built = VectorIndex::build_with_chunking(
        chunks.clone(),
        embedder.clone(),
        &location,
        Some(ChunkingParams {
            chunk_size: 60,
            chunk_overlap: 10,
        }),
    )
    .await
    .expect("build");
    let loaded = VectorIndex::load(&location, embedder).expect("load");

    assert_eq!(loaded.len(), chunks.len());
    assert_eq!(
        loaded.manifest().chunking,
        Some(ChunkingParams {
            chunk_size: 60,
            chunk_overlap: 10
        })
    );

    let question = "what sleep schedule supports mood";
    let before = built.query(question, 2).await.expect("query");
    let after = loaded.query(question, 2).await.expect("query");
    assert_eq!(before, after);
    assert!(after[0].chunk.metadata.source.ends_with("sleep.txt"));
}

#[tokio::test]
async fn rebuilding_the_same_corpus_yields_the_same_ids() {
    let temp = TempDir::new().expect("tmp");
    fs::write(temp.path().join("a.txt"), "Grounding: name five things you see.").expect("write");
    let ingestor = text_ingestor(500, 50);
    let first: Vec<_> = ingestor
        .ingest(temp.path())
        .expect("chunks")
        .into_iter()
        .map(|chunk| chunk.id)
        .collect();
    let second: Vec<_> = ingestor
        .ingest(temp.path())
        .expect("chunks")
        .into_iter()
        .map(|chunk| chunk.id)
        .collect();
    assert_eq!(first, second);
}

#[tokio::test]
async fn query_before_build_has_nothing_to_load() {
    let temp = TempDir::new().expect("tmp");
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new(32));
    let err = VectorIndex::load(&temp.path().join("missing"), embedder).unwrap_err();
    assert!(matches!(err, IndexError::NotFound(_)));
}

fn markdown_ingestor() -> DocumentIngestor {
    DocumentIngestor::new(IngestOptions {
        extensions: vec!["md".to_string()],
        recursive: false,
        chunk_size: 500,
        chunk_overlap: 50,
    })
    .expect("ingestor")
}

#[test]
fn support_corpus_has_more_chunks_than_the_default_k() {
    let temp = TempDir::new().expect("tmp");
    seed_support_corpus(temp.path()).expect("corpus");
    let chunks = markdown_ingestor().ingest(temp.path()).expect("chunks");
    assert_eq!(chunks.len(), 7);
    assert!(chunks.iter().any(|chunk| chunk.text == CALMING_TEXT));
}

/// "How can I calm down?" shares no words with the breathing passage, so this
/// needs a semantic model. Export all-MiniLM-L6-v2 and point
/// `HAVEN_ONNX_MODEL_DIR` at it.
#[cfg(feature = "onnx")]
#[tokio::test]
#[ignore]
async fn calm_down_question_retrieves_the_breathing_passage() {
    let model_dir = std::env::var("HAVEN_ONNX_MODEL_DIR").expect("HAVEN_ONNX_MODEL_DIR");
    let temp = TempDir::new().expect("tmp");
    let corpus = temp.path().join("corpus");
    seed_support_corpus(&corpus).expect("corpus");
    let chunks = markdown_ingestor().ingest(&corpus).expect("chunks");

    let embedder: Arc<dyn Embedder> = Arc::new(
        haven_rs_rag::OnnxEmbedder::from_dir(
            &model_dir,
            "sentence-transformers/all-MiniLM-L6-v2",
            384,
        )
        .expect("embedder"),
    );
    let index = VectorIndex::build(chunks, embedder, &temp.path().join("index"))
        .await
        .expect("build");
    assert!(index.len() > 3);

    let retrieved = index.query("How can I calm down?", 3).await.expect("query");
    assert_eq!(retrieved.len(), 3);
    assert!(
        retrieved.iter().any(|hit| hit.chunk.text == CALMING_TEXT),
        "top 3: {:?}",
        retrieved.iter().map(|hit| &hit.chunk.text).collect::<Vec<_>>()
    );
}
