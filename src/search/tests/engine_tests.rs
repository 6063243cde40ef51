use super::*;
use crate::cache::dictionary_cache::CacheRegistry;
use crate::dictionary::Dictionary;
use crate::error::JitenError;
use crate::morphology::NormalizationFlags;
use std::io::Write;
use std::path::Path;

async fn open_dictionary(
    cache_root: &Path,
    source_path: &Path,
    contents: &str,
) -> Arc<Dictionary> {
    let mut file = std::fs::File::create(source_path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    let registry = CacheRegistry::new(cache_root, NormalizationFlags::default());
    Arc::new(
        Dictionary::open(source_path, DictionaryKind::Edict, &registry)
            .await
            .unwrap(),
    )
}

fn search(dictionary: &Arc<Dictionary>, query: &str) -> Search {
    Search::new(
        Arc::clone(dictionary),
        query,
        Arc::new(morph()),
        SearchOptions::default(),
    )
}

#[tokio::test]
async fn test_end_to_end_word_restricted_and_unrestricted() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary = open_dictionary(
        tmp.path(),
        &tmp.path().join("words.edict"),
        "cat\tneko\nfeline\tneko",
    )
    .await;

    let restricted = search(&dictionary, "word:cat");
    assert_eq!(restricted.run().await.unwrap(), SearchStatus::Finished);
    let rows = restricted.results().rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].line, 0);

    let unrestricted = search(&dictionary, "neko");
    assert_eq!(unrestricted.run().await.unwrap(), SearchStatus::Finished);
    let lines: Vec<u32> = unrestricted.results().rows().iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![0, 1]);
}

#[tokio::test]
async fn test_start_twice_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary =
        open_dictionary(tmp.path(), &tmp.path().join("d.edict"), "cat\tneko\n").await;
    let search = search(&dictionary, "cat");
    search.start().await.unwrap();
    assert!(matches!(
        search.start().await,
        Err(JitenError::InvalidState(_))
    ));
    search.wait().await;
}

#[tokio::test]
async fn test_bad_query_parks_in_errored() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary =
        open_dictionary(tmp.path(), &tmp.path().join("d.edict"), "cat\tneko\n").await;
    let search = search(&dictionary, "(cat");
    search.start().await.unwrap();
    assert_eq!(search.wait().await, SearchStatus::Errored);
    assert!(matches!(
        search.take_error(),
        Some(JitenError::UnmatchedParenthesis { .. })
    ));
    // Results stay queryable after failure.
    assert!(search.results().is_empty());
}

#[tokio::test]
async fn test_cancellation_before_build_keeps_partial_state() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary =
        open_dictionary(tmp.path(), &tmp.path().join("d.edict"), "cat\tneko\n").await;
    let search = search(&dictionary, "cat");
    // Cancel before the worker ever runs; the build observes the token.
    search.cancel();
    search.start().await.unwrap();
    assert_eq!(search.wait().await, SearchStatus::Cancelled);
    assert!(search.results().is_empty());
}

#[tokio::test]
async fn test_max_results_stops_early() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary = open_dictionary(
        tmp.path(),
        &tmp.path().join("d.edict"),
        "neko []\nneko []\nneko []\n",
    )
    .await;
    let search = Search::new(
        Arc::clone(&dictionary),
        "neko",
        Arc::new(morph()),
        SearchOptions {
            include_filter_columns: false,
            max_results: Some(2),
        },
    );
    assert_eq!(search.run().await.unwrap(), SearchStatus::Finished);
    assert_eq!(search.results().len(), 2);
}

#[tokio::test]
async fn test_second_search_loads_cache_without_rebuild() {
    let tmp = tempfile::tempdir().unwrap();
    let source = tmp.path().join("d.edict");
    let contents = "cat\tneko\nfeline\tneko\n";
    let dictionary = open_dictionary(tmp.path(), &source, contents).await;
    search(&dictionary, "cat").run().await.unwrap();

    // A fresh registry simulates a new process over the same cache dir.
    let registry = CacheRegistry::new(tmp.path(), NormalizationFlags::default());
    let reopened = Arc::new(
        Dictionary::open(&source, DictionaryKind::Edict, &registry)
            .await
            .unwrap(),
    );
    let warm = search(&reopened, "neko");
    assert_eq!(warm.run().await.unwrap(), SearchStatus::Finished);
    assert_eq!(warm.results().len(), 2);
}

#[tokio::test]
async fn test_progress_reaches_completion() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary =
        open_dictionary(tmp.path(), &tmp.path().join("d.edict"), "cat\tneko\n").await;
    let search = search(&dictionary, "cat");
    search.run().await.unwrap();
    let (current, total) = search.progress().totals();
    assert_eq!(current, total);
}

#[tokio::test]
async fn test_match_spans_attached_to_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let dictionary =
        open_dictionary(tmp.path(), &tmp.path().join("d.edict"), "cat\tneko\n").await;
    let search = search(&dictionary, "neko");
    search.run().await.unwrap();
    let rows = search.results().rows();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].matches.spans.is_empty());
}
