//! End-to-end search over the tantivy store

use serde_json::json;
use skill_search::search::*;
use std::sync::Arc;
use tempfile::TempDir;

/// Store with every index of both views created
async fn create_test_store() -> (TempDir, Arc<TantivyStore>) {
    let temp_dir = TempDir::new().unwrap();
    let config = SearchConfig {
        index_path: temp_dir.path().to_path_buf(),
        writer_heap_size: 15_000_000,
        realtime_indexing: true,
        ..Default::default()
    };
    let store = Arc::new(TantivyStore::open(config).unwrap());

    let bootstrap = IndexBootstrap::new(store.clone());
    bootstrap.ensure_view(IndexView::Published).await.unwrap();
    bootstrap.ensure_view(IndexView::Admin).await.unwrap();

    (temp_dir, store)
}

fn engine(store: &Arc<TantivyStore>, view: IndexView) -> SearchEngine {
    SearchEngine::for_store(store.clone(), view, &SearchConfig::default())
}

async fn put(store: &TantivyStore, biz: Biz, view: IndexView, id: i64, doc: serde_json::Value) {
    store
        .index_document(biz.index_name(view), &id.to_string(), &doc.to_string())
        .await
        .unwrap();
}

fn ids<T>(records: &[T], id: impl Fn(&T) -> i64) -> Vec<i64> {
    records.iter().map(id).collect()
}

#[tokio::test]
async fn test_title_match_outranks_body_match() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Case, published, 1, json!({
        "id": 1,
        "title": "Consumer group internals",
        "content": "Why a kafka rebalance pauses every partition",
        "status": 2
    }))
    .await;
    put(&store, Biz::Case, published, 2, json!({
        "id": 2,
        "title": "Kafka rebalance",
        "content": "Walkthrough of the protocol",
        "status": 2
    }))
    .await;

    let result = engine(&store, published).search("biz:case:kafka").await.unwrap();
    assert_eq!(ids(&result.cases, |c| c.id), vec![2, 1]);
    assert!(result.questions.is_empty());
}

#[tokio::test]
async fn test_published_view_hides_drafts() {
    let (_dir, store) = create_test_store().await;

    for view in [IndexView::Published, IndexView::Admin] {
        put(&store, Biz::Case, view, 1, json!({"id": 1, "title": "Raft leader election", "status": 2})).await;
        put(&store, Biz::Case, view, 2, json!({"id": 2, "title": "Raft log compaction", "status": 1})).await;
        put(&store, Biz::Question, view, 3, json!({"id": 3, "title": "Explain raft", "status": 1})).await;
    }

    let published = engine(&store, IndexView::Published)
        .search("biz:all:raft")
        .await
        .unwrap();
    assert_eq!(ids(&published.cases, |c| c.id), vec![1]);
    assert!(published.questions.is_empty());

    let admin = engine(&store, IndexView::Admin).search("biz:all:raft").await.unwrap();
    let mut admin_cases = ids(&admin.cases, |c| c.id);
    admin_cases.sort();
    assert_eq!(admin_cases, vec![1, 2]);
    assert_eq!(ids(&admin.questions, |q| q.id), vec![3]);
}

#[tokio::test]
async fn test_entities_without_status_are_always_visible() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Skill, published, 5, json!({
        "id": 5,
        "name": "Distributed consensus",
        "basic": {"id": 51, "desc": "paxos basics"}
    }))
    .await;
    put(&store, Biz::QuestionSet, published, 6, json!({
        "id": 6,
        "title": "Paxos drill",
        "questions": [1, 2, 3]
    }))
    .await;

    let result = engine(&store, published).search("biz:all:paxos").await.unwrap();
    assert_eq!(ids(&result.skills, |s| s.id), vec![5]);
    assert_eq!(result.skills[0].basic.id, 51);
    assert_eq!(ids(&result.question_sets, |s| s.id), vec![6]);
    assert_eq!(result.question_sets[0].questions, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_labels_match_exact_terms_only() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Case, published, 1, json!({
        "id": 1,
        "title": "Index tuning",
        "labels": ["MySQL", "InnoDB"],
        "status": 2
    }))
    .await;

    let engine = engine(&store, published);
    let exact = engine.search("biz:case:MySQL").await.unwrap();
    assert_eq!(ids(&exact.cases, |c| c.id), vec![1]);
    assert_eq!(exact.cases[0].labels, vec!["MySQL", "InnoDB"]);

    let folded = engine.search("biz:case:mysql").await.unwrap();
    assert!(folded.cases.is_empty());
}

#[tokio::test]
async fn test_nested_answer_fields_are_searchable() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Question, published, 9, json!({
        "id": 9,
        "title": "Consistency models",
        "status": 2,
        "answer": {
            "advanced": {"id": 94, "content": "Linearizability versus sequential consistency"}
        }
    }))
    .await;

    let result = engine(&store, published)
        .search("biz:question:linearizability")
        .await
        .unwrap();
    assert_eq!(ids(&result.questions, |q| q.id), vec![9]);
    let advanced = &result.questions[0].answer.advanced;
    assert_eq!(advanced.id, 94);
    assert!(advanced.content.is_highlighted());
    assert!(!result.questions[0].title.is_highlighted());
}

#[tokio::test]
async fn test_highlight_wraps_matched_terms() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Case, published, 1, json!({
        "id": 1,
        "title": "Redis cache penetration",
        "guidance": "Start from the bloom filter",
        "status": 2
    }))
    .await;

    let result = engine(&store, published).search("biz:case:redis").await.unwrap();
    let case = &result.cases[0];
    assert_eq!(case.title.value, "Redis cache penetration");
    assert!(case.title.highlight_fragments[0].contains("<b>Redis</b>"));
    assert!(!case.guidance.is_highlighted());
}

#[tokio::test]
async fn test_highlighting_can_be_disabled() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    put(&store, Biz::Case, published, 1, json!({"id": 1, "title": "Redis", "status": 2})).await;

    let config = SearchConfig {
        enable_highlighting: false,
        ..Default::default()
    };
    let engine = SearchEngine::for_store(store.clone(), published, &config);
    let result = engine.search("biz:case:redis").await.unwrap();
    assert_eq!(result.cases.len(), 1);
    assert!(!result.cases[0].title.is_highlighted());
}

#[tokio::test]
async fn test_pagination_is_applied_per_entity() {
    let (_dir, store) = create_test_store().await;
    let published = IndexView::Published;

    for id in 1..=5 {
        put(&store, Biz::QuestionSet, published, id, json!({"id": id, "title": format!("golang set {id}")})).await;
        put(&store, Biz::Skill, published, id, json!({"id": id, "name": format!("golang {id}")})).await;
    }

    let engine = engine(&store, published);
    let first = engine.search_page("biz:all:golang", Page::new(0, 2)).await.unwrap();
    assert_eq!(first.question_sets.len(), 2);
    assert_eq!(first.skills.len(), 2);

    let last = engine.search_page("biz:all:golang", Page::new(4, 2)).await.unwrap();
    assert_eq!(last.question_sets.len(), 1);
    assert_eq!(last.skills.len(), 1);

    let empty = engine.search_page("biz:all:golang", Page::new(0, 0)).await.unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_blank_keywords_match_nothing() {
    let (_dir, store) = create_test_store().await;
    put(&store, Biz::Skill, IndexView::Published, 1, json!({"id": 1, "name": "golang"})).await;

    let engine = engine(&store, IndexView::Published);
    assert!(engine.search("biz:all:").await.unwrap().is_empty());
    assert!(engine.search("biz:skill:   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reindex_replaces_document() {
    let (_dir, store) = create_test_store().await;
    let index = Biz::Case.index_name(IndexView::Published);

    put(&store, Biz::Case, IndexView::Published, 1, json!({"id": 1, "title": "Old title", "status": 2})).await;
    put(&store, Biz::Case, IndexView::Published, 1, json!({"id": 1, "title": "Sharding strategies", "status": 2})).await;

    assert_eq!(store.count(index).await.unwrap(), 1);

    let engine = engine(&store, IndexView::Published);
    assert!(engine.search("biz:case:old").await.unwrap().cases.is_empty());
    assert_eq!(engine.search("biz:case:sharding").await.unwrap().cases.len(), 1);
}

#[tokio::test]
async fn test_invalid_document_is_rejected() {
    let (_dir, store) = create_test_store().await;
    let index = Biz::Case.index_name(IndexView::Published);

    let not_json = store.index_document(index, "1", "{not json").await;
    assert!(matches!(not_json, Err(SearchError::InvalidDocument { .. })));

    let bad_status = store
        .index_document(index, "1", r#"{"id": 1, "status": "published"}"#)
        .await;
    assert!(matches!(bad_status, Err(SearchError::InvalidDocument { .. })));

    assert_eq!(store.count(index).await.unwrap(), 0);
}

#[tokio::test]
async fn test_unknown_index_is_not_found() {
    let (_dir, store) = create_test_store().await;
    let err = store
        .index_document("roadmap_index", "1", "{}")
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::IndexNotFound(_)));
}

#[tokio::test]
async fn test_indices_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = SearchConfig {
        index_path: temp_dir.path().to_path_buf(),
        writer_heap_size: 15_000_000,
        ..Default::default()
    };
    let index = Biz::Skill.index_name(IndexView::Admin);

    {
        let store = Arc::new(TantivyStore::open(config.clone()).unwrap());
        IndexBootstrap::new(store.clone())
            .ensure_view(IndexView::Admin)
            .await
            .unwrap();
        store
            .index_document(index, "1", r#"{"id": 1, "name": "tokio"}"#)
            .await
            .unwrap();
        store.commit_all().await.unwrap();
    }

    let store = Arc::new(TantivyStore::open(config).unwrap());
    assert!(store.index_exists(index).await.unwrap());
    assert_eq!(store.count(index).await.unwrap(), 1);

    // Bootstrap finds the existing indices and leaves them alone
    IndexBootstrap::new(store.clone())
        .ensure_view(IndexView::Admin)
        .await
        .unwrap();
    let result = engine(&store, IndexView::Admin).search("biz:skill:tokio").await.unwrap();
    assert_eq!(result.skills.len(), 1);
}

#[tokio::test]
async fn test_deep_pages_are_rejected_before_searching() {
    let (_dir, store) = create_test_store().await;
    put(&store, Biz::Case, IndexView::Published, 1, json!({
        "id": 1,
        "title": "Redis persistence",
        "status": 2
    }))
    .await;
    let engine = engine(&store, IndexView::Published);

    for page in [Page::new(1_000_000_000_000, 20), Page::new(usize::MAX - 5, 20)] {
        let err = engine.search_page("biz:case:redis", page).await.unwrap_err();
        assert!(matches!(err, SearchError::ResultWindowExceeded { .. }));
        assert!(err.is_client_error());
    }

    // The store enforces the window for callers that bypass the engine
    let query = QueryBuilder::new(CaseRecord::FIELDS, "redis")
        .with_page(Page::new(1_000_000_000_000, 20))
        .build();
    let err = store
        .search(Biz::Case.index_name(IndexView::Published), &query)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::ResultWindowExceeded { window: 10_000, .. }));

    // The last page inside the window is still served
    let result = engine
        .search_page("biz:case:redis", Page::new(9_980, 20))
        .await
        .unwrap();
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_buffered_writes_become_searchable_on_commit_interval() {
    let temp_dir = TempDir::new().unwrap();
    let config = SearchConfig {
        index_path: temp_dir.path().to_path_buf(),
        writer_heap_size: 15_000_000,
        realtime_indexing: false,
        commit_interval_secs: 1,
        ..Default::default()
    };
    let store = Arc::new(TantivyStore::open(config.clone()).unwrap());
    IndexBootstrap::new(store.clone())
        .ensure_view(IndexView::Published)
        .await
        .unwrap();
    let committer = store.start_committer().expect("buffered mode starts a committer");

    put(&store, Biz::Case, IndexView::Published, 1, json!({
        "id": 1,
        "title": "Redis failover",
        "status": 2
    }))
    .await;
    let engine = SearchEngine::for_store(store.clone(), IndexView::Published, &config);

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        let result = engine.search("biz:case:redis").await.unwrap();
        if result.cases.len() == 1 {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "write never became searchable");
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    committer.stop().await;
}

#[tokio::test]
async fn test_realtime_store_has_no_committer() {
    let (_dir, store) = create_test_store().await;
    assert!(store.start_committer().is_none());
}
