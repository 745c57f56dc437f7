//! Fan-out dispatch behaviour of the search engine

mod common;

use common::{MockHandler, MockOutcome};
use skill_search::search::{Biz, EntityHandler, Page, SearchEngine, SearchError};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn engine_with(handlers: &[Arc<MockHandler>]) -> SearchEngine {
    handlers
        .iter()
        .fold(SearchEngine::new(), |engine, handler| engine.register(handler.clone()))
}

fn all_handlers(outcome: MockOutcome) -> Vec<Arc<MockHandler>> {
    [Biz::Case, Biz::Question, Biz::Skill, Biz::QuestionSet]
        .into_iter()
        .map(|biz| MockHandler::new(biz, outcome))
        .collect()
}

#[tokio::test]
async fn test_single_target_calls_only_its_handler() {
    let handlers = all_handlers(MockOutcome::Hits(2));
    let engine = engine_with(&handlers);

    let result = engine.search("biz:skill:tokio runtime").await.unwrap();

    assert_eq!(result.skills.len(), 2);
    assert_eq!(result.total(), 2);
    for handler in &handlers {
        let expected = usize::from(handler.biz() == Biz::Skill);
        assert_eq!(handler.calls(), expected);
    }
    let (keywords, _) = handlers[2].last_call().unwrap();
    assert_eq!(keywords, "tokio runtime");
}

#[tokio::test]
async fn test_all_target_merges_every_handler() {
    let handlers = vec![
        MockHandler::new(Biz::Case, MockOutcome::Hits(1)),
        MockHandler::new(Biz::Question, MockOutcome::Hits(2)),
        MockHandler::new(Biz::Skill, MockOutcome::Hits(0)),
        MockHandler::new(Biz::QuestionSet, MockOutcome::Hits(3)),
    ];
    let engine = engine_with(&handlers);

    let result = engine.search("biz:all:redis").await.unwrap();

    assert_eq!(result.cases.len(), 1);
    assert_eq!(result.questions.len(), 2);
    assert!(result.skills.is_empty());
    assert_eq!(result.question_sets.len(), 3);
    assert!(handlers.iter().all(|h| h.calls() == 1));
}

#[tokio::test]
async fn test_merge_ignores_completion_order() {
    let order = [Biz::Case, Biz::Question, Biz::Skill, Biz::QuestionSet];
    let staggered = |slowest_first: bool| -> Vec<Arc<MockHandler>> {
        order
            .iter()
            .enumerate()
            .map(|(i, &biz)| {
                let rank = if slowest_first { order.len() - i } else { i + 1 };
                MockHandler::delayed(biz, MockOutcome::Hits(1), Duration::from_millis(40 * rank as u64))
            })
            .collect()
    };

    // Cases finish last in the first run and first in the second
    let case_slowest = engine_with(&staggered(true)).search("biz:all:redis").await.unwrap();
    let case_fastest = engine_with(&staggered(false)).search("biz:all:redis").await.unwrap();

    assert_eq!(case_slowest, case_fastest);
    assert_eq!(case_slowest.total(), 4);
    assert_eq!(case_slowest.cases.len(), 1);
    assert_eq!(case_slowest.questions.len(), 1);
    assert_eq!(case_slowest.skills.len(), 1);
    assert_eq!(case_slowest.question_sets.len(), 1);
}

#[tokio::test]
async fn test_handlers_run_concurrently() {
    let handlers: Vec<_> = [Biz::Case, Biz::Question, Biz::Skill, Biz::QuestionSet]
        .into_iter()
        .map(|biz| MockHandler::delayed(biz, MockOutcome::Hits(1), Duration::from_millis(200)))
        .collect();
    let engine = engine_with(&handlers);

    let start = Instant::now();
    let result = engine.search("biz:all:x").await.unwrap();

    assert_eq!(result.total(), 4);
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn test_one_failing_handler_fails_the_search() {
    let handlers = vec![
        MockHandler::new(Biz::Case, MockOutcome::Hits(5)),
        MockHandler::new(Biz::Question, MockOutcome::Fail),
        MockHandler::new(Biz::Skill, MockOutcome::Hits(5)),
        MockHandler::new(Biz::QuestionSet, MockOutcome::Hits(5)),
    ];
    let engine = engine_with(&handlers);

    let err = engine.search("biz:all:redis").await.unwrap_err();
    assert!(
        matches!(err, SearchError::HandlerFailed { biz: Biz::Question, .. }),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn test_failure_aborts_slow_handlers() {
    let slow = MockHandler::delayed(Biz::Case, MockOutcome::Hits(1), Duration::from_secs(5));
    let failing = MockHandler::new(Biz::Skill, MockOutcome::Fail);
    let engine = engine_with(&[slow.clone(), failing]);

    let start = Instant::now();
    assert!(engine.search("biz:all:x").await.is_err());
    assert!(start.elapsed() < Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(slow.completed(), 0);
}

#[tokio::test]
async fn test_deadline_fails_the_whole_search() {
    let handlers = vec![
        MockHandler::new(Biz::Case, MockOutcome::Hits(1)),
        MockHandler::delayed(Biz::Skill, MockOutcome::Hits(1), Duration::from_secs(5)),
    ];
    let engine = engine_with(&handlers).with_timeout(Duration::from_millis(100));

    let err = engine.search("biz:all:x").await.unwrap_err();
    assert!(matches!(err, SearchError::Timeout(100)));
    assert_eq!(handlers[1].completed(), 0);
}

#[tokio::test]
async fn test_unknown_target_calls_nothing() {
    let handlers = all_handlers(MockOutcome::Hits(1));
    let engine = engine_with(&handlers);

    for expr in ["biz:roadmap:x", "biz::x", "biz:Case:x", "biz:question_set:x"] {
        let err = engine.search(expr).await.unwrap_err();
        assert!(matches!(err, SearchError::UnknownTarget(_)), "{expr}: {err}");
    }
    assert!(handlers.iter().all(|h| h.calls() == 0));
}

#[tokio::test]
async fn test_unregistered_entity_is_unknown() {
    let engine = engine_with(&[MockHandler::new(Biz::Case, MockOutcome::Hits(1))]);

    let err = engine.search("biz:skill:x").await.unwrap_err();
    assert!(matches!(err, SearchError::UnknownTarget(ref t) if t == "skill"));

    // `all` only covers what is registered
    let result = engine.search("biz:all:x").await.unwrap();
    assert_eq!(result.cases.len(), 1);
    assert_eq!(engine.targets(), vec![Biz::Case]);
}

#[tokio::test]
async fn test_malformed_expression_calls_nothing() {
    let handlers = all_handlers(MockOutcome::Hits(1));
    let engine = engine_with(&handlers);

    for expr in ["", "case:redis", "biz:case", "search:case:redis", "biz:case:a:b"] {
        let err = engine.search(expr).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidExpression(_)), "{expr:?}: {err}");
        assert!(err.is_client_error());
    }
    assert!(handlers.iter().all(|h| h.calls() == 0));
}

#[tokio::test]
async fn test_page_is_forwarded_and_capped() {
    let handler = MockHandler::new(Biz::Case, MockOutcome::Hits(0));
    let engine = engine_with(&[handler.clone()])
        .with_page_size(10)
        .with_max_results(50);

    engine.search("biz:case:x").await.unwrap();
    assert_eq!(handler.last_call().unwrap().1, Page::new(0, 10));

    engine.search_page("biz:case:x", Page::new(40, 500)).await.unwrap();
    assert_eq!(handler.last_call().unwrap().1, Page::new(40, 50));
}

#[tokio::test]
async fn test_registering_twice_replaces_handler() {
    let first = MockHandler::new(Biz::Case, MockOutcome::Hits(1));
    let second = MockHandler::new(Biz::Case, MockOutcome::Hits(3));
    let engine = engine_with(&[first.clone(), second.clone()]);

    let result = engine.search("biz:case:x").await.unwrap();
    assert_eq!(result.cases.len(), 3);
    assert_eq!(first.calls(), 0);
    assert_eq!(second.calls(), 1);
}
