use super::*;
use crate::browser::MockBrowser;
use crate::core::pipeline::{AbortReason, Stage};
use crate::progress::{ChannelProgress, ProgressEvent};
use crate::storage::{CsvSink, MemorySink, NoticeRow, ResultSink, HEADER};
use crate::testing::{fast_config, notice_cells, Portal};
use crate::{CrawlConfig, ScraperError};
use std::sync::Arc;
use tempfile::tempdir;

fn crawler_for(browser: &MockBrowser, sink: Arc<dyn ResultSink>) -> Crawler {
    Crawler::new(Box::new(browser.launcher()), sink)
}

fn seeded_sink() -> MemorySink {
    MemorySink::with_rows(vec![NoticeRow::from_cells(&notice_cells(
        "1",
        "R24BK00000099",
        "기존 공고",
    ))])
}

#[tokio::test]
async fn test_first_run_persists_three_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("g2b_result.csv");
    let browser = Portal::new()
        .rows(&[
            notice_cells("1", "R25BK00000001", "컴퓨터 구매"),
            notice_cells("2", "R25BK00000002", "노트북 임차"),
            notice_cells("3", "R25BK00000003", "서버 유지보수"),
        ])
        .build();
    let config = fast_config().with_output(&path);
    let crawler = crawler_for(&browser, Arc::new(CsvSink::new(&path)));

    let outcome = crawler.run(&config).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Persisted {
            scraped: 3,
            total: 3,
            query_verified: true,
        }
    );
    let stored = CsvSink::new(&path).load().await.unwrap().unwrap();
    assert_eq!(stored.len(), 3);
    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.trim_start_matches('\u{feff}').lines().next().unwrap();
    assert_eq!(header.split(',').count(), HEADER.len());
    assert_eq!(browser.close_calls(), 1);
}

#[tokio::test]
async fn test_second_run_merges_and_updates_shared_notice() {
    let sink = MemorySink::new();
    let first = Portal::new()
        .rows(&[
            notice_cells("1", "R25BK00000001", "컴퓨터 구매"),
            notice_cells("2", "R25BK00000002", "노트북 임차"),
            notice_cells("3", "R25BK00000003", "서버 유지보수"),
        ])
        .build();
    crawler_for(&first, Arc::new(sink.clone()))
        .run(&fast_config())
        .await
        .unwrap();

    let second = Portal::new()
        .rows(&[
            notice_cells("1", "R25BK00000003", "서버 유지보수 (정정)"),
            notice_cells("2", "R25BK00000004", "모니터 구매"),
        ])
        .build();
    let outcome = crawler_for(&second, Arc::new(sink.clone()))
        .run(&fast_config())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Persisted {
            scraped: 2,
            total: 4,
            query_verified: true,
        }
    );
    let rows = sink.snapshot().unwrap();
    let keys: Vec<&str> = rows.iter().map(|r| r.notice_number.as_str()).collect();
    assert_eq!(
        keys,
        vec!["R25BK00000001", "R25BK00000002", "R25BK00000003", "R25BK00000004"]
    );
    assert_eq!(rows[2].title, "서버 유지보수 (정정)");
}

#[tokio::test]
async fn test_missing_grid_aborts_without_touching_sink() {
    let sink = seeded_sink();
    let before = sink.snapshot();
    let browser = Portal::new().without_grid().build();

    let outcome = crawler_for(&browser, Arc::new(sink.clone()))
        .run(&fast_config())
        .await
        .unwrap();

    match outcome {
        RunOutcome::Aborted { reason, stage, .. } => {
            assert_eq!(reason, AbortReason::NoResultsGridFound);
            assert_eq!(stage, Stage::ResultsReady);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(sink.snapshot(), before);
    assert_eq!(sink.store_count(), 0);
    assert_eq!(browser.close_calls(), 1);
}

#[tokio::test]
async fn test_empty_grid_reports_no_results() {
    let sink = seeded_sink();
    let before = sink.snapshot();
    let browser = Portal::new().build();

    let outcome = crawler_for(&browser, Arc::new(sink.clone()))
        .run(&fast_config())
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::NoResults);
    assert_eq!(sink.snapshot(), before);
    assert_eq!(sink.store_count(), 0);
    assert_eq!(browser.close_calls(), 1);
}

#[tokio::test]
async fn test_unclosable_overlay_still_reaches_results() {
    let sink = MemorySink::new();
    let browser = Portal::new()
        .overlays(0, 1)
        .rows(&[notice_cells("1", "R25BK00000001", "컴퓨터 구매")])
        .build();
    let crawler = crawler_for(&browser, Arc::new(sink.clone()));

    let outcome = crawler.run(&fast_config()).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Persisted { scraped: 1, .. }));
    assert_eq!(crawler.stats().get_stats().popups_skipped, 1);
    assert_eq!(browser.close_calls(), 1);
}

#[tokio::test]
async fn test_browser_error_that_outlasts_retries_is_a_classified_abort() {
    let sink = seeded_sink();
    let before = sink.snapshot();
    let browser = Portal::new()
        .rows(&[notice_cells("1", "R25BK00000001", "컴퓨터 구매")])
        .build()
        .failing_outer_html();
    let (progress, mut rx) = ChannelProgress::new();
    let crawler =
        crawler_for(&browser, Arc::new(sink.clone())).with_progress(Arc::new(progress));

    let outcome = crawler.run(&fast_config()).await.unwrap();

    match &outcome {
        RunOutcome::Aborted {
            reason,
            stage,
            detail,
        } => {
            assert_eq!(*reason, AbortReason::StageError);
            assert_eq!(*stage, Stage::ResultsReady);
            assert_eq!(detail.as_ref().unwrap().title, "나라장터 종합쇼핑몰");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(browser.close_calls(), 1);
    assert_eq!(sink.snapshot(), before);
    assert_eq!(sink.store_count(), 0);
    assert!(crawler.stats().get_stats().end_time.is_some());

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(ProgressEvent::RunFinished(outcome)));
}

#[tokio::test]
async fn test_session_closed_once_when_pipeline_panics() {
    let sink = MemorySink::new();
    let browser = Portal::new()
        .rows(&[notice_cells("1", "R25BK00000001", "컴퓨터 구매")])
        .build()
        .panicking_on_click("entry");

    let result = crawler_for(&browser, Arc::new(sink.clone()))
        .run(&fast_config())
        .await;

    match result {
        Err(ScraperError::Panicked(message)) => assert!(message.contains("entry")),
        other => panic!("expected panic to surface as an error, got {:?}", other),
    }
    assert_eq!(browser.close_calls(), 1);
    assert!(sink.snapshot().is_none());
}

#[tokio::test]
async fn test_launch_failure_never_touches_session_or_sink() {
    let sink = MemorySink::new();
    let browser = MockBrowser::new().failing_launch();

    let result = crawler_for(&browser, Arc::new(sink.clone()))
        .run(&fast_config())
        .await;

    assert!(result.is_err());
    assert_eq!(browser.launch_calls(), 1);
    assert_eq!(browser.close_calls(), 0);
    assert_eq!(sink.store_count(), 0);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_launch() {
    let browser = MockBrowser::new();
    let config = CrawlConfig::default().with_query("");

    let result = crawler_for(&browser, Arc::new(MemorySink::new()))
        .run(&config)
        .await;

    assert!(matches!(result, Err(ScraperError::ConfigError(_))));
    assert_eq!(browser.launch_calls(), 0);
}

#[tokio::test]
async fn test_progress_reports_run_outcome() {
    let browser = Portal::new()
        .rows(&[notice_cells("1", "R25BK00000001", "컴퓨터 구매")])
        .build();
    let (progress, mut rx) = ChannelProgress::new();
    let crawler =
        crawler_for(&browser, Arc::new(MemorySink::new())).with_progress(Arc::new(progress));

    let outcome = crawler.run(&fast_config()).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), Stage::ORDER.len() + 1);
    assert_eq!(events.last(), Some(&ProgressEvent::RunFinished(outcome)));
}

#[test]
fn test_outcome_serializes_with_tag() {
    let outcome = RunOutcome::Persisted {
        scraped: 3,
        total: 4,
        query_verified: false,
    };
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "persisted");
    assert_eq!(json["total"], 4);
    assert!(outcome.to_string().contains("query not verified"));
}
