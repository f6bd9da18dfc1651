//! End-to-end behaviour of submit / poll through a running App.

use std::collections::HashSet;
use std::time::Duration;

use pifinder_core::domain::JobPayload;
use pifinder_core::{App, AppBuilder, AppConfig, JobError, JobId, JobStatus, PollResponse};
use ulid::Ulid;

fn app(workers: usize) -> App {
    AppBuilder::new()
        .config(
            AppConfig::default()
                .with_workers(workers)
                .with_pop_timeout(Duration::from_millis(50))
                .with_poll_interval(Duration::from_millis(5)),
        )
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submitted_handle_is_always_pollable() {
    let app = app(2);
    let service = app.service().clone();

    for _ in 0..20 {
        let id = service.submit(JobPayload::new(100)).await.unwrap();
        assert!(service.poll(id).await.is_ok());
    }

    app.drain().await;
}

#[tokio::test]
async fn fabricated_handle_is_not_found() {
    let app = app(1);
    let id: JobId = format!("job-{}", Ulid::new()).parse().unwrap();

    let err = app.service().poll(id).await.unwrap_err();
    assert_eq!(err, JobError::NotFound(id));

    app.shutdown().await;
}

#[tokio::test]
async fn non_positive_iterations_are_rejected_synchronously() {
    let app = app(1);
    let service = app.service().clone();

    for niter in [0, -5] {
        let err = service.submit(JobPayload::new(niter)).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidArgument(_)));
    }
    assert_eq!(service.counts().await.unwrap().total(), 0);

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn small_job_runs_to_success() {
    let app = app(2);
    let service = app.service().clone();

    let id = service.submit(JobPayload::new(1000)).await.unwrap();
    let response = service.wait(id, Duration::from_secs(10)).await.unwrap();

    match response {
        PollResponse::Succeeded { job_id, result } => {
            assert_eq!(job_id, id);
            assert_eq!(result.niter, 1000);
            assert!(result.pi > 2.5 && result.pi < 3.5, "pi = {}", result.pi);
        }
        other => panic!("expected success, got {other:?}"),
    }

    let snapshot = service.snapshot(id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Success);
    assert!(snapshot.result.is_some());
    assert!(snapshot.error.is_none());
    assert!(snapshot.finished_at.is_some());

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn status_never_moves_backwards() {
    let app = app(1);
    let service = app.service().clone();

    let id = service.submit(JobPayload::new(2_000_000)).await.unwrap();

    let mut last = JobStatus::Pending;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
    loop {
        let status = service.poll(id).await.unwrap().status();
        assert!(status.rank() >= last.rank(), "{last} -> {status}");
        last = status;
        if status.is_terminal() || tokio::time::Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(last, JobStatus::Success);

    // 終了後は変化しない
    for _ in 0..5 {
        assert_eq!(service.poll(id).await.unwrap().status(), JobStatus::Success);
    }

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn result_and_error_are_mutually_exclusive() {
    let app = app(2);
    let service = app.service().clone();

    let ids = service
        .submit_sweep(pifinder_core::SweepRange::new(100, 1_000, 300))
        .await
        .unwrap();
    for id in &ids {
        service.wait(*id, Duration::from_secs(10)).await.unwrap();
    }

    for id in ids {
        let snapshot = service.snapshot(id).await.unwrap();
        match snapshot.status {
            JobStatus::Success => {
                assert!(snapshot.result.is_some() && snapshot.error.is_none())
            }
            JobStatus::Failure => {
                assert!(snapshot.result.is_none() && snapshot.error.is_some())
            }
            _ => assert!(snapshot.result.is_none() && snapshot.error.is_none()),
        }
    }

    app.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_identical_submissions_get_distinct_handles() {
    let app = app(2);
    let service = app.service().clone();

    let mut joins = Vec::new();
    for _ in 0..50 {
        let service = service.clone();
        joins.push(tokio::spawn(async move {
            service.submit(JobPayload::new(10)).await.unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for j in joins {
        ids.insert(j.await.unwrap());
    }
    assert_eq!(ids.len(), 50);

    app.drain().await;
    let counts = service.counts().await.unwrap();
    assert_eq!(counts.success, 50);
}

#[tokio::test]
async fn shutdown_stops_accepting_jobs() {
    let app = AppBuilder::new()
        .config(AppConfig::default().with_workers(1))
        .build()
        .unwrap();
    let service = app.service().clone();

    app.shutdown().await;

    // 停止後は受け付けない
    let err = service.submit(JobPayload::new(10)).await.unwrap_err();
    assert_eq!(err, JobError::QueueClosed);
}
