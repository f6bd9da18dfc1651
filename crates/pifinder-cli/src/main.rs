use std::collections::HashMap;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pifinder_core::domain::DEFAULT_ITERATIONS;
use pifinder_core::{App, AppBuilder, AppConfig, JobId, JobPayload, JobService, JobStatus, SweepRange};

#[derive(Parser, Debug)]
#[command(name = "pifinder")]
#[command(version)]
#[command(about = "Estimate π with background Monte Carlo jobs")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Number of workers
    #[arg(long, env = "PIFINDER_WORKERS", default_value = "4", global = true)]
    workers: usize,

    /// Seconds a finished job stays pollable (0 keeps it forever)
    #[arg(long, env = "PIFINDER_RETENTION_SECS", default_value = "3600", global = true)]
    retention_secs: u64,

    /// Give up waiting after this many seconds
    #[arg(long, env = "PIFINDER_TIMEOUT_SECS", default_value = "600", global = true)]
    timeout_secs: u64,

    /// Poll interval in milliseconds
    #[arg(long, env = "PIFINDER_POLL_MS", default_value = "200", global = true)]
    poll_ms: u64,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Submit jobs and follow them until they finish
    Submit {
        /// Iterations per job
        #[arg(long, default_value_t = DEFAULT_ITERATIONS.to_string())]
        niter: String,

        /// Number of identical jobs
        #[arg(long, default_value = "1")]
        jobs: usize,

        /// Fixed RNG seed for reproducible estimates
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Submit one job per iteration count in [min, max]
    Sweep {
        #[arg(long)]
        min: i64,

        #[arg(long)]
        max: i64,

        #[arg(long)]
        step: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let poll_interval = Duration::from_millis(args.poll_ms.max(1));
    let retention = (args.retention_secs > 0).then(|| Duration::from_secs(args.retention_secs));
    let config = AppConfig::default()
        .with_workers(args.workers)
        .with_retention(retention)
        .with_poll_interval(poll_interval);
    let app = AppBuilder::new()
        .config(config)
        .build()
        .context("failed to start job runtime")?;
    run(
        app,
        args.command,
        poll_interval,
        Duration::from_secs(args.timeout_secs),
    )
    .await
}

/// Submit, follow until done, and shut the app down on every path.
async fn run(
    app: App,
    command: Commands,
    poll_interval: Duration,
    timeout: Duration,
) -> anyhow::Result<()> {
    let service = app.service().clone();

    let ids = match submit_all(&service, command).await {
        Ok(ids) => ids,
        Err(e) => {
            app.shutdown().await;
            return Err(e);
        }
    };

    let result = tokio::select! {
        res = follow(&service, &ids, poll_interval, timeout) => res,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down");
            Ok(())
        }
    };

    if let Ok(counts) = service.counts().await {
        tracing::info!(
            success = counts.success,
            failure = counts.failure,
            in_flight = counts.in_flight(),
            "Done"
        );
    }
    app.shutdown().await;
    result
}

/// Submit the requested jobs and print one JSON line per accepted handle.
async fn submit_all(service: &JobService, command: Commands) -> anyhow::Result<Vec<JobId>> {
    let ids = match command {
        Commands::Submit { niter, jobs, seed } => {
            let mut payload = JobPayload::from_form(Some(&niter))?;
            if let Some(seed) = seed {
                payload = payload.with_seed(seed);
            }
            let mut ids = Vec::with_capacity(jobs);
            for _ in 0..jobs {
                match service.submit(payload).await {
                    Ok(id) => {
                        print_submitted(id);
                        ids.push(id);
                    }
                    Err(e) => {
                        let accepted = ids.len();
                        return Err(e).with_context(|| {
                            format!("submit failed after {accepted} accepted job(s)")
                        });
                    }
                }
            }
            ids
        }
        Commands::Sweep { min, max, step } => {
            match service.submit_sweep(SweepRange::new(min, max, step)).await {
                Ok(ids) => {
                    ids.iter().copied().for_each(print_submitted);
                    ids
                }
                Err(e) => {
                    e.submitted.iter().copied().for_each(print_submitted);
                    return Err(e.into());
                }
            }
        }
    };
    Ok(ids)
}

fn print_submitted(id: JobId) {
    println!("{}", serde_json::json!({ "submitted": id }));
}

/// Poll every job until all are terminal, printing each status change as a JSON line.
async fn follow(
    service: &JobService,
    ids: &[JobId],
    poll_interval: Duration,
    timeout: Duration,
) -> anyhow::Result<()> {
    // 大きすぎる timeout は期限なし
    let deadline = tokio::time::Instant::now().checked_add(timeout);
    let mut last: HashMap<JobId, JobStatus> = HashMap::new();
    let mut ticker = tokio::time::interval(poll_interval);

    loop {
        ticker.tick().await;

        let mut done = 0;
        for &id in ids {
            let response = service.poll(id).await?;
            let status = response.status();
            if last.insert(id, status) != Some(status) {
                println!("{}", serde_json::to_string(&response)?);
            }
            if response.is_terminal() {
                done += 1;
            }
        }

        if done == ids.len() {
            return Ok(());
        }
        if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
            anyhow::bail!(
                "{} of {} jobs still running after {:?}",
                ids.len() - done,
                ids.len(),
                timeout
            );
        }
    }
}
