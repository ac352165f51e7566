//! Queue worker loops.
//!
//! Each worker repeatedly claims the oldest runnable job, drives the
//! enrichment pipeline for it, forwards progress checkpoints into the
//! job row, and records the terminal outcome. Workers never share a
//! job: the claim query locks the row, and stale claims are recovered
//! by the heartbeat check, giving at-least-once processing.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use leadscope_core::Subject;
use leadscope_db::JobRow;
use leadscope_enrich::{EnrichmentService, ProgressReporter};

#[derive(Clone)]
pub struct WorkerContext {
    pub pool: PgPool,
    pub service: Arc<EnrichmentService>,
    pub poll_interval: Duration,
    pub stale_after_secs: u64,
}

/// Spawns `count` independent worker loops.
pub fn spawn_workers(count: usize, ctx: &WorkerContext) -> Vec<JoinHandle<()>> {
    (0..count.max(1))
        .map(|worker| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                tracing::info!(worker, "worker loop started");
                run_worker(worker, &ctx).await;
            })
        })
        .collect()
}

async fn run_worker(worker: usize, ctx: &WorkerContext) {
    loop {
        match leadscope_db::claim_next_job(&ctx.pool, ctx.stale_after_secs).await {
            Ok(Some(job)) => {
                let job_id = job.id;
                tracing::info!(worker, job_id = %job_id, "claimed analysis job");
                process_job(ctx, job).await;
            }
            Ok(None) => {
                tokio::time::sleep(ctx.poll_interval).await;
            }
            Err(e) => {
                tracing::error!(worker, error = %e, "job claim failed; backing off");
                tokio::time::sleep(ctx.poll_interval).await;
            }
        }
    }
}

/// Runs one claimed job to its terminal state.
async fn process_job(ctx: &WorkerContext, job: JobRow) {
    let job_id = job.id;

    let subject = match Subject::new(job.github_repo.as_deref(), job.website.as_deref()) {
        Ok(subject) => subject,
        Err(e) => {
            // Submission validates subjects, so a bad row means the data
            // was tampered with or the validation rules drifted.
            record_failure(ctx, job_id, &format!("invalid job subject: {e}")).await;
            return;
        }
    };

    let (reporter, mut rx) = ProgressReporter::channel();
    let forwarder = {
        let pool = ctx.pool.clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let percent = *rx.borrow();
                if let Err(e) = leadscope_db::update_job_progress(&pool, job_id, percent).await {
                    tracing::warn!(job_id = %job_id, percent, error = %e, "progress update failed");
                }
            }
        })
    };

    let outcome = ctx.service.enrich(&subject, &reporter).await;

    // Close the channel so the forwarder drains and exits before the
    // terminal status write.
    drop(reporter);
    if let Err(e) = forwarder.await {
        tracing::warn!(job_id = %job_id, error = %e, "progress forwarder panicked");
    }

    match outcome {
        Ok(lead) => {
            let lead_json = match serde_json::to_value(&lead) {
                Ok(json) => json,
                Err(e) => {
                    record_failure(ctx, job_id, &format!("failed to serialize lead result: {e}"))
                        .await;
                    return;
                }
            };

            if let Err(e) =
                leadscope_db::upsert_lead(&ctx.pool, &subject.cache_key(), &lead).await
            {
                record_failure(ctx, job_id, &format!("failed to persist lead: {e}")).await;
                return;
            }

            match leadscope_db::complete_job(&ctx.pool, job_id, &lead_json).await {
                Ok(()) => tracing::info!(job_id = %job_id, "analysis job completed"),
                Err(e) => tracing::error!(job_id = %job_id, error = %e, "completion write failed"),
            }
        }
        Err(e) => {
            tracing::warn!(job_id = %job_id, error = %e, "analysis job failed");
            record_failure(ctx, job_id, &e.to_string()).await;
        }
    }
}

async fn record_failure(ctx: &WorkerContext, job_id: uuid::Uuid, reason: &str) {
    if let Err(e) = leadscope_db::fail_job(&ctx.pool, job_id, reason).await {
        tracing::error!(job_id = %job_id, error = %e, "failure write failed");
    }
}
