//! Scheduled voting ticks.
//!
//! Two independent loops drive the coordinator on a fixed
//! `tokio::time::interval`:
//!
//! - [`run_assignment`] puts new submissions into a batch.
//! - [`run_expiry`] evaluates batches whose window has closed.
//!
//! Failures are logged (the coordinator also toasts them to the affected
//! project) and never stop the loop. Both run until `cancel` is triggered.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::state::Coordinator;

/// Run the batch assignment loop.
pub async fn run_assignment(
    coordinator: Arc<Coordinator>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Voting assignment job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Voting assignment job stopping");
                break;
            }
            _ = interval.tick() => {
                match coordinator.assign_unbatched(Utc::now()).await {
                    Ok(batches) => {
                        if batches.is_empty() {
                            tracing::debug!("Voting assignment: nothing to batch");
                        } else {
                            let clips: usize = batches.iter().map(|b| b.clip_ids.len()).sum();
                            tracing::info!(batches = batches.len(), clips, "Voting assignment: batches created");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Voting assignment: tick failed");
                    }
                }
            }
        }
    }
}

/// Run the expired-batch evaluation loop.
pub async fn run_expiry(coordinator: Arc<Coordinator>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Voting expiry job started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Voting expiry job stopping");
                break;
            }
            _ = interval.tick() => {
                match coordinator.check_expired_batches(Utc::now()).await {
                    Ok(sweep) => {
                        for failure in &sweep.failures {
                            tracing::warn!(
                                project_id = failure.project_id,
                                batch_token = %failure.batch_token,
                                error = %failure.error,
                                "Voting expiry: batch left for next tick",
                            );
                        }
                        if !sweep.evaluated.is_empty() {
                            let approved: usize =
                                sweep.evaluated.iter().map(|e| e.approved_count()).sum();
                            tracing::info!(
                                evaluated = sweep.evaluated.len(),
                                approved,
                                skipped = sweep.skipped,
                                "Voting expiry: batches evaluated",
                            );
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Voting expiry: tick failed");
                    }
                }
            }
        }
    }
}
