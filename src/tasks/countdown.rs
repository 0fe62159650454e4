use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::schemas::answer::SubmitTrigger;
use crate::services::submission::{self, SubmissionPipeline};
use crate::session::countdown::Tick;
use crate::session::{SessionError, SharedSession};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives the session countdown once per second until it expires, the
/// session is frozen (`stop`), or the process shuts down.
pub(crate) fn spawn(
    session: SharedSession,
    pipeline: Arc<SubmissionPipeline>,
    stop: watch::Receiver<bool>,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(run(session, pipeline, stop, shutdown))
}

async fn run(
    session: SharedSession,
    pipeline: Arc<SubmissionPipeline>,
    mut stop: watch::Receiver<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *stop.borrow() || *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = stop.changed() => break,
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let tick = session.lock().await.tick();
                match tick {
                    Tick::Running(remaining) => {
                        tracing::trace!(remaining, "Countdown tick");
                    }
                    Tick::Stopped => break,
                    Tick::Expired => {
                        auto_submit(&session, &pipeline).await;
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("Countdown driver finished");
}

async fn auto_submit(session: &SharedSession, pipeline: &Arc<SubmissionPipeline>) {
    tracing::info!("Time is up; submitting automatically");
    match submission::submit(session, pipeline, SubmitTrigger::Timeout).await {
        Ok(outcome) => tracing::info!(
            status = ?outcome.status,
            delivery = outcome.receipt.as_str(),
            "Timed submission finished"
        ),
        Err(SessionError::AlreadySubmitted) => {
            tracing::debug!("Manual submission won the race against the timer");
        }
        Err(err) => tracing::error!(error = %err, "Timed submission could not start"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DeliveryMode;
    use crate::schemas::session::SessionPhase;
    use crate::services::local_export::LocalExporter;
    use crate::services::submission::OutcomeStatus;
    use crate::test_support::{registered_session, sample_store, FakeRelay, FakeUploader};

    fn pipeline(uploader: Arc<FakeUploader>, relay: Arc<FakeRelay>) -> Arc<SubmissionPipeline> {
        Arc::new(SubmissionPipeline::new(
            DeliveryMode::Upload,
            Some(uploader),
            LocalExporter::new(std::env::temp_dir().join("quiz-countdown-unused")),
            Some(relay),
            "help@example.com".to_string(),
            "Thank you, {name}!".to_string(),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_exactly_once_with_timeout_trigger() {
        let (session, stop_rx) = registered_session(sample_store(3), 3);
        let uploader = Arc::new(FakeUploader::succeeding("https://cdn.example.com/t/"));
        let relay = Arc::new(FakeRelay::succeeding());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn(
            session.clone(),
            pipeline(uploader.clone(), relay.clone()),
            stop_rx,
            shutdown_rx,
        );
        handle.await.expect("driver joined");

        assert_eq!(uploader.calls(), 1);
        assert_eq!(relay.forms().len(), 1);
        let guard = session.lock().await;
        assert_eq!(guard.phase(), SessionPhase::Completed);
        let view = guard.view();
        assert_eq!(view.timer.expect("timer").remaining_seconds, 0);
        let prepared = guard.prepared().expect("payload");
        assert_eq!(prepared.payload.trigger, SubmitTrigger::Timeout);
        assert!(prepared.payload.answers.iter().all(|record| record.is_skipped()));
    }

    #[tokio::test(start_paused = true)]
    async fn manual_submit_stops_the_driver_without_a_second_submission() {
        let (session, stop_rx) = registered_session(sample_store(1), 60);
        let uploader = Arc::new(FakeUploader::succeeding("https://cdn.example.com/m/"));
        let relay = Arc::new(FakeRelay::succeeding());
        let pipeline = pipeline(uploader.clone(), relay.clone());
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn(session.clone(), pipeline.clone(), stop_rx, shutdown_rx);
        tokio::time::sleep(Duration::from_millis(5_500)).await;

        let outcome = submission::submit(&session, &pipeline, SubmitTrigger::Manual)
            .await
            .expect("manual submit");
        assert_eq!(outcome.status, OutcomeStatus::Completed);

        handle.await.expect("driver joined");
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(uploader.calls(), 1);
        let guard = session.lock().await;
        let timer = guard.view().timer.expect("timer");
        assert_eq!(timer.remaining_seconds, 55);
        assert!(!timer.running);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_driver() {
        let (session, stop_rx) = registered_session(sample_store(1), 60);
        let uploader = Arc::new(FakeUploader::succeeding("https://cdn.example.com/s/"));
        let relay = Arc::new(FakeRelay::succeeding());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = spawn(session.clone(), pipeline(uploader.clone(), relay), stop_rx, shutdown_rx);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        shutdown_tx.send(true).expect("send shutdown");
        handle.await.expect("driver joined");

        assert_eq!(uploader.calls(), 0);
        assert_eq!(session.lock().await.phase(), SessionPhase::InProgress);
    }
}
