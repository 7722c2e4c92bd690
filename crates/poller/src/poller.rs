use std::time::Duration;

use tokio_util::sync::CancellationToken;

use herald_common::error::PollError;
use herald_common::types::{Cursor, Submission};
use herald_notifier::{MessageSender, Notifier};

use crate::fetcher::StatusSource;
use crate::response::check_response;
use crate::verdict::{parse_submission, verdict_message};

/// What a single poll iteration ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// A verdict message was delivered.
    Notified,
    /// The latest submission matches the last delivered one.
    Unchanged,
    /// The response carried no submissions.
    NoUpdates,
    /// A verdict message was built but could not be delivered; retried next iteration.
    DeliveryFailed,
    /// A stage failed. `suppressed` is set when the failure equals the previous
    /// one and no failure notification was attempted.
    Failed { suppressed: bool },
}

/// Review-status poller that relays verdict changes to a single chat.
///
/// Owns all loop state: the cursor, the last reported error and the last
/// delivered submission. Iterations run strictly one after another.
pub struct StatusPoller<S, M> {
    source: S,
    notifier: Notifier<M>,
    chat_id: String,
    retry_period: Duration,
    cursor: Cursor,
    last_error: Option<PollError>,
    last_delivered: Option<Submission>,
}

impl<S: StatusSource, M: MessageSender> StatusPoller<S, M> {
    pub fn new(
        source: S,
        notifier: Notifier<M>,
        chat_id: impl Into<String>,
        retry_period: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            chat_id: chat_id.into(),
            retry_period,
            cursor: Cursor::now(),
            last_error: None,
            last_delivered: None,
        }
    }

    /// Start polling from `cursor` instead of the current time.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn last_error(&self) -> Option<&PollError> {
        self.last_error.as_ref()
    }

    /// Start the polling loop. Runs until `shutdown` is cancelled, which is
    /// observed both mid-request and during the pause between iterations.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        tracing::info!(
            cursor = %self.cursor,
            retry_period_secs = self.retry_period.as_secs(),
            "Status poller started"
        );

        loop {
            tokio::select! {
                outcome = self.tick() => {
                    tracing::info!(
                        ?outcome,
                        cursor = %self.cursor,
                        retry_in_secs = self.retry_period.as_secs(),
                        "Poll iteration finished"
                    );
                }
                _ = shutdown.cancelled() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.retry_period) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        tracing::info!(cursor = %self.cursor, "Status poller stopped");
    }

    /// Run one full fetch, validate, map and notify cycle.
    ///
    /// Never fails: stage errors are reported to the chat (once per distinct
    /// error) and folded into the outcome.
    pub async fn tick(&mut self) -> IterationOutcome {
        match self.poll_once().await {
            Ok(outcome) => outcome,
            Err(e) => self.report_failure(e).await,
        }
    }

    async fn poll_once(&mut self) -> Result<IterationOutcome, PollError> {
        let body = self.source.fetch(self.cursor).await?;
        let response = check_response(&body)?;

        let Some(latest) = response.homeworks.first() else {
            tracing::debug!(cursor = %self.cursor, "No review updates");
            self.complete(response.current_date);
            return Ok(IterationOutcome::NoUpdates);
        };

        let latest = parse_submission(latest)?;
        let message = verdict_message(&latest)?;

        if self.last_delivered.as_ref() == Some(&latest) {
            tracing::debug!(
                homework = %latest.homework_name,
                status = %latest.status,
                "Review status unchanged"
            );
            self.complete(response.current_date);
            return Ok(IterationOutcome::Unchanged);
        }

        if !self.notifier.send_message(&self.chat_id, &message).await {
            tracing::warn!(
                homework = %latest.homework_name,
                "Verdict not delivered, keeping cursor for the next iteration"
            );
            return Ok(IterationOutcome::DeliveryFailed);
        }

        tracing::info!(
            homework = %latest.homework_name,
            status = %latest.status,
            "Review status changed"
        );
        self.last_delivered = Some(latest);
        self.complete(response.current_date);
        Ok(IterationOutcome::Notified)
    }

    /// Bookkeeping for a successfully processed response.
    fn complete(&mut self, current_date: Option<i64>) {
        if let Some(server_time) = current_date {
            if self.cursor.advance(server_time) {
                tracing::debug!(cursor = %self.cursor, "Cursor advanced");
            } else {
                tracing::debug!(
                    cursor = %self.cursor,
                    server_time,
                    "Server time not ahead of cursor, keeping cursor"
                );
            }
        }
        self.last_error = None;
    }

    async fn report_failure(&mut self, error: PollError) -> IterationOutcome {
        let stage = if error.is_fetch_failure() { "fetch" } else { "process" };
        tracing::error!(error = %error, stage, cursor = %self.cursor, "Poll iteration failed");

        if self.last_error.as_ref() == Some(&error) {
            tracing::warn!(error = %error, "Repeated failure, notification suppressed");
            return IterationOutcome::Failed { suppressed: true };
        }

        let message = format!("Program failure: {error}");
        self.notifier.send_message(&self.chat_id, &message).await;
        self.last_error = Some(error);
        IterationOutcome::Failed { suppressed: false }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use herald_notifier::NotifyError;

    use super::*;

    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Value, PollError>>>,
        cursors: Arc<Mutex<Vec<i64>>>,
    }

    impl StatusSource for ScriptedSource {
        async fn fetch(&self, cursor: Cursor) -> Result<Value, PollError> {
            self.cursors.lock().unwrap().push(cursor.value());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "homeworks": [] })))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSender {
        sent: Arc<Mutex<Vec<String>>>,
        fail: Arc<Mutex<bool>>,
    }

    impl MessageSender for RecordingSender {
        async fn send_text(&self, _chat_id: &str, text: &str) -> Result<(), NotifyError> {
            if *self.fail.lock().unwrap() {
                return Err(NotifyError::Rejected("unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn make_poller(
        replies: Vec<Result<Value, PollError>>,
    ) -> (
        StatusPoller<ScriptedSource, RecordingSender>,
        RecordingSender,
        Arc<Mutex<Vec<i64>>>,
    ) {
        let cursors = Arc::new(Mutex::new(Vec::new()));
        let source = ScriptedSource {
            replies: Mutex::new(replies.into()),
            cursors: cursors.clone(),
        };
        let sender = RecordingSender::default();
        let poller = StatusPoller::new(
            source,
            Notifier::new(sender.clone()),
            "42",
            Duration::from_secs(600),
        )
        .with_cursor(Cursor::new(500));
        (poller, sender, cursors)
    }

    fn approved(name: &str, current_date: i64) -> Result<Value, PollError> {
        Ok(json!({
            "homeworks": [{ "status": "approved", "homework_name": name }],
            "current_date": current_date
        }))
    }

    #[tokio::test]
    async fn test_fetch_uses_current_cursor() {
        let (mut poller, _, cursors) = make_poller(vec![approved("hw1", 1000)]);
        poller.tick().await;
        poller.tick().await;
        assert_eq!(*cursors.lock().unwrap(), vec![500, 1000]);
    }

    #[tokio::test]
    async fn test_unchanged_status_not_renotified() {
        let (mut poller, sender, _) =
            make_poller(vec![approved("hw1", 1000), approved("hw1", 1100)]);
        assert_eq!(poller.tick().await, IterationOutcome::Notified);
        assert_eq!(poller.tick().await, IterationOutcome::Unchanged);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert_eq!(poller.cursor().value(), 1100);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_cursor_and_retries() {
        let (mut poller, sender, _) =
            make_poller(vec![approved("hw1", 1000), approved("hw1", 1000)]);
        *sender.fail.lock().unwrap() = true;
        assert_eq!(poller.tick().await, IterationOutcome::DeliveryFailed);
        assert_eq!(poller.cursor().value(), 500);

        *sender.fail.lock().unwrap() = false;
        assert_eq!(poller.tick().await, IterationOutcome::Notified);
        assert_eq!(poller.cursor().value(), 1000);
    }

    #[tokio::test]
    async fn test_stale_server_time_does_not_rewind_cursor() {
        let (mut poller, _, _) = make_poller(vec![approved("hw1", 100)]);
        assert_eq!(poller.tick().await, IterationOutcome::Notified);
        assert_eq!(poller.cursor().value(), 500);
    }

    #[tokio::test]
    async fn test_success_clears_last_error() {
        let (mut poller, sender, _) = make_poller(vec![
            Err(PollError::UnsuccessfulStatus { status: 502 }),
            Ok(json!({ "homeworks": [] })),
            Err(PollError::UnsuccessfulStatus { status: 502 }),
        ]);
        assert_eq!(poller.tick().await, IterationOutcome::Failed { suppressed: false });
        assert!(poller.last_error().is_some());
        assert_eq!(poller.tick().await, IterationOutcome::NoUpdates);
        assert!(poller.last_error().is_none());
        // Same error after a success is reported again.
        assert_eq!(poller.tick().await, IterationOutcome::Failed { suppressed: false });
        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_notification_is_best_effort() {
        let (mut poller, sender, _) = make_poller(vec![Err(PollError::Decode("eof".to_string()))]);
        *sender.fail.lock().unwrap() = true;
        assert_eq!(poller.tick().await, IterationOutcome::Failed { suppressed: false });
        assert_eq!(
            poller.last_error(),
            Some(&PollError::Decode("eof".to_string()))
        );
    }

    #[tokio::test]
    async fn test_trailing_junk_entry_does_not_block_latest_verdict() {
        let (mut poller, sender, _) = make_poller(vec![Ok(json!({
            "homeworks": [{ "status": "approved", "homework_name": "hw1" }, 5],
            "current_date": 1000
        }))]);
        assert_eq!(poller.tick().await, IterationOutcome::Notified);
        assert_eq!(poller.cursor().value(), 1000);
        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw1"));
    }

    #[tokio::test]
    async fn test_non_string_status_reported_as_unknown() {
        let (mut poller, sender, _) = make_poller(vec![Ok(json!({
            "homeworks": [{ "status": 7, "homework_name": "hw1" }]
        }))]);
        assert_eq!(poller.tick().await, IterationOutcome::Failed { suppressed: false });
        assert_eq!(
            poller.last_error(),
            Some(&PollError::UnknownStatus("unrecognized status \"7\"".to_string()))
        );
        assert!(sender.sent.lock().unwrap()[0].starts_with("Program failure: Unknown status"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancellation() {
        let (mut poller, _, cursors) = make_poller(vec![]);
        let shutdown = CancellationToken::new();

        let stopper = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1500)).await;
            stopper.cancel();
        });

        poller.run(shutdown).await;
        // Iterations at t=0, 600 and 1200 before the cancel at 1500.
        assert_eq!(cursors.lock().unwrap().len(), 3);
    }
}
