use super::parser::{ChatCommand, parse_line};
use super::queue::{CommandQueue, QueuedLine};
use crate::config::FailurePolicy;
use crate::core::error::BooperError;
use crate::twitch::session::{UserRef, resolve_one};
use crate::twitch::{ChatService, Session};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Read-only view of a dispatch run's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub remaining: usize,
    pub running: bool,
}

/// What happened to a line that was handled without a surfaced error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Sent,
    Banned { target: String },
    BanTargetNotFound { target: String },
    BanFailed { target: String, error: String },
    TermBlocked { phrase: String },
    TermBlockFailed { phrase: String, error: String },
    /// The line had a command prefix but nothing to act on.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    Started {
        total: usize,
    },
    LineDone {
        index: usize,
        line: String,
        outcome: LineOutcome,
        progress: Progress,
    },
    LineFailed {
        index: usize,
        line: String,
        error: String,
        progress: Progress,
    },
    Completed {
        processed: usize,
        marker_error: Option<String>,
    },
    Aborted {
        processed: usize,
        remaining: usize,
    },
    /// The run could not start; no line was touched.
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineFailure {
    pub index: usize,
    pub line: String,
    pub error: String,
}

/// Final tally of a dispatch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub status: RunStatus,
    pub processed: usize,
    /// Lines that were never attempted, in their original order.
    pub pending: Vec<String>,
    pub failures: Vec<LineFailure>,
}

/// Sends queued lines to a channel one at a time.
#[derive(Clone)]
pub struct CommandDispatcher {
    client: Arc<dyn ChatService>,
    session: Arc<Session>,
    policy: FailurePolicy,
    progress: Arc<watch::Sender<Progress>>,
    cancel: Arc<Mutex<CancellationToken>>,
}

impl CommandDispatcher {
    pub fn new(client: Arc<dyn ChatService>, session: Session, policy: FailurePolicy) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            client,
            session: Arc::new(session),
            policy,
            progress: Arc::new(progress),
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    pub fn progress(&self) -> Progress {
        *self.progress.borrow()
    }

    /// Spawns a run over `queue`, waiting `delay` before each line.
    ///
    /// Fails with [`BooperError::AlreadyRunning`] while a previous run is active.
    pub fn start(&self, queue: CommandQueue, delay: Duration) -> Result<DispatchRun, BooperError> {
        let total = queue.len();
        // Held until the new token is installed so a concurrent `stop` always
        // lands on the run it raced with.
        let mut cancel = self.cancel.lock().unwrap_or_else(|e| e.into_inner());
        let mut claimed = false;
        self.progress.send_if_modified(|progress| {
            if progress.running {
                return false;
            }
            *progress = Progress {
                processed: 0,
                remaining: total,
                running: true,
            };
            claimed = true;
            true
        });
        if !claimed {
            return Err(BooperError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        *cancel = token.clone();
        drop(cancel);

        let (events, receiver) = mpsc::unbounded();
        let worker = Worker {
            client: self.client.clone(),
            session: self.session.clone(),
            policy: self.policy,
            delay,
            token,
            events,
            progress: self.progress.clone(),
        };
        let task = tokio::spawn(worker.run(queue));

        Ok(DispatchRun {
            events: receiver,
            task,
        })
    }

    /// Requests the active run to stop before its next line.
    pub fn stop(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }
}

/// Handle to a spawned run: a stream of events plus the final report.
pub struct DispatchRun {
    events: UnboundedReceiver<DispatchEvent>,
    task: JoinHandle<DispatchReport>,
}

impl DispatchRun {
    pub async fn finish(self) -> Result<DispatchReport, BooperError> {
        Ok(self.task.await?)
    }
}

impl Stream for DispatchRun {
    type Item = DispatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.events.poll_next_unpin(cx)
    }
}

/// Clears the running flag however the worker exits.
struct RunningGuard(Arc<watch::Sender<Progress>>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.send_modify(|progress| progress.running = false);
    }
}

struct Worker {
    client: Arc<dyn ChatService>,
    session: Arc<Session>,
    policy: FailurePolicy,
    delay: Duration,
    token: CancellationToken,
    events: UnboundedSender<DispatchEvent>,
    progress: Arc<watch::Sender<Progress>>,
}

impl Worker {
    async fn run(self, mut queue: CommandQueue) -> DispatchReport {
        let _guard = RunningGuard(self.progress.clone());
        let total = queue.len();
        let mut processed = 0;
        let mut failures = Vec::new();

        tracing::info!(
            total,
            delay_ms = self.delay.as_millis() as u64,
            channel = %self.session.channel.login,
            "dispatch run starting"
        );

        if let Err(e) = self.client.send_message(&self.session, &marker("Started")).await {
            tracing::error!(error = %e, "could not send start marker");
            self.emit(DispatchEvent::Failed {
                error: e.to_string(),
            });
            return DispatchReport {
                status: RunStatus::Failed,
                processed,
                pending: queue.into_lines(),
                failures,
            };
        }
        self.emit(DispatchEvent::Started { total });

        let status = loop {
            let Some(line) = queue.peek().cloned() else {
                break RunStatus::Completed;
            };
            if !self.pause().await {
                break RunStatus::Aborted;
            }

            let result = self.handle(&line).await;
            queue.pop();
            processed += 1;
            let progress = self.publish(processed, queue.len());

            match result {
                Ok(outcome) => {
                    tracing::debug!(index = line.index, ?outcome, "line handled");
                    self.emit(DispatchEvent::LineDone {
                        index: line.index,
                        line: line.text,
                        outcome,
                        progress,
                    });
                }
                Err(e) => {
                    tracing::warn!(index = line.index, error = %e, "line failed");
                    failures.push(LineFailure {
                        index: line.index,
                        line: line.text.clone(),
                        error: e.to_string(),
                    });
                    self.emit(DispatchEvent::LineFailed {
                        index: line.index,
                        line: line.text,
                        error: e.to_string(),
                        progress,
                    });
                    if self.policy == FailurePolicy::Abort {
                        break RunStatus::Aborted;
                    }
                }
            }
        };

        match status {
            RunStatus::Completed => {
                let marker_error = self
                    .client
                    .send_message(&self.session, &marker("Completed"))
                    .await
                    .err()
                    .map(|e| {
                        tracing::warn!(error = %e, "could not send completion marker");
                        e.to_string()
                    });
                tracing::info!(processed, "dispatch run completed");
                self.emit(DispatchEvent::Completed {
                    processed,
                    marker_error,
                });
                queue.clear();
            }
            _ => {
                tracing::info!(processed, remaining = queue.len(), "dispatch run aborted");
                self.emit(DispatchEvent::Aborted {
                    processed,
                    remaining: queue.len(),
                });
            }
        }

        DispatchReport {
            status,
            processed,
            pending: queue.into_lines(),
            failures,
        }
    }

    /// Waits out the delay. Returns `false` if the run was cancelled before
    /// or during the wait.
    async fn pause(&self) -> bool {
        if self.token.is_cancelled() {
            return false;
        }
        if !self.delay.is_zero() {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return false,
                _ = tokio::time::sleep(self.delay) => {}
            }
        }
        !self.token.is_cancelled()
    }

    /// Carries out one line. Only failures that must reach the user are
    /// returned as errors; ban and blocked-term failures become outcomes.
    async fn handle(&self, line: &QueuedLine) -> Result<LineOutcome, BooperError> {
        let Some(command) = parse_line(&line.text) else {
            return Ok(LineOutcome::Skipped);
        };

        match command {
            ChatCommand::SendMessage(text) => {
                self.client.send_message(&self.session, &text).await?;
                Ok(LineOutcome::Sent)
            }
            ChatCommand::BanUser { target, reason } => self.ban(target, reason).await,
            ChatCommand::AddBlockedTerm(phrase) => {
                match self.client.block_term(&self.session, &phrase).await {
                    Ok(()) => Ok(LineOutcome::TermBlocked { phrase }),
                    Err(e) => {
                        tracing::warn!(%phrase, error = %e, "blocked term not added");
                        Ok(LineOutcome::TermBlockFailed {
                            phrase,
                            error: e.to_string(),
                        })
                    }
                }
            }
        }
    }

    async fn ban(
        &self,
        target: String,
        reason: Option<String>,
    ) -> Result<LineOutcome, BooperError> {
        let resolved = resolve_one(self.client.as_ref(), UserRef::Login(&target)).await?;
        let Some(user) = resolved else {
            tracing::debug!(%target, "ban target not found");
            return Ok(LineOutcome::BanTargetNotFound { target });
        };

        match self
            .client
            .ban_user(&self.session, &user.id, reason.as_deref())
            .await
        {
            Ok(()) => Ok(LineOutcome::Banned { target }),
            Err(e) => {
                tracing::warn!(%target, error = %e, "ban not applied");
                Ok(LineOutcome::BanFailed {
                    target,
                    error: e.to_string(),
                })
            }
        }
    }

    fn publish(&self, processed: usize, remaining: usize) -> Progress {
        let progress = Progress {
            processed,
            remaining,
            running: true,
        };
        self.progress.send_replace(progress);
        progress
    }

    fn emit(&self, event: DispatchEvent) {
        // The receiver may have been dropped; the run continues regardless.
        let _ = self.events.unbounded_send(event);
    }
}

fn marker(label: &str) -> String {
    format!("{}: {}", label, chrono::Local::now().format("%H:%M:%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitch::TwitchUser;
    use crate::twitch::fake::{Call, FakeChat};

    fn session() -> Session {
        Session::new(
            TwitchUser {
                id: "100".to_string(),
                login: "streamer".to_string(),
                display_name: "Streamer".to_string(),
            },
            TwitchUser {
                id: "200".to_string(),
                login: "modbot".to_string(),
                display_name: "ModBot".to_string(),
            },
        )
    }

    fn dispatcher(chat: Arc<FakeChat>, policy: FailurePolicy) -> CommandDispatcher {
        CommandDispatcher::new(chat, session(), policy)
    }

    async fn run_to_end(
        dispatcher: &CommandDispatcher,
        lines: &[&str],
        delay: Duration,
    ) -> (Vec<DispatchEvent>, DispatchReport) {
        let mut run = dispatcher
            .start(CommandQueue::new(lines.iter().copied()), delay)
            .unwrap();
        let mut events = Vec::new();
        while let Some(event) = run.next().await {
            events.push(event);
        }
        (events, run.finish().await.unwrap())
    }

    fn outcomes(events: &[DispatchEvent]) -> Vec<LineOutcome> {
        events
            .iter()
            .filter_map(|e| match e {
                DispatchEvent::LineDone { outcome, .. } => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_completes_every_line() {
        let chat = Arc::new(FakeChat::new().with_user("alice", "42"));
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);
        let lines = ["hello chat", "/ban alice spamming", "/add_blocked_term buy followers"];

        let (events, report) = run_to_end(&dispatcher, &lines, Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 3);
        assert!(report.pending.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(
            dispatcher.progress(),
            Progress {
                processed: 3,
                remaining: 0,
                running: false
            }
        );
        assert_eq!(
            outcomes(&events),
            vec![
                LineOutcome::Sent,
                LineOutcome::Banned {
                    target: "alice".to_string()
                },
                LineOutcome::TermBlocked {
                    phrase: "buy followers".to_string()
                },
            ]
        );
        assert!(chat.calls().contains(&Call::Ban {
            user_id: "42".to_string(),
            reason: Some("spamming".to_string())
        }));
        assert!(chat.calls().contains(&Call::Block("buy followers".to_string())));
    }

    #[tokio::test]
    async fn test_markers_bracket_a_run() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        run_to_end(&dispatcher, &["one", "two"], Duration::ZERO).await;

        let sent = chat.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent[0].starts_with("Started: "));
        assert_eq!(&sent[1..3], &["one".to_string(), "two".to_string()]);
        assert!(sent[3].starts_with("Completed: "));
    }

    #[tokio::test]
    async fn test_empty_queue_still_sends_markers() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) = run_to_end(&dispatcher, &[], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 0);
        assert_eq!(chat.sent().len(), 2);
        assert_eq!(events.first(), Some(&DispatchEvent::Started { total: 0 }));
        assert!(matches!(
            events.last(),
            Some(DispatchEvent::Completed { processed: 0, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_wait_keeps_remaining_lines() {
        let lines = ["l1", "l2", "l3", "l4", "l5"];

        for k in 1..=lines.len() {
            let chat = Arc::new(FakeChat::new());
            let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);
            let mut run = dispatcher
                .start(CommandQueue::new(lines), Duration::from_secs(1))
                .unwrap();

            let mut events = Vec::new();
            while let Some(event) = run.next().await {
                // Line k - 1 is done, so the worker is now waiting before line k.
                let waiting_before_k = match &event {
                    DispatchEvent::Started { .. } => k == 1,
                    DispatchEvent::LineDone { index, .. } => *index == k - 1,
                    _ => false,
                };
                events.push(event);
                if waiting_before_k {
                    dispatcher.stop();
                }
            }
            let report = run.finish().await.unwrap();

            assert_eq!(report.status, RunStatus::Aborted, "k = {k}");
            assert_eq!(report.processed, k - 1, "k = {k}");
            assert_eq!(report.pending, lines[k - 1..].to_vec(), "k = {k}");
            assert_eq!(
                events.last(),
                Some(&DispatchEvent::Aborted {
                    processed: k - 1,
                    remaining: lines.len() - (k - 1)
                })
            );
            assert!(!chat.sent().iter().any(|m| m.starts_with("Completed: ")));
            assert!(chat.sent()[0].starts_with("Started: "));
            assert!(!dispatcher.progress().running);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_does_not_wait_out_the_delay() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);
        let delay = Duration::from_secs(30);
        let started = tokio::time::Instant::now();

        let mut run = dispatcher.start(CommandQueue::new(["a", "b"]), delay).unwrap();
        assert_eq!(run.next().await, Some(DispatchEvent::Started { total: 2 }));
        dispatcher.stop();
        while run.next().await.is_some() {}
        let report = run.finish().await.unwrap();

        assert_eq!(report.processed, 0);
        assert!(started.elapsed() < delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_right_after_start_reaches_the_new_run() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        // A stop with no active run must not leak into the next one.
        dispatcher.stop();
        let (_, report) = run_to_end(&dispatcher, &["a"], Duration::ZERO).await;
        assert_eq!(report.status, RunStatus::Completed);

        let mut run = dispatcher
            .start(CommandQueue::new(["b", "c"]), Duration::from_secs(1))
            .unwrap();
        dispatcher.stop();
        while run.next().await.is_some() {}
        let report = run.finish().await.unwrap();

        assert_eq!(report.status, RunStatus::Aborted);
        assert_eq!(report.processed, 0);
        assert_eq!(report.pending, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_paces_each_line() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);
        let started = tokio::time::Instant::now();

        run_to_end(&dispatcher, &["a", "b", "c"], Duration::from_millis(2000)).await;

        assert!(started.elapsed() >= Duration::from_millis(6000));
    }

    #[tokio::test]
    async fn test_ban_without_target_makes_no_call() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) =
            run_to_end(&dispatcher, &["/ban ", "/add_blocked_term "], Duration::ZERO).await;

        assert_eq!(report.processed, 2);
        assert_eq!(outcomes(&events), vec![LineOutcome::Skipped, LineOutcome::Skipped]);
        // Only the two markers reach the service.
        assert_eq!(chat.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_ban_target_is_silent() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) = run_to_end(&dispatcher, &["/ban ghost"], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert!(report.failures.is_empty());
        assert_eq!(
            outcomes(&events),
            vec![LineOutcome::BanTargetNotFound {
                target: "ghost".to_string()
            }]
        );
        assert!(!chat.calls().iter().any(|c| matches!(c, Call::Ban { .. })));
        assert!(!events.iter().any(|e| matches!(e, DispatchEvent::LineFailed { .. })));
    }

    #[tokio::test]
    async fn test_ban_and_block_failures_are_swallowed() {
        let mut chat = FakeChat::new().with_user("alice", "42");
        chat.fail_bans = true;
        chat.fail_blocks = true;
        let chat = Arc::new(chat);
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Abort);

        let (events, report) = run_to_end(
            &dispatcher,
            &["/ban alice", "/add_blocked_term scam link", "after"],
            Duration::ZERO,
        )
        .await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 3);
        assert!(report.failures.is_empty());
        let outcomes = outcomes(&events);
        assert!(matches!(
            &outcomes[0],
            LineOutcome::BanFailed { target, .. } if target == "alice"
        ));
        assert!(matches!(
            &outcomes[1],
            LineOutcome::TermBlockFailed { phrase, .. } if phrase == "scam link"
        ));
        assert_eq!(outcomes[2], LineOutcome::Sent);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_and_run_continues() {
        let mut chat = FakeChat::new();
        chat.failing_sends = vec!["bad".to_string()];
        let chat = Arc::new(chat);
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) =
            run_to_end(&dispatcher, &["good", "bad", "also good"], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert_eq!(report.processed, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert!(events.iter().any(|e| matches!(
            e,
            DispatchEvent::LineFailed { index: 2, line, .. } if line == "bad"
        )));
        assert!(chat.sent().contains(&"also good".to_string()));
    }

    #[tokio::test]
    async fn test_send_failure_aborts_under_abort_policy() {
        let mut chat = FakeChat::new();
        chat.failing_sends = vec!["bad".to_string()];
        let chat = Arc::new(chat);
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Abort);

        let (_, report) = run_to_end(&dispatcher, &["good", "bad", "never"], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Aborted);
        assert_eq!(report.processed, 2);
        assert_eq!(report.pending, vec!["never".to_string()]);
        assert!(!chat.sent().contains(&"never".to_string()));
        assert!(!chat.sent().iter().any(|m| m.starts_with("Completed: ")));
    }

    #[tokio::test]
    async fn test_start_marker_failure_fails_run() {
        let mut chat = FakeChat::new();
        chat.failing_sends = vec!["Started: ".to_string()];
        let chat = Arc::new(chat);
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) = run_to_end(&dispatcher, &["a", "b"], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.processed, 0);
        assert_eq!(report.pending, vec!["a".to_string(), "b".to_string()]);
        assert!(matches!(events.as_slice(), [DispatchEvent::Failed { .. }]));
        assert_eq!(chat.sent().len(), 1);
        assert!(!dispatcher.progress().running);
    }

    #[tokio::test]
    async fn test_completion_marker_failure_still_completes() {
        let mut chat = FakeChat::new();
        chat.failing_sends = vec!["Completed: ".to_string()];
        let chat = Arc::new(chat);
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (events, report) = run_to_end(&dispatcher, &["a"], Duration::ZERO).await;

        assert_eq!(report.status, RunStatus::Completed);
        assert!(matches!(
            events.last(),
            Some(DispatchEvent::Completed {
                processed: 1,
                marker_error: Some(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_lines_each_dispatched_once() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let (_, report) = run_to_end(&dispatcher, &["gg", "gg", "gg"], Duration::ZERO).await;

        assert_eq!(report.processed, 3);
        assert_eq!(chat.sent().iter().filter(|m| *m == "gg").count(), 3);
    }

    #[tokio::test]
    async fn test_progress_counts_stay_balanced() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);
        let lines = ["a", "b", "c", "d"];

        let (events, _) = run_to_end(&dispatcher, &lines, Duration::ZERO).await;

        let mut last_processed = 0;
        for event in events {
            if let DispatchEvent::LineDone { progress, .. } = event {
                assert_eq!(progress.processed + progress.remaining, lines.len());
                assert!(progress.processed > last_processed);
                assert!(progress.running);
                last_processed = progress.processed;
            }
        }
        assert_eq!(last_processed, lines.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_while_running_is_rejected() {
        let chat = Arc::new(FakeChat::new());
        let dispatcher = dispatcher(chat.clone(), FailurePolicy::Continue);

        let mut run = dispatcher
            .start(CommandQueue::new(["a"]), Duration::from_secs(5))
            .unwrap();
        assert!(dispatcher.progress().running);
        assert!(matches!(
            dispatcher.start(CommandQueue::new(["b"]), Duration::ZERO),
            Err(BooperError::AlreadyRunning)
        ));

        while run.next().await.is_some() {}
        run.finish().await.unwrap();

        assert!(!dispatcher.progress().running);
        let (_, report) = run_to_end(&dispatcher, &["b"], Duration::ZERO).await;
        assert_eq!(report.status, RunStatus::Completed);
    }
}
