//! Batch Coordinator
//!
//! Collects admitted requests into batches and hands each closed batch to a
//! [`BatchDispatcher`]. A batch closes when it reaches the policy's
//! `max_size`, when `max_wait` has elapsed since its first arrival, or when
//! the coordinator drains for shutdown.
//!
//! The intake loop is the only owner of the in-progress batch. Callers talk
//! to it through a [`CoordinatorHandle`] and wait on a [`PendingAnswer`].
//! Completion handles never leave the coordinator: outcomes returned by the
//! dispatcher are paired with them by position.

use crate::ports::batch_dispatcher::{BatchDispatcher, BatchItem};
use crate::use_cases::shared::{AskError, Outcome};
use chrono::Utc;
use counsel_domain::{BatchPolicy, CloseReason, Question, UserDirectory};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Admission limits for the coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Maximum number of admitted but unresolved requests. `None` is unbounded.
    pub max_pending: Option<usize>,
}

impl CoordinatorOptions {
    pub fn with_max_pending(mut self, max_pending: Option<usize>) -> Self {
        self.max_pending = max_pending;
        self
    }
}

/// Single-use completion handle for one admitted request.
///
/// `resolve` consumes the resolver, so an answer is delivered at most once.
/// Dropping a resolver without resolving it wakes the waiter with
/// [`AskError::Abandoned`]. Either way the pending slot is released exactly
/// once, before the waiter can observe the outcome.
struct Resolver {
    sender: Option<oneshot::Sender<Outcome>>,
    pending: Arc<AtomicUsize>,
}

impl Resolver {
    fn resolve(mut self, outcome: Outcome) {
        if let Some(sender) = self.sender.take() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            // The caller may have stopped waiting; nothing to do then.
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// A request that passed admission and waits for its batch
struct Admitted {
    item: BatchItem,
    resolver: Resolver,
}

/// The caller's side of an admitted request.
///
/// Resolves exactly once with the answer or the reason there is none.
#[derive(Debug)]
pub struct PendingAnswer {
    id: Uuid,
    receiver: oneshot::Receiver<Outcome>,
}

impl PendingAnswer {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Future for PendingAnswer {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Outcome> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(AskError::Abandoned)))
    }
}

/// Cloneable entry point to a running coordinator
#[derive(Clone)]
pub struct CoordinatorHandle {
    intake: mpsc::UnboundedSender<Admitted>,
    directory: Arc<UserDirectory>,
    pending: Arc<AtomicUsize>,
    options: CoordinatorOptions,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl CoordinatorHandle {
    /// Admit a request and return the handle to wait on.
    ///
    /// Unknown users and blank questions are rejected here, before they
    /// occupy a batch slot.
    pub fn submit(&self, user: &str, question: &str) -> Result<PendingAnswer, AskError> {
        if self.cancel.is_cancelled() {
            return Err(AskError::ShuttingDown);
        }

        let (user, role) = self.directory.resolve(user).inspect_err(|_| {
            debug!("Rejected request from unknown user '{}'", user);
        })?;
        let question = Question::try_new(question)?;

        self.reserve_slot()?;
        let (sender, receiver) = oneshot::channel();
        let resolver = Resolver {
            sender: Some(sender),
            pending: Arc::clone(&self.pending),
        };

        let id = Uuid::new_v4();
        let item = BatchItem {
            id,
            user,
            role,
            question,
            arrived_at: Utc::now(),
        };
        debug!(request_id = %id, user = %item.user, "Request admitted");

        // A refused send drops the resolver, which releases the slot.
        self.intake
            .send(Admitted { item, resolver })
            .map_err(|_| AskError::ShuttingDown)?;

        Ok(PendingAnswer { id, receiver })
    }

    /// Submit and wait for the outcome
    pub async fn ask(&self, user: &str, question: &str) -> Outcome {
        self.submit(user, question)?.await
    }

    /// Number of admitted requests that are not yet resolved
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop admitting, dispatch whatever is queued, and wait for every
    /// in-flight batch to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn reserve_slot(&self) -> Result<(), AskError> {
        match self.options.max_pending {
            Some(max) => self
                .pending
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < max).then_some(n + 1)
                })
                .map(|_| ())
                .map_err(|current| {
                    warn!("Request queue full ({} pending)", current);
                    AskError::QueueFull(current)
                }),
            None => {
                self.pending.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

/// The intake loop that forms batches
pub struct BatchCoordinator {
    intake: mpsc::UnboundedReceiver<Admitted>,
    dispatcher: Arc<dyn BatchDispatcher>,
    policy: BatchPolicy,
    cancel: CancellationToken,
    tracker: TaskTracker,
    batch: Vec<Admitted>,
    deadline: Option<Instant>,
    next_batch_id: u64,
}

impl BatchCoordinator {
    /// Start the intake loop on the current runtime.
    ///
    /// Cancelling `cancel` has the same effect as [`CoordinatorHandle::shutdown`]
    /// except that nothing waits for the drain.
    pub fn spawn(
        dispatcher: Arc<dyn BatchDispatcher>,
        directory: Arc<UserDirectory>,
        policy: BatchPolicy,
        options: CoordinatorOptions,
        cancel: CancellationToken,
    ) -> CoordinatorHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tracker = TaskTracker::new();

        let coordinator = Self {
            intake: receiver,
            dispatcher,
            policy,
            cancel: cancel.clone(),
            tracker: tracker.clone(),
            batch: Vec::with_capacity(policy.max_size()),
            deadline: None,
            next_batch_id: 1,
        };
        tracker.spawn(coordinator.run());

        info!(
            "Batch coordinator started (max_size={}, max_wait={:?}, max_pending={:?})",
            policy.max_size(),
            policy.max_wait(),
            options.max_pending
        );

        CoordinatorHandle {
            intake: sender,
            directory,
            pending: Arc::new(AtomicUsize::new(0)),
            options,
            cancel,
            tracker,
        }
    }

    async fn run(mut self) {
        let mut draining = false;

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled(), if !draining => {
                    draining = true;
                    // Queued requests are still delivered by recv below.
                    self.intake.close();
                    info!("Batch coordinator draining");
                }

                _ = sleep_until(self.deadline.unwrap_or_else(Instant::now)), if self.deadline.is_some() => {
                    self.close_batch(CloseReason::Timeout);
                }

                received = self.intake.recv() => match received {
                    Some(admitted) => {
                        if self.batch.is_empty() {
                            self.deadline = Some(Instant::now() + self.policy.max_wait());
                        }
                        self.batch.push(admitted);
                        if self.policy.is_full(self.batch.len()) {
                            self.close_batch(CloseReason::Size);
                        }
                    }
                    None => {
                        if !self.batch.is_empty() {
                            self.close_batch(CloseReason::Shutdown);
                        }
                        break;
                    }
                },
            }
        }

        info!("Batch coordinator stopped");
    }

    /// Hand the in-progress batch to a new task and start an empty one.
    fn close_batch(&mut self, reason: CloseReason) {
        let members = std::mem::replace(
            &mut self.batch,
            Vec::with_capacity(self.policy.max_size()),
        );
        self.deadline = None;

        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        info!(batch_id, size = members.len(), %reason, "Batch closed");

        let dispatcher = Arc::clone(&self.dispatcher);
        self.tracker.spawn(Self::run_batch(batch_id, dispatcher, members));
    }

    /// Dispatch one batch and resolve every member exactly once.
    async fn run_batch(
        batch_id: u64,
        dispatcher: Arc<dyn BatchDispatcher>,
        members: Vec<Admitted>,
    ) {
        let (items, resolvers): (Vec<BatchItem>, Vec<Resolver>) = members
            .into_iter()
            .map(|admitted| (admitted.item, admitted.resolver))
            .unzip();
        let expected = items.len();

        // A panicking dispatcher must not leave the batch unresolved.
        let joined = tokio::spawn(async move { dispatcher.dispatch(items).await }).await;

        let outcomes = match joined {
            Ok(Ok(outcomes)) if outcomes.len() == expected => outcomes,
            Ok(Ok(outcomes)) => {
                error!(
                    batch_id,
                    "Dispatcher returned {} outcome(s) for {} request(s)",
                    outcomes.len(),
                    expected
                );
                vec![
                    Err(AskError::BatchDispatchFailure(
                        "dispatcher returned the wrong number of outcomes".to_string()
                    ));
                    expected
                ]
            }
            Ok(Err(e)) => {
                error!(batch_id, "Batch dispatch failed: {}", e);
                vec![Err(AskError::from(e)); expected]
            }
            Err(e) => {
                error!(batch_id, "Batch dispatch task failed: {}", e);
                vec![Err(AskError::BatchDispatchFailure(e.to_string())); expected]
            }
        };

        for (resolver, outcome) in resolvers.into_iter().zip(outcomes) {
            resolver.resolve(outcome);
        }
        debug!(batch_id, "Batch resolved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::batch_dispatcher::BatchDispatchError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Copy)]
    enum Mode {
        Echo,
        Fail,
        Panic,
        ShortCount,
    }

    /// Records each batch it receives together with the (paused) clock.
    struct RecordingDispatcher {
        mode: Mode,
        started: Instant,
        batches: Mutex<Vec<(Duration, Vec<String>)>>,
    }

    impl RecordingDispatcher {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                started: Instant::now(),
                batches: Mutex::new(Vec::new()),
            })
        }

        fn batches(&self) -> Vec<(Duration, Vec<String>)> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BatchDispatcher for RecordingDispatcher {
        async fn dispatch(
            &self,
            batch: Vec<BatchItem>,
        ) -> Result<Vec<Outcome>, BatchDispatchError> {
            let users: Vec<String> = batch.iter().map(|item| item.user.to_string()).collect();
            self.batches
                .lock()
                .unwrap()
                .push((self.started.elapsed(), users));

            match self.mode {
                Mode::Echo => Ok(batch
                    .iter()
                    .map(|item| Ok(format!("{}: {}", item.user, item.question)))
                    .collect()),
                Mode::Fail => Err(BatchDispatchError("model crashed".to_string())),
                Mode::Panic => panic!("dispatcher exploded"),
                Mode::ShortCount => Ok(vec![Ok("only one".to_string())]),
            }
        }
    }

    fn start(dispatcher: Arc<RecordingDispatcher>, options: CoordinatorOptions) -> CoordinatorHandle {
        BatchCoordinator::spawn(
            dispatcher,
            Arc::new(UserDirectory::default()),
            BatchPolicy::default(),
            options,
            CancellationToken::new(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_batch_dispatches_without_waiting() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let (a, b, c) = tokio::join!(
            handle.ask("Linda", "How do I study?"),
            handle.ask("Miguel", "How do I help?"),
            handle.ask("Mike", "Best workout?"),
        );

        assert_eq!(a.unwrap(), "Linda: How do I study?");
        assert_eq!(b.unwrap(), "Miguel: How do I help?");
        assert_eq!(c.unwrap(), "Mike: Best workout?");

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].1, vec!["Linda", "Miguel", "Mike"]);
        assert!(batches[0].0 < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_request_waits_for_max_wait() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let answer = handle.ask("Mike", "Hello").await;

        assert_eq!(answer.unwrap(), "Mike: Hello");
        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].0 >= Duration::from_secs(2));
        assert!(batches[0].0 < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_starts_a_new_batch() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let answers = futures::future::join_all(vec![
            handle.submit("Linda", "one").unwrap(),
            handle.submit("Miguel", "two").unwrap(),
            handle.submit("Mike", "three").unwrap(),
            handle.submit("Linda", "four").unwrap(),
        ])
        .await;

        assert!(answers.iter().all(|a| a.is_ok()));
        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].1.len(), 3);
        assert_eq!(batches[1].1, vec!["Linda"]);
        assert!(batches[1].0 >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_restarts_with_the_next_batch() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        handle.ask("Linda", "first").await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.ask("Mike", "second").await.unwrap();

        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 2);
        let gap = batches[1].0 - batches[0].0;
        assert!(gap >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_user_consumes_no_slot() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let result = handle.submit("Zed", "Hello");

        assert_eq!(result.unwrap_err(), AskError::UnknownUser("Zed".to_string()));
        assert_eq!(handle.pending(), 0);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(dispatcher.batches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_question_is_rejected() {
        let handle = start(RecordingDispatcher::new(Mode::Echo), CoordinatorOptions::default());

        let result = handle.submit("Linda", "   ");

        assert!(matches!(result, Err(AskError::InvalidQuestion(_))));
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_error_resolves_every_member() {
        let handle = start(RecordingDispatcher::new(Mode::Fail), CoordinatorOptions::default());

        let (a, b) = tokio::join!(handle.ask("Linda", "one"), handle.ask("Mike", "two"));

        assert_eq!(
            a,
            Err(AskError::BatchDispatchFailure("model crashed".to_string()))
        );
        assert_eq!(b, a);
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_panic_resolves_every_member() {
        let handle = start(RecordingDispatcher::new(Mode::Panic), CoordinatorOptions::default());

        let (a, b, c) = tokio::join!(
            handle.ask("Linda", "one"),
            handle.ask("Miguel", "two"),
            handle.ask("Mike", "three"),
        );

        for outcome in [a, b, c] {
            assert!(matches!(outcome, Err(AskError::BatchDispatchFailure(_))));
        }
        assert_eq!(handle.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_outcome_count_mismatch_fails_the_batch() {
        let handle = start(
            RecordingDispatcher::new(Mode::ShortCount),
            CoordinatorOptions::default(),
        );

        let (a, b) = tokio::join!(handle.ask("Linda", "one"), handle.ask("Mike", "two"));

        assert!(matches!(a, Err(AskError::BatchDispatchFailure(_))));
        assert!(matches!(b, Err(AskError::BatchDispatchFailure(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queue_full_rejects_until_slots_free_up() {
        let handle = start(
            RecordingDispatcher::new(Mode::Echo),
            CoordinatorOptions::default().with_max_pending(Some(2)),
        );

        let first = handle.submit("Linda", "one").unwrap();
        let second = handle.submit("Mike", "two").unwrap();
        assert_eq!(handle.pending(), 2);
        assert_eq!(handle.submit("Miguel", "three").unwrap_err(), AskError::QueueFull(2));

        first.await.unwrap();
        second.await.unwrap();
        assert_eq!(handle.pending(), 0);
        assert!(handle.submit("Miguel", "three").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drains_queued_requests() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let pending = handle.submit("Linda", "still answered?").unwrap();
        handle.shutdown().await;

        assert_eq!(pending.await.unwrap(), "Linda: still answered?");
        let batches = dispatcher.batches();
        assert_eq!(batches.len(), 1);
        assert!(batches[0].0 < Duration::from_secs(2));

        assert_eq!(
            handle.submit("Mike", "too late").unwrap_err(),
            AskError::ShuttingDown
        );
        assert!(handle.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_waiter_does_not_disturb_siblings() {
        let dispatcher = RecordingDispatcher::new(Mode::Echo);
        let handle = start(dispatcher.clone(), CoordinatorOptions::default());

        let dropped = handle.submit("Linda", "never mind").unwrap();
        drop(dropped);
        let answer = handle.ask("Mike", "still here").await;

        assert_eq!(answer.unwrap(), "Mike: still here");
        assert_eq!(handle.pending(), 0);
        assert_eq!(dispatcher.batches()[0].1.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slot_is_free_once_the_answer_arrives() {
        let handle = BatchCoordinator::spawn(
            RecordingDispatcher::new(Mode::Echo),
            Arc::new(UserDirectory::default()),
            BatchPolicy::new(1, Duration::from_secs(2)).unwrap(),
            CoordinatorOptions::default().with_max_pending(Some(1)),
            CancellationToken::new(),
        );

        for i in 0..50 {
            let answer = handle.ask("Linda", &format!("question {}", i)).await;
            assert_eq!(answer.unwrap(), format!("Linda: question {}", i));
            assert_eq!(handle.pending(), 0);
        }
    }

    #[test]
    fn test_resolver_releases_slot_once() {
        let (sender, mut receiver) = oneshot::channel();
        let pending = Arc::new(AtomicUsize::new(1));
        let resolver = Resolver {
            sender: Some(sender),
            pending: Arc::clone(&pending),
        };

        resolver.resolve(Ok("done".to_string()));

        assert_eq!(pending.load(Ordering::SeqCst), 0);
        assert_eq!(receiver.try_recv().unwrap(), Ok("done".to_string()));
    }

    #[tokio::test]
    async fn test_unresolved_handle_surfaces_abandoned() {
        let (sender, receiver) = oneshot::channel();
        let pending = Arc::new(AtomicUsize::new(1));
        let resolver = Resolver {
            sender: Some(sender),
            pending: Arc::clone(&pending),
        };
        let answer = PendingAnswer {
            id: Uuid::new_v4(),
            receiver,
        };

        drop(resolver);

        assert_eq!(answer.await, Err(AskError::Abandoned));
        assert_eq!(pending.load(Ordering::SeqCst), 0);
    }
}
