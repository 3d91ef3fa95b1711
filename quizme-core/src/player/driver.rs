//! Event loop around the player state machine
//!
//! All transitions are serialized through one queue. Timers are spawned
//! tokio tasks that only post events into that queue; their handles are
//! owned here and aborted whenever the state they were started for goes
//! away (restart, completion, teardown).

use super::session::{Advance, LoadError, Player};
use super::PlayerConfig;
use crate::types::EmbedQuiz;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, trace};

/// User actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Select an option of the current question
    Select(String),
    /// Check the selected option
    Check,
    /// Skip the current question
    Skip,
    /// Start over
    Restart,
}

/// Everything the driver reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Outcome of the initial fetch
    Loaded(Result<EmbedQuiz, LoadError>),
    /// A user action
    Command(Command),
    /// Elapsed-time tick from the ticker of `generation`
    Tick {
        /// Generation the ticker was started in
        generation: u64,
    },
    /// Deferred advance after a check
    Advance {
        /// Generation the advance was scheduled in
        generation: u64,
        /// Question index the advance was scheduled for
        index: usize,
    },
}

/// What handling an event did to the visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Nothing changed
    Ignored,
    /// Only the elapsed counter moved
    Ticked,
    /// Something the player can see changed
    Changed,
}

/// Handle to a spawned timer task; aborts the task when dropped
#[derive(Debug)]
pub struct TaskHandle(JoinHandle<()>);

impl TaskHandle {
    fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        TaskHandle(tokio::spawn(future))
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Owns a [`Player`] and the timers acting on it
pub struct PlayerDriver {
    player: Player,
    config: PlayerConfig,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    ticker: Option<TaskHandle>,
    pending_advance: Option<TaskHandle>,
    generation: u64,
}

impl PlayerDriver {
    /// Create a driver in the `Loading` state
    pub fn new(config: PlayerConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        PlayerDriver {
            player: Player::Loading,
            config,
            tx,
            rx,
            ticker: None,
            pending_advance: None,
            generation: 0,
        }
    }

    /// Current player state
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Sender for feeding events from other tasks
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Whether an elapsed-time ticker is running
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether a deferred advance is scheduled
    pub fn has_pending_advance(&self) -> bool {
        self.pending_advance.is_some()
    }

    /// Wait for the next queued event and handle it
    pub async fn step(&mut self) -> Option<Update> {
        let event = self.rx.recv().await?;
        Some(self.handle(event))
    }

    /// Apply one event
    ///
    /// Must be called from within a tokio runtime, since it may start timers.
    pub fn handle(&mut self, event: Event) -> Update {
        trace!("Player event: {:?}", event);

        match event {
            Event::Loaded(outcome) => self.on_loaded(outcome),
            Event::Command(command) => self.on_command(command),
            Event::Tick { generation } => {
                if generation != self.generation {
                    return Update::Ignored;
                }
                match self.player.session_mut().map(|session| session.tick()) {
                    Some(true) => Update::Ticked,
                    _ => Update::Ignored,
                }
            }
            Event::Advance { generation, index } => {
                let current = self
                    .player
                    .session()
                    .map(|s| (s.index(), s.correctness().is_answered()));
                if generation != self.generation || current != Some((index, true)) {
                    debug!("Dropping stale advance for question {}", index);
                    return Update::Ignored;
                }
                self.pending_advance = None;
                self.advance();
                Update::Changed
            }
        }
    }

    /// Stop every timer; the player state is kept as-is
    pub fn shutdown(&mut self) {
        self.ticker = None;
        self.pending_advance = None;
    }

    fn on_loaded(&mut self, outcome: Result<EmbedQuiz, LoadError>) -> Update {
        if !matches!(self.player, Player::Loading) {
            return Update::Ignored;
        }
        self.player.finish_loading(outcome);
        if self.player.session().is_some() {
            self.start_ticker();
        }
        Update::Changed
    }

    fn on_command(&mut self, command: Command) -> Update {
        let Some(session) = self.player.session_mut() else {
            return Update::Ignored;
        };

        match command {
            Command::Select(option) => {
                if session.select_answer(&option) {
                    Update::Changed
                } else {
                    Update::Ignored
                }
            }
            Command::Check => {
                let index = session.index();
                match session.check_answer() {
                    Some(correctness) => {
                        debug!("Question {} checked: {:?}", index, correctness);
                        self.schedule_advance(index);
                        Update::Changed
                    }
                    None => Update::Ignored,
                }
            }
            Command::Skip => match session.skip_question() {
                Some(advance) => {
                    self.pending_advance = None;
                    if advance == Advance::Completed {
                        self.ticker = None;
                    }
                    Update::Changed
                }
                None => Update::Ignored,
            },
            Command::Restart => {
                session.restart();
                self.generation += 1;
                self.pending_advance = None;
                self.start_ticker();
                debug!("Session restarted (generation {})", self.generation);
                Update::Changed
            }
        }
    }

    fn schedule_advance(&mut self, index: usize) {
        if self.config.advance_delay.is_zero() {
            self.advance();
            return;
        }

        let tx = self.tx.clone();
        let delay = self.config.advance_delay;
        let generation = self.generation;
        self.pending_advance = Some(TaskHandle::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(Event::Advance { generation, index });
        }));
    }

    fn advance(&mut self) {
        if let Some(session) = self.player.session_mut() {
            if session.advance() == Advance::Completed {
                debug!("Quiz complete with score {}", session.score());
                self.ticker = None;
            }
        }
    }

    fn start_ticker(&mut self) {
        let tx = self.tx.clone();
        let period = self.config.tick_interval;
        let generation = self.generation;

        // Replacing the handle aborts the previous ticker.
        self.ticker = Some(TaskHandle::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(Event::Tick { generation }).is_err() {
                    break;
                }
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::session::{Correctness, UNAVAILABLE_MESSAGE};
    use crate::types::Question;
    use std::time::Duration;

    fn quiz(len: usize) -> EmbedQuiz {
        let questions = (0..len)
            .map(|i| {
                Question::new(
                    format!("Question {}?", i + 1),
                    vec!["A".into(), "B".into(), "C".into()],
                    ["A", "B", "C"][i % 3],
                )
            })
            .collect();
        EmbedQuiz {
            id: "drv".into(),
            name: "Driver".into(),
            questions,
            total_questions: len,
            allowed_embed_domains: Vec::new(),
        }
    }

    fn loaded(len: usize) -> PlayerDriver {
        let mut driver = PlayerDriver::new(PlayerConfig::default());
        driver.handle(Event::Loaded(Ok(quiz(len))));
        driver
    }

    async fn run_for(driver: &mut PlayerDriver, duration: Duration) {
        let deadline = Instant::now() + duration;
        while let Ok(Some(_)) = tokio::time::timeout_at(deadline, driver.step()).await {}
    }

    fn cmd(driver: &mut PlayerDriver, command: Command) -> Update {
        driver.handle(Event::Command(command))
    }

    fn session(driver: &PlayerDriver) -> &crate::player::Session {
        driver.player().session().expect("session")
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_counts_seconds() {
        let mut driver = loaded(3);
        assert!(driver.is_ticking());

        run_for(&mut driver, Duration::from_millis(3_500)).await;
        assert_eq!(session(&driver).elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_advances_after_delay() {
        let mut driver = loaded(3);
        cmd(&mut driver, Command::Select("A".into()));
        assert_eq!(cmd(&mut driver, Command::Check), Update::Changed);
        assert!(driver.has_pending_advance());

        run_for(&mut driver, Duration::from_millis(1_200)).await;
        assert_eq!(session(&driver).index(), 0);
        assert_eq!(session(&driver).correctness(), Correctness::Correct);

        run_for(&mut driver, Duration::from_millis(500)).await;
        assert_eq!(session(&driver).index(), 1);
        assert_eq!(session(&driver).selected(), None);
        assert_eq!(session(&driver).correctness(), Correctness::Unanswered);
        assert!(!driver.has_pending_advance());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_leaves_single_ticker() {
        let mut driver = loaded(3);
        run_for(&mut driver, Duration::from_millis(2_500)).await;
        assert_eq!(session(&driver).elapsed_secs(), 2);

        cmd(&mut driver, Command::Restart);
        assert_eq!(session(&driver).elapsed_secs(), 0);
        assert!(driver.is_ticking());

        run_for(&mut driver, Duration::from_millis(3_500)).await;
        assert_eq!(session(&driver).elapsed_secs(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_pending_advance() {
        let mut driver = loaded(3);
        cmd(&mut driver, Command::Select("A".into()));
        cmd(&mut driver, Command::Check);
        cmd(&mut driver, Command::Restart);
        assert!(!driver.has_pending_advance());

        run_for(&mut driver, Duration::from_secs(2)).await;
        let s = session(&driver);
        assert_eq!(s.index(), 0);
        assert_eq!(s.score(), 0);
        assert_eq!(s.correctness(), Correctness::Unanswered);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_during_feedback_drops_advance() {
        let mut driver = loaded(3);
        cmd(&mut driver, Command::Select("A".into()));
        cmd(&mut driver, Command::Check);
        cmd(&mut driver, Command::Skip);
        assert_eq!(session(&driver).index(), 1);

        run_for(&mut driver, Duration::from_secs(2)).await;
        assert_eq!(session(&driver).index(), 1);
        assert_eq!(session(&driver).score(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_events_are_ignored() {
        let mut driver = loaded(3);
        cmd(&mut driver, Command::Restart);

        assert_eq!(driver.handle(Event::Tick { generation: 0 }), Update::Ignored);
        assert_eq!(
            driver.handle(Event::Advance {
                generation: 1,
                index: 0
            }),
            Update::Ignored
        );
        assert_eq!(session(&driver).elapsed_secs(), 0);
        assert_eq!(session(&driver).index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_stops_ticker() {
        let mut driver = loaded(1);
        run_for(&mut driver, Duration::from_millis(1_500)).await;
        cmd(&mut driver, Command::Skip);

        assert!(session(&driver).is_complete());
        assert!(!driver.is_ticking());

        run_for(&mut driver, Duration::from_secs(3)).await;
        assert_eq!(session(&driver).elapsed_secs(), 1);
    }

    #[tokio::test]
    async fn test_zero_delay_scores_and_completes() {
        let config = PlayerConfig {
            advance_delay: Duration::ZERO,
            ..PlayerConfig::default()
        };
        let mut driver = PlayerDriver::new(config);
        driver.handle(Event::Loaded(Ok(quiz(3))));

        cmd(&mut driver, Command::Select("A".into()));
        cmd(&mut driver, Command::Check);
        cmd(&mut driver, Command::Select("B".into()));
        cmd(&mut driver, Command::Check);
        cmd(&mut driver, Command::Skip);

        let stats = session(&driver).stats().expect("complete");
        assert_eq!(stats.correct, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.percentage(), 67);
        assert!(!driver.is_ticking());
    }

    #[tokio::test]
    async fn test_load_failure_never_ready() {
        let mut driver = PlayerDriver::new(PlayerConfig::default());
        driver.handle(Event::Loaded(Err(LoadError::Status(404))));

        assert_eq!(driver.player().error_message(), Some(UNAVAILABLE_MESSAGE));
        assert!(!driver.is_ticking());
        assert_eq!(cmd(&mut driver, Command::Skip), Update::Ignored);
        assert_eq!(
            driver.handle(Event::Loaded(Ok(quiz(2)))),
            Update::Ignored
        );
    }

    #[tokio::test]
    async fn test_shutdown_stops_timers() {
        let mut driver = loaded(2);
        cmd(&mut driver, Command::Select("A".into()));
        cmd(&mut driver, Command::Check);
        driver.shutdown();
        assert!(!driver.is_ticking());
        assert!(!driver.has_pending_advance());
    }
}
