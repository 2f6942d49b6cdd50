//! Roguequiz Game Engine
//!
//! Platform-agnostic core of the roguelike quiz mode: procedural stage maps,
//! the run state machine, answer scoring, reward boxes and the end-of-run
//! roulette. This crate has no UI or persistence; both are reached through the
//! sink traits below.

pub mod answer;
#[cfg(feature = "async")]
pub mod channel;
pub mod config;
pub mod constants;
pub mod elite;
pub mod event;
pub mod map;
pub mod numbers;
pub mod pool;
pub mod quiz;
pub mod reward;
pub mod rng;
pub mod roulette;
pub mod seed;
pub mod session;
pub mod stage;
pub mod timer;

// Re-export commonly used types
pub use answer::{Answer, AnswerInput, Verdict, time_points, validate};
#[cfg(feature = "async")]
pub use channel::{ChannelSink, ChannelSinkError};
pub use config::{
    ConfigError, EdgeTuning, PointRange, RewardTuning, RouletteTuning, RunConfig, StageMix,
};
pub use elite::{EliteError, EliteGauntlet, EliteOutcome, ElitePhase, EliteStep};
pub use event::{ActivityRecord, Command, ScoringStatus};
pub use map::{
    EdgeKind, MapEdge, MapGraphBuilder, MapNode, MapViolation, NodeId, Position, StageMap,
};
pub use pool::QuestionPools;
pub use quiz::{MatchType, Question, QuestionBody, QuestionKind, Quiz, QuizError};
pub use reward::{BuffEffect, RewardBox, RewardError, RewardGrant, RewardKind, TemporaryBuff};
pub use rng::{CountingRng, RngBundle};
pub use roulette::{
    ActivityBonus, RouletteEffect, RouletteError, RouletteResult, RouletteTable, ticket_count,
};
pub use seed::{decode_run_code, encode_run_code, generate_run_code};
pub use session::{GameSession, GameState, RunSession, SessionError, TransitionError};
pub use stage::{Stage, StageType};
pub use timer::{CountdownTimer, TimerTick};

/// Trait for the activity-logging collaborator
/// Platform-specific implementations should provide this
pub trait ActivitySink {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Record one answered question or settled reward
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be delivered.
    fn log_activity(&self, record: &ActivityRecord) -> Result<(), Self::Error>;
}

/// Trait for the score-publication collaborator
pub trait ScorePublisher {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publish the finalized score of a run
    ///
    /// # Errors
    ///
    /// Returns an error if the score could not be published.
    fn publish_score(&self, final_score: i64) -> Result<(), Self::Error>;
}

/// Delivery counts from draining a session outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DispatchReport {
    pub const fn absorb(&mut self, other: Self) {
        self.delivered += other.delivered;
        self.failed += other.failed;
    }
}

/// Main engine for creating runs and delivering their commands
pub struct GameEngine<A, P>
where
    A: ActivitySink,
    P: ScorePublisher,
{
    activity: A,
    publisher: P,
    config: RunConfig,
}

impl<A, P> GameEngine<A, P>
where
    A: ActivitySink,
    P: ScorePublisher,
{
    /// Create an engine with the default run configuration
    pub fn new(activity: A, publisher: P) -> Self {
        Self::with_config(activity, publisher, RunConfig::default())
    }

    pub const fn with_config(activity: A, publisher: P, config: RunConfig) -> Self {
        Self {
            activity,
            publisher,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Create a new run over `quiz` with the given seed
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the quiz has no
    /// usable questions.
    pub fn create_run(&self, quiz: Quiz, seed: u64) -> Result<RunSession, SessionError> {
        RunSession::new(quiz, self.config.clone(), seed)
    }

    /// Create a run from a shareable run code, overriding the round count.
    ///
    /// Returns `None` when the code does not decode.
    #[must_use]
    pub fn create_run_from_code(
        &self,
        quiz: Quiz,
        code: &str,
    ) -> Option<Result<RunSession, SessionError>> {
        let (rounds, seed) = decode_run_code(code)?;
        let config = self.config.clone().with_rounds(rounds);
        Some(RunSession::new(quiz, config, seed))
    }

    /// Deliver every queued command of `run`. Failures are logged and dropped;
    /// the run itself is never affected.
    pub fn flush(&self, run: &mut RunSession) -> DispatchReport {
        self.dispatch(run.drain_commands())
    }

    pub fn dispatch(&self, commands: impl IntoIterator<Item = Command>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for command in commands {
            let outcome = match &command {
                Command::LogActivity(record) => self
                    .activity
                    .log_activity(record)
                    .map_err(|err| err.to_string()),
                Command::PublishScore { final_score } => self
                    .publisher
                    .publish_score(*final_score)
                    .map_err(|err| err.to_string()),
            };
            match outcome {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    log::warn!("dropping {} command: {err}", command.kind());
                    report.failed += 1;
                }
            }
        }
        report
    }
}
