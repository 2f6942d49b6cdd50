//! Run state machine.
//!
//! [`RunSession`] owns one run: the generated map, the question timer, the
//! elite gauntlet and reward box of the active stage, and the end-of-run
//! roulette. Every transition is a synchronous in-memory update; rejected
//! transitions leave the session untouched. Work for external collaborators is
//! queued as [`Command`]s and drained by the caller.
//!
//! An answered campfire opens a multiplier reward box before the player
//! returns to map selection, like a cleared normal or elite stage does.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::answer::{self, Answer, AnswerInput};
use crate::config::{ConfigError, RunConfig};
use crate::elite::{EliteError, EliteGauntlet, EliteOutcome, EliteStep};
use crate::event::{Command, ScoringStatus};
use crate::map::{MapGraphBuilder, MapViolation, NodeId, StageMap};
use crate::numbers::floor_f64_to_i64;
use crate::pool::QuestionPools;
use crate::quiz::{Question, Quiz};
use crate::reward::{self, RewardBox, RewardError, RewardGrant, TemporaryBuff};
use crate::rng::RngBundle;
use crate::roulette::{ActivityBonus, RouletteError, RouletteResult, RouletteTable, ticket_count};
use crate::stage::{Stage, StageType};
use crate::timer::{CountdownTimer, TimerTick};

/// Top-level run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameState {
    MapSelection,
    StageActive,
    RewardBox,
    Completed,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MapSelection => "map-selection",
            Self::StageActive => "stage-active",
            Self::RewardBox => "reward-box",
            Self::Completed => "completed",
        })
    }
}

/// A transition the current state does not allow. The session is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{action} is not allowed during {state}")]
    WrongState {
        action: &'static str,
        state: GameState,
    },
    #[error("{to} is not reachable from {from}")]
    NotAdjacent { from: NodeId, to: NodeId },
    #[error("no reward is waiting to be opened")]
    NoPendingReward,
    #[error("the active stage has no question to answer")]
    NoActiveQuestion,
    #[error(transparent)]
    Elite(#[from] EliteError),
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error(transparent)]
    Roulette(#[from] RouletteError),
    #[error("run has already been finalized")]
    AlreadyFinalized,
}

/// Why a run could not be created.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("quiz has no questions any stage can use")]
    EmptyQuiz,
    #[error("generated map is malformed: {0:?}")]
    MalformedMap(Vec<MapViolation>),
}

/// Mutable run record. Mutated only through [`RunSession`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub current_node: NodeId,
    pub base_score: i64,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    pub buffs: Vec<TemporaryBuff>,
    pub state: GameState,
    pub waiting_for_reward: bool,
    pub pending_answer: Option<Answer>,
    pub participated_in_opinion: bool,
    pub answers: Vec<Answer>,
    pub total_answer_secs: f64,
    pub final_score: Option<i64>,
    /// Milliseconds of session time advanced through [`RunSession::tick`].
    pub clock_ms: u64,
}

impl GameSession {
    fn new(start: NodeId) -> Self {
        Self {
            current_node: start,
            base_score: 0,
            correct_answers: 0,
            total_questions: 0,
            current_streak: 0,
            max_streak: 0,
            buffs: Vec::new(),
            state: GameState::MapSelection,
            waiting_for_reward: false,
            pending_answer: None,
            participated_in_opinion: false,
            answers: Vec::new(),
            total_answer_secs: 0.0,
            final_score: None,
            clock_ms: 0,
        }
    }

    /// Mean seconds per answered question, if any were answered.
    #[must_use]
    pub fn average_answer_secs(&self) -> Option<f64> {
        (self.total_questions > 0).then(|| self.total_answer_secs / f64::from(self.total_questions))
    }

    fn record(&mut self, answer: &Answer) {
        self.total_questions += 1;
        self.total_answer_secs += answer.time_spent_secs.max(0.0);
        if answer.is_correct {
            self.correct_answers += 1;
            self.current_streak += 1;
            self.max_streak = self.max_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
        self.answers.push(answer.clone());
    }
}

/// One roguelike run bound to a quiz, a configuration and a seed.
#[derive(Debug, Clone)]
pub struct RunSession {
    quiz: Quiz,
    cfg: RunConfig,
    seed: u64,
    map: StageMap,
    rng: RngBundle,
    session: GameSession,
    timer: CountdownTimer,
    elite: Option<EliteGauntlet>,
    reward: Option<RewardBox>,
    roulette: Option<RouletteTable>,
    outbox: Vec<Command>,
}

impl RunSession {
    /// Generate the map and position the player on the start node.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration, a quiz with no usable questions, or
    /// a map that breaks its structural invariants.
    pub fn new(quiz: Quiz, cfg: RunConfig, seed: u64) -> Result<Self, SessionError> {
        cfg.validate()?;
        let pools = QuestionPools::index(&quiz);
        let mut rng = RngBundle::from_user_seed(seed);
        let mut map = MapGraphBuilder::new(&pools, &cfg).generate(&mut rng);
        let Some(start) = map.start() else {
            return Err(SessionError::EmptyQuiz);
        };
        let violations = map.violations();
        if !violations.is_empty() {
            return Err(SessionError::MalformedMap(violations));
        }
        if let Some(stage) = map.stage_mut(start) {
            stage.completed = true;
        }
        log::debug!(
            "run created: seed={seed} layout={:?} nodes={}",
            map.layout(),
            map.nodes().len()
        );
        Ok(Self {
            quiz,
            cfg,
            seed,
            map,
            rng,
            session: GameSession::new(start),
            timer: CountdownTimer::new(),
            elite: None,
            reward: None,
            roulette: None,
            outbox: Vec::new(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> GameState {
        self.session.state
    }

    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    #[must_use]
    pub const fn map(&self) -> &StageMap {
        &self.map
    }

    #[must_use]
    pub const fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.cfg
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    #[must_use]
    pub const fn elite(&self) -> Option<&EliteGauntlet> {
        self.elite.as_ref()
    }

    #[must_use]
    pub const fn reward_box(&self) -> Option<&RewardBox> {
        self.reward.as_ref()
    }

    #[must_use]
    pub const fn roulette(&self) -> Option<&RouletteTable> {
        self.roulette.as_ref()
    }

    #[must_use]
    pub const fn final_score(&self) -> Option<i64> {
        self.session.final_score
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.session.final_score.is_some()
    }

    /// Random draws taken so far across every stream.
    #[must_use]
    pub const fn rng_draws(&self) -> u64 {
        self.rng.total_draws()
    }

    #[must_use]
    pub fn current_stage(&self) -> Option<&Stage> {
        self.map.stage(self.session.current_node)
    }

    /// Quiz index of the question awaiting an answer, if any.
    #[must_use]
    pub fn active_question_index(&self) -> Option<usize> {
        if self.session.state != GameState::StageActive {
            return None;
        }
        let stage = self.current_stage()?;
        match stage.stage_type {
            StageType::Elite => self.elite.as_ref()?.current_question(),
            StageType::Normal | StageType::Campfire => stage.first_question(),
            StageType::Start | StageType::Roulette | StageType::End => None,
        }
    }

    #[must_use]
    pub fn active_question(&self) -> Option<&Question> {
        self.active_question_index()
            .and_then(|index| self.quiz.question(index))
    }

    /// Nodes the player may move to next.
    #[must_use]
    pub fn available_paths(&self) -> Vec<NodeId> {
        if self.session.state != GameState::MapSelection {
            return Vec::new();
        }
        self.map.outgoing(self.session.current_node).collect()
    }

    /// Move to an adjacent node and activate its stage.
    ///
    /// # Errors
    ///
    /// Rejects the move outside map selection or to a node that is not a
    /// direct successor of the current node.
    pub fn select_map_path(&mut self, next: NodeId) -> Result<GameState, TransitionError> {
        self.expect_state("select_map_path", GameState::MapSelection)?;
        let from = self.session.current_node;
        if !self.map.has_edge(from, next) {
            return Err(TransitionError::NotAdjacent { from, to: next });
        }
        let Some(stage_type) = self.map.stage(next).map(|stage| stage.stage_type) else {
            return Err(TransitionError::NotAdjacent { from, to: next });
        };
        self.session.current_node = next;
        log::debug!("moved {from} -> {next} ({stage_type})");

        match stage_type {
            StageType::End => self.enter_completed(),
            StageType::Roulette | StageType::Start => {
                self.session.state = GameState::StageActive;
            }
            StageType::Elite => {
                let questions = self
                    .map
                    .stage(next)
                    .map(|stage| stage.question_indices.clone())
                    .unwrap_or_default();
                self.elite = Some(EliteGauntlet::new(
                    questions,
                    self.cfg.elite_result_delay_secs,
                ));
                self.session.state = GameState::StageActive;
                self.start_question_timer();
            }
            StageType::Normal | StageType::Campfire => {
                self.session.state = GameState::StageActive;
                self.start_question_timer();
            }
        }
        Ok(self.session.state)
    }

    /// Answer the active question using the question timer for time spent.
    ///
    /// # Errors
    ///
    /// Rejects answers outside an active stage or while an elite result is
    /// still on screen.
    pub fn submit_answer(&mut self, input: AnswerInput) -> Result<GameState, TransitionError> {
        self.expect_state("submit_answer", GameState::StageActive)?;
        let stage_type = self
            .current_stage()
            .map_or(StageType::End, |stage| stage.stage_type);
        if stage_type.is_terminal() || stage_type == StageType::Start {
            self.complete_current_stage(0);
            self.enter_completed();
            return Ok(self.session.state);
        }
        if let Some(elite) = &self.elite
            && elite.current_question().is_none()
        {
            return Err(EliteError::NotPlaying(elite.phase()).into());
        }
        let Some(question_index) = self.active_question_index() else {
            return Err(TransitionError::NoActiveQuestion);
        };
        let Some(question) = self.quiz.question(question_index) else {
            return Err(TransitionError::NoActiveQuestion);
        };

        let verdict = answer::validate(
            question,
            &input,
            self.timer.remaining(),
            self.timer.limit(),
        );
        let mut answer = Answer {
            question_index,
            stage_type,
            response: input,
            is_correct: verdict.is_correct,
            points: verdict.points,
            answered_at_ms: self.session.clock_ms,
            time_spent_secs: self.timer.elapsed(),
            scoring: ScoringStatus::Final,
        };

        match stage_type {
            StageType::Campfire => {
                self.timer.stop();
                self.session.record(&answer);
                self.outbox.push(Command::log(&answer));
                if answer.is_correct {
                    self.session.participated_in_opinion = true;
                    self.open_reward(StageType::Campfire, None);
                } else {
                    // No usable opinion was given.
                    self.complete_current_stage(0);
                }
            }
            StageType::Normal => {
                self.timer.stop();
                if answer.is_correct {
                    answer.scoring = ScoringStatus::PendingReward;
                    self.session.record(&answer);
                    self.outbox.push(Command::log(&answer));
                    self.open_reward(StageType::Normal, Some(answer));
                } else {
                    self.session.record(&answer);
                    self.outbox.push(Command::log(&answer));
                    self.complete_current_stage(0);
                }
            }
            StageType::Elite => {
                answer.scoring = ScoringStatus::Deferred;
                self.session.record(&answer);
                self.outbox.push(Command::log(&answer));
                self.timer.pause();
                if let Some(elite) = self.elite.as_mut() {
                    elite.submit(answer)?;
                }
            }
            StageType::Start | StageType::Roulette | StageType::End => {}
        }
        Ok(self.session.state)
    }

    /// Advance session time: the question countdown, or the elite result
    /// display. An expired countdown is submitted as a timed-out answer.
    pub fn tick(&mut self, dt_secs: f64) -> GameState {
        if dt_secs.is_finite() && dt_secs > 0.0 {
            let ms = floor_f64_to_i64(dt_secs * 1_000.0);
            self.session.clock_ms = self
                .session
                .clock_ms
                .saturating_add(u64::try_from(ms).unwrap_or(0));
        }
        if self.session.state != GameState::StageActive {
            return self.session.state;
        }

        if let Some(elite) = self.elite.as_mut()
            && elite.current_question().is_none()
        {
            match elite.tick(dt_secs) {
                Some(EliteStep::NextQuestion { .. }) => self.start_question_timer(),
                Some(EliteStep::Finished(outcome)) => self.finish_elite(outcome),
                Some(EliteStep::MovingToNext) | None => {}
            }
            return self.session.state;
        }

        if self.timer.tick(dt_secs) == TimerTick::Expired {
            log::debug!("question timed out at {}", self.session.current_node);
            if let Err(err) = self.submit_answer(AnswerInput::TimedOut) {
                log::warn!("timed-out answer was rejected: {err}");
            }
        }
        self.session.state
    }

    /// Freeze the question countdown without losing the remaining time.
    pub const fn pause_timer(&mut self) {
        self.timer.pause();
    }

    pub const fn resume_timer(&mut self) {
        self.timer.resume();
    }

    /// Open one of the three reward choices.
    ///
    /// # Errors
    ///
    /// Fails (changing nothing) when no reward is waiting, which makes a
    /// second resolution of the same box impossible.
    pub fn select_reward_box(&mut self, choice: usize) -> Result<RewardGrant, TransitionError> {
        if !self.session.waiting_for_reward || self.session.state != GameState::RewardBox {
            return Err(TransitionError::NoPendingReward);
        }
        let Some(reward_box) = self.reward.as_mut() else {
            return Err(TransitionError::NoPendingReward);
        };
        let grant = reward_box.open(choice, self.session.base_score, self.rng.reward())?;
        let grant = match grant {
            RewardGrant::Points { points } => RewardGrant::Points {
                points: reward::boosted_points(points, &self.session.buffs),
            },
            multiplied @ RewardGrant::Multiplied { .. } => multiplied,
        };

        let delta = grant.delta();
        match grant {
            RewardGrant::Points { points } => self.session.base_score += points,
            RewardGrant::Multiplied { after, .. } => self.session.base_score = after,
        }
        if let Some(pending) = self.session.pending_answer.take() {
            let settled = pending.rescored(ScoringStatus::Final, delta);
            self.outbox.push(Command::log(&settled));
        }
        self.session.waiting_for_reward = false;
        self.reward = None;
        log::debug!(
            "reward opened: {grant:?}, base score now {}",
            self.session.base_score
        );
        self.complete_current_stage(delta);
        Ok(grant)
    }

    /// Add a buff; it lasts for `remaining_stages` completed stages.
    pub fn grant_buff(&mut self, buff: TemporaryBuff) {
        if buff.remaining_stages > 0 {
            self.session.buffs.push(buff);
        }
    }

    /// Activity bonus computed from the current counters.
    #[must_use]
    pub fn activity_bonus(&self) -> ActivityBonus {
        ActivityBonus {
            correct_answers: self.session.correct_answers,
            max_streak: self.session.max_streak,
            average_answer_secs: self.session.average_answer_secs(),
            participated_in_opinion: self.session.participated_in_opinion,
            completion_bonus: self.cfg.roulette.completion_bonus,
        }
    }

    /// Apply one effect from the current roulette offer.
    ///
    /// # Errors
    ///
    /// Fails before completion, after finalization, or on an invalid choice.
    pub fn select_roulette_effect(
        &mut self,
        choice: usize,
    ) -> Result<RouletteResult, TransitionError> {
        self.expect_state("select_roulette_effect", GameState::Completed)?;
        if self.is_finished() {
            return Err(TransitionError::AlreadyFinalized);
        }
        let Some(table) = self.roulette.as_mut() else {
            return Err(RouletteError::NoTickets.into());
        };
        let result = table.select(choice)?;
        log::debug!("roulette: {}", result.message);
        if table.is_finished() {
            self.finalize();
        } else {
            table.deal(self.rng.roulette());
        }
        Ok(result)
    }

    /// Take every queued command, oldest first.
    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.outbox)
    }

    #[must_use]
    pub fn pending_commands(&self) -> &[Command] {
        &self.outbox
    }

    fn expect_state(&self, action: &'static str, state: GameState) -> Result<(), TransitionError> {
        if self.session.state == state {
            Ok(())
        } else {
            Err(TransitionError::WrongState {
                action,
                state: self.session.state,
            })
        }
    }

    fn start_question_timer(&mut self) {
        let limit = self.active_question().map_or_else(
            || f64::from(self.cfg.question_time_limit_secs),
            |question| {
                answer::effective_limit(
                    question,
                    self.cfg.question_time_limit_secs,
                    reward::extra_time(&self.session.buffs),
                )
            },
        );
        self.timer.start(limit);
    }

    fn open_reward(&mut self, stage_type: StageType, pending: Option<Answer>) {
        self.reward = Some(RewardBox::for_stage(
            stage_type,
            &self.cfg.rewards,
            self.rng.reward(),
        ));
        self.session.pending_answer = pending;
        self.session.waiting_for_reward = true;
        self.session.state = GameState::RewardBox;
    }

    fn finish_elite(&mut self, outcome: EliteOutcome) {
        self.elite = None;
        self.timer.stop();
        log::debug!(
            "elite gauntlet finished: success={} correct={}",
            outcome.success,
            outcome.correct_count
        );
        if outcome.success {
            let pending = outcome
                .last_answer
                .map(|last| last.rescored(ScoringStatus::PendingReward, 0));
            self.open_reward(StageType::Elite, pending);
        } else {
            if let Some(last) = outcome.last_answer {
                self.outbox
                    .push(Command::log(&last.rescored(ScoringStatus::Final, 0)));
            }
            self.complete_current_stage(0);
        }
    }

    /// Mark the current stage resolved and return to map selection.
    fn complete_current_stage(&mut self, score: i64) {
        let node = self.session.current_node;
        if let Some(stage) = self.map.stage_mut(node)
            && !stage.completed
        {
            stage.completed = true;
            stage.score = score;
        }
        reward::tick_buffs(&mut self.session.buffs);
        self.timer.stop();
        self.session.state = GameState::MapSelection;
    }

    fn enter_completed(&mut self) {
        if let Some(stage) = self.map.stage_mut(self.session.current_node) {
            stage.completed = true;
        }
        self.timer.stop();
        self.session.state = GameState::Completed;
        let bonus = self.activity_bonus();
        let tickets = ticket_count(bonus.total(), self.cfg.roulette.ticket_cost);
        log::debug!(
            "run completed: base score {} activity bonus {} tickets {tickets}",
            self.session.base_score,
            bonus.total()
        );
        let mut table = RouletteTable::new(self.session.base_score, tickets);
        table.deal(self.rng.roulette());
        self.roulette = Some(table);
        if tickets == 0 {
            self.finalize();
        }
    }

    fn finalize(&mut self) {
        if self.session.final_score.is_some() {
            return;
        }
        let final_score = self
            .roulette
            .as_ref()
            .map_or(self.session.base_score, RouletteTable::score);
        self.session.final_score = Some(final_score);
        self.outbox.push(Command::PublishScore { final_score });
        log::debug!("run finalized with score {final_score}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{MatchType, QuestionBody};
    use crate::reward::BuffEffect;

    /// Sample quiz with every question on the run's default time limit.
    fn quiz() -> Quiz {
        let mut quiz = Quiz::sample().unwrap();
        for question in &mut quiz.questions {
            question.time_limit_secs = None;
        }
        quiz
    }

    fn run(seed: u64) -> RunSession {
        RunSession::new(quiz(), RunConfig::default(), seed).unwrap()
    }

    fn correct_input(question: &Question) -> AnswerInput {
        match &question.body {
            QuestionBody::MultipleChoice { correct_index, .. } => {
                AnswerInput::Choice(*correct_index)
            }
            QuestionBody::ShortAnswer { correct_text, .. } => {
                AnswerInput::text(correct_text.clone())
            }
            QuestionBody::Opinion { .. } => AnswerInput::Choice(0),
        }
    }

    fn wrong_input(question: &Question) -> AnswerInput {
        match &question.body {
            QuestionBody::MultipleChoice {
                correct_index,
                options,
            } => AnswerInput::Choice((correct_index + 1) % options.len()),
            _ => AnswerInput::text("definitely wrong"),
        }
    }

    /// Move to the first successor of the current node whose stage matches.
    fn go_to(run: &mut RunSession, kind: StageType) -> bool {
        let target = run
            .available_paths()
            .into_iter()
            .find(|id| run.map().stage(*id).map(|s| s.stage_type) == Some(kind));
        match target {
            Some(id) => {
                run.select_map_path(id).unwrap();
                true
            }
            None => false,
        }
    }

    fn find_run_with_first_step(kind: StageType) -> RunSession {
        (0..500)
            .map(run)
            .find(|r| {
                r.available_paths()
                    .iter()
                    .any(|id| r.map().stage(*id).map(|s| s.stage_type) == Some(kind))
            })
            .unwrap()
    }

    #[test]
    fn starts_on_completed_start_node() {
        let run = run(1);
        assert_eq!(run.state(), GameState::MapSelection);
        assert_eq!(Some(run.session().current_node), run.map().start());
        assert!(run.current_stage().unwrap().completed);
        assert!(!run.available_paths().is_empty());
    }

    #[test]
    fn rejects_non_adjacent_moves_without_change() {
        let mut run = run(2);
        let terminal = run.map().terminal().unwrap();
        let before = run.session().clone();
        let err = run.select_map_path(terminal).unwrap_err();
        assert!(matches!(err, TransitionError::NotAdjacent { .. }));
        assert_eq!(run.session(), &before);
    }

    #[test]
    fn correct_normal_answer_waits_for_reward() {
        let mut run = find_run_with_first_step(StageType::Normal);
        assert!(go_to(&mut run, StageType::Normal));
        let question = run.active_question().unwrap().clone();
        run.tick(15.0);
        assert_eq!(run.submit_answer(correct_input(&question)).unwrap(), GameState::RewardBox);
        assert!(run.session().waiting_for_reward);
        assert_eq!(run.session().base_score, 0);
        let pending = run.session().pending_answer.clone().unwrap();
        assert_eq!(pending.scoring, ScoringStatus::PendingReward);
        assert_eq!(pending.points, 75);

        let grant = run.select_reward_box(0).unwrap();
        let RewardGrant::Points { points } = grant else {
            panic!("normal stage must grant points");
        };
        assert!((80..=350).contains(&points));
        assert_eq!(run.session().base_score, points);
        assert_eq!(run.state(), GameState::MapSelection);
        assert!(run.current_stage().unwrap().completed);
        assert_eq!(run.current_stage().unwrap().score, points);

        let before = run.session().clone();
        assert_eq!(run.select_reward_box(1), Err(TransitionError::NoPendingReward));
        assert_eq!(run.session(), &before);

        let commands = run.drain_commands();
        assert_eq!(commands.len(), 2);
        let Command::LogActivity(settled) = &commands[1] else {
            panic!("expected activity log");
        };
        assert_eq!(settled.scoring, ScoringStatus::Final);
        assert_eq!(settled.points, points);
    }

    #[test]
    fn wrong_normal_answer_skips_reward() {
        let mut run = find_run_with_first_step(StageType::Normal);
        go_to(&mut run, StageType::Normal);
        let question = run.active_question().unwrap().clone();
        run.tick(3.0);
        run.tick(2.0);
        assert_eq!(run.submit_answer(wrong_input(&question)).unwrap(), GameState::MapSelection);
        assert_eq!(run.session().current_streak, 0);
        assert_eq!(run.session().total_questions, 1);
        assert_eq!(run.session().correct_answers, 0);
        assert!((run.session().answers[0].time_spent_secs - 5.0).abs() < 1e-9);
        assert_eq!(run.current_stage().unwrap().score, 0);
        assert!(run.reward_box().is_none());
    }

    #[test]
    fn timeout_counts_as_wrong() {
        let mut run = find_run_with_first_step(StageType::Normal);
        go_to(&mut run, StageType::Normal);
        for _ in 0..29 {
            assert_eq!(run.tick(1.0), GameState::StageActive);
        }
        assert_eq!(run.tick(1.0), GameState::MapSelection);
        let answer = &run.session().answers[0];
        assert_eq!(answer.response, AnswerInput::TimedOut);
        assert!(!answer.is_correct);
    }

    #[test]
    fn paused_timer_does_not_expire() {
        let mut run = find_run_with_first_step(StageType::Normal);
        go_to(&mut run, StageType::Normal);
        run.tick(10.0);
        run.pause_timer();
        for _ in 0..100 {
            run.tick(1.0);
        }
        assert_eq!(run.state(), GameState::StageActive);
        assert!((run.timer().remaining() - 20.0).abs() < 1e-9);
        run.resume_timer();
        run.tick(20.0);
        assert_eq!(run.state(), GameState::MapSelection);
    }

    #[test]
    fn extra_time_buff_extends_limit() {
        let mut run = find_run_with_first_step(StageType::Normal);
        run.grant_buff(TemporaryBuff::new(BuffEffect::ExtraTime { seconds: 10 }, 1));
        go_to(&mut run, StageType::Normal);
        assert!((run.timer().limit() - 40.0).abs() < 1e-9);
        let question = run.active_question().unwrap().clone();
        run.submit_answer(wrong_input(&question)).unwrap();
        assert!(run.session().buffs.is_empty());
    }

    #[test]
    fn campfire_offers_multipliers() {
        let mut run = campfire_run();
        run.submit_answer(AnswerInput::Choice(0)).unwrap();
        assert_eq!(run.state(), GameState::RewardBox);
        assert!(run.session().participated_in_opinion);
        assert_eq!(run.session().current_streak, 1);
        assert_eq!(run.session().base_score, 0);
        let grant = run.select_reward_box(0).unwrap();
        assert!(matches!(grant, RewardGrant::Multiplied { before: 0, after: 0, .. }));
        assert_eq!(run.state(), GameState::MapSelection);
    }

    #[test]
    fn answers_rejected_outside_active_stage() {
        let mut run = run(3);
        let before = run.session().clone();
        assert!(matches!(
            run.submit_answer(AnswerInput::Choice(0)),
            Err(TransitionError::WrongState { .. })
        ));
        assert!(matches!(
            run.select_roulette_effect(0),
            Err(TransitionError::WrongState { .. })
        ));
        assert_eq!(run.session(), &before);
    }

    /// A run standing on an elite stage, reached after one wrong normal answer.
    fn elite_run() -> RunSession {
        let quiz = Quiz::new(
            "elite",
            vec![
                Question::short_answer("a?", "a", MatchType::Exact, Vec::<String>::new()),
                Question::short_answer("b?", "b", MatchType::Exact, Vec::<String>::new()),
                Question::short_answer("c?", "c", MatchType::Exact, Vec::<String>::new()),
            ],
        );
        (0..500)
            .find_map(|seed| {
                let start = RunSession::new(quiz.clone(), RunConfig::default(), seed).ok()?;
                start.available_paths().into_iter().find_map(|first| {
                    let mut run = start.clone();
                    run.select_map_path(first).ok()?;
                    run.submit_answer(AnswerInput::text("zzz")).ok()?;
                    go_to(&mut run, StageType::Elite).then_some(run)
                })
            })
            .expect("some seed leads to an elite stage")
    }

    /// Every interior stage of an opinion-only quiz is a campfire.
    fn campfire_run() -> RunSession {
        let quiz = Quiz::new(
            "opinions",
            vec![
                Question::opinion("tea or coffee?", ["tea", "coffee"]),
                Question::opinion("cats or dogs?", ["cats", "dogs"]),
            ],
        );
        let mut run = RunSession::new(quiz, RunConfig::default(), 9).unwrap();
        assert!(go_to(&mut run, StageType::Campfire));
        run
    }

    fn assert_campfire_declined(run: &mut RunSession) {
        assert_eq!(run.state(), GameState::MapSelection);
        assert!(run.reward_box().is_none());
        assert!(run.current_stage().unwrap().completed);
        assert_eq!(run.current_stage().unwrap().score, 0);

        let session = run.session();
        assert_eq!(session.total_questions, 1);
        assert_eq!(session.correct_answers, 0);
        assert_eq!(session.current_streak, 0);
        assert!(!session.participated_in_opinion);
        assert!(!session.answers[0].is_correct);

        let commands = run.drain_commands();
        assert_eq!(commands.len(), 1);
        let Command::LogActivity(record) = &commands[0] else {
            panic!("expected activity log");
        };
        assert!(!record.is_correct);
        assert_eq!(record.points, 0);
    }

    #[test]
    fn timed_out_campfire_is_not_an_opinion() {
        let mut run = campfire_run();
        for _ in 0..30 {
            run.tick(1.0);
        }
        assert_eq!(run.session().answers[0].response, AnswerInput::TimedOut);
        assert_campfire_declined(&mut run);
        assert_eq!(run.activity_bonus().total(), 300);
    }

    #[test]
    fn blank_campfire_answer_is_declined() {
        let mut run = campfire_run();
        assert_eq!(
            run.submit_answer(AnswerInput::text("   ")).unwrap(),
            GameState::MapSelection
        );
        assert_campfire_declined(&mut run);
    }

    #[test]
    fn campfire_choice_outside_options_is_declined() {
        let mut run = campfire_run();
        run.submit_answer(AnswerInput::Choice(2)).unwrap();
        assert_campfire_declined(&mut run);
    }

    #[test]
    fn elite_timeout_fails_the_gauntlet() {
        let mut run = elite_run();
        let _ = run.drain_commands();
        assert!(run.elite().is_some());
        for _ in 0..40 {
            run.tick(1.0);
        }
        assert_eq!(run.state(), GameState::MapSelection);
        assert!(run.elite().is_none());
        assert!(run.reward_box().is_none());
        let stage = run.current_stage().unwrap();
        assert!(stage.completed);
        assert_eq!(stage.score, 0);

        let last = run.session().answers.last().unwrap();
        assert_eq!(
            (last.response.clone(), last.is_correct),
            (AnswerInput::TimedOut, false)
        );

        let commands = run.drain_commands();
        assert_eq!(commands.len(), 2);
        let Command::LogActivity(first) = &commands[0] else {
            panic!("expected activity log");
        };
        assert_eq!(first.scoring, ScoringStatus::Deferred);
        let Command::LogActivity(settled) = &commands[1] else {
            panic!("expected activity log");
        };
        assert_eq!(settled.scoring, ScoringStatus::Final);
        assert_eq!(settled.points, 0);
        assert!(!settled.is_correct);
    }

    #[test]
    fn elite_gauntlet_runs_inside_session() {
        let mut run = elite_run();
        for _ in 0..3 {
            let question = run.active_question().unwrap().clone();
            run.submit_answer(correct_input(&question)).unwrap();
            assert!(run.active_question().is_none());
            assert!(matches!(
                run.submit_answer(AnswerInput::text("x")),
                Err(TransitionError::Elite(_))
            ));
            run.tick(1.5);
            run.tick(0.0);
        }
        assert_eq!(run.state(), GameState::RewardBox);
        let grant = run.select_reward_box(2).unwrap();
        assert!((250..=1_000).contains(&grant.delta()));
        let deferred = run
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, Command::LogActivity(r) if r.scoring == ScoringStatus::Deferred))
            .count();
        assert_eq!(deferred, 3);
    }

    #[test]
    fn reaching_end_finalizes_once() {
        let mut run = run(11);
        while run.state() != GameState::Completed {
            match run.state() {
                GameState::MapSelection => {
                    let next = run.available_paths()[0];
                    run.select_map_path(next).unwrap();
                }
                GameState::StageActive => {
                    let input = run
                        .active_question()
                        .map_or(AnswerInput::Choice(0), correct_input);
                    run.submit_answer(input).unwrap();
                    run.tick(2.0);
                    run.tick(2.0);
                }
                GameState::RewardBox => {
                    run.select_reward_box(0).unwrap();
                }
                GameState::Completed => {}
            }
        }
        while !run.is_finished() {
            run.select_roulette_effect(0).unwrap();
        }
        let final_score = run.final_score().unwrap();
        let publishes: Vec<_> = run
            .drain_commands()
            .into_iter()
            .filter(|c| matches!(c, Command::PublishScore { .. }))
            .collect();
        assert_eq!(publishes, vec![Command::PublishScore { final_score }]);
        assert_eq!(
            run.select_roulette_effect(0),
            Err(TransitionError::AlreadyFinalized)
        );
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = RunSession::new(Quiz::default(), RunConfig::default(), 1).unwrap_err();
        assert!(matches!(err, SessionError::EmptyQuiz));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = RunSession::new(quiz(), RunConfig::default().with_rounds(1), 1).unwrap_err();
        assert!(matches!(err, SessionError::Config(_)));
    }
}
