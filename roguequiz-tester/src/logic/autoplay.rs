//! Headless driver that plays a run to finalization under a policy and the
//! invariant checks applied to every finished run.
use roguequiz_game::{
    ActivitySink, AnswerInput, DispatchReport, GameEngine, GameState, RunSession, ScorePublisher,
    StageMap, StageType,
};
use serde::{Deserialize, Serialize};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Seconds advanced per tick while an elite result is on screen.
const RESULT_TICK_SECS: f64 = 0.5;

/// Hard stop for runaway runs.
pub const DEFAULT_MAX_STEPS: usize = 2_000;

/// What happened while playing one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaySummary {
    pub steps: usize,
    pub timeouts: u32,
    pub dispatch: DispatchReport,
}

/// Headline numbers of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub layout: Vec<usize>,
    pub elites: usize,
    pub campfires: usize,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub max_streak: u32,
    pub base_score: i64,
    pub final_score: Option<i64>,
    pub roulette_spins: usize,
    pub rng_draws: u64,
}

impl RunMetrics {
    #[must_use]
    pub fn collect(run: &RunSession) -> Self {
        let session = run.session();
        Self {
            layout: run.map().layout().to_vec(),
            elites: run.map().count_kind(StageType::Elite),
            campfires: run.map().count_kind(StageType::Campfire),
            total_questions: session.total_questions,
            correct_answers: session.correct_answers,
            max_streak: session.max_streak,
            base_score: session.base_score,
            final_score: run.final_score(),
            roulette_spins: run.roulette().map_or(0, |table| table.results().len()),
            rng_draws: run.rng_draws(),
        }
    }
}

/// Play `run` until it is finalized, delivering commands through `engine`
/// after every step.
///
/// # Errors
///
/// Returns a description of the first rejected transition, a dead end on the
/// map, or a run that did not finish within `max_steps`.
pub fn play_run<A, P>(
    run: &mut RunSession,
    policy: &mut dyn PlayerPolicy,
    engine: &GameEngine<A, P>,
    max_steps: usize,
) -> Result<PlaySummary, String>
where
    A: ActivitySink,
    P: ScorePublisher,
{
    let mut summary = PlaySummary::default();
    summary.dispatch.absorb(engine.flush(run));

    while !run.is_finished() {
        if summary.steps >= max_steps {
            return Err(format!(
                "run did not finish within {max_steps} steps (stuck in {})",
                run.state()
            ));
        }
        summary.steps += 1;
        step(run, policy, &mut summary)?;
        summary.dispatch.absorb(engine.flush(run));
    }

    log::debug!(
        "{} finished in {} steps with score {:?}",
        policy.name(),
        summary.steps,
        run.final_score()
    );
    Ok(summary)
}

fn step(
    run: &mut RunSession,
    policy: &mut dyn PlayerPolicy,
    summary: &mut PlaySummary,
) -> Result<(), String> {
    match run.state() {
        GameState::MapSelection => {
            let paths = run.available_paths();
            let Some(last) = paths.len().checked_sub(1) else {
                return Err(format!("dead end at {}", run.session().current_node));
            };
            let next = paths[policy.pick_path(&paths).min(last)];
            run.select_map_path(next).map_err(|err| err.to_string())?;
        }
        GameState::StageActive => {
            if let Some(question) = run.active_question().cloned() {
                let answered = run.session().total_questions;
                let think = policy.think_time(run.timer().limit());
                run.tick(think);
                if run.session().total_questions != answered {
                    summary.timeouts += 1;
                } else if run.active_question_index().is_some() {
                    run.submit_answer(policy.answer(&question))
                        .map_err(|err| err.to_string())?;
                }
            } else if run.elite().is_some() {
                run.tick(RESULT_TICK_SECS);
            } else {
                // Roulette terminal: any input clears it.
                run.submit_answer(AnswerInput::TimedOut)
                    .map_err(|err| err.to_string())?;
            }
        }
        GameState::RewardBox => {
            let choice = run
                .reward_box()
                .map_or(0, |reward| policy.pick_reward(reward));
            run.select_reward_box(choice)
                .map_err(|err| err.to_string())?;
        }
        GameState::Completed => {
            let Some(table) = run.roulette() else {
                return Err("completed run has no roulette table".to_string());
            };
            let score = table.score();
            let offer = table.offer().map(<[_]>::to_vec).unwrap_or_default();
            let choice = policy.pick_roulette(score, &offer);
            run.select_roulette_effect(choice)
                .map_err(|err| err.to_string())?;
        }
    }
    Ok(())
}

/// Structural problems with a generated map.
#[must_use]
pub fn check_map(map: &StageMap, rounds: usize) -> Vec<String> {
    let mut failures: Vec<String> = map
        .violations()
        .into_iter()
        .map(|violation| violation.to_string())
        .collect();
    if map.layout().len() != rounds {
        failures.push(format!(
            "layout {:?} has {} rounds, expected {rounds}",
            map.layout(),
            map.layout().len()
        ));
    }
    failures
}

/// Problems with a finished run given the strategy that played it and the
/// scores the publisher received.
#[must_use]
pub fn check_outcome(
    run: &RunSession,
    strategy: GameplayStrategy,
    published: &[i64],
) -> Vec<String> {
    let mut failures = Vec::new();
    let session = run.session();

    match run.final_score() {
        None => failures.push("run was never finalized".to_string()),
        Some(score) if score < 0 => failures.push(format!("final score {score} is negative")),
        Some(score) => {
            if published != [score] {
                failures.push(format!(
                    "expected a single publish of {score}, publisher saw {published:?}"
                ));
            }
        }
    }

    if session.waiting_for_reward || session.pending_answer.is_some() {
        failures.push("run finished with an unclaimed reward".to_string());
    }
    if session.correct_answers > session.total_questions {
        failures.push(format!(
            "{} correct answers out of {} questions",
            session.correct_answers, session.total_questions
        ));
    }
    if session.max_streak > session.correct_answers {
        failures.push(format!(
            "streak {} exceeds correct answers {}",
            session.max_streak, session.correct_answers
        ));
    }
    if let Some(terminal) = run.map().terminal()
        && !run.map().stage(terminal).is_some_and(|stage| stage.completed)
    {
        failures.push(format!("terminal {terminal} was not completed"));
    }

    let campfire_answers = session
        .answers
        .iter()
        .filter(|answer| answer.stage_type == StageType::Campfire)
        .count();
    let campfire_answers = u32::try_from(campfire_answers).unwrap_or(u32::MAX);
    match strategy {
        GameplayStrategy::Perfect if session.correct_answers != session.total_questions => {
            failures.push(format!(
                "perfect play got {}/{} correct",
                session.correct_answers, session.total_questions
            ));
        }
        GameplayStrategy::Careless if session.correct_answers != campfire_answers => {
            failures.push(format!(
                "careless play got {} correct beyond {campfire_answers} campfires",
                session.correct_answers
            ));
        }
        _ => {}
    }

    failures
}
