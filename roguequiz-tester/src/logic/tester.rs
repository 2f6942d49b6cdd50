use colored::Colorize;
use roguequiz_game::{
    ActivityRecord, ActivitySink, ChannelSink, DispatchReport, GameEngine, Quiz, RunConfig,
    RunSession, ScorePublisher,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::{Duration, Instant};

use crate::logic::autoplay::{
    DEFAULT_MAX_STEPS, PlaySummary, RunMetrics, check_map, check_outcome, play_run,
};
use crate::logic::policy::GameplayStrategy;
use crate::logic::seeds::SeedInfo;
use crate::logic::sink::ScoreBoard;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: String,
    pub strategy: GameplayStrategy,
    pub rounds: usize,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub average_final_score: f64,
    pub timeouts: u32,
    pub dispatch: DispatchReport,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

/// Sink for replays; their commands were already checked on the first play.
struct Discard;

impl ActivitySink for Discard {
    type Error = Infallible;

    fn log_activity(&self, _record: &ActivityRecord) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ScorePublisher for Discard {
    type Error = Infallible;

    fn publish_score(&self, _final_score: i64) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct IterationOutcome {
    metrics: RunMetrics,
    summary: PlaySummary,
}

pub struct LogicTester {
    quiz: Quiz,
    config: RunConfig,
    activity: ChannelSink,
    scores: ScoreBoard,
    verbose: bool,
}

impl LogicTester {
    pub fn new(quiz: Quiz, config: RunConfig, activity: ChannelSink, verbose: bool) -> Self {
        Self {
            quiz,
            config,
            activity,
            scores: ScoreBoard::default(),
            verbose,
        }
    }

    pub fn run_scenarios(
        &self,
        seeds: &[SeedInfo],
        strategy: GameplayStrategy,
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|info| {
                if self.verbose {
                    println!(
                        "🧪 Testing {} play on seed {}",
                        strategy.label().bright_white(),
                        info.label()
                    );
                }
                self.run_single_scenario(info, strategy, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        info: &SeedInfo,
        strategy: GameplayStrategy,
        iterations: usize,
    ) -> ScenarioResult {
        let rounds = info.rounds_or(self.config.rounds);
        let config = self.config.clone().with_rounds(rounds);
        let engine = GameEngine::with_config(self.activity.clone(), self.scores.clone(), config);

        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut scores = Vec::new();
        let mut timeouts = 0;
        let mut dispatch = DispatchReport::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let seed = info
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            match self.run_iteration(&engine, seed, strategy) {
                Ok(outcome) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    timeouts += outcome.summary.timeouts;
                    dispatch.absorb(outcome.summary.dispatch);
                    if let Some(score) = outcome.metrics.final_score {
                        scores.push(score);
                    }
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) layout:{:?} correct:{}/{} score:{}",
                            i + 1,
                            iterations,
                            outcome.metrics.layout,
                            outcome.metrics.correct_answers,
                            outcome.metrics.total_questions,
                            outcome.metrics.final_score.unwrap_or_default()
                        );
                    }
                }
                Err(problems) => {
                    let joined = problems.join("; ");
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            joined.clone().red()
                        );
                    }
                    failures.push(format!(
                        "Iteration {} (strategy {}, seed {seed}, rounds {rounds}): {joined}",
                        i + 1,
                        strategy.label()
                    ));
                }
            }
        }

        ScenarioResult {
            scenario_name: format!("{} @ {}", strategy.label(), info.label()),
            seed: info.label(),
            strategy,
            rounds,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_final_score: mean(&scores),
            timeouts,
            dispatch,
            average_duration: average_duration(&performance_data),
            performance_data,
        }
    }

    fn run_iteration(
        &self,
        engine: &GameEngine<ChannelSink, ScoreBoard>,
        seed: u64,
        strategy: GameplayStrategy,
    ) -> Result<IterationOutcome, Vec<String>> {
        // Drop anything a previous failed iteration left behind.
        let _ = self.scores.take();

        let mut run = engine
            .create_run(self.quiz.clone(), seed)
            .map_err(|err| vec![format!("run could not start: {err}")])?;

        let mut problems = check_map(run.map(), engine.config().rounds);
        let mut policy = strategy.create_policy(seed);
        let summary = match play_run(&mut run, policy.as_mut(), engine, DEFAULT_MAX_STEPS) {
            Ok(summary) => summary,
            Err(err) => {
                problems.push(err);
                return Err(problems);
            }
        };
        problems.extend(check_outcome(&run, strategy, &self.scores.take()));

        if let Some(problem) = self.replay_mismatch(&run, engine.config(), seed, strategy) {
            problems.push(problem);
        }

        if problems.is_empty() {
            Ok(IterationOutcome {
                metrics: RunMetrics::collect(&run),
                summary,
            })
        } else {
            Err(problems)
        }
    }

    /// Replaying the same seed with the same policy must land on the same run.
    fn replay_mismatch(
        &self,
        original: &RunSession,
        config: &RunConfig,
        seed: u64,
        strategy: GameplayStrategy,
    ) -> Option<String> {
        let engine = GameEngine::with_config(Discard, Discard, config.clone());
        let mut replay = match engine.create_run(self.quiz.clone(), seed) {
            Ok(run) => run,
            Err(err) => return Some(format!("replay could not start: {err}")),
        };
        let mut policy = strategy.create_policy(seed);
        if let Err(err) = play_run(&mut replay, policy.as_mut(), &engine, DEFAULT_MAX_STEPS) {
            return Some(format!("replay failed: {err}"));
        }
        if replay.session() != original.session() || replay.map() != original.map() {
            return Some(format!(
                "replay diverged: score {:?} vs {:?}",
                replay.final_score(),
                original.final_score()
            ));
        }
        None
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<i64>() as f64 / values.len() as f64
    }
}

fn average_duration(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        Duration::ZERO
    } else {
        samples.iter().sum::<Duration>() / u32::try_from(samples.len()).unwrap_or(1)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}
