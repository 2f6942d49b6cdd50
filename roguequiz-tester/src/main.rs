mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use roguequiz_game::{Quiz, RunConfig};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{
    ActivityLog, ActivityLogStats, GameplayStrategy, LogicTester, ScenarioResult,
    resolve_seed_inputs,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "roguequiz-tester", version)]
#[command(about = "Automated QA for the roguequiz engine - seeded autoplay with map and scoring checks")]
struct Args {
    /// Seeds to run: integers, ranges (1..20, 1..=20) or run codes (R7-ATLAS42), comma-separated
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of consecutive seeds played per seed token
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Round count for numeric seeds (run codes carry their own)
    #[arg(long)]
    rounds: Option<usize>,

    /// Autoplay strategy
    #[arg(long, value_enum, default_value_t = GameplayStrategy::Perfect)]
    strategy: GameplayStrategy,

    /// Quiz JSON to play (defaults to the bundled sample quiz)
    #[arg(long)]
    quiz: Option<PathBuf>,

    /// Run configuration JSON; missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write every activity record as a JSON line to this path
    #[arg(long)]
    activity_log: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let start_time = Instant::now();
    let quiz = load_quiz(args.quiz.as_deref())?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(rounds) = args.rounds {
        config = config.with_rounds(rounds);
        config.validate().context("invalid --rounds")?;
    }
    let seed_tokens = split_csv(&args.seeds);
    let seeds = resolve_seed_inputs(&seed_tokens)?;

    println!(
        "{} {} seed(s) x {} iteration(s), {} play, {} rounds",
        "🧠 Running".bright_yellow().bold(),
        seeds.len(),
        args.iterations,
        args.strategy,
        config.rounds
    );

    let activity = ActivityLog::spawn(args.activity_log.clone());
    let tester = LogicTester::new(quiz, config, activity.sink, args.verbose);
    let results = tester.run_scenarios(&seeds, args.strategy, args.iterations);
    // Every sender must be gone before the drain task can finish.
    drop(tester);
    let activity_stats = activity
        .handle
        .await
        .context("activity log task panicked")??;

    write_reports(&args, &results, activity_stats, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn announce_banner() {
    println!("{}", "🎲 Roguequiz Automated Tester".bright_cyan().bold());
    println!("{}", "=============================".cyan());
}

fn load_quiz(path: Option<&Path>) -> Result<Quiz> {
    let quiz = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read quiz {}", path.display()))?;
            Quiz::from_json(&json).with_context(|| format!("invalid quiz {}", path.display()))?
        }
        None => Quiz::sample().context("bundled sample quiz is invalid")?,
    };
    if quiz.is_empty() {
        anyhow::bail!("quiz has no questions");
    }
    Ok(quiz)
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    RunConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    activity: ActivityLogStats,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => {
            logic::reports::generate_json_report(output_target.writer(), results, activity)?;
        }
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(output_target.writer(), results, activity)?;
        }
        ReportFormat::Console => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    output_target.writer(),
                    results,
                    activity,
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
