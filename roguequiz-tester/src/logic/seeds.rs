use anyhow::{Result, bail};
use regex::Regex;
use roguequiz_game::decode_run_code;
use std::collections::HashSet;
use std::sync::LazyLock;

static RANGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\.(=?)(\d+)$").expect("valid range pattern"));

static RUN_CODE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^R\d{1,2}-[A-Z]+\d{2}$").expect("valid run code pattern"));

/// Upper bound on how many seeds a single range token may expand to.
const MAX_RANGE_LEN: u64 = 100_000;

/// Seed metadata resolved from one CLI token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Round count carried by a run code; overrides `--rounds`.
    pub rounds: Option<usize>,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self {
            seed,
            rounds: None,
            code: None,
        }
    }

    #[must_use]
    pub const fn from_run_code(seed: u64, rounds: usize, code: String) -> Self {
        Self {
            seed,
            rounds: Some(rounds),
            code: Some(code),
        }
    }

    #[must_use]
    pub fn rounds_or(&self, default_rounds: usize) -> usize {
        self.rounds.unwrap_or(default_rounds)
    }

    /// Label for reports: the run code when the seed came from one.
    #[must_use]
    pub fn label(&self) -> String {
        self.code.clone().unwrap_or_else(|| self.seed.to_string())
    }
}

/// Resolve CLI seed tokens into canonical seeds.
///
/// Accepts integers, ranges such as `1..10` or `1..=10`, and run codes
/// like `R7-ATLAS42`. Duplicates are dropped, keeping the first spelling.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending = Vec::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(caps) = RANGE_TOKEN.captures(token) {
            let start: u64 = caps[1].parse()?;
            let mut end: u64 = caps[3].parse()?;
            if &caps[2] == "=" {
                end = end.saturating_add(1);
            }
            if end <= start {
                bail!("Empty seed range: {token}");
            }
            if end - start > MAX_RANGE_LEN {
                bail!("Seed range {token} is longer than {MAX_RANGE_LEN}");
            }
            pending.extend((start..end).map(SeedInfo::from_numeric));
            continue;
        }

        if RUN_CODE_TOKEN.is_match(token) {
            let Some((rounds, seed)) = decode_run_code(token) else {
                bail!("Run code {token} does not decode (unknown word or round count)");
            };
            pending.push(SeedInfo::from_run_code(seed, rounds, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert((info.seed, info.rounds)));

    if pending.is_empty() {
        pending.push(SeedInfo::from_numeric(1337));
    }

    Ok(pending)
}
