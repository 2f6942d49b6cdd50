//! Reversible run codes built from a 64-word list.
//! Code format: R<ROUNDS>-<WORD><NN>, e.g., R7-ATLAS42, R9-COMET07

use crate::constants::{MAX_ROUNDS, MIN_ROUNDS};

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const WORD_LIST: [&str; 64] = [
    "ATLAS", "COMET", "QUILL", "RIDDLE", "TORCH", "EMBER", "GLYPH", "SPHINX", "ORACLE", "SCROLL",
    "LANTERN", "MAZE", "CIPHER", "RUNE", "BEACON", "COMPASS", "SUMMIT", "VALLEY", "HARBOR",
    "CANYON", "GROVE", "MEADOW", "TUNDRA", "DELTA", "ISLAND", "GEYSER", "GLACIER", "PRAIRIE",
    "TEMPLE", "TOWER", "BRIDGE", "CASTLE", "VAULT", "ARCHIVE", "LIBRARY", "ATRIUM", "CRYPT",
    "GARDEN", "FORGE", "ANVIL", "BANNER", "CREST", "SHIELD", "SABER", "ARROW", "QUIVER", "HELM",
    "GAUNTLT", "CAMPFIR", "TICKET", "WHEEL", "JACKPOT", "STREAK", "BONUS", "PUZZLE", "TRIVIA",
    "QUIZZER", "SCHOLAR", "SAGE", "MENTOR", "PUPIL", "CHALK", "SLATE", "INKWELL",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x003F | ((u16::from(nn) & 0x7F) << 6)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x003F, u8::try_from((packed >> 6) & 0x7F).unwrap_or(0))
}

fn compose_seed(rounds: usize, word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    let mut buf = [0u8; 10];
    buf[..6].copy_from_slice(b"RQUIZ-");
    buf[6] = u8::try_from(rounds).unwrap_or(u8::MAX);
    buf[7] = packed.to_le_bytes()[0];
    buf[8] = packed.to_le_bytes()[1];
    buf[9] = 0x5A;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Render a seed as a run code. Only the low 16 bits of the seed are visible,
/// so decoding the result yields a canonical seed for the same code.
#[must_use]
pub fn encode_run_code(rounds: usize, seed: u64) -> String {
    let packed = u16::try_from(seed & 0xFFFF).unwrap_or(0);
    let (wi, nn) = unpack(packed);
    let word = WORD_LIST.get(usize::from(wi)).copied().unwrap_or(WORD_LIST[0]);
    format!("R{rounds}-{word}{:02}", nn % 100)
}

/// Decode a run code into `(rounds, seed)`.
#[must_use]
pub fn decode_run_code(code: &str) -> Option<(usize, u64)> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    let rounds_part = prefix.strip_prefix('R').or_else(|| prefix.strip_prefix('r'))?;
    let rounds: usize = rounds_part.parse().ok()?;
    if !(MIN_ROUNDS..=MAX_ROUNDS).contains(&rounds) {
        return None;
    }
    if rest.len() < 3 || !rest.is_ascii() {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some((rounds, compose_seed(rounds, wi, nn)))
}

/// Build a canonical run code from arbitrary entropy.
#[must_use]
pub fn generate_run_code(rounds: usize, entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = u8::try_from((entropy >> 17) % 100).unwrap_or(0);
    encode_run_code(rounds, compose_seed(rounds, wi, nn))
}
