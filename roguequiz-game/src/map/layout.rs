//! Per-round node-count layouts.
use rand::Rng;
use rand::seq::SliceRandom;

/// Hand-authored layouts; entries are filtered by length and the growth rule.
const LAYOUT_CATALOGUE: &[&[usize]] = &[
    &[1, 1, 1],
    &[1, 2, 1],
    &[1, 2, 2, 1],
    &[1, 2, 1, 1],
    &[1, 2, 3, 2, 1],
    &[1, 2, 4, 2, 1],
    &[1, 2, 2, 2, 1],
    &[1, 2, 3, 3, 2, 1],
    &[1, 2, 4, 3, 2, 1],
    &[1, 2, 3, 4, 2, 1],
    &[1, 2, 4, 3, 4, 2, 1],
    &[1, 2, 3, 4, 3, 2, 1],
    &[1, 2, 4, 4, 3, 2, 1],
    &[1, 2, 3, 3, 4, 2, 1],
    &[1, 2, 3, 4, 4, 3, 2, 1],
    &[1, 2, 4, 3, 4, 3, 2, 1],
    &[1, 2, 4, 5, 4, 3, 2, 1],
    &[1, 2, 3, 4, 5, 4, 3, 2, 1],
    &[1, 2, 4, 3, 4, 5, 4, 2, 1],
    &[1, 2, 4, 4, 3, 4, 4, 2, 1],
];

/// Growth rule between consecutive rounds: `ceil(a/2) <= b <= 2a`.
#[must_use]
pub(crate) const fn step_is_valid(a: usize, b: usize) -> bool {
    a > 0 && b > 0 && b <= a * 2 && b >= a.div_ceil(2)
}

pub(crate) fn has_single_endpoints(layout: &[usize]) -> bool {
    matches!((layout.first(), layout.last()), (Some(1), Some(1)))
}

/// Whether a layout has single-node endpoints and obeys the growth rule.
#[must_use]
pub fn is_valid_layout(layout: &[usize]) -> bool {
    has_single_endpoints(layout) && layout.windows(2).all(|pair| step_is_valid(pair[0], pair[1]))
}

/// Layout used when the catalogue has nothing for the requested round count.
///
/// Always valid: every interior round holds two nodes.
#[must_use]
pub fn fallback_layout(rounds: usize) -> Vec<usize> {
    match rounds {
        0 => Vec::new(),
        1 => vec![1],
        _ => {
            let mut layout = vec![2; rounds];
            layout[0] = 1;
            layout[rounds - 1] = 1;
            layout
        }
    }
}

/// Draw a catalogue layout with `rounds` entries, or the fallback layout.
pub fn select_layout<R: Rng + ?Sized>(rounds: usize, rng: &mut R) -> Vec<usize> {
    let candidates: Vec<&[usize]> = LAYOUT_CATALOGUE
        .iter()
        .copied()
        .filter(|layout| layout.len() == rounds && is_valid_layout(layout))
        .collect();
    if let Some(layout) = candidates.choose(rng) {
        log::debug!("map layout {layout:?} chosen from {} candidates", candidates.len());
        layout.to_vec()
    } else {
        let layout = fallback_layout(rounds);
        log::debug!("no catalogue layout for {rounds} rounds, using fallback {layout:?}");
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn catalogue_entries_are_valid() {
        for layout in LAYOUT_CATALOGUE {
            assert!(is_valid_layout(layout), "{layout:?}");
        }
    }

    #[test]
    fn growth_rule_matches_bounds() {
        assert!(step_is_valid(1, 2));
        assert!(!step_is_valid(1, 3));
        assert!(step_is_valid(4, 2));
        assert!(!step_is_valid(3, 1));
        assert!(step_is_valid(5, 3));
        assert!(!step_is_valid(5, 2));
    }

    #[test]
    fn selects_layout_of_requested_length() {
        let mut rng = SmallRng::seed_from_u64(9);
        for rounds in 3..=9 {
            for _ in 0..10 {
                let layout = select_layout(rounds, &mut rng);
                assert_eq!(layout.len(), rounds);
                assert!(is_valid_layout(&layout));
            }
        }
    }

    #[test]
    fn falls_back_when_catalogue_has_no_match() {
        let mut rng = SmallRng::seed_from_u64(3);
        let layout = select_layout(11, &mut rng);
        assert_eq!(layout, fallback_layout(11));
        assert_eq!(layout.len(), 11);
        assert!(is_valid_layout(&layout));
        assert_eq!(fallback_layout(3), vec![1, 2, 1]);
    }
}
