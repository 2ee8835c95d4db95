// Rhythm placement: where a chord's target lands and where its approach
// figure has to start.
//
// Targets land on offbeats (odd eighth offsets from the window start). A
// 4-eighth window only has room for offsets 1 and 3; every other length
// uses 1, 3, 5, 7. The approach figure runs on consecutive eighths up to
// the landing, so its first note sits `approach_count - 1` eighths earlier.
// That start may fall before the window (anticipation) or even below zero;
// the scheduler decides what to keep.
//
// Parity: a figure that starts on an odd eighth gets one extra "isolated"
// note in front of it so the whole gesture begins on a downbeat.
//
// Pure functions, no state.

use crate::error::ScheduleError;
use bebop_theory::ChordWindow;
use serde::Serialize;

const SHORT_WINDOW_OFFSETS: &[u32] = &[1, 3];
const FULL_WINDOW_OFFSETS: &[u32] = &[1, 3, 5, 7];

/// Timing for one chord's figure, in absolute eighths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RhythmPlacement {
    /// Eighth the target note lands on.
    pub landing: i32,
    /// Eighth of the first approach note (equals `landing` with no approaches).
    pub approach_start: i32,
    /// Earliest eighth of the whole figure, isolated note included.
    pub total_start: i32,
    /// Parity-correction note, one eighth before `approach_start`.
    pub isolated: Option<i32>,
}

impl RhythmPlacement {
    /// Earliest time the figure occupies.
    pub fn earliest(&self) -> i32 {
        self.isolated.unwrap_or(self.approach_start)
    }
}

/// Legal landing offsets for a window of the given length.
pub fn landing_offsets(length_eighths: u32) -> &'static [u32] {
    match length_eighths {
        4 => SHORT_WINDOW_OFFSETS,
        _ => FULL_WINDOW_OFFSETS,
    }
}

/// Merge a preferred order into the legal offsets: preferred offsets that are
/// legal come first in the given order, then the rest in natural order.
pub fn merged_offsets(length_eighths: u32, preferred: Option<&[u32]>) -> Vec<u32> {
    let legal = landing_offsets(length_eighths);
    let mut order: Vec<u32> = Vec::with_capacity(legal.len());
    for &offset in preferred.unwrap_or_default() {
        if legal.contains(&offset) && !order.contains(&offset) {
            order.push(offset);
        }
    }
    for &offset in legal {
        if !order.contains(&offset) {
            order.push(offset);
        }
    }
    order
}

/// Compute where the target lands and where its figure starts.
///
/// `approach_count` is the full formula length, target included, so it must
/// be at least 1.
pub fn compute_placement(
    window: &ChordWindow,
    approach_count: usize,
    preferred: Option<&[u32]>,
) -> Result<RhythmPlacement, ScheduleError> {
    if approach_count == 0 {
        return Err(ScheduleError::InvalidFormulaLength(approach_count));
    }

    let order = merged_offsets(window.length_eighths, preferred);
    let landing = (window.start_eighth + order[0]) as i32;
    let approach_start = landing - (approach_count as i32 - 1);
    let isolated = (approach_start.rem_euclid(2) == 1).then_some(approach_start - 1);

    Ok(RhythmPlacement {
        landing,
        approach_start,
        total_start: isolated.unwrap_or(approach_start),
        isolated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: u32, length: u32) -> ChordWindow {
        ChordWindow {
            chord_symbol: "C∆".to_string(),
            start_eighth: start,
            length_eighths: length,
        }
    }

    #[test]
    fn offsets_depend_on_window_length() {
        assert_eq!(landing_offsets(4), &[1, 3]);
        assert_eq!(landing_offsets(8), &[1, 3, 5, 7]);
        assert_eq!(landing_offsets(6), &[1, 3, 5, 7]);
    }

    #[test]
    fn preferred_order_goes_first_and_illegal_offsets_are_dropped() {
        assert_eq!(merged_offsets(8, Some(&[5, 3])), vec![5, 3, 1, 7]);
        assert_eq!(merged_offsets(4, Some(&[7, 3])), vec![3, 1]);
        assert_eq!(merged_offsets(4, Some(&[2])), vec![1, 3]);
        assert_eq!(merged_offsets(8, None), vec![1, 3, 5, 7]);
    }

    #[test]
    fn odd_start_gets_isolated_note() {
        // Three-note figure landing on 9 starts on 7, which is odd.
        let p = compute_placement(&window(8, 8), 3, None).unwrap();
        assert_eq!(p.landing, 9);
        assert_eq!(p.approach_start, 7);
        assert_eq!(p.isolated, Some(6));
        assert_eq!(p.total_start, 6);
        assert_eq!(p.earliest(), 6);
    }

    #[test]
    fn even_start_needs_no_isolated_note() {
        let p = compute_placement(&window(8, 8), 4, None).unwrap();
        assert_eq!(p.approach_start, 6);
        assert_eq!(p.isolated, None);
        assert_eq!(p.total_start, 6);
    }

    #[test]
    fn target_only_formula_lands_with_parity_note() {
        let p = compute_placement(&window(0, 4), 1, None).unwrap();
        assert_eq!(p.landing, 1);
        assert_eq!(p.approach_start, 1);
        assert_eq!(p.isolated, Some(0));
    }

    #[test]
    fn negative_starts_use_absolute_parity() {
        // Landing on 1 with five notes starts at -3: odd, so isolated at -4.
        let p = compute_placement(&window(0, 8), 5, None).unwrap();
        assert_eq!(p.approach_start, -3);
        assert_eq!(p.isolated, Some(-4));
    }

    #[test]
    fn policy_order_moves_the_landing() {
        let p = compute_placement(&window(16, 8), 2, Some(&[5])).unwrap();
        assert_eq!(p.landing, 21);
        assert_eq!(p.approach_start, 20);
    }

    #[test]
    fn zero_length_formula_rejected() {
        assert!(matches!(
            compute_placement(&window(0, 8), 0, None),
            Err(ScheduleError::InvalidFormulaLength(0))
        ));
    }
}
