// The scheduler: turns chord windows into a bebop targeting line.
//
// Per window, in order and never revisited:
// 1. `ContourGenerator` picks the target degree and pitch.
// 2. `FormulaSelector` draws an approach formula for that degree's type.
// 3. The policy's preferred landing order for the window length, if any.
// 4. `fit_formula` places the figure, dropping leading approach notes until
//    it no longer reaches back past the previous window's start (or 0).
// 5. Approach offsets are added to the target pitch, wrapped into the fixed
//    register, and laid on consecutive eighths from `approach_start`.
// 6. The parity note, unless it would sit before time 0 in the first window.
// 7. Approach notes reaching back further than one window are dropped.
// 8. The target itself at the landing.
//
// After the last window the notes are sorted and one closure note resolves
// the final target a step away (see `closure_note`).
//
// Any failure aborts the run; there is no partial output.

use crate::contour::{ContourGenerator, ContourTarget};
use crate::error::ScheduleError;
use crate::formula::{FormulaPolicy, FormulaSelector};
use crate::phrase::{NoteSource, ScheduledNote};
use crate::rhythm::{RhythmPlacement, compute_placement};
use bebop_prng::LineRng;
use bebop_theory::{ChordWindow, Register, TheoryStore};
use log::{debug, trace};

/// Largest leap, in semitones, the closure may make from the final target.
const MAX_CLOSURE_LEAP: i32 = 11;

/// Caller-facing knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOptions {
    /// 0..1 register narrowing for the contour (0 = full [60, 84]).
    pub slider: f64,
    pub policy: Option<FormulaPolicy>,
}

/// Shrink `formula` from the front until its figure starts at or after
/// `lower_bound`, or only the target is left.
///
/// Terminates after at most `formula.len() - 1` drops.
pub fn fit_formula(
    window: &ChordWindow,
    mut formula: Vec<i8>,
    lower_bound: i32,
    preferred: Option<&[u32]>,
) -> Result<(Vec<i8>, RhythmPlacement), ScheduleError> {
    loop {
        let placement = compute_placement(window, formula.len(), preferred)?;
        if placement.earliest() >= lower_bound || formula.len() <= 1 {
            return Ok((formula, placement));
        }
        trace!(
            "{}: figure of {} starts at {} before bound {}, dropping {}",
            window.chord_symbol,
            formula.len(),
            placement.earliest(),
            lower_bound,
            formula[0]
        );
        formula.remove(0);
    }
}

/// Closure note for a time-sorted line, or `None` if it has no target.
///
/// One eighth after the latest target, a whole step below it; a whole step
/// above when below the fixed floor, else the floor itself; and a fourth
/// below (wrapped) if that still leaps more than a major seventh.
pub fn closure_note(notes: &[ScheduledNote]) -> Option<ScheduledNote> {
    let last_target = notes
        .iter()
        .filter(|n| n.src == NoteSource::Target)
        .max_by_key(|n| n.t)?;

    let fixed = Register::FIXED;
    let target = last_target.midi as i32;
    let mut pitch = target - 2;
    if pitch < fixed.low() {
        pitch = target + 2;
        if !fixed.contains(pitch) {
            pitch = fixed.low();
        }
    }
    if (pitch - target).abs() > MAX_CLOSURE_LEAP {
        pitch = fixed.wrap(target - 5);
    }

    let mut note = ScheduledNote::new(last_target.t + 1, pitch as u8, NoteSource::Closure);
    note.chord = last_target.chord.clone();
    Some(note)
}

/// Owns the per-run state: contour direction and the last formula type.
///
/// Built for one run and consumed by it.
pub struct Scheduler<'a> {
    store: &'a TheoryStore,
    contour: ContourGenerator,
    selector: FormulaSelector,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        store: &'a TheoryStore,
        contour: ContourGenerator,
        policy: Option<FormulaPolicy>,
    ) -> Self {
        Scheduler {
            store,
            contour,
            selector: FormulaSelector::new(policy),
        }
    }

    /// Schedule every window and append the closure.
    pub fn run(
        mut self,
        windows: &[ChordWindow],
        rng: &mut LineRng,
    ) -> Result<Vec<ScheduledNote>, ScheduleError> {
        let mut notes = Vec::new();
        for (idx, window) in windows.iter().enumerate() {
            let previous_start = idx
                .checked_sub(1)
                .map(|prev| windows[prev].start_eighth as i32);
            self.schedule_window(window, previous_start, rng, &mut notes)?;
        }

        notes.sort_by_key(|n| n.t);
        if let Some(closure) = closure_note(&notes) {
            notes.push(closure);
            notes.sort_by_key(|n| n.t);
        }
        Ok(notes)
    }

    fn schedule_window(
        &mut self,
        window: &ChordWindow,
        previous_start: Option<i32>,
        rng: &mut LineRng,
        notes: &mut Vec<ScheduledNote>,
    ) -> Result<(), ScheduleError> {
        let profile = self.store.chord_profile(&window.chord_symbol)?;
        let target = self.contour.next_target(&window.chord_symbol, &profile)?;
        let formula = self.selector.select(self.store, &profile, &target.degree, rng)?;

        let preferred = self
            .selector
            .policy()
            .and_then(|policy| policy.landing_order_for(window.length_eighths));
        let lower_bound = previous_start.unwrap_or(0);
        let (formula, placement) = fit_formula(window, formula, lower_bound, preferred)?;

        debug!(
            "{} @{}+{}: target {} ({}) formula {:?} landing {} start {}",
            profile.symbol,
            window.start_eighth,
            window.length_eighths,
            target.pitch,
            target.degree,
            formula,
            placement.landing,
            placement.total_start
        );

        emit_figure(
            window,
            &profile.symbol,
            &target,
            &formula,
            &placement,
            previous_start,
            notes,
        );
        Ok(())
    }
}

/// Steps 5–8: realize the placed formula as notes.
fn emit_figure(
    window: &ChordWindow,
    chord: &str,
    target: &ContourTarget,
    formula: &[i8],
    placement: &RhythmPlacement,
    previous_start: Option<i32>,
    notes: &mut Vec<ScheduledNote>,
) {
    let fixed = Register::FIXED;
    let target_midi = target.midi as i32;
    let window_start = window.start_eighth as i32;

    if let Some(t) = placement.isolated {
        let before_phrase = t < 0 && previous_start.is_none();
        if !before_phrase {
            notes.push(ScheduledNote::new(
                t,
                fixed.wrap(target_midi) as u8,
                NoteSource::Isolated,
            ));
        }
    }

    let reach_limit = window_start.min(previous_start.unwrap_or(window_start));
    let approaches = &formula[..formula.len().saturating_sub(1)];
    for (i, &offset) in approaches.iter().enumerate() {
        let t = placement.approach_start + i as i32;
        if t < reach_limit {
            continue;
        }
        let midi = fixed.wrap(target_midi + offset as i32) as u8;
        notes.push(ScheduledNote::new(t, midi, NoteSource::Approach).with_chord(chord));
    }

    notes.push(
        ScheduledNote::new(placement.landing, target.midi, NoteSource::Target)
            .with_chord(chord)
            .with_degree(target.degree.clone()),
    );
}

/// Schedule a whole progression with fresh per-run state.
pub fn schedule_progression(
    windows: &[ChordWindow],
    store: &TheoryStore,
    rng: &mut LineRng,
    options: &ScheduleOptions,
) -> Result<Vec<ScheduledNote>, ScheduleError> {
    let contour = ContourGenerator::from_slider(options.slider);
    Scheduler::new(store, contour, options.policy.clone()).run(windows, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bebop_theory::{default_store, parse_progression};

    fn window(symbol: &str, start: u32, length: u32) -> ChordWindow {
        ChordWindow {
            chord_symbol: symbol.to_string(),
            start_eighth: start,
            length_eighths: length,
        }
    }

    fn target_note(t: i32, midi: u8) -> ScheduledNote {
        ScheduledNote::new(t, midi, NoteSource::Target).with_chord("C")
    }

    #[test]
    fn fit_keeps_a_formula_that_already_fits() {
        let (formula, placement) = fit_formula(&window("C∆", 8, 8), vec![2, -1, 0], 4, None).unwrap();
        assert_eq!(formula, vec![2, -1, 0]);
        assert_eq!(placement.earliest(), 6);
    }

    #[test]
    fn fit_shrinks_from_the_front_in_the_first_window() {
        // Landing on 1: five notes start at -3 (parity note at -4), four at -2,
        // three at -1 (parity at -2), two at 0.
        let (formula, placement) =
            fit_formula(&window("C∆", 0, 4), vec![5, 4, 2, -1, 0], 0, None).unwrap();
        assert_eq!(formula, vec![-1, 0]);
        assert_eq!(placement.approach_start, 0);
        assert_eq!(placement.isolated, None);
    }

    #[test]
    fn fit_stops_at_the_target() {
        // An absurd bound can never be met; the loop still ends.
        let (formula, _) = fit_formula(&window("C∆", 0, 8), vec![3, 2, 1, -1, 0], 100, None).unwrap();
        assert_eq!(formula, vec![0]);
    }

    #[test]
    fn fit_rejects_an_empty_formula() {
        assert!(matches!(
            fit_formula(&window("C∆", 0, 8), Vec::new(), 0, None),
            Err(ScheduleError::InvalidFormulaLength(0))
        ));
    }

    #[test]
    fn closure_steps_down_from_the_last_target() {
        let notes = vec![target_note(1, 70), target_note(9, 72)];
        let closure = closure_note(&notes).unwrap();
        assert_eq!(closure.t, 10);
        assert_eq!(closure.midi, 70);
        assert_eq!(closure.src, NoteSource::Closure);
        assert_eq!(closure.chord.as_deref(), Some("C"));
    }

    #[test]
    fn closure_steps_up_near_the_floor() {
        let closure = closure_note(&[target_note(3, 61)]).unwrap();
        assert_eq!(closure.midi, 63);
    }

    #[test]
    fn no_closure_without_targets() {
        let notes = vec![ScheduledNote::new(0, 60, NoteSource::Approach)];
        assert!(closure_note(&notes).is_none());
        assert!(closure_note(&[]).is_none());
    }

    #[test]
    fn emitted_notes_follow_the_placement() {
        let store = default_store();
        let windows = parse_progression("| C∆ |").unwrap();
        let mut rng = LineRng::new(17);
        let notes =
            schedule_progression(&windows, &store, &mut rng, &ScheduleOptions::default()).unwrap();

        let targets: Vec<&ScheduledNote> =
            notes.iter().filter(|n| n.src == NoteSource::Target).collect();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].t, 1);
        assert_eq!(targets[0].midi, 72);
        assert_eq!(targets[0].degree.as_deref(), Some("1"));
        assert_eq!(targets[0].chord.as_deref(), Some("Cmaj7"));

        // Nothing may anticipate before the phrase starts.
        assert!(notes.iter().all(|n| n.t >= 0));
        assert_eq!(notes.last().unwrap().src, NoteSource::Closure);
        assert_eq!(notes.last().unwrap().t, 2);
    }

    #[test]
    fn unknown_chord_aborts_the_run() {
        let store = default_store();
        let windows = vec![window("C∆", 0, 8), window("Qxx", 8, 8)];
        let mut rng = LineRng::new(1);
        let err = schedule_progression(&windows, &store, &mut rng, &ScheduleOptions::default())
            .unwrap_err();
        assert!(err.to_string().contains("Qxx"), "{err}");
    }

    #[test]
    fn landing_order_from_policy_is_used() {
        let store = default_store();
        let mut policy = FormulaPolicy::default();
        policy.landing_order.insert(8, vec![5]);
        let options = ScheduleOptions { slider: 0.0, policy: Some(policy) };
        let windows = parse_progression("| C∆ | F∆ |").unwrap();
        let mut rng = LineRng::new(4);
        let notes = schedule_progression(&windows, &store, &mut rng, &options).unwrap();
        let landings: Vec<i32> = notes
            .iter()
            .filter(|n| n.src == NoteSource::Target)
            .map(|n| n.t)
            .collect();
        assert_eq!(landings, vec![5, 13]);
    }
}
