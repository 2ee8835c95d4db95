// Lead-sheet progression parsing into chord windows.
//
// Input looks like `| Dm9  G13 | C∆ | % |`: bars are separated by `|`, a bar
// holds one chord (8 eighths) or two chords (4 eighths each), and `%`
// repeats the previous bar. Windows come out contiguous and ordered by start.
// Chord symbols are not checked here; the scheduler resolves them against
// the theory store.

use crate::error::TheoryError;
use serde::{Deserialize, Serialize};

/// Eighths in a 4/4 bar.
pub const BAR_EIGHTHS: u32 = 8;

/// One chord's slice of time, in absolute eighth notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChordWindow {
    pub chord_symbol: String,
    pub start_eighth: u32,
    pub length_eighths: u32,
}

impl ChordWindow {
    /// First eighth after this window.
    pub fn end_eighth(&self) -> u32 {
        self.start_eighth + self.length_eighths
    }
}

/// Parse a bar-separated progression.
pub fn parse_progression(text: &str) -> Result<Vec<ChordWindow>, TheoryError> {
    let mut windows = Vec::new();
    let mut previous_bar: Option<Vec<String>> = None;
    let mut cursor = 0u32;

    let bars = text.split('|').map(str::trim).filter(|bar| !bar.is_empty());
    for (bar_idx, bar) in bars.enumerate() {
        let bar_number = bar_idx + 1;
        let tokens: Vec<&str> = bar.split_whitespace().collect();

        let chords: Vec<String> = if tokens == ["%"] {
            previous_bar
                .clone()
                .ok_or_else(|| TheoryError::ProgressionSyntax {
                    bar: bar_number,
                    reason: "'%' has no previous bar to repeat".to_string(),
                })?
        } else {
            if tokens.len() > 2 {
                return Err(TheoryError::ProgressionSyntax {
                    bar: bar_number,
                    reason: format!("{} chords in one bar (at most 2)", tokens.len()),
                });
            }
            if tokens.contains(&"%") {
                return Err(TheoryError::ProgressionSyntax {
                    bar: bar_number,
                    reason: "'%' must stand alone in its bar".to_string(),
                });
            }
            tokens.iter().map(|t| t.to_string()).collect()
        };

        let length = BAR_EIGHTHS / chords.len() as u32;
        for chord in &chords {
            windows.push(ChordWindow {
                chord_symbol: chord.clone(),
                start_eighth: cursor,
                length_eighths: length,
            });
            cursor += length;
        }
        previous_bar = Some(chords);
    }

    if windows.is_empty() {
        return Err(TheoryError::EmptyProgression);
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(windows: &[ChordWindow]) -> Vec<(&str, u32, u32)> {
        windows
            .iter()
            .map(|w| (w.chord_symbol.as_str(), w.start_eighth, w.length_eighths))
            .collect()
    }

    #[test]
    fn one_and_two_chord_bars() {
        let windows = parse_progression("| Dm9  G13 | C∆ |").unwrap();
        assert_eq!(layout(&windows), [("Dm9", 0, 4), ("G13", 4, 4), ("C∆", 8, 8)]);
        assert_eq!(windows[2].end_eighth(), 16);
    }

    #[test]
    fn bar_lines_are_optional_at_the_edges() {
        let windows = parse_progression("Fmaj7 | E7 A7").unwrap();
        assert_eq!(layout(&windows), [("Fmaj7", 0, 8), ("E7", 8, 4), ("A7", 12, 4)]);
    }

    #[test]
    fn repeat_sign_copies_previous_bar() {
        let windows = parse_progression("| Dm7 G7 | % | C∆ |").unwrap();
        assert_eq!(
            layout(&windows),
            [("Dm7", 0, 4), ("G7", 4, 4), ("Dm7", 8, 4), ("G7", 12, 4), ("C∆", 16, 8)]
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(
            parse_progression("| C D E |"),
            Err(TheoryError::ProgressionSyntax { bar: 1, .. })
        ));
        assert!(matches!(
            parse_progression("| % | C |"),
            Err(TheoryError::ProgressionSyntax { bar: 1, .. })
        ));
        assert!(matches!(
            parse_progression("| C | C % |"),
            Err(TheoryError::ProgressionSyntax { bar: 2, .. })
        ));
        assert!(matches!(parse_progression(" | | "), Err(TheoryError::EmptyProgression)));
    }
}
