//! # Position Search
//!
//! Enumerates every fingering of a concrete chord on an instrument.
//!
//! The search assigns strings one at a time from the lowest to the
//! highest, choosing "muted" or a fret that sounds one of the chord's
//! not-yet-covered notes. It runs on an explicit frame stack (worst-case
//! depth = string count, no recursion) and prunes during the search:
//! a fretted branch that would stretch the shape past `max_fret_span`
//! dies immediately, as does any branch with more uncovered notes than
//! strings left. Fret candidates are tried in ascending order and string
//! order is fixed, so identical inputs always produce the identical
//! output sequence.
//!
//! Finding nothing is not an error: an empty result is the answer
//! "0 playable positions".

use std::collections::BTreeSet;

use crate::chord::{Chord, ChordName, VoicingOptions};
use crate::instrument::Instrument;
use crate::pitch::Note;
use crate::position::GuitarPosition;

pub const DEFAULT_MAX_FRET_SPAN: i8 = 4;

/// Policies for position enumeration.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Maximum difference between the highest and lowest fretted fret;
    /// enforced during the search, not by post-filtering.
    pub max_fret_span: i8,
    /// Admit thumb-over-the-neck shapes.
    pub allow_thumb: bool,
    /// Let a pitch class sound on more than one string (different
    /// octaves). Applies where candidate voicings are generated.
    pub allow_repeats: bool,
    /// Let the exact same pitch sound on more than one string.
    pub allow_identical: bool,
    /// Keep shapes that fail the hand-shape rules or duplicate a shape
    /// twelve frets down.
    pub include_unplayable: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_fret_span: DEFAULT_MAX_FRET_SPAN,
            allow_thumb: true,
            allow_repeats: false,
            allow_identical: false,
            include_unplayable: false,
        }
    }
}

/// A string's options at one search depth: muted, or `(fret, target)`.
type Choice = Option<(i8, usize)>;

struct Frame {
    choices: Vec<Choice>,
    next: usize,
    covered: u32,
    min_fret: Option<i8>,
    max_fret: Option<i8>,
}

/// All fingerings of `chord` on `instrument`: every chord note sounds on
/// exactly one string, no string sounds anything else, and the policies
/// in `opts` hold. Deterministic; ordering is search order (rank with
/// [`crate::rank`] for presentation).
pub fn enumerate_positions(
    chord: &Chord,
    instrument: &Instrument,
    opts: &SearchOptions,
) -> Vec<GuitarPosition> {
    let targets = chord.notes();
    let n_strings = instrument.string_count();
    if targets.is_empty() || targets.len() > n_strings {
        return Vec::new();
    }
    let full: u32 = (1u32 << targets.len()) - 1;

    let mut raw: Vec<GuitarPosition> = Vec::new();
    let mut assignment: Vec<Option<i8>> = vec![None; n_strings];
    let mut stack: Vec<Frame> = Vec::with_capacity(n_strings);
    stack.push(Frame {
        choices: string_choices(targets, instrument, opts, 0, 0, None, None),
        next: 0,
        covered: 0,
        min_fret: None,
        max_fret: None,
    });

    while let Some(frame) = stack.last_mut() {
        if frame.next >= frame.choices.len() {
            stack.pop();
            continue;
        }
        let choice = frame.choices[frame.next];
        frame.next += 1;
        let (covered, min_fret, max_fret) = (frame.covered, frame.min_fret, frame.max_fret);
        let string = stack.len() - 1;

        let (covered, min_fret, max_fret) = match choice {
            None => {
                assignment[string] = None;
                (covered, min_fret, max_fret)
            }
            Some((fret, target)) => {
                assignment[string] = Some(fret);
                let (min_fret, max_fret) = if fret > 0 {
                    (
                        Some(min_fret.map_or(fret, |m| m.min(fret))),
                        Some(max_fret.map_or(fret, |m| m.max(fret))),
                    )
                } else {
                    (min_fret, max_fret)
                };
                (covered | (1 << target), min_fret, max_fret)
            }
        };

        if string + 1 == n_strings {
            if covered == full {
                raw.push(GuitarPosition::new(assignment.clone()));
            }
            continue;
        }
        let uncovered = (full & !covered).count_ones() as usize;
        if uncovered > n_strings - string - 1 {
            continue;
        }
        stack.push(Frame {
            choices: string_choices(
                targets, instrument, opts, string + 1, covered, min_fret, max_fret,
            ),
            next: 0,
            covered,
            min_fret,
            max_fret,
        });
    }

    if !opts.include_unplayable {
        raw.retain(|p| p.is_playable(opts.max_fret_span, opts.allow_thumb) && !p.redundant());
    }
    filter_subset_duplicates(raw, instrument)
}

/// Choices for one string: muted first, then frets ascending. Identical
/// target pitches collapse to one choice (the lowest uncovered index),
/// so duplicated notes in a voicing never permute.
fn string_choices(
    targets: &[Note],
    instrument: &Instrument,
    opts: &SearchOptions,
    string: usize,
    covered: u32,
    min_fret: Option<i8>,
    max_fret: Option<i8>,
) -> Vec<Choice> {
    let open = instrument.effective_open(string).semitones();
    let range = instrument.fret_range() as i32;
    let mut seen: BTreeSet<i8> = BTreeSet::new();
    let mut frets: Vec<(i8, usize)> = Vec::new();
    for (idx, note) in targets.iter().enumerate() {
        if covered & (1 << idx) != 0 {
            continue;
        }
        let delta = note.semitones() - open;
        if delta < 0 || delta > range {
            continue;
        }
        let fret = delta as i8;
        if !seen.insert(fret) {
            continue;
        }
        if fret > 0 {
            let lo = min_fret.map_or(fret, |m| m.min(fret));
            let hi = max_fret.map_or(fret, |m| m.max(fret));
            if hi - lo > opts.max_fret_span {
                continue;
            }
        }
        frets.push((fret, idx));
    }
    frets.sort_unstable();
    let mut choices: Vec<Choice> = Vec::with_capacity(frets.len() + 1);
    choices.push(None);
    choices.extend(frets.into_iter().map(Some));
    choices
}

/// All single-string renderings of one note.
pub fn note_positions(note: &Note, instrument: &Instrument) -> Vec<GuitarPosition> {
    let n_strings = instrument.string_count();
    let mut out = Vec::new();
    for s in 0..n_strings {
        let delta = note.semitones() - instrument.effective_open(s).semitones();
        if delta >= 0 && delta <= instrument.fret_range() as i32 {
            let mut frets = vec![None; n_strings];
            frets[s] = Some(delta as i8);
            out.push(GuitarPosition::new(frets));
        }
    }
    out
}

/// The full symbol-to-fingerings pipeline: every candidate voicing of
/// `name` within the instrument's range, expanded into positions and
/// subset-filtered.
pub fn chord_name_positions(
    name: &ChordName,
    instrument: &Instrument,
    opts: &SearchOptions,
) -> Vec<GuitarPosition> {
    let vopts = VoicingOptions {
        max_notes: Some(instrument.string_count()),
        allow_repeats: opts.allow_repeats,
        allow_identical: opts.allow_identical,
    };
    let voicings = name.candidate_chords(instrument.lowest(), instrument.highest(), &vopts);
    let mut all: Vec<GuitarPosition> = Vec::new();
    for voicing in &voicings {
        all.extend(enumerate_positions(voicing, instrument, opts));
    }
    filter_subset_duplicates(all, instrument)
}

/// Drop every position whose played strings are a superset (at identical
/// frets) of an already-accepted position with the same pitch-class
/// coverage; the extra strings add nothing. Acceptance runs smallest
/// shape first; the surviving positions keep their input order.
pub fn filter_subset_duplicates(
    positions: Vec<GuitarPosition>,
    instrument: &Instrument,
) -> Vec<GuitarPosition> {
    let classes: Vec<BTreeSet<u8>> = positions
        .iter()
        .map(|p| p.pitch_classes(instrument))
        .collect();
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by_key(|&i| (positions[i].played_count(), i));
    let mut keep = vec![false; positions.len()];
    let mut accepted: Vec<usize> = Vec::new();
    for i in order {
        let dominated = accepted.iter().any(|&j| {
            positions[j].is_subset_of(&positions[i]) && classes[j] == classes[i]
        });
        if !dominated {
            keep[i] = true;
            accepted.push(i);
        }
    }
    positions
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rank::{rank_positions, RankWeights};

    fn pos(pairs: &[(usize, i8)]) -> GuitarPosition {
        GuitarPosition::from_pairs(6, pairs)
    }

    #[test]
    fn test_two_note_chord_positions() {
        let g = Instrument::standard();
        let chord = Chord::from_names(&["A2", "C#3"]).unwrap();
        let actual = enumerate_positions(&chord, &g, &SearchOptions::default());
        let expected = [pos(&[(0, 5), (1, 4)]), pos(&[(0, 9), (1, 0)])];
        assert_eq!(actual.len(), 2);
        for p in &expected {
            assert!(actual.contains(p), "missing {}", p);
        }
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let g = Instrument::standard();
        let chord = Chord::from_names(&["C3", "E3", "G3", "C4"]).unwrap();
        let first = enumerate_positions(&chord, &g, &SearchOptions::default());
        let second = enumerate_positions(&chord, &g, &SearchOptions::default());
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_span_bound_holds() {
        let g = Instrument::standard();
        let chord = Chord::from_names(&["C3", "G3", "E4", "Bb4"]).unwrap();
        for max_span in [1, 2, 3, 4] {
            let opts = SearchOptions {
                max_fret_span: max_span,
                ..Default::default()
            };
            for p in enumerate_positions(&chord, &g, &opts) {
                assert!(
                    p.fret_span() <= max_span,
                    "{} exceeds span {}",
                    p,
                    max_span
                );
            }
        }
    }

    #[test]
    fn test_c7_census_and_best_position() {
        let g = Instrument::preset("standard", 12, 0).unwrap();
        let chord = Chord::from_names(&["C3", "G3", "E4", "Bb4"]).unwrap();
        let mut positions = enumerate_positions(&chord, &g, &SearchOptions::default());
        assert_eq!(positions.len(), 9);
        rank_positions(&mut positions, &RankWeights::default());
        assert_eq!(positions[0], pos(&[(0, 8), (1, 10), (3, 9), (4, 11)]));
    }

    #[test]
    fn test_open_position_found_under_capo() {
        let g = Instrument::preset("standard", 22, 2).unwrap();
        let notes: Vec<Note> = (0..6).map(|s| g.effective_open(s)).collect();
        let chord = Chord::new(notes);
        let positions = enumerate_positions(&chord, &g, &SearchOptions::default());
        let all_open = GuitarPosition::new(vec![Some(0); 6]);
        assert!(positions.contains(&all_open));
    }

    #[test]
    fn test_note_positions() {
        let c3 = Note::parse("C3").unwrap();
        let g = Instrument::preset("standard", 10, 0).unwrap();
        let actual = note_positions(&c3, &g);
        assert_eq!(actual, vec![pos(&[(0, 8)]), pos(&[(1, 3)])]);

        let g = Instrument::preset("standard", 5, 0).unwrap();
        assert_eq!(note_positions(&c3, &g), vec![pos(&[(1, 3)])]);
    }

    #[test]
    fn test_subset_duplicates_are_dropped() {
        let g = Instrument::standard();
        // A-string 3 sounds C3; the E-string 8 doubles the same class
        let small = pos(&[(1, 3)]);
        let superset = pos(&[(0, 8), (1, 3)]);
        let unrelated = pos(&[(0, 3), (1, 2)]);
        let kept = filter_subset_duplicates(
            vec![superset.clone(), small.clone(), unrelated.clone()],
            &g,
        );
        assert_eq!(kept, vec![small, unrelated]);
    }

    #[test]
    fn test_chord_name_positions_cover_symbol() {
        let g = Instrument::standard();
        let name = ChordName::parse("G7").unwrap();
        let positions = chord_name_positions(&name, &g, &SearchOptions::default());
        assert!(!positions.is_empty());
        for p in &positions {
            assert_eq!(
                p.pitch_classes(&g),
                name.pitch_classes(),
                "{} must sound exactly the chord's classes",
                p
            );
            assert!(p.is_playable(DEFAULT_MAX_FRET_SPAN, true));
        }
    }

    #[test]
    fn test_no_playable_position_is_empty_not_error() {
        // a five-note cluster is unreachable on two strings
        let tuning = Instrument::parse_tuning("E,E2;A,A2").unwrap();
        let g = Instrument::new(tuning, 12, 0).unwrap();
        let chord = Chord::from_names(&["C3", "D3", "E3", "F3", "G3"]).unwrap();
        assert!(enumerate_positions(&chord, &g, &SearchOptions::default()).is_empty());
    }
}
