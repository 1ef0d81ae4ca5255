//! # Progression Optimization
//!
//! Two sequencing problems over an ordered list of chord symbols, solved
//! by the same left-to-right dynamic program over per-chord candidate
//! sets:
//!
//! - **voice leading**: candidates are abstract voicings in a register
//!   window; the transition cost is a minimum-cost matching of voices by
//!   absolute semitone displacement;
//! - **fingering continuity**: candidates are ranked playable positions;
//!   the transition cost is fret distance on strings fretted in both
//!   shapes plus a penalty per string engaged or released.
//!
//! The candidate layers form a DAG, so the DP finds the global optimum;
//! in particular a two-chord progression reduces to the single best pair,
//! and no greedy chaining of adjacent choices can beat the result.

use crate::chord::{Chord, ChordName, VoicingOptions};
use crate::error::FretworkError;
use crate::instrument::Instrument;
use crate::pitch::Note;
use crate::position::GuitarPosition;
use crate::rank::{rank_and_truncate, RankWeights};
use crate::search::{chord_name_positions, SearchOptions};

/// Ranked positions fed into the fingering DP per chord. The DP is exact
/// over this set; the cap only bounds its width.
const CANDIDATES_PER_CHORD: usize = 32;

/// Cost of newly fretting a string or releasing one between two shapes.
const ENGAGE_PENALTY: i32 = 1;

/// An ordered sequence of chord symbols.
#[derive(Debug, Clone)]
pub struct ChordProgression {
    chords: Vec<ChordName>,
}

impl ChordProgression {
    pub fn new(chords: Vec<ChordName>) -> Self {
        Self { chords }
    }

    /// Parse a list of symbols; the first bad symbol aborts the parse.
    pub fn parse(symbols: &[&str]) -> Result<Self, FretworkError> {
        let chords = symbols
            .iter()
            .map(|s| ChordName::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(chords))
    }

    pub fn chords(&self) -> &[ChordName] {
        &self.chords
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

/// Total semitone movement between two chords under the best pairing of
/// their voices.
///
/// Voices match one-to-one by an exact minimum-cost assignment (bitmask
/// DP; chords are at most a handful of notes). When the chords differ
/// in size, the smaller side matches injectively and every surplus voice
/// pays its distance to the nearest note of the other chord.
pub fn voice_movement(a: &Chord, b: &Chord) -> i32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (small, large) = if a.len() <= b.len() {
        (a.notes(), b.notes())
    } else {
        (b.notes(), a.notes())
    };
    let n = small.len();
    let m = large.len();
    let size = 1usize << m;
    let mut dp = vec![i32::MAX; size];
    dp[0] = 0;
    for mask in 0..size {
        if dp[mask] == i32::MAX {
            continue;
        }
        let i = (mask as u32).count_ones() as usize;
        if i >= n {
            continue;
        }
        for (j, note) in large.iter().enumerate() {
            if mask & (1 << j) != 0 {
                continue;
            }
            let next = mask | (1 << j);
            let cost = dp[mask] + (small[i].semitones() - note.semitones()).abs();
            if cost < dp[next] {
                dp[next] = cost;
            }
        }
    }
    let mut best = i32::MAX;
    for mask in 0..size {
        if (mask as u32).count_ones() as usize != n || dp[mask] == i32::MAX {
            continue;
        }
        let mut total = dp[mask];
        for (j, note) in large.iter().enumerate() {
            if mask & (1 << j) == 0 {
                let nearest = small
                    .iter()
                    .map(|s| (s.semitones() - note.semitones()).abs())
                    .min()
                    .expect("small side checked non-empty");
                total += nearest;
            }
        }
        best = best.min(total);
    }
    best
}

/// Hand movement between two fingering shapes: fret distance on strings
/// fretted in both, plus [`ENGAGE_PENALTY`] per string fretted in exactly
/// one. Open and muted strings need no finger and move for free.
pub fn position_movement(a: &GuitarPosition, b: &GuitarPosition) -> i32 {
    let mut cost = 0;
    for (fa, fb) in a.frets().iter().copied().zip(b.frets().iter().copied()) {
        let fa = fa.filter(|f| *f > 0);
        let fb = fb.filter(|f| *f > 0);
        match (fa, fb) {
            (Some(x), Some(y)) => cost += (x as i32 - y as i32).abs(),
            (Some(_), None) | (None, Some(_)) => cost += ENGAGE_PENALTY,
            (None, None) => {}
        }
    }
    cost
}

/// The voicing sequence minimizing cumulative voice movement across the
/// progression, with every voicing inside `[lower, upper]`. Cost ties
/// break toward tighter voicings.
pub fn optimize_voice_leading(
    progression: &ChordProgression,
    lower: Note,
    upper: Note,
) -> Result<Vec<Chord>, FretworkError> {
    if progression.is_empty() {
        return Ok(Vec::new());
    }
    let mut layers: Vec<Vec<Chord>> = Vec::with_capacity(progression.len());
    for (index, name) in progression.chords().iter().enumerate() {
        let candidates = name.candidate_chords(lower, upper, &VoicingOptions::default());
        if candidates.is_empty() {
            return Err(FretworkError::NoPlayableProgression {
                index,
                symbol: name.to_string(),
            });
        }
        layers.push(candidates);
    }
    let path = best_path(&layers, voice_movement, |c: &Chord| c.span());
    Ok(path
        .into_iter()
        .enumerate()
        .map(|(i, j)| layers[i][j].clone())
        .collect())
}

/// The fingering sequence minimizing cumulative hand movement across the
/// progression. Candidates per chord are the ranked playable positions;
/// a chord with none fails with its index.
pub fn optimize_guitar_progression(
    progression: &ChordProgression,
    instrument: &Instrument,
    opts: &SearchOptions,
) -> Result<Vec<GuitarPosition>, FretworkError> {
    if progression.is_empty() {
        return Ok(Vec::new());
    }
    let weights = RankWeights::default();
    let mut layers: Vec<Vec<GuitarPosition>> = Vec::with_capacity(progression.len());
    for (index, name) in progression.chords().iter().enumerate() {
        let positions = chord_name_positions(name, instrument, opts);
        let positions = rank_and_truncate(positions, CANDIDATES_PER_CHORD, &weights);
        if positions.is_empty() {
            return Err(FretworkError::NoPlayableProgression {
                index,
                symbol: name.to_string(),
            });
        }
        layers.push(positions);
    }
    let path = best_path(&layers, position_movement, |p: &GuitarPosition| {
        p.fret_span() as i32
    });
    Ok(path
        .into_iter()
        .enumerate()
        .map(|(i, j)| layers[i][j].clone())
        .collect())
}

/// Left-to-right DP over candidate layers. Returns one index per layer.
/// Ties in cumulative cost break toward the candidate with the smaller
/// `width`, then the smaller index, so the result is deterministic.
fn best_path<T>(
    layers: &[Vec<T>],
    transition: impl Fn(&T, &T) -> i32,
    width: impl Fn(&T) -> i32,
) -> Vec<usize> {
    let n = layers.len();
    let mut cost: Vec<Vec<i64>> = Vec::with_capacity(n);
    let mut parent: Vec<Vec<usize>> = Vec::with_capacity(n);
    cost.push(vec![0; layers[0].len()]);
    parent.push(vec![0; layers[0].len()]);
    for i in 1..n {
        let mut layer_cost = Vec::with_capacity(layers[i].len());
        let mut layer_parent = Vec::with_capacity(layers[i].len());
        for cur in &layers[i] {
            let mut best: Option<(i64, i32, usize)> = None;
            for (k, prev) in layers[i - 1].iter().enumerate() {
                let key = (cost[i - 1][k] + transition(prev, cur) as i64, width(prev), k);
                if best.map_or(true, |b| key < b) {
                    best = Some(key);
                }
            }
            let (c, _, k) = best.expect("layers are non-empty");
            layer_cost.push(c);
            layer_parent.push(k);
        }
        cost.push(layer_cost);
        parent.push(layer_parent);
    }
    let last = n - 1;
    let mut end: Option<(i64, i32, usize)> = None;
    for (j, cand) in layers[last].iter().enumerate() {
        let key = (cost[last][j], width(cand), j);
        if end.map_or(true, |b| key < b) {
            end = Some(key);
        }
    }
    let mut idx = end.expect("layers are non-empty").2;
    let mut path = vec![0; n];
    for i in (0..n).rev() {
        path[i] = idx;
        idx = parent[i][idx];
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(s: &str) -> Note {
        Note::parse(s).unwrap()
    }

    fn chord(s: &str) -> Chord {
        Chord::from_names(&s.split(',').collect::<Vec<_>>()).unwrap()
    }

    fn total_movement(chords: &[Chord]) -> i32 {
        chords
            .windows(2)
            .map(|pair| voice_movement(&pair[0], &pair[1]))
            .sum()
    }

    #[test]
    fn test_voice_movement_equal_sizes() {
        let c1 = chord("C3,Eb3,F3,A3");
        let c2 = chord("C3,E3,G3,Bb3");
        assert_eq!(voice_movement(&c1, &c2), 4);
        assert_eq!(voice_movement(&c2, &c1), 4);
        assert_eq!(voice_movement(&c1, &c1), 0);
    }

    #[test]
    fn test_voice_movement_different_sizes() {
        let c1 = chord("C3,F3,A3");
        let c2 = chord("C3,E3,G3,Bb3");
        assert_eq!(voice_movement(&c1, &c2), 4);
        assert_eq!(voice_movement(&c2, &c1), 4);
    }

    #[test]
    fn test_position_movement() {
        let a = GuitarPosition::from_pairs(6, &[(1, 2), (3, 2)]);
        let b = GuitarPosition::from_pairs(6, &[(1, 3), (4, 3)]);
        // A string slides one fret; G released, B engaged
        assert_eq!(position_movement(&a, &b), 3);
        assert_eq!(position_movement(&a, &a), 0);
        // opens and mutes move for free
        let open = GuitarPosition::from_pairs(6, &[(1, 0), (3, 0)]);
        let muted = GuitarPosition::from_pairs(6, &[]);
        assert_eq!(position_movement(&open, &muted), 0);
    }

    #[test]
    fn test_two_chord_progression_is_single_pair_minimum() {
        let progression = ChordProgression::parse(&["Dm7", "G7"]).unwrap();
        let (lower, upper) = (note("C2"), note("C4"));
        let result = optimize_voice_leading(&progression, lower, upper).unwrap();
        assert_eq!(result.len(), 2);
        let opts = VoicingOptions::default();
        let best_pair = progression.chords()[0]
            .candidate_chords(lower, upper, &opts)
            .iter()
            .flat_map(|a| {
                progression.chords()[1]
                    .candidate_chords(lower, upper, &opts)
                    .into_iter()
                    .map(move |b| voice_movement(a, &b))
            })
            .min()
            .unwrap();
        assert_eq!(voice_movement(&result[0], &result[1]), best_pair);
    }

    #[test]
    fn test_voice_leading_beats_exhaustive_search() {
        let progression = ChordProgression::parse(&["Dm7", "G7", "CM7"]).unwrap();
        let (lower, upper) = (note("C3"), note("C5"));
        let result = optimize_voice_leading(&progression, lower, upper).unwrap();
        assert_eq!(result.len(), 3);
        for c in &result {
            assert_eq!(c.len(), 4);
        }
        let dp_total = total_movement(&result);

        let opts = VoicingOptions::default();
        let layers: Vec<Vec<Chord>> = progression
            .chords()
            .iter()
            .map(|n| n.candidate_chords(lower, upper, &opts))
            .collect();
        let mut exhaustive = i32::MAX;
        for a in &layers[0] {
            for b in &layers[1] {
                let ab = voice_movement(a, b);
                for c in &layers[2] {
                    exhaustive = exhaustive.min(ab + voice_movement(b, c));
                }
            }
        }
        assert_eq!(dp_total, exhaustive);
    }

    #[test]
    fn test_voice_leading_never_worse_than_greedy() {
        let progression =
            ChordProgression::parse(&["Em7", "A7", "Dm7", "G7", "CM7"]).unwrap();
        let (lower, upper) = (note("C3"), note("C5"));
        let result = optimize_voice_leading(&progression, lower, upper).unwrap();
        let dp_total = total_movement(&result);

        let opts = VoicingOptions::default();
        let layers: Vec<Vec<Chord>> = progression
            .chords()
            .iter()
            .map(|n| n.candidate_chords(lower, upper, &opts))
            .collect();
        let mut current = layers[0][0].clone();
        let mut greedy_total = 0;
        for layer in &layers[1..] {
            let next = layer
                .iter()
                .min_by_key(|c| voice_movement(&current, c))
                .unwrap()
                .clone();
            greedy_total += voice_movement(&current, &next);
            current = next;
        }
        assert!(dp_total <= greedy_total);
    }

    #[test]
    fn test_optimize_guitar_progression() {
        let progression = ChordProgression::parse(&["Dm7", "G7", "CM7"]).unwrap();
        let g = Instrument::standard();
        let opts = SearchOptions::default();
        let result = optimize_guitar_progression(&progression, &g, &opts).unwrap();
        assert_eq!(result.len(), 3);
        for (name, position) in progression.chords().iter().zip(&result) {
            assert_eq!(
                position.pitch_classes(&g),
                name.pitch_classes(),
                "chosen position must sound {}",
                name
            );
            assert!(position.is_playable(opts.max_fret_span, opts.allow_thumb));
        }
        // deterministic
        let again = optimize_guitar_progression(&progression, &g, &opts).unwrap();
        assert_eq!(result, again);
    }

    #[test]
    fn test_unrealizable_chord_reports_index() {
        let progression = ChordProgression::parse(&["C", "Cmaj7", "G"]).unwrap();
        let tuning = Instrument::parse_tuning("E,E2;A,A2").unwrap();
        let g = Instrument::new(tuning, 12, 0).unwrap();
        let err = optimize_guitar_progression(&progression, &g, &SearchOptions::default())
            .unwrap_err();
        match err {
            FretworkError::NoPlayableProgression { index, symbol } => {
                assert_eq!(index, 0);
                assert_eq!(symbol, "C");
            }
            other => panic!("expected NoPlayableProgression, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_failure_surfaces_immediately() {
        assert!(ChordProgression::parse(&["Dm7", "Qx"]).is_err());
    }

    #[test]
    fn test_empty_progression() {
        let progression = ChordProgression::new(Vec::new());
        let result =
            optimize_voice_leading(&progression, note("C2"), note("C5")).unwrap();
        assert!(result.is_empty());
    }
}
