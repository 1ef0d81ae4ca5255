//! # Guitar Positions
//!
//! A [`GuitarPosition`] maps each string of an instrument to a fret or to
//! "muted". Structural attributes (fret span, barre, thumb use, interior
//! gaps) are derived once at construction; whether the shape fits under a
//! hand is answered by [`GuitarPosition::is_playable`].

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::chord::Chord;
use crate::instrument::Instrument;

/// A fingering shape: one entry per string, low to high.
/// `None` = muted, `Some(0)` = open, `Some(f)` = fretted at `f`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GuitarPosition {
    frets: Vec<Option<i8>>,
    lowest_fret: i8,
    fret_span: i8,
    max_interior_gap: i8,
    use_thumb: bool,
    barre: Option<(usize, usize)>,
    redundant: bool,
}

impl GuitarPosition {
    pub fn new(frets: Vec<Option<i8>>) -> Self {
        let fretted: Vec<(usize, i8)> = frets
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f {
                Some(f) if *f > 0 => Some((i, *f)),
                _ => None,
            })
            .collect();
        let lowest_fret = fretted.iter().map(|&(_, f)| f).min().unwrap_or(0);
        let highest_fret = fretted.iter().map(|&(_, f)| f).max().unwrap_or(0);
        let fret_span = highest_fret - lowest_fret;

        let max_interior_gap = match (fretted.first(), fretted.last()) {
            (Some(&(first, _)), Some(&(last, _))) => {
                let mut gap = 0i8;
                let mut max_gap = 0i8;
                for f in &frets[first..last] {
                    match f {
                        Some(f) if *f > 0 => gap = 0,
                        _ => {
                            gap += 1;
                            max_gap = max_gap.max(gap);
                        }
                    }
                }
                max_gap
            }
            _ => 0,
        };

        let use_thumb =
            fretted.len() == 5 && frets.first().copied().flatten() == Some(lowest_fret);

        let open_count = frets.iter().filter(|f| **f == Some(0)).count();
        let at_lowest: Vec<usize> = fretted
            .iter()
            .filter(|&&(_, f)| f == lowest_fret)
            .map(|&(i, _)| i)
            .collect();
        let barre = if fretted.len() > 4
            && open_count == 0
            && at_lowest.len() > 1
            && !use_thumb
        {
            let lo = at_lowest[0];
            let hi = at_lowest[at_lowest.len() - 1];
            // nothing open or muted inside the barred range
            let clean = frets[lo..=hi]
                .iter()
                .all(|f| matches!(f, Some(f) if *f > 0));
            clean.then_some((lo, hi))
        } else {
            None
        };

        // the same shape exists twelve frets down
        let redundant = !fretted.is_empty() && fretted.iter().all(|&(_, f)| f >= 12);

        Self {
            frets,
            lowest_fret,
            fret_span,
            max_interior_gap,
            use_thumb,
            barre,
            redundant,
        }
    }

    /// Test helper: build a position on `strings` strings from
    /// `(string, fret)` pairs; unnamed strings stay muted.
    pub fn from_pairs(strings: usize, pairs: &[(usize, i8)]) -> Self {
        let mut frets = vec![None; strings];
        for &(i, f) in pairs {
            frets[i] = Some(f);
        }
        Self::new(frets)
    }

    pub fn frets(&self) -> &[Option<i8>] {
        &self.frets
    }

    /// Strings that sound, with their frets.
    pub fn played(&self) -> impl Iterator<Item = (usize, i8)> + '_ {
        self.frets
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.map(|f| (i, f)))
    }

    pub fn played_count(&self) -> usize {
        self.frets.iter().filter(|f| f.is_some()).count()
    }

    pub fn fretted_count(&self) -> usize {
        self.frets.iter().filter(|f| matches!(f, Some(x) if *x > 0)).count()
    }

    pub fn muted_count(&self) -> usize {
        self.frets.iter().filter(|f| f.is_none()).count()
    }

    /// Lowest fretted fret; 0 when nothing is fretted.
    pub fn lowest_fret(&self) -> i8 {
        self.lowest_fret
    }

    /// Distance between the highest and lowest fretted fret.
    pub fn fret_span(&self) -> i8 {
        self.fret_span
    }

    /// Longest run of unfretted strings strictly between the outermost
    /// fretted strings.
    pub fn max_interior_gap(&self) -> i8 {
        self.max_interior_gap
    }

    /// Five fretted strings with the lowest string on the lowest fret:
    /// playable by wrapping the thumb over the neck.
    pub fn use_thumb(&self) -> bool {
        self.use_thumb
    }

    /// The inclusive string range covered by a barre, if this shape
    /// needs one.
    pub fn barre(&self) -> Option<(usize, usize)> {
        self.barre
    }

    /// True when every fretted note sits at or above fret 12: the same
    /// shape exists an octave down.
    pub fn redundant(&self) -> bool {
        self.redundant
    }

    /// Whether the shape fits under a hand.
    ///
    /// Up to four fretted strings are always playable within the span
    /// bound; a fifth needs the thumb or a barre, and barre shapes are
    /// limited to four distinct frets with at most three fretted notes
    /// above the barre.
    pub fn is_playable(&self, max_fret_span: i8, allow_thumb: bool) -> bool {
        if self.played_count() == 0 {
            return false;
        }
        if self.fret_span > max_fret_span {
            return false;
        }
        if self.use_thumb && !allow_thumb {
            return false;
        }
        let fretted: Vec<i8> = self
            .frets
            .iter()
            .copied()
            .filter_map(|f| f.filter(|x| *x > 0))
            .collect();
        if fretted.len() <= 4 || self.use_thumb {
            return true;
        }
        if self.barre.is_none() {
            return false;
        }
        let distinct: BTreeSet<i8> = fretted.iter().copied().collect();
        if distinct.len() > 4 {
            return false;
        }
        if fretted.iter().filter(|&&f| f > self.lowest_fret).count() > 3 {
            return false;
        }
        fretted.iter().filter(|&&f| f == self.lowest_fret).count() > 1
    }

    /// True when `other` plays every string this position plays, at the
    /// same frets.
    pub fn is_subset_of(&self, other: &GuitarPosition) -> bool {
        self.frets.len() == other.frets.len()
            && self
                .played()
                .all(|(i, f)| other.frets[i] == Some(f))
    }

    /// The pitch classes this position sounds on `instrument`.
    pub fn pitch_classes(&self, instrument: &Instrument) -> BTreeSet<u8> {
        self.played()
            .map(|(i, f)| {
                instrument
                    .effective_open(i)
                    .add_semitones(f as i32)
                    .pitch_class()
            })
            .collect()
    }

    /// The concrete notes this position sounds on `instrument`.
    pub fn sounding_chord(&self, instrument: &Instrument) -> Chord {
        Chord::new(
            self.played()
                .map(|(i, f)| instrument.effective_open(i).add_semitones(f as i32))
                .collect(),
        )
    }

    /// ASCII fretboard rows, highest string first.
    ///
    /// ```text
    /// e x|---|---|---|---|
    /// B  |---|---|---|-@-|
    /// G  |---|-@-|---|---|
    /// D  |-@-|---|---|---|
    /// A  |---|---|-@-|---|
    /// E  |-T-|---|---|---|
    ///     3fr
    /// ```
    pub fn diagram(&self, instrument: &Instrument) -> Vec<String> {
        let labels = instrument.labels();
        let widest = labels.iter().map(|l| l.len()).max().unwrap_or(0);
        let cells = (self.fret_span + 1) as usize;
        let mut rows = Vec::with_capacity(self.frets.len() + 1);
        for i in (0..self.frets.len()).rev() {
            let mut marks = vec!["---"; cells];
            let ring = match self.frets[i] {
                Some(f) if f > 0 => {
                    let mark = if self.use_thumb && i == 0 { "-T-" } else { "-@-" };
                    marks[(f - self.lowest_fret) as usize] = mark;
                    ' '
                }
                Some(_) => 'o',
                None => 'x',
            };
            if let Some((lo, hi)) = self.barre {
                if lo < i && i < hi {
                    marks[0] = "-|-";
                }
            }
            let label = &labels[i];
            rows.push(format!(
                "{}{} {}|{}|",
                " ".repeat(widest - label.len()),
                label,
                ring,
                marks.join("|")
            ));
        }
        if self.lowest_fret > 0 {
            rows.push(format!("{}   {}fr", " ".repeat(widest), self.lowest_fret));
        }
        rows
    }
}

impl fmt::Display for GuitarPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for fret in &self.frets {
            if !first {
                f.write_str(" ")?;
            }
            match fret {
                Some(n) => write!(f, "{}", n)?,
                None => f.write_str("x")?,
            }
            first = false;
        }
        Ok(())
    }
}
