//! # Instrument Model
//!
//! A fretted instrument: ordered strings with open tunings, a fret count,
//! and an optional capo. The capo raises every string's effective open
//! pitch and shrinks the usable fret range; fret 0 on a capoed string is
//! the capo itself.

use crate::error::FretworkError;
use crate::pitch::{Accidental, Note, NoteName, PitchName};

/// String labels with open pitches, fret count, capo.
#[derive(Debug, Clone)]
pub struct Instrument {
    name: String,
    labels: Vec<String>,
    open: Vec<Note>,
    frets: i8,
    capo: i8,
    lowest: Note,
    highest: Note,
}

impl Instrument {
    pub const DEFAULT_FRETS: i8 = 22;

    /// Build an instrument from an ordered tuning (lowest string first).
    pub fn new(
        tuning: Vec<(String, Note)>,
        frets: i8,
        capo: i8,
    ) -> Result<Self, FretworkError> {
        Self::with_name("custom", tuning, frets, capo)
    }

    fn with_name(
        name: &str,
        tuning: Vec<(String, Note)>,
        frets: i8,
        capo: i8,
    ) -> Result<Self, FretworkError> {
        if tuning.is_empty() {
            return Err(FretworkError::TuningParseError(
                "tuning must name at least one string".to_string(),
            ));
        }
        if frets < 1 {
            return Err(FretworkError::TuningParseError(format!(
                "fret count must be positive, got {}",
                frets
            )));
        }
        if capo < 0 || capo > frets {
            return Err(FretworkError::TuningParseError(format!(
                "capo {} outside 0..={}",
                capo, frets
            )));
        }
        let (labels, open): (Vec<String>, Vec<Note>) = tuning.into_iter().unzip();
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(FretworkError::TuningParseError(format!(
                    "duplicate string label '{}'",
                    label
                )));
            }
        }
        let lowest_open = *open.iter().min().expect("tuning checked non-empty");
        let highest_open = *open.iter().max().expect("tuning checked non-empty");
        Ok(Self {
            name: name.to_string(),
            labels,
            open,
            frets,
            capo,
            lowest: lowest_open.add_semitones(capo as i32),
            highest: highest_open.add_semitones(frets as i32),
        })
    }

    /// A named preset tuning.
    ///
    /// # Example
    /// ```
    /// use fretwork::Instrument;
    ///
    /// let g = Instrument::preset("drop_d", Instrument::DEFAULT_FRETS, 0).unwrap();
    /// assert_eq!(g.effective_open(0).to_string(), "D2");
    /// ```
    pub fn preset(name: &str, frets: i8, capo: i8) -> Result<Self, FretworkError> {
        let tuning = preset_tuning(name).ok_or_else(|| {
            FretworkError::TuningParseError(format!("unknown tuning preset '{}'", name))
        })?;
        Self::with_name(name, tuning, frets, capo)
    }

    /// Six strings, EADGBE, 22 frets, no capo.
    pub fn standard() -> Self {
        Self::with_name(
            "standard",
            preset_tuning("standard").expect("standard preset exists"),
            Self::DEFAULT_FRETS,
            0,
        )
        .expect("standard preset is valid")
    }

    pub fn tuning_name(&self) -> &str {
        &self.name
    }

    pub fn string_count(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn frets(&self) -> i8 {
        self.frets
    }

    pub fn capo(&self) -> i8 {
        self.capo
    }

    /// The open pitch of a string with the capo applied.
    pub fn effective_open(&self, string: usize) -> Note {
        self.open[string].add_semitones(self.capo as i32)
    }

    /// Frets playable above the capo; the valid fret interval is
    /// `0..=fret_range()`.
    pub fn fret_range(&self) -> i8 {
        self.frets - self.capo
    }

    /// The sounding pitch of a string stopped at `fret`.
    pub fn pitch_at(&self, string: usize, fret: i8) -> Result<Note, FretworkError> {
        let label = self
            .labels
            .get(string)
            .map(|s| s.as_str())
            .unwrap_or("?")
            .to_string();
        if string >= self.labels.len() || fret < 0 || fret > self.fret_range() {
            return Err(FretworkError::OutOfRange {
                string: label,
                fret,
                max: self.fret_range(),
            });
        }
        Ok(self.effective_open(string).add_semitones(fret as i32))
    }

    /// Lowest playable pitch (lowest effective open string).
    pub fn lowest(&self) -> Note {
        self.lowest
    }

    /// Highest playable pitch (highest string at the top fret).
    pub fn highest(&self) -> Note {
        self.highest
    }

    /// Parse a user-supplied tuning: a JSON map (`{"E": "E2", ...}`,
    /// key order = string order, low to high) or a CSV list
    /// (`E,E2;A,A2;...`).
    pub fn parse_tuning(text: &str) -> Result<Vec<(String, Note)>, FretworkError> {
        let text = text.trim();
        if text.starts_with('{') {
            let map: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&text.replace('\'', "\"")).map_err(|e| {
                    FretworkError::TuningParseError(format!("bad JSON tuning: {}", e))
                })?;
            map.into_iter()
                .map(|(label, value)| {
                    let token = value.as_str().ok_or_else(|| {
                        FretworkError::TuningParseError(format!(
                            "string '{}' must map to a note name",
                            label
                        ))
                    })?;
                    Ok((label, Note::parse(token)?))
                })
                .collect()
        } else {
            text.split(';')
                .map(|pair| {
                    let (label, token) = pair.split_once(',').ok_or_else(|| {
                        FretworkError::TuningParseError(format!(
                            "expected 'label,note' in '{}'",
                            pair
                        ))
                    })?;
                    Ok((label.trim().to_string(), Note::parse(token.trim())?))
                })
                .collect()
        }
    }
}

fn preset_tuning(name: &str) -> Option<Vec<(String, Note)>> {
    fn n(name: NoteName, accidental: Accidental, octave: i32) -> Note {
        Note::spelled(PitchName::new(name, accidental), octave)
    }
    use Accidental::{Natural, Sharp};
    use NoteName::{A, B, C, D, E, F, G};
    let tuning: Vec<(&str, Note)> = match name {
        "standard" => vec![
            ("E", n(E, Natural, 2)),
            ("A", n(A, Natural, 2)),
            ("D", n(D, Natural, 3)),
            ("G", n(G, Natural, 3)),
            ("B", n(B, Natural, 3)),
            ("e", n(E, Natural, 4)),
        ],
        "drop_d" => vec![
            ("D", n(D, Natural, 2)),
            ("A", n(A, Natural, 2)),
            ("d", n(D, Natural, 3)),
            ("G", n(G, Natural, 3)),
            ("B", n(B, Natural, 3)),
            ("e", n(E, Natural, 4)),
        ],
        "open_d" => vec![
            ("D", n(D, Natural, 2)),
            ("A", n(A, Natural, 2)),
            ("d", n(D, Natural, 3)),
            ("F#", n(F, Sharp, 3)),
            ("a", n(A, Natural, 3)),
            ("dd", n(D, Natural, 4)),
        ],
        "open_g" => vec![
            ("D", n(D, Natural, 2)),
            ("G", n(G, Natural, 2)),
            ("d", n(D, Natural, 3)),
            ("g", n(G, Natural, 3)),
            ("B", n(B, Natural, 3)),
            ("dd", n(D, Natural, 4)),
        ],
        "open_a" => vec![
            ("E", n(E, Natural, 2)),
            ("A", n(A, Natural, 2)),
            ("C#", n(C, Sharp, 3)),
            ("e", n(E, Natural, 3)),
            ("a", n(A, Natural, 3)),
            ("ee", n(E, Natural, 4)),
        ],
        _ => return None,
    };
    Some(
        tuning
            .into_iter()
            .map(|(label, note)| (label.to_string(), note))
            .collect(),
    )
}
