//! # Chord Model
//!
//! Concrete chords ([`Chord`]: sorted notes) and symbolic chord names
//! ([`ChordName`]: root + quality + extensions + optional slash bass).
//!
//! ## Symbol Grammar
//! ```text
//! symbol    = root quality extension* ( "/" bass )?
//! root      = letter accidental?          e.g. C, F#, Bb, Ebb
//! quality   = "" | maj | M | m | min | dim | aug | sus2 | sus4
//!           | maj7 | M7 | 7 | mM7 | mmaj7 | minmaj7 | minM7
//!           | m7 | min7 | m7b5 | dim7 | aug7 | 6
//! extension = [b#]? ( 9 | 11 | 13 )
//! bass      = letter accidental?
//! ```
//! Tokens are matched longest-first, so `Cmaj7` never parses as
//! `C` + `maj` + junk, and `Cm7b5` resolves to the half-diminished
//! quality rather than `m7` + `b5`. Unknown trailing tokens are an
//! error, never ignored.
//!
//! A quality is a closed set of interval patterns; there is no open-ended
//! chord taxonomy. Extensions are semitone offsets from the root an
//! octave up (9 → 14, 11 → 17, 13 → 21, modifier ±1).

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::error::FretworkError;
use crate::pitch::{Accidental, Bias, Note, NoteName, PitchName};

/// An ordered (bass-first) list of concrete notes.
///
/// Duplicate semitone values are allowed only when the constructing
/// caller put them there (see [`VoicingOptions`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Chord {
    notes: Vec<Note>,
}

impl Chord {
    /// Build a chord; notes are sorted ascending so the bass comes first.
    pub fn new(mut notes: Vec<Note>) -> Self {
        notes.sort();
        Self { notes }
    }

    /// Build a chord from note tokens.
    ///
    /// # Example
    /// ```
    /// use fretwork::Chord;
    ///
    /// let c = Chord::from_names(&["E4", "C3", "G3"]).unwrap();
    /// assert_eq!(c.to_string(), "C3,G3,E4");
    /// ```
    pub fn from_names(names: &[&str]) -> Result<Self, FretworkError> {
        let notes = names
            .iter()
            .map(|s| Note::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(notes))
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// The lowest note.
    pub fn bass(&self) -> Option<Note> {
        self.notes.first().copied()
    }

    /// The highest note.
    pub fn top(&self) -> Option<Note> {
        self.notes.last().copied()
    }

    /// Distance in semitones from lowest to highest note.
    pub fn span(&self) -> i32 {
        match (self.bass(), self.top()) {
            (Some(lo), Some(hi)) => hi.semitones() - lo.semitones(),
            _ => 0,
        }
    }

    /// The set of sounding pitch classes.
    pub fn pitch_classes(&self) -> BTreeSet<u8> {
        self.notes.iter().map(|n| n.pitch_class()).collect()
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for n in &self.notes {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", n)?;
            first = false;
        }
        Ok(())
    }
}

/// Chord quality, keyed to a fixed interval set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major7,
    Dominant7,
    MinorMajor7,
    Minor7,
    HalfDiminished,
    Diminished7,
    Augmented7,
    Sixth,
}

/// Every accepted quality token. Order is irrelevant; matching takes the
/// longest token that prefixes the input.
const QUALITY_TOKENS: &[(&str, Quality)] = &[
    ("", Quality::Major),
    ("maj", Quality::Major),
    ("M", Quality::Major),
    ("m", Quality::Minor),
    ("min", Quality::Minor),
    ("dim", Quality::Diminished),
    ("aug", Quality::Augmented),
    ("sus2", Quality::Sus2),
    ("sus4", Quality::Sus4),
    ("maj7", Quality::Major7),
    ("M7", Quality::Major7),
    ("7", Quality::Dominant7),
    ("minmaj7", Quality::MinorMajor7),
    ("minM7", Quality::MinorMajor7),
    ("mmaj7", Quality::MinorMajor7),
    ("mM7", Quality::MinorMajor7),
    ("min7", Quality::Minor7),
    ("m7", Quality::Minor7),
    ("m7b5", Quality::HalfDiminished),
    ("dim7", Quality::Diminished7),
    ("aug7", Quality::Augmented7),
    ("6", Quality::Sixth),
];

impl Quality {
    /// Semitone offsets from the root.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Quality::Major => &[0, 4, 7],
            Quality::Minor => &[0, 3, 7],
            Quality::Diminished => &[0, 3, 6],
            Quality::Augmented => &[0, 4, 8],
            Quality::Sus2 => &[0, 2, 7],
            Quality::Sus4 => &[0, 5, 7],
            Quality::Major7 => &[0, 4, 7, 11],
            Quality::Dominant7 => &[0, 4, 7, 10],
            Quality::MinorMajor7 => &[0, 3, 7, 11],
            Quality::Minor7 => &[0, 3, 7, 10],
            Quality::HalfDiminished => &[0, 3, 6, 10],
            Quality::Diminished7 => &[0, 3, 6, 9],
            Quality::Augmented7 => &[0, 4, 8, 10],
            Quality::Sixth => &[0, 4, 7, 9],
        }
    }

    /// Canonical token used when serializing a chord name.
    pub fn symbol(self) -> &'static str {
        match self {
            Quality::Major => "",
            Quality::Minor => "m",
            Quality::Diminished => "dim",
            Quality::Augmented => "aug",
            Quality::Sus2 => "sus2",
            Quality::Sus4 => "sus4",
            Quality::Major7 => "maj7",
            Quality::Dominant7 => "7",
            Quality::MinorMajor7 => "mM7",
            Quality::Minor7 => "m7",
            Quality::HalfDiminished => "m7b5",
            Quality::Diminished7 => "dim7",
            Quality::Augmented7 => "aug7",
            Quality::Sixth => "6",
        }
    }

    fn match_prefix(s: &str) -> (&'static str, Quality) {
        // the empty token always matches, so this cannot fail
        QUALITY_TOKENS
            .iter()
            .filter(|(tok, _)| s.starts_with(tok))
            .max_by_key(|(tok, _)| tok.len())
            .copied()
            .unwrap()
    }
}

/// Extension degree above the octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtensionDegree {
    Ninth,
    Eleventh,
    Thirteenth,
}

impl ExtensionDegree {
    fn base_semitones(self) -> i32 {
        match self {
            ExtensionDegree::Ninth => 14,
            ExtensionDegree::Eleventh => 17,
            ExtensionDegree::Thirteenth => 21,
        }
    }

    fn number(self) -> &'static str {
        match self {
            ExtensionDegree::Ninth => "9",
            ExtensionDegree::Eleventh => "11",
            ExtensionDegree::Thirteenth => "13",
        }
    }
}

/// A single extension/alteration token: degree plus flat/natural/sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extension {
    pub degree: ExtensionDegree,
    pub modifier: Accidental,
}

const EXTENSION_TOKENS: &[(&str, ExtensionDegree, Accidental)] = &[
    ("b13", ExtensionDegree::Thirteenth, Accidental::Flat),
    ("#13", ExtensionDegree::Thirteenth, Accidental::Sharp),
    ("b11", ExtensionDegree::Eleventh, Accidental::Flat),
    ("#11", ExtensionDegree::Eleventh, Accidental::Sharp),
    ("13", ExtensionDegree::Thirteenth, Accidental::Natural),
    ("11", ExtensionDegree::Eleventh, Accidental::Natural),
    ("b9", ExtensionDegree::Ninth, Accidental::Flat),
    ("#9", ExtensionDegree::Ninth, Accidental::Sharp),
    ("9", ExtensionDegree::Ninth, Accidental::Natural),
];

impl Extension {
    /// Semitone offset from the root (the 9th of C is 14, D an octave up).
    pub fn semitones(self) -> i32 {
        self.degree.base_semitones() + self.modifier.semitone_offset()
    }

    fn match_prefix(s: &str) -> Option<(&'static str, Extension)> {
        EXTENSION_TOKENS
            .iter()
            .find(|(tok, _, _)| s.starts_with(tok))
            .map(|&(tok, degree, modifier)| (tok, Extension { degree, modifier }))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifier, self.degree.number())
    }
}

/// A parsed chord symbol.
///
/// The bass defaults to the root; a slash bass may name a pitch class
/// outside the chord tones. Unlike a [`Chord`], a `ChordName` fixes no
/// octaves; it is instantiated into concrete chords via
/// [`ChordName::close_voicing`] or [`ChordName::candidate_chords`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChordName {
    root: PitchName,
    quality: Quality,
    extensions: Vec<Extension>,
    bass: PitchName,
}

/// Multiplicity policy for voicing enumeration.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoicingOptions {
    /// Cap on the number of notes per voicing; defaults to one per
    /// chord-tone/extension class.
    pub max_notes: Option<usize>,
    /// Allow a chord-tone class to appear more than once (different
    /// octaves).
    pub allow_repeats: bool,
    /// Allow the exact same pitch to appear more than once.
    pub allow_identical: bool,
}

impl ChordName {
    /// Parse a chord symbol.
    ///
    /// # Example
    /// ```
    /// use fretwork::{ChordName, Quality};
    ///
    /// let name = ChordName::parse("Cmaj7#11/E").unwrap();
    /// assert_eq!(name.quality(), Quality::Major7);
    /// assert_eq!(name.bass().pitch_class(), 4);
    /// ```
    pub fn parse(text: &str) -> Result<Self, FretworkError> {
        let err = |message: &str| FretworkError::ChordParseError {
            symbol: text.to_string(),
            message: message.to_string(),
        };
        let (head, bass_token) = match text.split_once('/') {
            Some((head, bass)) => (head, Some(bass)),
            None => (text, None),
        };
        let mut chars = head.chars();
        let letter = chars
            .next()
            .and_then(NoteName::from_char)
            .ok_or_else(|| err("expected a root note letter"))?;
        let rest = chars.as_str();
        let acc_len = if rest.starts_with("bb") || rest.starts_with("##") {
            2
        } else if rest.starts_with('b') || rest.starts_with('#') {
            1
        } else {
            0
        };
        let accidental = match &rest[..acc_len] {
            "" => Accidental::Natural,
            "b" => Accidental::Flat,
            "bb" => Accidental::DoubleFlat,
            "#" => Accidental::Sharp,
            _ => Accidental::DoubleSharp,
        };
        let root = PitchName::new(letter, accidental);
        let mut remainder = &rest[acc_len..];

        let (quality_token, quality) = Quality::match_prefix(remainder);
        remainder = &remainder[quality_token.len()..];

        let mut extensions = Vec::new();
        while !remainder.is_empty() {
            match Extension::match_prefix(remainder) {
                Some((token, ext)) => {
                    extensions.push(ext);
                    remainder = &remainder[token.len()..];
                }
                None => {
                    return Err(err(&format!("unrecognized token '{}'", remainder)));
                }
            }
        }

        let bass = match bass_token {
            Some(token) => {
                PitchName::parse(token).map_err(|_| err("invalid bass note"))?
            }
            None => root,
        };
        Ok(Self {
            root,
            quality,
            extensions,
            bass,
        })
    }

    pub fn root(&self) -> PitchName {
        self.root
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn bass(&self) -> PitchName {
        self.bass
    }

    /// Ordered semitone offsets from the root, extensions included.
    /// `Cmaj7#11` yields `[0, 4, 7, 11, 18]`.
    pub fn intervals(&self) -> Vec<i32> {
        let mut out: Vec<i32> = self.quality.intervals().to_vec();
        out.extend(self.extensions.iter().map(|e| e.semitones()));
        out
    }

    /// The sounding pitch-class set (root-relative intervals folded mod 12).
    pub fn pitch_classes(&self) -> BTreeSet<u8> {
        let root = self.root.pitch_class() as i32;
        self.intervals()
            .iter()
            .map(|i| (root + i).rem_euclid(12) as u8)
            .collect()
    }

    /// Flat or sharp spelling for tones derived from this root.
    /// C and F lean flat; G, D, A, E, B lean sharp; accidentals on the
    /// root carry their own direction.
    fn key_bias(&self) -> Bias {
        match self.root.accidental {
            Accidental::Flat | Accidental::DoubleFlat => Bias::Flat,
            Accidental::Sharp | Accidental::DoubleSharp => Bias::Sharp,
            Accidental::Natural => match self.root.name {
                NoteName::C | NoteName::F => Bias::Flat,
                _ => Bias::Sharp,
            },
        }
    }

    /// Spelled chord-tone classes, rotated so the bass class leads.
    /// A slash bass outside the chord tones is prepended instead.
    pub fn chord_tones(&self) -> Vec<PitchName> {
        let bias = self.key_bias();
        let root = Note::spelled(self.root, 0);
        let mut tones: Vec<PitchName> = self
            .quality
            .intervals()
            .iter()
            .map(|&i| root.add_semitones_with_bias(i, bias).pitch_name())
            .collect();
        match tones
            .iter()
            .position(|t| t.pitch_class() == self.bass.pitch_class())
        {
            Some(idx) => tones.rotate_left(idx),
            None => tones.insert(0, self.bass),
        }
        tones
    }

    /// Spelled extension classes; the modifier sets the spelling
    /// direction, naturals follow the key bias.
    pub fn extension_names(&self) -> Vec<PitchName> {
        let key_bias = self.key_bias();
        let root = Note::spelled(self.root, 1);
        self.extensions
            .iter()
            .map(|e| {
                let bias = match e.modifier {
                    Accidental::Flat => Bias::Flat,
                    Accidental::Sharp => Bias::Sharp,
                    _ => key_bias,
                };
                root.add_semitones_with_bias(e.semitones(), bias).pitch_name()
            })
            .collect()
    }

    /// The close-position instantiation whose bass is the lowest matching
    /// note at or above `lower`; extensions stack above the chord tones.
    pub fn close_voicing(&self, lower: Note) -> Chord {
        let tones = self.chord_tones();
        let mut notes: Vec<Note> = Vec::new();
        let mut cursor = lower;
        for &tone in &tones {
            notes.push(cursor.nearest_above(tone, true));
            cursor = notes[0];
        }
        let top = *notes.iter().max().expect("a quality has at least three tones");
        for name in self.extension_names() {
            notes.push(top.nearest_above(name, true));
        }
        Chord::new(notes)
    }

    /// Every instantiation of this symbol inside `[lower, upper]`.
    ///
    /// The bass class always sounds lowest, every chord-tone class appears
    /// at least once, and extensions sit above the chord tones (each at
    /// most once, at least an octave above `lower`). `opts` controls how
    /// many times a class may sound. Output is deduplicated and ordered
    /// close-voiced first (ascending span). The list is exhaustive, not
    /// ranked; ranking is a downstream concern.
    pub fn candidate_chords(
        &self,
        lower: Note,
        upper: Note,
        opts: &VoicingOptions,
    ) -> Vec<Chord> {
        if upper < lower {
            return Vec::new();
        }
        let tones = self.chord_tones();
        let ext_names = self.extension_names();
        let max_notes = opts.max_notes.unwrap_or(tones.len() + ext_names.len());
        let bass_name = tones[0];
        let required: BTreeSet<u8> = tones[1..].iter().map(|t| t.pitch_class()).collect();

        let mut pool_all: Vec<Note> = Vec::new();
        for &tone in &tones {
            pool_all.extend(placements(lower, upper, tone, 0));
        }
        pool_all.sort();
        pool_all.dedup();

        // unplaceable extension classes drop out rather than killing the
        // whole enumeration
        let ext_lists: Vec<Vec<Note>> = ext_names
            .iter()
            .map(|&e| placements(lower, upper, e, 1))
            .filter(|l| !l.is_empty())
            .collect();
        let ext_combos = cartesian(&ext_lists);

        let mut seen: BTreeSet<Vec<i32>> = BTreeSet::new();
        let mut chords: Vec<Chord> = Vec::new();
        for bass in placements(lower, upper, bass_name, 0) {
            for combo in &ext_combos {
                if max_notes < 1 + combo.len() {
                    continue;
                }
                // chord tones stay at or below the lowest extension
                let cap = combo.iter().min().copied().unwrap_or(upper);
                let pool: Vec<Note> = pool_all
                    .iter()
                    .copied()
                    .filter(|&x| {
                        if opts.allow_identical {
                            bass <= x && x <= cap
                        } else if opts.allow_repeats {
                            bass < x && x <= cap
                        } else {
                            bass < x
                                && x <= cap
                                && x.pitch_class() != bass.pitch_class()
                        }
                    })
                    .collect();
                let available = max_notes - 1 - combo.len();
                for mid in constrained_subsets(
                    &pool,
                    &required,
                    available,
                    opts.allow_repeats,
                    opts.allow_identical,
                ) {
                    let mut notes = vec![bass];
                    notes.extend(mid);
                    notes.extend(combo.iter().copied());
                    let chord = Chord::new(notes);
                    let key: Vec<i32> =
                        chord.notes().iter().map(|n| n.semitones()).collect();
                    if seen.insert(key) {
                        chords.push(chord);
                    }
                }
            }
        }
        chords.sort_by_key(|c| {
            (
                c.span(),
                c.notes().iter().map(|n| n.semitones()).collect::<Vec<_>>(),
            )
        });
        chords
    }
}

impl fmt::Display for ChordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality.symbol())?;
        for e in &self.extensions {
            write!(f, "{}", e)?;
        }
        if self.bass.pitch_class() != self.root.pitch_class() {
            write!(f, "/{}", self.bass)?;
        }
        Ok(())
    }
}

/// All instances of `name`'s pitch class in `[lower, upper]`, starting
/// `start_octave` octaves above the lowest instance.
fn placements(lower: Note, upper: Note, name: PitchName, start_octave: i32) -> Vec<Note> {
    let mut n = lower.nearest_above(name, true).add_octaves(start_octave);
    let mut out = Vec::new();
    while n <= upper {
        out.push(n);
        n = n.add_octaves(1);
    }
    out
}

/// Cartesian product of the per-class placement lists.
fn cartesian(lists: &[Vec<Note>]) -> Vec<Vec<Note>> {
    let mut out: Vec<Vec<Note>> = vec![Vec::new()];
    for list in lists {
        let mut next = Vec::with_capacity(out.len() * list.len());
        for combo in &out {
            for &n in list {
                let mut c = combo.clone();
                c.push(n);
                next.push(c);
            }
        }
        out = next;
    }
    out
}

/// Subsets of `pool` (sizes 0..=`max_len`) whose pitch classes cover
/// `required`. Without `allow_repeats`, each pitch class may appear at
/// most once; with `allow_identical`, a pool element may even be taken
/// more than once.
fn constrained_subsets(
    pool: &[Note],
    required: &BTreeSet<u8>,
    max_len: usize,
    allow_repeats: bool,
    allow_identical: bool,
) -> Vec<Vec<Note>> {
    struct Ctx<'a> {
        pool: &'a [Note],
        required: &'a BTreeSet<u8>,
        max_len: usize,
        allow_repeats: bool,
        allow_identical: bool,
    }
    fn extend(ctx: &Ctx, start: usize, current: &mut Vec<Note>, out: &mut Vec<Vec<Note>>) {
        let covered = ctx
            .required
            .iter()
            .all(|c| current.iter().any(|n| n.pitch_class() == *c));
        if covered {
            out.push(current.clone());
        }
        if current.len() == ctx.max_len {
            return;
        }
        for i in start..ctx.pool.len() {
            let candidate = ctx.pool[i];
            if !ctx.allow_repeats
                && current.iter().any(|n| n.same_pitch_class(&candidate))
            {
                continue;
            }
            current.push(candidate);
            let next = if ctx.allow_identical { i } else { i + 1 };
            extend(ctx, next, current, out);
            current.pop();
        }
    }
    let ctx = Ctx {
        pool,
        required,
        max_len,
        allow_repeats,
        allow_identical,
    };
    let mut out = Vec::new();
    let mut current = Vec::new();
    extend(&ctx, 0, &mut current, &mut out);
    out
}
