//! # Pitch Model
//!
//! Absolute pitch representation and semitone arithmetic.
//!
//! A [`Note`] is a spelled pitch (letter + accidental + octave) that
//! reduces to a single semitone count above C0. Two notes are equal iff
//! their semitone values are equal (`F#3 == Gb3`), and ordering, hashing,
//! and all arithmetic go through the semitone value. The spelling is kept
//! only so output reads the way a musician wrote the input.
//!
//! ## Octave System
//! Octave numbers follow the written letter, not the sounding pitch, so
//! `Cb4` sits one semitone below `C4` (it sounds as `B3`).

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::FretworkError;

/// The seven letter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Semitones above C within one octave.
    pub fn semitone_offset(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    pub(crate) fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accidental applied to a letter name, from double flat to double sharp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accidental {
    DoubleFlat,
    Flat,
    Natural,
    Sharp,
    DoubleSharp,
}

impl Accidental {
    pub fn semitone_offset(self) -> i32 {
        match self {
            Accidental::DoubleFlat => -2,
            Accidental::Flat => -1,
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::DoubleSharp => 2,
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "bb" => Some(Accidental::DoubleFlat),
            "b" => Some(Accidental::Flat),
            "" => Some(Accidental::Natural),
            "#" => Some(Accidental::Sharp),
            "##" => Some(Accidental::DoubleSharp),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Accidental::DoubleFlat => "bb",
            Accidental::Flat => "b",
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::DoubleSharp => "##",
        }
    }
}

impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spelling preference when a semitone value lands on a black key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    Flat,
    Sharp,
}

/// A spelled pitch class: letter + accidental, no octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PitchName {
    pub name: NoteName,
    pub accidental: Accidental,
}

impl PitchName {
    pub fn new(name: NoteName, accidental: Accidental) -> Self {
        Self { name, accidental }
    }

    /// Parse a name token such as `"G"`, `"Bb"`, or `"F##"`.
    pub fn parse(token: &str) -> Result<Self, FretworkError> {
        let invalid = || FretworkError::InvalidNoteSyntax {
            token: token.to_string(),
        };
        let mut chars = token.chars();
        let name = chars.next().and_then(NoteName::from_char).ok_or_else(invalid)?;
        let accidental = Accidental::from_str(chars.as_str()).ok_or_else(invalid)?;
        Ok(Self { name, accidental })
    }

    /// Signed semitone offset from C of the same written octave.
    /// `Cb` is -1: it spells the pitch one semitone below that octave's C.
    pub fn semitone_offset(self) -> i32 {
        self.name.semitone_offset() + self.accidental.semitone_offset()
    }

    /// Pitch class 0-11.
    pub fn pitch_class(self) -> u8 {
        self.semitone_offset().rem_euclid(12) as u8
    }
}

impl fmt::Display for PitchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.accidental)
    }
}

/// An absolute pitch: spelled name plus octave.
///
/// Immutable value type. Equality, ordering, and hashing use only the
/// semitone value; the spelling is display metadata.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Note {
    name: PitchName,
    octave: i32,
    semitones: i32,
}

impl Note {
    /// Build a note from a name token and octave.
    ///
    /// # Example
    /// ```
    /// use fretwork::Note;
    ///
    /// let n = Note::new("G#", 3).unwrap();
    /// assert_eq!(n.semitones(), 44);
    /// assert!(Note::new("H", 3).is_err());
    /// ```
    pub fn new(token: &str, octave: i32) -> Result<Self, FretworkError> {
        Ok(Self::spelled(PitchName::parse(token)?, octave))
    }

    /// Build a note from an already-parsed pitch name and octave.
    pub fn spelled(name: PitchName, octave: i32) -> Self {
        Self {
            name,
            octave,
            semitones: 12 * octave + name.semitone_offset(),
        }
    }

    /// Parse a combined token such as `"Bb3"` or `"C#10"`.
    pub fn parse(token: &str) -> Result<Self, FretworkError> {
        let invalid = || FretworkError::InvalidNoteSyntax {
            token: token.to_string(),
        };
        let split = token
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .ok_or_else(invalid)?;
        let (name, octave) = token.split_at(split);
        let octave: i32 = octave.parse().map_err(|_| invalid())?;
        Note::new(name, octave)
    }

    /// Build a note from a raw semitone value (semitones above C0),
    /// spelling black keys per `bias`.
    pub fn from_semitones(semitones: i32, bias: Bias) -> Self {
        let octave = semitones.div_euclid(12);
        let rem = semitones.rem_euclid(12);
        let natural = |name| PitchName::new(name, Accidental::Natural);
        let name = match rem {
            0 => natural(NoteName::C),
            2 => natural(NoteName::D),
            4 => natural(NoteName::E),
            5 => natural(NoteName::F),
            7 => natural(NoteName::G),
            9 => natural(NoteName::A),
            11 => natural(NoteName::B),
            black => {
                let (letter, accidental) = match (black, bias) {
                    (1, Bias::Flat) => (NoteName::D, Accidental::Flat),
                    (1, Bias::Sharp) => (NoteName::C, Accidental::Sharp),
                    (3, Bias::Flat) => (NoteName::E, Accidental::Flat),
                    (3, Bias::Sharp) => (NoteName::D, Accidental::Sharp),
                    (6, Bias::Flat) => (NoteName::G, Accidental::Flat),
                    (6, Bias::Sharp) => (NoteName::F, Accidental::Sharp),
                    (8, Bias::Flat) => (NoteName::A, Accidental::Flat),
                    (8, Bias::Sharp) => (NoteName::G, Accidental::Sharp),
                    (10, Bias::Flat) => (NoteName::B, Accidental::Flat),
                    (10, Bias::Sharp) => (NoteName::A, Accidental::Sharp),
                    _ => unreachable!(),
                };
                PitchName::new(letter, accidental)
            }
        };
        Self::spelled(name, octave)
    }

    pub fn pitch_name(&self) -> PitchName {
        self.name
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Semitones above C0.
    pub fn semitones(&self) -> i32 {
        self.semitones
    }

    /// Pitch class 0-11.
    pub fn pitch_class(&self) -> u8 {
        self.semitones.rem_euclid(12) as u8
    }

    pub fn same_pitch_class(&self, other: &Note) -> bool {
        self.pitch_class() == other.pitch_class()
    }

    /// Transpose by a semitone delta. Black keys keep the note's own
    /// accidental direction, defaulting to flats from naturals.
    pub fn add_semitones(&self, delta: i32) -> Note {
        let bias = match self.name.accidental {
            Accidental::Sharp | Accidental::DoubleSharp => Bias::Sharp,
            _ => Bias::Flat,
        };
        Note::from_semitones(self.semitones + delta, bias)
    }

    /// Transpose by a semitone delta with an explicit spelling bias.
    pub fn add_semitones_with_bias(&self, delta: i32, bias: Bias) -> Note {
        Note::from_semitones(self.semitones + delta, bias)
    }

    /// Shift by whole octaves, preserving the spelling.
    pub fn add_octaves(&self, octaves: i32) -> Note {
        Self::spelled(self.name, self.octave + octaves)
    }

    /// The closest note at (or, with `allow_equal`, above) this one whose
    /// pitch class matches `target`. The result takes the target's
    /// spelling. With `allow_equal` the note itself is returned when its
    /// own class already matches.
    ///
    /// # Example
    /// ```
    /// use fretwork::{Note, PitchName};
    ///
    /// let c3 = Note::parse("C3").unwrap();
    /// let e = PitchName::parse("E").unwrap();
    /// assert_eq!(c3.nearest_above(e, true), Note::parse("E3").unwrap());
    /// ```
    pub fn nearest_above(&self, target: PitchName, allow_equal: bool) -> Note {
        let mut interval =
            (target.pitch_class() as i32 - self.pitch_class() as i32).rem_euclid(12);
        if !allow_equal && interval == 0 {
            interval = 12;
        }
        Self::at_pitch(target, self.semitones + interval)
    }

    /// Mirror of [`Note::nearest_above`], searching downward.
    pub fn nearest_below(&self, target: PitchName, allow_equal: bool) -> Note {
        let mut interval =
            (self.pitch_class() as i32 - target.pitch_class() as i32).rem_euclid(12);
        if !allow_equal && interval == 0 {
            interval = 12;
        }
        Self::at_pitch(target, self.semitones - interval)
    }

    /// A note spelled `name` whose pitch is exactly `semitones`.
    /// Requires the classes to agree.
    fn at_pitch(name: PitchName, semitones: i32) -> Note {
        let octave = (semitones - name.semitone_offset()).div_euclid(12);
        debug_assert_eq!((semitones - name.semitone_offset()).rem_euclid(12), 0);
        Self::spelled(name, octave)
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.semitones == other.semitones
    }
}

impl Eq for Note {}

impl PartialOrd for Note {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Note {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semitones.cmp(&other.semitones)
    }
}

impl Hash for Note {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.semitones.hash(state);
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}
