pub mod chord;
pub mod error;
pub mod instrument;
pub mod pitch;
pub mod position;
pub mod progression;
pub mod rank;
pub mod search;

pub use chord::{Chord, ChordName, Extension, ExtensionDegree, Quality, VoicingOptions};
pub use error::FretworkError;
pub use instrument::Instrument;
pub use pitch::{Accidental, Bias, Note, NoteName, PitchName};
pub use position::GuitarPosition;
pub use progression::{
    optimize_guitar_progression, optimize_voice_leading, position_movement,
    voice_movement, ChordProgression,
};
pub use rank::{rank_and_truncate, rank_positions, RankWeights};
pub use search::{
    chord_name_positions, enumerate_positions, note_positions, SearchOptions,
    DEFAULT_MAX_FRET_SPAN,
};

/// Parse a chord symbol like `Bbmaj7/D`.
/// This is the main entry point for symbolic input.
pub fn parse_chord_name(text: &str) -> Result<ChordName, FretworkError> {
    ChordName::parse(text)
}
