//! # Error Types
//!
//! All error types for the fretwork library.
//!
//! Parsing errors carry the offending token so front ends can echo it back;
//! the progression error carries the index of the chord that could not be
//! realized. An enumeration that finds *zero* positions is not an error:
//! it is a valid empty result (`Vec::new()`), so callers can report
//! "0 positions" rather than fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FretworkError {
    /// A note token such as `"H#"` or `"Cbbb4"` that does not name a pitch.
    #[error("invalid note syntax: '{token}'")]
    InvalidNoteSyntax { token: String },

    /// A chord symbol outside the supported grammar. Unknown extension
    /// tokens are rejected rather than silently ignored.
    ///
    /// # Example
    /// ```
    /// use fretwork::ChordName;
    ///
    /// let err = ChordName::parse("Cmaj7q").unwrap_err();
    /// assert!(err.to_string().contains("Cmaj7q"));
    /// ```
    #[error("cannot parse chord symbol '{symbol}': {message}")]
    ChordParseError { symbol: String, message: String },

    /// A tuning description (preset name, JSON map, or CSV list) that
    /// could not be understood, or an inconsistent instrument setup
    /// (e.g. capo beyond the last fret).
    #[error("invalid tuning: {0}")]
    TuningParseError(String),

    /// A fret or register request outside the instrument's bounds.
    #[error("fret {fret} out of range for string {string} (0..={max})")]
    OutOfRange { string: String, fret: i8, max: i8 },

    /// A progression element with no viable candidate voicing or
    /// fingering under the given constraints.
    #[error("no playable candidates for chord {index} ('{symbol}')")]
    NoPlayableProgression { index: usize, symbol: String },
}
