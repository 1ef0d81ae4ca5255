//! Integration tests for the fretwork library
//!
//! Exercises the public API end to end: symbol parsing, position
//! enumeration and ranking, and progression optimization.

use fretwork::{
    chord_name_positions, enumerate_positions, optimize_guitar_progression,
    optimize_voice_leading, parse_chord_name, rank_and_truncate, Chord,
    ChordProgression, FretworkError, GuitarPosition, Instrument, Note, Quality,
    RankWeights, SearchOptions, DEFAULT_MAX_FRET_SPAN,
};

fn note(s: &str) -> Note {
    Note::parse(s).unwrap()
}

#[test]
fn test_note_round_trip_preserves_pitch() {
    for s in ["C0", "Eb3", "F#2", "Bbb1", "G##4", "B3"] {
        let parsed = note(s);
        let reparsed = note(&parsed.to_string());
        assert_eq!(
            reparsed.semitones(),
            parsed.semitones(),
            "round trip for {}",
            s
        );
    }
}

#[test]
fn test_chord_symbol_grammar_is_total_and_deterministic() {
    let symbols = [
        "C", "Cm", "C7", "Cmaj7", "Cm7b5", "Cdim7", "Caug7", "C6", "Csus2",
        "Csus4", "CmM7", "F#m7", "Bb13", "Eb7#9", "Abmaj7#11", "G7b9b13",
        "Dm7/G", "C/E",
    ];
    for symbol in symbols {
        let first = parse_chord_name(symbol).unwrap();
        let second = parse_chord_name(symbol).unwrap();
        assert_eq!(first, second, "parsing {} must be deterministic", symbol);
        let canonical = parse_chord_name(&first.to_string()).unwrap();
        assert_eq!(canonical.pitch_classes(), first.pitch_classes());
        assert_eq!(canonical.bass().pitch_class(), first.bass().pitch_class());
    }
    for bad in ["X", "Cmaj7!", "C/", "Cb5", ""] {
        assert!(parse_chord_name(bad).is_err(), "'{}' must be rejected", bad);
    }
}

#[test]
fn test_cmaj7_sharp11_over_e() {
    let name = parse_chord_name("Cmaj7#11/E").unwrap();
    assert_eq!(name.root().pitch_class(), 0);
    assert_eq!(name.quality(), Quality::Major7);
    let intervals = name.intervals();
    assert!(intervals.contains(&11), "natural 7 present");
    assert!(intervals.contains(&18), "sharp 11 present");
    assert_eq!(name.bass().pitch_class(), 4);
}

#[test]
fn test_c7_position_census_and_best_fingering() {
    let instrument = Instrument::preset("standard", 12, 0).unwrap();
    let chord = Chord::from_names(&["C3", "G3", "E4", "Bb4"]).unwrap();
    let positions = enumerate_positions(&chord, &instrument, &SearchOptions::default());
    assert!(positions.len() >= 9, "expected at least 9, got {}", positions.len());

    let ranked = rank_and_truncate(positions, 1, &RankWeights::default());
    let best = GuitarPosition::from_pairs(6, &[(0, 8), (1, 10), (3, 9), (4, 11)]);
    assert_eq!(ranked[0], best, "best fingering is E8 A10 G9 B11");
}

#[test]
fn test_enumeration_invariants() {
    let instrument = Instrument::standard();
    let name = parse_chord_name("Bbmaj7").unwrap();
    let opts = SearchOptions::default();
    let positions = chord_name_positions(&name, &instrument, &opts);
    assert!(!positions.is_empty());

    // determinism
    assert_eq!(positions, chord_name_positions(&name, &instrument, &opts));

    for p in &positions {
        assert!(p.fret_span() <= DEFAULT_MAX_FRET_SPAN);
        assert!(
            p.pitch_classes(&instrument).is_superset(&name.pitch_classes()),
            "{} must cover the chord's classes",
            p
        );
    }

    // no strict subset pairs survive the filter
    for (i, a) in positions.iter().enumerate() {
        for (j, b) in positions.iter().enumerate() {
            if i != j && a.is_subset_of(b) {
                assert_ne!(
                    a.pitch_classes(&instrument),
                    b.pitch_classes(&instrument),
                    "{} and {} are subset duplicates",
                    a,
                    b
                );
            }
        }
    }
}

#[test]
fn test_ranking_is_sorted_and_truncates() {
    let instrument = Instrument::standard();
    let name = parse_chord_name("G").unwrap();
    let positions = chord_name_positions(&name, &instrument, &SearchOptions::default());
    let n = positions.len();
    let weights = RankWeights::default();
    let ranked = rank_and_truncate(positions, n, &weights);
    for pair in ranked.windows(2) {
        let a = (pair[0].fret_span(), pair[0].max_interior_gap());
        let b = (pair[1].fret_span(), pair[1].max_interior_gap());
        assert!(
            pair[0].fret_span() < pair[1].fret_span() || a <= b,
            "ranking must be non-decreasing on the primary keys"
        );
    }
    assert_eq!(rank_and_truncate(ranked.clone(), 3, &weights).len(), 3);
    assert!(rank_and_truncate(Vec::new(), 3, &weights).is_empty());
}

#[test]
fn test_voice_leading_dm7_g7_cmaj7() {
    let progression = ChordProgression::parse(&["Dm7", "G7", "CM7"]).unwrap();
    let (lower, upper) = (note("C3"), note("C5"));
    let result = optimize_voice_leading(&progression, lower, upper).unwrap();
    assert_eq!(result.len(), 3);
    for (name, voicing) in progression.chords().iter().zip(&result) {
        assert_eq!(voicing.len(), 4, "{} voices as four notes", name);
        assert!(voicing.bass().unwrap() >= lower);
        assert!(voicing.top().unwrap() <= upper);
        assert_eq!(voicing.pitch_classes(), name.pitch_classes());
    }
}

#[test]
fn test_guitar_progression_returns_one_position_per_chord() {
    let progression = ChordProgression::parse(&["Em7", "A7", "Dmaj7"]).unwrap();
    let instrument = Instrument::standard();
    let opts = SearchOptions::default();
    let result = optimize_guitar_progression(&progression, &instrument, &opts).unwrap();
    assert_eq!(result.len(), 3);
    for (name, position) in progression.chords().iter().zip(&result) {
        assert_eq!(position.pitch_classes(&instrument), name.pitch_classes());
        assert!(position.is_playable(opts.max_fret_span, opts.allow_thumb));
    }
}

#[test]
fn test_unplayable_progression_reports_offender() {
    let tuning = Instrument::parse_tuning("E,E2;A,A2;D,D3").unwrap();
    let instrument = Instrument::new(tuning, 12, 0).unwrap();
    let progression = ChordProgression::parse(&["E5", "Cmaj9"]);
    assert!(progression.is_err(), "E5 is not in the grammar");

    let progression = ChordProgression::parse(&["Em", "Cmaj7#11"]).unwrap();
    let err = optimize_guitar_progression(
        &progression,
        &instrument,
        &SearchOptions::default(),
    )
    .unwrap_err();
    match err {
        FretworkError::NoPlayableProgression { index, .. } => assert_eq!(index, 1),
        other => panic!("expected NoPlayableProgression, got {:?}", other),
    }
}

#[test]
fn test_capo_and_custom_tuning_pipeline() {
    let instrument = Instrument::preset("standard", 12, 3).unwrap();
    let name = parse_chord_name("G").unwrap();
    let positions = chord_name_positions(&name, &instrument, &SearchOptions::default());
    for p in &positions {
        for (_, fret) in p.played() {
            assert!(fret <= instrument.fret_range(), "{} is beyond the capo range", fret);
        }
    }

    let tuning = Instrument::parse_tuning(
        r#"{"D": "D2", "A": "A2", "d": "D3", "G": "G3", "B": "B3", "e": "E4"}"#,
    )
    .unwrap();
    let drop_d = Instrument::new(tuning, 22, 0).unwrap();
    assert_eq!(drop_d.effective_open(0), note("D2"));
    let positions = chord_name_positions(
        &parse_chord_name("D").unwrap(),
        &drop_d,
        &SearchOptions::default(),
    );
    assert!(!positions.is_empty());
}
