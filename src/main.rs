use std::env;
use std::process;

use fretwork::{
    chord_name_positions, enumerate_positions, optimize_guitar_progression,
    optimize_voice_leading, parse_chord_name, rank_and_truncate, Chord,
    ChordProgression, GuitarPosition, Instrument, Note, RankWeights, SearchOptions,
};

const PRESETS: &[&str] = &["standard", "drop_d", "open_d", "open_g", "open_a"];

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
        process::exit(1);
    }
    let result = match args[1].as_str() {
        "positions" => cmd_positions(&args[2..]),
        "progression" => cmd_progression(&args[2..]),
        "voice-leading" => cmd_voice_leading(&args[2..]),
        _ => {
            usage();
            process::exit(1);
        }
    };
    if let Err(message) = result {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn usage() {
    eprintln!("Usage: fretwork positions --name <symbol> [options]");
    eprintln!("       fretwork positions --notes <C3,G3,E4,...> [options]");
    eprintln!("       fretwork progression [--graphical] <chords...>");
    eprintln!("       fretwork voice-leading [--lower C2] [--upper C5] <chords...>");
    eprintln!();
    eprintln!("Position options:");
    eprintln!("  --top-n <n>          how many positions to print");
    eprintln!("  --max-fret-span <n>  widest playable stretch in frets (default 4)");
    eprintln!("  --allow-repeats      chord tones may repeat in other octaves");
    eprintln!("  --allow-identical    the exact same pitch may repeat");
    eprintln!("  --no-thumb           reject thumb-over-the-neck shapes");
    eprintln!("  --tuning <t>         preset name, JSON map, or label,note;... list");
    eprintln!("  --frets <n>          fret count (default 22)");
    eprintln!("  --capo <n>           capo fret (default 0)");
    eprintln!("  --graphical          draw ASCII fretboard diagrams");
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn parse_i8(value: &str, flag: &str) -> Result<i8, String> {
    value
        .parse()
        .map_err(|_| format!("{} needs a small integer, got '{}'", flag, value))
}

fn build_instrument(tuning: Option<&str>, frets: i8, capo: i8) -> Result<Instrument, String> {
    match tuning {
        None => Instrument::preset("standard", frets, capo).map_err(|e| e.to_string()),
        Some(t) if PRESETS.contains(&t) => {
            Instrument::preset(t, frets, capo).map_err(|e| e.to_string())
        }
        Some(t) => {
            let parsed = Instrument::parse_tuning(t).map_err(|e| e.to_string())?;
            Instrument::new(parsed, frets, capo).map_err(|e| e.to_string())
        }
    }
}

fn print_positions(positions: &[GuitarPosition], instrument: &Instrument, graphical: bool) {
    for p in positions {
        if graphical {
            println!();
            for row in p.diagram(instrument) {
                println!("{}", row);
            }
        } else {
            println!("{}", p);
        }
    }
}

fn cmd_positions(args: &[String]) -> Result<(), String> {
    let mut name: Option<String> = None;
    let mut notes: Option<String> = None;
    let mut top_n: Option<usize> = None;
    let mut opts = SearchOptions::default();
    let mut graphical = false;
    let mut tuning: Option<String> = None;
    let mut frets = Instrument::DEFAULT_FRETS;
    let mut capo = 0i8;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--name" => name = Some(take_value(args, &mut i, "--name")?),
            "--notes" => notes = Some(take_value(args, &mut i, "--notes")?),
            "--top-n" => {
                let value = take_value(args, &mut i, "--top-n")?;
                top_n = Some(
                    value
                        .parse()
                        .map_err(|_| format!("--top-n needs a count, got '{}'", value))?,
                );
            }
            "--max-fret-span" => {
                let value = take_value(args, &mut i, "--max-fret-span")?;
                opts.max_fret_span = parse_i8(&value, "--max-fret-span")?;
            }
            "--allow-repeats" => opts.allow_repeats = true,
            "--allow-identical" => opts.allow_identical = true,
            "--no-thumb" => opts.allow_thumb = false,
            "--graphical" => graphical = true,
            "--tuning" => tuning = Some(take_value(args, &mut i, "--tuning")?),
            "--frets" => {
                let value = take_value(args, &mut i, "--frets")?;
                frets = parse_i8(&value, "--frets")?;
            }
            "--capo" => {
                let value = take_value(args, &mut i, "--capo")?;
                capo = parse_i8(&value, "--capo")?;
            }
            other => return Err(format!("unknown option '{}'", other)),
        }
        i += 1;
    }

    let instrument = build_instrument(tuning.as_deref(), frets, capo)?;
    let positions = if let Some(notes) = notes {
        let names: Vec<&str> = notes.split(',').map(str::trim).collect();
        let chord = Chord::from_names(&names).map_err(|e| e.to_string())?;
        println!("Chord: {}", chord);
        enumerate_positions(&chord, &instrument, &opts)
    } else if let Some(name) = name {
        let chord_name = parse_chord_name(&name).map_err(|e| e.to_string())?;
        println!("Chord: {}", chord_name);
        chord_name_positions(&chord_name, &instrument, &opts)
    } else {
        return Err("one of --name or --notes is required".to_string());
    };

    let total = positions.len();
    println!(
        "{} playable positions ({} tuning, {} frets, capo {})",
        total,
        instrument.tuning_name(),
        instrument.frets(),
        instrument.capo()
    );
    let keep = top_n.unwrap_or(total);
    let shown = rank_and_truncate(positions, keep, &RankWeights::default());
    print_positions(&shown, &instrument, graphical);
    Ok(())
}

fn cmd_progression(args: &[String]) -> Result<(), String> {
    let mut graphical = false;
    let mut symbols: Vec<String> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--graphical" => graphical = true,
            other => symbols.push(other.to_string()),
        }
    }
    if symbols.is_empty() {
        return Err("at least one chord symbol is required".to_string());
    }
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let progression = ChordProgression::parse(&symbols).map_err(|e| e.to_string())?;
    let instrument = Instrument::standard();
    let result =
        optimize_guitar_progression(&progression, &instrument, &SearchOptions::default())
            .map_err(|e| e.to_string())?;
    println!("Optimal positions:");
    for (name, position) in progression.chords().iter().zip(&result) {
        println!("{}: {}", name, position);
        if graphical {
            for row in position.diagram(&instrument) {
                println!("{}", row);
            }
            println!();
        }
    }
    Ok(())
}

fn cmd_voice_leading(args: &[String]) -> Result<(), String> {
    let mut lower = "C2".to_string();
    let mut upper = "C5".to_string();
    let mut symbols: Vec<String> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--lower" => lower = take_value(args, &mut i, "--lower")?,
            "--upper" => upper = take_value(args, &mut i, "--upper")?,
            other => symbols.push(other.to_string()),
        }
        i += 1;
    }
    if symbols.is_empty() {
        return Err("at least one chord symbol is required".to_string());
    }
    let lower = Note::parse(&lower).map_err(|e| e.to_string())?;
    let upper = Note::parse(&upper).map_err(|e| e.to_string())?;
    let symbols: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let progression = ChordProgression::parse(&symbols).map_err(|e| e.to_string())?;
    let result =
        optimize_voice_leading(&progression, lower, upper).map_err(|e| e.to_string())?;
    println!("Optimal voicing:");
    for (name, voicing) in progression.chords().iter().zip(&result) {
        println!("{}: {}", name, voicing);
    }
    Ok(())
}
