//! # Pitch a WAV file
//!
//! Shift the pitch of a WAV file by a number of semitones, optionally changing tempo.
//!
//! **Concepts:** `RenderOptions`, `PitchParams`, `render_wav_file`
//!
//! ```bash
//! cargo run --example pitch_wav -- input.wav output.wav 7 [tempo]
//! ```

use std::path::PathBuf;
use tessitura::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: pitch_wav <input.wav> <output.wav> [semitones] [tempo]");
        std::process::exit(2);
    };
    let semitones: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0.0);
    let tempo: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1.0);

    let params = PitchParams::new().pitch_semitones(semitones).tempo(tempo);
    params.validate()?;
    let options = RenderOptions::default().params(params);

    let result = render_wav_file(&PathBuf::from(&input), &PathBuf::from(&output), &options)?;
    tracing::info!(
        frames = result.frames(),
        seconds = result.duration_seconds(),
        peak = result.peak_level,
        "done"
    );
    println!(
        "Wrote {} ({:.2}s, {:+} semitones, tempo x{})",
        output,
        result.duration_seconds(),
        semitones,
        tempo
    );

    Ok(())
}
