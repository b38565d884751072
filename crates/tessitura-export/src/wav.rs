//! WAV file I/O using hound
//!
//! Reads 8/16/24/32-bit integer and 32-bit float WAV files, writes 16-bit, 24-bit or
//! 32-bit float.

use std::io::{Seek, Write};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{ExportError, Result};
use crate::options::{BitDepth, RenderOptions};
use crate::renderer::{OfflineRenderer, RenderResult};

/// Decoded WAV contents, one `Vec` per channel
#[derive(Debug, Clone, PartialEq)]
pub struct WavAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl WavAudio {
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

/// Read a WAV file into planar float channels
pub fn read_wav(path: &Path) -> Result<WavAudio> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        return Err(ExportError::InvalidData("WAV file has no channels".into()));
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];
    for frame in interleaved.chunks_exact(channel_count) {
        for (channel, &sample) in channels.iter_mut().zip(frame) {
            channel.push(sample);
        }
    }

    tracing::debug!(
        path = %path.display(),
        channels = channel_count,
        frames,
        sample_rate = spec.sample_rate,
        "read WAV"
    );
    Ok(WavAudio {
        channels,
        sample_rate: spec.sample_rate,
    })
}

/// Write planar channels to a WAV file
pub fn write_wav(
    path: &Path,
    channels: &[&[f32]],
    sample_rate: u32,
    bit_depth: BitDepth,
) -> Result<()> {
    if channels.is_empty() {
        return Err(ExportError::InvalidData("no channels to write".into()));
    }
    let frames = channels[0].len();
    if channels.iter().any(|c| c.len() != frames) {
        return Err(ExportError::InvalidData(
            "channels have different lengths".into(),
        ));
    }

    let spec = create_wav_spec(channels.len() as u16, sample_rate, bit_depth);
    let mut writer = WavWriter::create(path, spec)?;
    write_samples(&mut writer, channels, frames, bit_depth)?;
    writer.finalize()?;

    tracing::debug!(path = %path.display(), frames, "wrote WAV");
    Ok(())
}

/// Render a WAV file through the pitch shifter into another WAV file
///
/// Mono input is processed as dual-mono and written back as mono. Files with more than
/// two channels are rejected.
pub fn render_wav_file(input: &Path, output: &Path, options: &RenderOptions) -> Result<RenderResult> {
    let audio = read_wav(input)?;
    let (left, right) = match audio.channels.as_slice() {
        [mono] => (mono.as_slice(), mono.as_slice()),
        [left, right] => (left.as_slice(), right.as_slice()),
        other => {
            return Err(ExportError::InvalidData(format!(
                "expected mono or stereo input, got {} channels",
                other.len()
            )))
        }
    };

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        frames = audio.frames(),
        "rendering WAV"
    );

    let mut renderer = OfflineRenderer::new(audio.sample_rate, *options)?;
    let result = renderer.render(left, right)?;

    if audio.channels.len() == 1 {
        write_wav(output, &[&result.left], result.sample_rate, options.bit_depth)?;
    } else {
        write_wav(
            output,
            &[&result.left, &result.right],
            result.sample_rate,
            options.bit_depth,
        )?;
    }
    Ok(result)
}

fn create_wav_spec(channels: u16, sample_rate: u32, bit_depth: BitDepth) -> WavSpec {
    let sample_format = match bit_depth {
        BitDepth::Float32 => SampleFormat::Float,
        BitDepth::Int16 | BitDepth::Int24 => SampleFormat::Int,
    };
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bit_depth.bits(),
        sample_format,
    }
}

fn write_samples<W: Write + Seek>(
    writer: &mut WavWriter<W>,
    channels: &[&[f32]],
    frames: usize,
    bit_depth: BitDepth,
) -> Result<()> {
    for i in 0..frames {
        for channel in channels {
            let sample = channel[i];
            match bit_depth {
                BitDepth::Int16 => writer.write_sample(float_to_i16(sample))?,
                BitDepth::Int24 => writer.write_sample(float_to_i24(sample))?,
                BitDepth::Float32 => writer.write_sample(sample)?,
            }
        }
    }
    Ok(())
}

/// Convert float sample to 16-bit integer with clipping
#[inline]
fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Convert float sample to 24-bit integer (stored as i32) with clipping
#[inline]
fn float_to_i24(sample: f32) -> i32 {
    (sample.clamp(-1.0, 1.0) * 8388607.0) as i32
}
