//! Gain and additive mixing on typed samples with saturation.
//!
//! Integer encodings are widened before any arithmetic (`i16 → i32`,
//! centred `u8 → i16`) and clamped back into range, so a sum can never wrap.
//! `Float32` results are clamped to `[-1.0, 1.0]`.

use byteorder::{ByteOrder, LittleEndian};

use crate::{
    audio::{
        constants::PCM8_CENTER,
        format::{AudioFormat, SampleEncoding},
        frame::Frame,
    },
    common::CodecError,
};

#[inline]
fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

#[inline]
fn clamp_u8_centred(v: i32) -> u8 {
    (v.clamp(-128, 127) + PCM8_CENTER as i32) as u8
}

/// NaN becomes silence, like [`super::sample::encode`].
#[inline]
fn clamp_f32(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

#[inline]
fn scale_i32(sample: i32, gain: f32) -> i32 {
    (sample as f32 * gain).round() as i32
}

fn check_pair(a: &[u8], b: &[u8], format: &AudioFormat) -> Result<(), CodecError> {
    if a.len() != b.len() {
        return Err(CodecError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    format.check_aligned(a.len())
}

/// Multiplies every sample by `gain`, saturating to the encoding's range.
pub fn apply_gain(bytes: &[u8], gain: f32, format: &AudioFormat) -> Result<Frame, CodecError> {
    format.check_aligned(bytes.len())?;
    // Unity gain cannot push an integer sample out of range; floats still clamp.
    if gain == 1.0 && format.encoding() != SampleEncoding::Float32 {
        return Ok(Frame::copy_from_slice(bytes));
    }

    let mut out = bytes.to_vec();
    match format.encoding() {
        SampleEncoding::Pcm8 => {
            for s in out.iter_mut() {
                *s = clamp_u8_centred(scale_i32(*s as i32 - PCM8_CENTER as i32, gain));
            }
        }
        SampleEncoding::Pcm16 => {
            for chunk in out.chunks_exact_mut(2) {
                let s = LittleEndian::read_i16(chunk) as i32;
                LittleEndian::write_i16(chunk, clamp_i16(scale_i32(s, gain)));
            }
        }
        SampleEncoding::Float32 => {
            for chunk in out.chunks_exact_mut(4) {
                let s = LittleEndian::read_f32(chunk);
                LittleEndian::write_f32(chunk, clamp_f32(s * gain));
            }
        }
    }
    Ok(Frame::from_vec(out))
}

/// Sample-wise `clamp(a + b)`.
pub fn mix_additive(a: &[u8], b: &[u8], format: &AudioFormat) -> Result<Frame, CodecError> {
    check_pair(a, b, format)?;

    let mut out = vec![0u8; a.len()];
    match format.encoding() {
        SampleEncoding::Pcm8 => {
            for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
                let sum = (x as i32 - PCM8_CENTER as i32) + (y as i32 - PCM8_CENTER as i32);
                *o = clamp_u8_centred(sum);
            }
        }
        SampleEncoding::Pcm16 => {
            for ((o, x), y) in out
                .chunks_exact_mut(2)
                .zip(a.chunks_exact(2))
                .zip(b.chunks_exact(2))
            {
                let sum = LittleEndian::read_i16(x) as i32 + LittleEndian::read_i16(y) as i32;
                LittleEndian::write_i16(o, clamp_i16(sum));
            }
        }
        SampleEncoding::Float32 => {
            for ((o, x), y) in out
                .chunks_exact_mut(4)
                .zip(a.chunks_exact(4))
                .zip(b.chunks_exact(4))
            {
                let sum = LittleEndian::read_f32(x) + LittleEndian::read_f32(y);
                LittleEndian::write_f32(o, clamp_f32(sum));
            }
        }
    }
    Ok(Frame::from_vec(out))
}

/// Sample-wise `clamp(a * a_gain + b * b_gain)` in a single pass, so the gain
/// stage does not saturate before the sum does.
pub fn mix_scaled(
    a: &[u8],
    a_gain: f32,
    b: &[u8],
    b_gain: f32,
    format: &AudioFormat,
) -> Result<Frame, CodecError> {
    if a_gain == 1.0 && b_gain == 1.0 {
        return mix_additive(a, b, format);
    }
    check_pair(a, b, format)?;

    let mut out = vec![0u8; a.len()];
    match format.encoding() {
        SampleEncoding::Pcm8 => {
            for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
                let x = (x as i32 - PCM8_CENTER as i32) as f32 * a_gain;
                let y = (y as i32 - PCM8_CENTER as i32) as f32 * b_gain;
                *o = clamp_u8_centred((x + y).round() as i32);
            }
        }
        SampleEncoding::Pcm16 => {
            for ((o, x), y) in out
                .chunks_exact_mut(2)
                .zip(a.chunks_exact(2))
                .zip(b.chunks_exact(2))
            {
                let x = LittleEndian::read_i16(x) as f32 * a_gain;
                let y = LittleEndian::read_i16(y) as f32 * b_gain;
                LittleEndian::write_i16(o, clamp_i16((x + y).round() as i32));
            }
        }
        SampleEncoding::Float32 => {
            for ((o, x), y) in out
                .chunks_exact_mut(4)
                .zip(a.chunks_exact(4))
                .zip(b.chunks_exact(4))
            {
                let sum = LittleEndian::read_f32(x) * a_gain + LittleEndian::read_f32(y) * b_gain;
                LittleEndian::write_f32(o, clamp_f32(sum));
            }
        }
    }
    Ok(Frame::from_vec(out))
}
