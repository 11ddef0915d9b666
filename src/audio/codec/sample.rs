//! Per-sample decode/encode between raw bytes and normalised `f32`.

use byteorder::{ByteOrder, LittleEndian};

use crate::audio::{
    constants::{INT8_SCALE, INT16_SCALE, PCM8_CENTER},
    format::SampleEncoding,
};

/// Reads one sample from `bytes` (exactly `bytes_per_sample` long) as a value
/// in `[-1.0, 1.0]`.
#[inline]
pub fn decode(bytes: &[u8], encoding: SampleEncoding) -> f32 {
    match encoding {
        SampleEncoding::Pcm8 => (bytes[0] as i16 - PCM8_CENTER) as f32 / INT8_SCALE,
        SampleEncoding::Pcm16 => LittleEndian::read_i16(bytes) as f32 / INT16_SCALE,
        SampleEncoding::Float32 => LittleEndian::read_f32(bytes),
    }
}

/// Writes `value` into `out` (exactly `bytes_per_sample` long), saturating to
/// the encoding's range. NaN encodes as silence.
#[inline]
pub fn encode(value: f32, encoding: SampleEncoding, out: &mut [u8]) {
    let value = if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    };
    match encoding {
        SampleEncoding::Pcm8 => {
            let centred = (value * INT8_SCALE).round() as i16;
            out[0] = (centred + PCM8_CENTER).clamp(0, 255) as u8;
        }
        SampleEncoding::Pcm16 => {
            let scaled = (value * INT16_SCALE).round() as i32;
            LittleEndian::write_i16(out, scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
        }
        SampleEncoding::Float32 => LittleEndian::write_f32(out, value),
    }
}

/// Iterates the samples of `bytes` as normalised `f32` values.
pub fn iter_normalized(
    bytes: &[u8],
    encoding: SampleEncoding,
) -> impl Iterator<Item = f32> + '_ {
    bytes
        .chunks_exact(encoding.bytes_per_sample())
        .map(move |chunk| decode(chunk, encoding))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_round_trips_exactly() {
        let mut out = [0u8; 2];
        for s in [i16::MIN, -12_345, -1, 0, 1, 12_345, i16::MAX] {
            let mut raw = [0u8; 2];
            LittleEndian::write_i16(&mut raw, s);
            encode(decode(&raw, SampleEncoding::Pcm16), SampleEncoding::Pcm16, &mut out);
            assert_eq!(LittleEndian::read_i16(&out), s);
        }
    }

    #[test]
    fn pcm8_is_centred_at_128() {
        assert_eq!(decode(&[128], SampleEncoding::Pcm8), 0.0);
        assert_eq!(decode(&[0], SampleEncoding::Pcm8), -1.0);

        let mut out = [0u8; 1];
        encode(1.0, SampleEncoding::Pcm8, &mut out);
        assert_eq!(out[0], 255);
        encode(-1.0, SampleEncoding::Pcm8, &mut out);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn encode_saturates_and_silences_nan() {
        let mut out = [0u8; 2];
        encode(3.5, SampleEncoding::Pcm16, &mut out);
        assert_eq!(LittleEndian::read_i16(&out), i16::MAX);
        encode(f32::NAN, SampleEncoding::Pcm16, &mut out);
        assert_eq!(LittleEndian::read_i16(&out), 0);
    }
}
