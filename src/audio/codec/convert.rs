//! Encoding and channel-count repacking.
//!
//! No sample-rate conversion happens here: when rates differ the output bytes
//! are simply played at the target rate.

use crate::{
    audio::{codec::sample, format::AudioFormat, frame::Frame},
    common::CodecError,
};

/// Repacks `bytes` from `from` into `to`.
///
/// Channel mapping:
/// - equal counts copy channel-for-channel,
/// - N → 1 averages all input channels,
/// - 1 → N duplicates the mono sample,
/// - any other N → M reads input channel `c % N` for output channel `c`.
pub fn convert(bytes: &[u8], from: &AudioFormat, to: &AudioFormat) -> Result<Frame, CodecError> {
    from.check_aligned(bytes.len())?;

    if from.encoding() == to.encoding() && from.channels() == to.channels() {
        return Ok(Frame::copy_from_slice(bytes));
    }

    let in_bps = from.bytes_per_sample();
    let out_bps = to.bytes_per_sample();
    let in_channels = from.channels();
    let out_channels = to.channels();
    let groups = bytes.len() / from.group_size();

    let mut out = vec![0u8; groups * to.group_size()];
    let mut group_buf = vec![0f32; in_channels];

    for (in_group, out_group) in bytes
        .chunks_exact(from.group_size())
        .zip(out.chunks_exact_mut(to.group_size()))
    {
        for (slot, raw) in group_buf.iter_mut().zip(in_group.chunks_exact(in_bps)) {
            *slot = sample::decode(raw, from.encoding());
        }

        for (c, out_raw) in out_group.chunks_exact_mut(out_bps).enumerate() {
            let value = if out_channels == 1 && in_channels > 1 {
                group_buf.iter().sum::<f32>() / in_channels as f32
            } else {
                group_buf[c % in_channels]
            };
            sample::encode(value, to.encoding(), out_raw);
        }
    }

    Ok(Frame::from_vec(out))
}

/// Number of input bytes in `from` that convert to exactly `out_len` bytes in
/// `to`. Partial trailing groups in `out_len` are rounded up.
pub fn source_len_for(out_len: usize, from: &AudioFormat, to: &AudioFormat) -> usize {
    out_len.div_ceil(to.group_size()) * from.group_size()
}

#[cfg(test)]
mod tests {
    use byteorder::{ByteOrder, LittleEndian};

    use super::*;
    use crate::audio::format::SampleEncoding;

    fn pcm16(samples: &[i16]) -> Vec<u8> {
        let mut out = vec![0u8; samples.len() * 2];
        LittleEndian::write_i16_into(samples, &mut out);
        out
    }

    fn to_i16(bytes: &[u8]) -> Vec<i16> {
        let mut out = vec![0i16; bytes.len() / 2];
        LittleEndian::read_i16_into(bytes, &mut out);
        out
    }

    #[test]
    fn identical_formats_copy_bytes() {
        let format = AudioFormat::pcm16_stereo(48_000);
        let bytes = pcm16(&[1, -2, 3, -4]);
        assert_eq!(convert(&bytes, &format, &format).unwrap().as_bytes(), &bytes[..]);
    }

    #[test]
    fn stereo_to_mono_averages() {
        let stereo = AudioFormat::pcm16_stereo(48_000);
        let mono = AudioFormat::pcm16_mono(48_000);
        let out = convert(&pcm16(&[1000, 3000, -200, -400]), &stereo, &mono).unwrap();
        assert_eq!(to_i16(&out), vec![2000, -300]);
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        let stereo = AudioFormat::pcm16_stereo(48_000);
        let mono = AudioFormat::pcm16_mono(48_000);
        let out = convert(&pcm16(&[7, -9]), &mono, &stereo).unwrap();
        assert_eq!(to_i16(&out), vec![7, 7, -9, -9]);
    }

    #[test]
    fn pcm16_to_pcm8_and_back() {
        let pcm16_mono = AudioFormat::pcm16_mono(8_000);
        let pcm8_mono = pcm16_mono.with_encoding(SampleEncoding::Pcm8);

        let down = convert(&pcm16(&[i16::MIN, 0, 256, i16::MAX]), &pcm16_mono, &pcm8_mono).unwrap();
        assert_eq!(down.as_bytes(), &[0, 128, 129, 255]);

        // 8-bit tops out at 127/128 of full scale.
        let up = convert(&down, &pcm8_mono, &pcm16_mono).unwrap();
        assert_eq!(to_i16(&up), vec![i16::MIN, 0, 256, 32_512]);
    }

    #[test]
    fn float_to_pcm16_saturates() {
        let float_mono = AudioFormat::new(SampleEncoding::Float32, 1, 48_000).unwrap();
        let pcm16_mono = AudioFormat::pcm16_mono(48_000);

        let mut raw = vec![0u8; 12];
        LittleEndian::write_f32_into(&[2.0, -0.5, -7.0], &mut raw);
        let out = convert(&raw, &float_mono, &pcm16_mono).unwrap();
        assert_eq!(to_i16(&out), vec![i16::MAX, -16_384, i16::MIN]);
    }

    #[test]
    fn misaligned_input_is_rejected() {
        let stereo = AudioFormat::pcm16_stereo(48_000);
        let mono = AudioFormat::pcm16_mono(48_000);
        assert_eq!(
            convert(&[0u8; 6], &stereo, &mono),
            Err(CodecError::Misaligned { len: 6, group: 4 })
        );
    }

    #[test]
    fn rate_difference_is_not_resampled() {
        let a = AudioFormat::pcm16_mono(44_100);
        let b = AudioFormat::pcm16_mono(48_000);
        let bytes = pcm16(&[1, 2, 3]);
        assert_eq!(convert(&bytes, &a, &b).unwrap().as_bytes(), &bytes[..]);
    }

    #[test]
    fn source_len_rounds_up_partial_groups() {
        let float_stereo = AudioFormat::new(SampleEncoding::Float32, 2, 48_000).unwrap();
        let pcm16_mono = AudioFormat::pcm16_mono(48_000);
        assert_eq!(source_len_for(960, &float_stereo, &pcm16_mono), 3840);
        assert_eq!(source_len_for(3, &float_stereo, &pcm16_mono), 16);
    }
}
