//! Demux layer: container detection and symphonia probing.

pub mod format;

pub use format::sniff_container;
use symphonia::core::{
    codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions},
    errors::Error,
    formats::{FormatOptions, FormatReader},
    io::{MediaSource, MediaSourceStream},
    meta::MetadataOptions,
    probe::Hint,
};

use crate::{audio::constants::DEFAULT_SAMPLE_RATE, common::types::ContainerKind};

/// A probed container with its first decodable audio track.
pub struct OpenedTrack {
    pub format: Box<dyn FormatReader>,
    pub decoder: Box<dyn Decoder>,
    pub track_id: u32,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Probe `source` and build a decoder for its first audio track.
///
/// `kind` only seeds the probe hint; symphonia still inspects the bytes.
pub fn open_format(
    source: Box<dyn MediaSource>,
    kind: ContainerKind,
) -> Result<OpenedTrack, Error> {
    let mss = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();
    let ext = kind.as_ext();
    if !ext.is_empty() {
        hint.with_extension(ext);
    }
    if let Some(mime) = kind.as_mime() {
        hint.mime_type(mime);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions {
            enable_gapless: true,
            ..Default::default()
        },
        &MetadataOptions::default(),
    )?;

    let format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no audio track found",
            ))
        })?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    Ok(OpenedTrack {
        format,
        decoder,
        track_id,
        sample_rate,
        channels,
    })
}
