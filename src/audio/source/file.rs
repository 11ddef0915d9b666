//! `FileSource`: frames decoded from an audio file on disk.
//!
//! `start()` opens and probes the file, then hands the demuxer to a dedicated
//! decode thread. Decoded PCM travels over a bounded flume channel as native
//! Float32 bytes; the pull path drains the channel into a fixed read-ahead
//! ring without ever blocking, and repacks into the requested format.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::PathBuf,
    thread,
    time::Duration,
};

use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use flume::{Receiver, Sender, TryRecvError};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::Decoder,
    errors::Error,
    formats::{FormatReader, SeekMode, SeekTo},
};
use tracing::{debug, info, warn};

use crate::{
    audio::{
        buffer::RingBuffer,
        codec,
        constants::{
            DECODE_CHANNEL_PACKETS, FIRST_PACKET_TIMEOUT_MS, MAX_DECODE_ERRORS, READ_AHEAD_BYTES,
        },
        demux::{self, OpenedTrack},
        format::{AudioFormat, SampleEncoding},
        frame::Frame,
        source::{FrameSupplier, queued::fit_to_len},
    },
    common::{AudioError, ContainerKind},
};

#[derive(Debug, Clone)]
pub struct FileSourceOptions {
    pub path: PathBuf,
    /// Seek back to the start at end of stream instead of finishing.
    pub looping: bool,
}

impl FileSourceOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            looping: false,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderCommand {
    Stop,
}

/// Handles held while a decode thread is running.
struct Running {
    native: AudioFormat,
    rx: Receiver<Bytes>,
    cmd_tx: Sender<DecoderCommand>,
}

pub struct FileSource {
    options: FileSourceOptions,
    running: Option<Running>,
    ring: RingBuffer,
    /// Part of a decoded packet that did not fit in the ring yet.
    pending: Option<Bytes>,
    groups_provided: u64,
    last_timestamp_ns: u64,
}

impl FileSource {
    pub fn new(options: FileSourceOptions) -> Self {
        Self {
            options,
            running: None,
            ring: RingBuffer::new(READ_AHEAD_BYTES),
            pending: None,
            groups_provided: 0,
            last_timestamp_ns: 0,
        }
    }

    pub fn options(&self) -> &FileSourceOptions {
        &self.options
    }

    /// Decoded format of the open file, once started.
    pub fn native_format(&self) -> Option<AudioFormat> {
        self.running.as_ref().map(|r| r.native)
    }

    fn open(&self) -> Result<OpenedTrack, AudioError> {
        let path = &self.options.path;
        let unavailable = |e: &dyn std::fmt::Display| {
            AudioError::SupplierUnavailable(format!("{}: {}", path.display(), e))
        };

        let mut file = File::open(path).map_err(|e| unavailable(&e))?;

        let mut kind = ContainerKind::from_path(path);
        if kind == ContainerKind::Unknown {
            let mut header = [0u8; 16];
            let n = file.read(&mut header).map_err(|e| unavailable(&e))?;
            file.seek(SeekFrom::Start(0)).map_err(|e| unavailable(&e))?;
            kind = demux::sniff_container(&header[..n]);
        }

        demux::open_format(Box::new(file), kind).map_err(|e| unavailable(&e))
    }

    /// Moves decoded bytes from the channel into the ring until `needed`
    /// bytes are buffered or nothing more is ready.
    fn fill(&mut self, needed: usize) {
        let Some(running) = &self.running else {
            return;
        };

        loop {
            if let Some(mut chunk) = self.pending.take() {
                let taken = self.ring.write(&chunk);
                if taken < chunk.len() {
                    let _ = chunk.split_to(taken);
                    self.pending = Some(chunk);
                    return;
                }
            }

            if self.ring.len() >= needed {
                return;
            }

            match running.rx.try_recv() {
                Ok(chunk) => self.pending = Some(chunk),
                Err(_) => return,
            }
        }
    }

    fn clear_buffers(&mut self) {
        self.ring.clear();
        self.pending = None;
        self.groups_provided = 0;
        self.last_timestamp_ns = 0;
    }
}

impl FrameSupplier for FileSource {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.running.is_some() {
            return Ok(());
        }
        self.clear_buffers();

        let opened = self.open()?;
        let native = AudioFormat::new(
            SampleEncoding::Float32,
            opened.channels.min(u8::MAX as usize) as u8,
            opened.sample_rate,
        )?;

        let (tx, rx) = flume::bounded::<Bytes>(DECODE_CHANNEL_PACKETS);
        let (cmd_tx, cmd_rx) = flume::unbounded::<DecoderCommand>();

        let mut decode = DecodeLoop {
            format: opened.format,
            decoder: opened.decoder,
            track_id: opened.track_id,
            looping: self.options.looping,
            tx,
            cmd_rx,
            sample_buf: None,
        };
        let path = self.options.path.display().to_string();
        thread::Builder::new()
            .name("mixtap-decode".to_string())
            .spawn(move || {
                if let Err(e) = decode.run() {
                    warn!("FileSource: decoding {} stopped: {}", path, e);
                }
            })?;

        info!(
            "FileSource: opened {} ({})",
            self.options.path.display(),
            native
        );

        // Wait briefly for the first packet so the first pull has data.
        if let Ok(first) = rx.recv_timeout(Duration::from_millis(FIRST_PACKET_TIMEOUT_MS)) {
            self.pending = Some(first);
        }

        self.running = Some(Running { native, rx, cmd_tx });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.cmd_tx.send(DecoderCommand::Stop);
            // Dropping the receiver unblocks a decode thread parked in `send`.
            drop(running.rx);
            debug!("FileSource: stopped {}", self.options.path.display());
        }
        self.clear_buffers();
    }

    fn has_more_data(&self) -> bool {
        let Some(running) = &self.running else {
            return false;
        };
        !self.ring.is_empty()
            || self.pending.is_some()
            || !(running.rx.is_disconnected() && running.rx.is_empty())
    }

    fn provide_frame(&mut self, requested_bytes: usize, format: &AudioFormat) -> Option<Frame> {
        let native = self.running.as_ref()?.native;
        if requested_bytes == 0 {
            return None;
        }

        let needed = codec::source_len_for(requested_bytes, &native, format);
        self.fill(needed);

        let available = self.ring.len().min(needed);
        let aligned = available - available % native.group_size();
        if aligned == 0 {
            return None;
        }

        let mut raw = Vec::with_capacity(aligned);
        self.ring.read_into(&mut raw, aligned);

        self.groups_provided += (aligned / native.group_size()) as u64;
        self.last_timestamp_ns = native.groups_to_nanos(self.groups_provided);

        match codec::convert(&raw, &native, format) {
            Ok(frame) => Some(fit_to_len(frame, requested_bytes, format)),
            Err(e) => {
                debug!("{}", AudioError::InternalConversionFailure(e));
                None
            }
        }
    }

    fn capture_timestamp(&self) -> u64 {
        self.last_timestamp_ns
    }
}

impl Drop for FileSource {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─── Decode thread ───────────────────────────────────────────────────────────

struct DecodeLoop {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    looping: bool,
    tx: Sender<Bytes>,
    cmd_rx: Receiver<DecoderCommand>,
    sample_buf: Option<SampleBuffer<f32>>,
}

impl DecodeLoop {
    fn run(&mut self) -> Result<(), Error> {
        let mut decode_errors = 0usize;
        let mut produced_since_rewind = false;

        loop {
            match self.cmd_rx.try_recv() {
                Ok(DecoderCommand::Stop) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // An empty file would otherwise rewind forever.
                    if self.looping && produced_since_rewind {
                        self.rewind()?;
                        produced_since_rewind = false;
                        continue;
                    }
                    break;
                }
                Err(Error::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(e),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    decode_errors = 0;
                    let spec = *decoded.spec();
                    let mut buf = self.sample_buf.take().unwrap_or_else(|| {
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
                    });
                    buf.copy_interleaved_ref(decoded);

                    let samples = buf.samples();
                    if !samples.is_empty() {
                        let mut bytes = vec![0u8; samples.len() * 4];
                        LittleEndian::write_f32_into(samples, &mut bytes);
                        produced_since_rewind = true;
                        if self.tx.send(Bytes::from(bytes)).is_err() {
                            // Source stopped or dropped.
                            break;
                        }
                    }
                    self.sample_buf = Some(buf);
                }
                Err(Error::DecodeError(e)) => {
                    decode_errors += 1;
                    warn!("FileSource: recoverable decode error: {}", e);
                    if decode_errors > MAX_DECODE_ERRORS {
                        return Err(Error::DecodeError("too many consecutive decode errors"));
                    }
                }
                Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
        }

        debug!("FileSource: decode loop finished");
        Ok(())
    }

    fn rewind(&mut self) -> Result<(), Error> {
        self.format.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: 0,
                track_id: self.track_id,
            },
        )?;
        self.decoder.reset();
        debug!("FileSource: looping back to start");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use byteorder::WriteBytesExt;

    use super::*;

    /// Writes a 16-bit mono PCM WAV holding `samples`.
    fn write_wav(name: &str, sample_rate: u32, samples: &[i16]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.wav", name, std::process::id()));
        let data_len = (samples.len() * 2) as u32;

        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.write_u32::<LittleEndian>(36 + data_len).unwrap();
        out.extend_from_slice(b"WAVEfmt ");
        out.write_u32::<LittleEndian>(16).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u16::<LittleEndian>(1).unwrap();
        out.write_u32::<LittleEndian>(sample_rate).unwrap();
        out.write_u32::<LittleEndian>(sample_rate * 2).unwrap();
        out.write_u16::<LittleEndian>(2).unwrap();
        out.write_u16::<LittleEndian>(16).unwrap();
        out.extend_from_slice(b"data");
        out.write_u32::<LittleEndian>(data_len).unwrap();
        for s in samples {
            out.write_i16::<LittleEndian>(*s).unwrap();
        }

        let mut file = File::create(&path).unwrap();
        file.write_all(&out).unwrap();
        path
    }

    /// Pulls until the source reports end of data.
    fn drain(source: &mut FileSource, len: usize, format: &AudioFormat) -> Vec<i16> {
        let mut out = Vec::new();
        for _ in 0..5_000 {
            match source.provide_frame(len, format) {
                Some(frame) => {
                    assert_eq!(frame.len(), len);
                    let mut samples = vec![0i16; len / 2];
                    LittleEndian::read_i16_into(&frame, &mut samples);
                    out.extend(samples);
                }
                None if !source.has_more_data() => break,
                None => thread::sleep(Duration::from_millis(1)),
            }
        }
        out
    }

    #[test]
    fn missing_file_is_unavailable() {
        let mut source = FileSource::new(FileSourceOptions::new("/nonexistent/clip.wav"));
        assert!(matches!(
            source.start(),
            Err(AudioError::SupplierUnavailable(_))
        ));
        assert!(!source.has_more_data());
    }

    #[test]
    fn decodes_wav_to_requested_format() {
        let path = write_wav("mixtap-file-source", 48_000, &[4096; 4_800]);
        let format = AudioFormat::pcm16_mono(48_000);

        let mut source = FileSource::new(FileSourceOptions::new(&path));
        assert!(source.provide_frame(960, &format).is_none());
        source.start().unwrap();
        assert_eq!(
            source.native_format(),
            AudioFormat::new(SampleEncoding::Float32, 1, 48_000).ok()
        );

        let samples = drain(&mut source, 960, &format);
        // 4800 decoded samples; the tail frame is silence-padded.
        assert_eq!(samples.iter().filter(|s| **s == 4096).count(), 4_800);
        assert!(samples[4_800..].iter().all(|s| *s == 0));
        assert_eq!(source.capture_timestamp(), 100_000_000);

        source.stop();
        assert!(!source.has_more_data());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn stereo_output_duplicates_mono_file() {
        let path = write_wav("mixtap-file-stereo", 16_000, &[-8192; 320]);
        let format = AudioFormat::pcm16_stereo(16_000);

        let mut source = FileSource::new(FileSourceOptions::new(&path));
        source.start().unwrap();
        let samples = drain(&mut source, 640, &format);
        assert_eq!(samples.iter().filter(|s| **s == -8192).count(), 640);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn looping_file_keeps_supplying() {
        let path = write_wav("mixtap-file-loop", 8_000, &[1000; 80]);
        let format = AudioFormat::pcm16_mono(8_000);

        let mut source = FileSource::new(FileSourceOptions::new(&path).looping(true));
        source.start().unwrap();

        let mut pulled = 0;
        for _ in 0..5_000 {
            if source.provide_frame(160, &format).is_some() {
                pulled += 1;
                if pulled == 5 {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(1));
            }
        }
        // Five 80-sample pulls cover the 80-sample file five times.
        assert_eq!(pulled, 5);
        assert!(source.has_more_data());

        source.stop();
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn restart_reads_from_the_beginning() {
        let mut samples = vec![0i16; 480];
        for (i, s) in samples.iter_mut().enumerate() {
            *s = (i as i16) * 8;
        }
        let path = write_wav("mixtap-file-restart", 48_000, &samples);
        let format = AudioFormat::pcm16_mono(48_000);

        let mut source = FileSource::new(FileSourceOptions::new(&path));
        source.start().unwrap();
        let first = drain(&mut source, 96, &format);
        source.stop();
        source.start().unwrap();
        let second = drain(&mut source, 96, &format);
        assert_eq!(first, second);
        assert_eq!(&first[..480], &samples[..]);
        std::fs::remove_file(path).ok();
    }
}
