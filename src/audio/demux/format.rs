//! Container detection via header byte sniffing.

use crate::common::types::ContainerKind;

/// Sniff the container from the first bytes of a file.
///
/// Requires at least 4 bytes. Returns `ContainerKind::Unknown` for anything
/// not in the table.
pub fn sniff_container(header: &[u8]) -> ContainerKind {
    if header.len() < 4 {
        return ContainerKind::Unknown;
    }

    // EBML magic (WebM / Matroska)
    if header.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return ContainerKind::Webm;
    }

    if header.len() >= 8 && &header[4..8] == b"ftyp" {
        return ContainerKind::Mp4;
    }

    if header.starts_with(b"OggS") {
        return ContainerKind::Ogg;
    }

    if header.starts_with(b"fLaC") {
        return ContainerKind::Flac;
    }

    if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WAVE" {
        return ContainerKind::Wav;
    }

    if header.starts_with(b"ID3") {
        return ContainerKind::Mp3;
    }
    // ADTS sync word: 12 set bits, layer bits zero.
    if header[0] == 0xFF && (header[1] & 0xF6) == 0xF0 {
        return ContainerKind::Aac;
    }
    // MPEG audio frame sync.
    if header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
        return ContainerKind::Mp3;
    }

    ContainerKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_wav() {
        let hdr = b"RIFF\x24\x00\x00\x00WAVEfmt ";
        assert_eq!(sniff_container(hdr), ContainerKind::Wav);
    }

    #[test]
    fn sniff_mp4() {
        let hdr = b"\x00\x00\x00\x1Cftypisom";
        assert_eq!(sniff_container(hdr), ContainerKind::Mp4);
    }

    #[test]
    fn sniff_mpeg_family() {
        assert_eq!(sniff_container(b"ID3\x04\x00"), ContainerKind::Mp3);
        assert_eq!(sniff_container(&[0xFF, 0xFB, 0x90, 0x00]), ContainerKind::Mp3);
        assert_eq!(sniff_container(&[0xFF, 0xF1, 0x50, 0x80]), ContainerKind::Aac);
    }

    #[test]
    fn sniff_ogg_flac_webm() {
        assert_eq!(sniff_container(b"OggS\x00"), ContainerKind::Ogg);
        assert_eq!(sniff_container(b"fLaC\x00"), ContainerKind::Flac);
        assert_eq!(
            sniff_container(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]),
            ContainerKind::Webm
        );
    }

    #[test]
    fn sniff_unknown() {
        assert_eq!(sniff_container(&[0, 0, 0, 0]), ContainerKind::Unknown);
        assert_eq!(sniff_container(b"RI"), ContainerKind::Unknown);
    }
}
