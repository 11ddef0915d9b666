/// A generic boxed error type.
pub type AnyError = Box<dyn std::error::Error + Send + Sync>;

/// A convenient Result alias returning `AnyError`.
pub type AnyResult<T> = std::result::Result<T, AnyError>;

/// Identifies a remote participant in a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::ops::Deref for ParticipantId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies one remote audio track of a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl From<String> for TrackId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::ops::Deref for TrackId {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media container kinds recognised by the file-backed source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ContainerKind {
    Aac,
    Mp4,
    Mp3,
    Ogg,
    Flac,
    Wav,
    Webm,
    Unknown,
}

impl ContainerKind {
    pub fn as_ext(&self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Mp4 => "m4a",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Webm => "mkv",
            Self::Unknown => "",
        }
    }

    pub fn from_ext(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "aac" => Self::Aac,
            "mp4" | "m4a" | "3gp" | "mov" => Self::Mp4,
            "mp3" => Self::Mp3,
            "ogg" | "opus" => Self::Ogg,
            "flac" => Self::Flac,
            "wav" | "wave" => Self::Wav,
            "webm" | "mkv" => Self::Webm,
            _ => Self::Unknown,
        }
    }

    /// Derives the container from a file path's extension.
    pub fn from_path(path: &std::path::Path) -> Self {
        path.extension()
            .and_then(|s| s.to_str())
            .map(Self::from_ext)
            .unwrap_or(Self::Unknown)
    }

    pub fn as_mime(&self) -> Option<&'static str> {
        match self {
            Self::Aac => Some("audio/aac"),
            Self::Mp4 => Some("audio/mp4"),
            Self::Mp3 => Some("audio/mpeg"),
            Self::Ogg => Some("audio/ogg"),
            Self::Flac => Some("audio/flac"),
            Self::Wav => Some("audio/wav"),
            Self::Webm => Some("audio/webm"),
            Self::Unknown => None,
        }
    }
}
