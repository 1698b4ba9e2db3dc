use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task on the remote board. The server only ever
/// produces these three values; anything else is a deserialization error.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, TaskStatus::New | TaskStatus::InProgress)
    }
}

impl FromStr for TaskStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub project: String,
    pub organisation: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<Attachment>,
}

impl Task {
    /// Short list label, e.g. `HD-42`.
    pub fn reference(&self) -> String {
        format!("{}-{}", self.project, self.id)
    }
}

/// A file committed to a task. The server body carries no `url`; the client
/// derives it from the attachment id after decoding.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Attachment {
    pub id: i64,
    pub filename: String,
    pub mimetype: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub url: String,
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::from_mime(&self.mimetype)
    }

    pub fn is_image(&self) -> bool {
        self.kind() == AttachmentKind::Image
    }
}

/// Coarse attachment category used to pick a grid icon.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Pdf,
    Text,
    Archive,
    Code,
    Document,
    Unknown,
}

impl AttachmentKind {
    pub fn from_mime(mimetype: &str) -> Self {
        let mime = mimetype.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else if mime.starts_with("audio/") {
            Self::Audio
        } else if mime.contains("pdf") {
            Self::Pdf
        } else if mime.contains("zip")
            || mime.contains("tar")
            || mime.contains("rar")
            || mime.contains("7z")
            || mime.contains("compressed")
        {
            Self::Archive
        } else if mime.contains("javascript")
            || mime.contains("json")
            || mime.contains("xml")
            || mime.contains("html")
            || mime.contains("css")
            || mime.contains("sql")
            || mime.contains("python")
            || mime.contains("x-sh")
        {
            Self::Code
        } else if mime.contains("msword")
            || mime.contains("wordprocessing")
            || mime.contains("spreadsheet")
            || mime.contains("excel")
            || mime.contains("presentation")
            || mime.contains("powerpoint")
            || mime.contains("opendocument")
            || mime.contains("rtf")
        {
            Self::Document
        } else if mime.starts_with("text/") {
            Self::Text
        } else {
            Self::Unknown
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Image => "[img]",
            Self::Video => "[vid]",
            Self::Audio => "[aud]",
            Self::Pdf => "[pdf]",
            Self::Text => "[txt]",
            Self::Archive => "[zip]",
            Self::Code => "[cod]",
            Self::Document => "[doc]",
            Self::Unknown => "[???]",
        }
    }
}

/// Fields of a task about to be created. Validation happens in the form
/// layer; the API client sends these as-is.
#[derive(Debug, Clone, Serialize, Eq, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub project: String,
    pub organisation: String,
}

/// A user-selected file staged for upload but not yet committed to the
/// server. Identity inside the staged set is the (name, size) pair.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PendingUpload {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

impl PendingUpload {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
            })?;
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        Ok(Self {
            name,
            size: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    pub fn same_identity(&self, other: &PendingUpload) -> bool {
        self.name == other.name && self.size == other.size
    }
}

/// Human-readable byte count for list and grid labels.
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{bytes} B")
    }
}
