use serde::{Deserialize, Serialize};
use std::fmt;

/// How a source provider reacts to a webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenType {
    /// Extracts links right away and downloads them once
    Disposable,
    /// Records the source in its own state; downloads happen on scheduled runs
    Persistent,
}

/// Content classification used to pick a destination directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    #[default]
    Common,
    VideoMixed,
    Tv,
    Movie,
    Music,
    Picture,
}

impl FileType {
    pub const ALL: [FileType; 6] = [
        FileType::Common,
        FileType::VideoMixed,
        FileType::Tv,
        FileType::Movie,
        FileType::Music,
        FileType::Picture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Common => "common",
            FileType::VideoMixed => "video_mixed",
            FileType::Tv => "tv",
            FileType::Movie => "movie",
            FileType::Music => "music",
            FileType::Picture => "picture",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link classification used to select a download strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Magnet,
    Torrent,
    #[default]
    General,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::Magnet => "magnet",
            LinkType::Torrent => "torrent",
            LinkType::General => "general",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One downloadable link emitted by a source provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDescriptor {
    pub link: String,
    pub file_type: FileType,
    /// Destination fragment relative to the file type directory
    pub path: String,
}

impl LinkDescriptor {
    pub fn new(link: impl Into<String>, file_type: FileType, path: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            file_type,
            path: path.into(),
        }
    }
}
