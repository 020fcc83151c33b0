//! The on-disk theme store.
//!
//! ```text
//! <root>/
//!   frames/<theme>/frame.png
//!   frames/<theme>/metadata.json   (optional)
//!   images/fallback.png
//!   index.html
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::asset::{AssetOrigin, ImageAsset};
use crate::error::{FrameError, FrameResult};

const FRAMES_DIR: &str = "frames";
const FRAME_FILE: &str = "frame.png";
const METADATA_FILE: &str = "metadata.json";
const FALLBACK_PATH: &str = "images/fallback.png";

/// One entry of the theme listing.
///
/// Keys from `metadata.json` override the defaults; unknown keys are passed
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeDescriptor {
    pub theme: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ThemeDescriptor {
    /// The descriptor used when a theme has no usable metadata.
    pub fn defaults(theme: &str) -> Self {
        Self {
            theme: theme.to_string(),
            name: theme.to_string(),
            description: format!("{theme} frame theme"),
            extra: serde_json::Map::new(),
        }
    }

    /// Overlays the keys of a parsed `metadata.json` object.
    fn merge(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        for (key, value) in metadata {
            match (key.as_str(), value) {
                ("theme", _) => {}
                ("name", serde_json::Value::String(name)) => self.name = name,
                ("description", serde_json::Value::String(description)) => {
                    self.description = description
                }
                (_, value) => {
                    self.extra.insert(key, value);
                }
            }
        }
        self
    }
}

/// Returns true when `theme` is a plain directory name.
pub fn is_valid_theme_id(theme: &str) -> bool {
    !theme.is_empty()
        && theme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Read-only access to frames, metadata and the fallback avatar.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    root: PathBuf,
}

impl ThemeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.root.join(FRAMES_DIR)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.root.join(FALLBACK_PATH)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.html")
    }

    /// Reads `frames/<theme>/frame.png`.
    pub async fn load_frame(&self, theme: &str) -> FrameResult<ImageAsset> {
        if !is_valid_theme_id(theme) {
            return Err(FrameError::ThemeNotFound(theme.to_string()));
        }
        let path = self.frames_dir().join(theme).join(FRAME_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FrameError::ThemeNotFound(theme.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        ImageAsset::from_bytes(bytes, AssetOrigin::Frame)
    }

    /// Reads `images/fallback.png`.
    pub async fn load_fallback(&self) -> FrameResult<ImageAsset> {
        let path = self.fallback_path();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|_| FrameError::FallbackMissing(path.display().to_string()))?;
        ImageAsset::from_bytes(bytes, AssetOrigin::Fallback)
    }

    /// Lists every loadable theme: directories with a plain-name id that
    /// contain a `frame.png`, sorted by id.
    pub async fn list_themes(&self) -> FrameResult<Vec<ThemeDescriptor>> {
        let frames_dir = self.frames_dir();
        let mut entries = match tokio::fs::read_dir(&frames_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(FrameError::FramesDirMissing(frames_dir.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut themes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(theme) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_valid_theme_id(&theme) {
                tracing::debug!(theme, "skipping theme directory with unsupported name");
                continue;
            }
            if !tokio::fs::try_exists(entry.path().join(FRAME_FILE)).await? {
                continue;
            }
            themes.push(self.describe(&theme, &entry.path()).await);
        }

        themes.sort_by(|a, b| a.theme.cmp(&b.theme));
        Ok(themes)
    }

    async fn describe(&self, theme: &str, dir: &Path) -> ThemeDescriptor {
        let descriptor = ThemeDescriptor::defaults(theme);
        let Ok(raw) = tokio::fs::read_to_string(dir.join(METADATA_FILE)).await else {
            return descriptor;
        };
        match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&raw) {
            Ok(metadata) => descriptor.merge(metadata),
            Err(err) => {
                tracing::warn!(theme, error = %err, "invalid metadata.json, using defaults");
                descriptor
            }
        }
    }
}
