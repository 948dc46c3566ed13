//! Parameter types for encode operations.
//!
//! These describe *what* to produce, not *how*. The [`encode`](super::encode)
//! module turns them into encoder calls.
//!
//! ## Types
//!
//! - [`Quality`] — Encoding quality (0–100, default 100). Clamped on construction.
//! - [`EncodeFormat`] — Output codec. Quality only matters for the lossy ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default export quality, matching what a crop view hands to the pipeline
/// when the caller does not pick one.
pub const DEFAULT_IMAGE_QUALITY: u8 = 100;

/// Quality setting for encoding (0-100).
///
/// The meaning is format dependent: lossy codecs map it onto their own scale,
/// lossless codecs ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_IMAGE_QUALITY)
    }
}

/// Output codec for an export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodeFormat {
    #[default]
    Jpeg,
    Png,
    #[serde(rename = "webp")]
    WebP,
    Avif,
}

impl EncodeFormat {
    pub const ALL: [EncodeFormat; 4] = [Self::Jpeg, Self::Png, Self::WebP, Self::Avif];

    /// Whether [`Quality`] affects the output.
    ///
    /// WebP goes through the `image` crate's lossless encoder, so it is
    /// lossless here even though the container supports lossy data.
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg | Self::Avif)
    }

    /// Canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        }
    }

    /// Infer the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for EncodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Avif => "avif",
        };
        f.write_str(name)
    }
}

impl FromStr for EncodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "avif" => Ok(Self::Avif),
            other => Err(format!(
                "unknown format '{other}' (expected jpeg, png, webp or avif)"
            )),
        }
    }
}
