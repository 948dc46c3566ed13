//! Crop configuration and export settings.
//!
//! [`CropConfig`] is the parameter record a crop view owns: viewport ratio,
//! scale bounds, overlay and grid appearance. Every field always holds either
//! an accepted caller value or its documented default. Three numeric fields
//! (`viewport_ratio`, `max_scale`, `min_scale`) fall back to their default when
//! given a non-positive value; every other setter stores what it is given.
//!
//! ## Settings File
//!
//! The same parameters can be populated from a TOML file, alongside the
//! export defaults and the worker pool size:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [viewport]
//! ratio = 0.0                   # width / height; 0 = match the image
//! overlay_padding = 0           # pixels between viewport and view edge
//! overlay_color = "#C8000000"   # #AARRGGBB or #RRGGBB
//! shape = "rectangle"           # "rectangle" or "oval"
//!
//! [scale]
//! max = 10.0
//! min = 0.0
//!
//! [grid]
//! enabled = false
//! columns = 3
//! lines = 3
//! color = "#FFFFFFFF"
//! outline_color = "#80FFFFFF"
//!
//! [export]
//! format = "jpeg"               # jpeg, png, webp, avif
//! quality = 100                 # 0-100, lossy formats only
//!
//! [processing]
//! max_workers = 4               # omit for auto = CPU cores; may exceed them
//! ```
//!
//! Values are applied through the [`CropConfig`] setters, so the
//! clamp-to-default rule holds for file input as well. Unknown keys are
//! rejected to catch typos early.

use crate::imaging::{EncodeFormat, Quality};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_VIEWPORT_RATIO: f32 = 0.0;
pub const DEFAULT_MAXIMUM_SCALE: f32 = 10.0;
pub const DEFAULT_MINIMUM_SCALE: f32 = 0.0;
pub const DEFAULT_VIEWPORT_OVERLAY_PADDING: u32 = 0;
/// Black with 200 alpha.
pub const DEFAULT_VIEWPORT_OVERLAY_COLOR: Argb = Argb(0xC800_0000);
pub const DEFAULT_GRID_ENABLED: bool = false;
pub const DEFAULT_GRID_COLUMNS: i32 = 3;
pub const DEFAULT_GRID_LINES: i32 = 3;
pub const DEFAULT_GRID_COLOR: Argb = Argb(0xFFFF_FFFF);
pub const DEFAULT_GRID_OUTLINE_COLOR: Argb = Argb(0x80FF_FFFF);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

// =============================================================================
// Value types
// =============================================================================

/// A 32-bit color packed as `0xAARRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self((a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    pub fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl FromStr for Argb {
    type Err = String;

    /// Parse `#AARRGGBB`, or `#RRGGBB` as fully opaque.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{s}' is not hexadecimal"));
        }
        let value =
            u32::from_str_radix(hex, 16).map_err(|e| format!("color '{s}' is invalid: {e}"))?;
        match hex.len() {
            8 => Ok(Self(value)),
            6 => Ok(Self(0xFF00_0000 | value)),
            _ => Err(format!("color '{s}' must be #RRGGBB or #AARRGGBB")),
        }
    }
}

/// Viewport outline shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rectangle,
    Oval,
}

/// Outcome of a clamp-to-default validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalized {
    /// The input passed validation and was stored as given.
    Accepted(f32),
    /// The input was rejected and the default stored instead.
    Defaulted { rejected: f32, default: f32 },
}

impl Normalized {
    /// The value that ends up stored.
    pub fn value(self) -> f32 {
        match self {
            Self::Accepted(v) => v,
            Self::Defaulted { default, .. } => default,
        }
    }

    pub fn was_defaulted(self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }
}

/// Accept strictly positive values; anything else (zero, negative, NaN)
/// becomes `default`.
pub fn positive_or_default(value: f32, default: f32) -> Normalized {
    if value > 0.0 {
        Normalized::Accepted(value)
    } else {
        Normalized::Defaulted {
            rejected: value,
            default,
        }
    }
}

fn store_positive(field: &'static str, slot: &mut f32, value: f32, default: f32) -> Normalized {
    let normalized = positive_or_default(value, default);
    if normalized.was_defaulted() {
        debug!(field, rejected = value, default, "non-positive value replaced by default");
    }
    *slot = normalized.value();
    normalized
}

// =============================================================================
// CropConfig
// =============================================================================

/// Crop and display parameters for a crop view.
///
/// Constructed with all defaults, then mutated field by field. Nothing here
/// can fail: the clamped setters report substitutions through [`Normalized`],
/// the rest store their input unchanged (including values such as zero or
/// negative grid columns, which callers are expected to avoid).
#[derive(Debug, Clone, PartialEq)]
pub struct CropConfig {
    viewport_ratio: f32,
    max_scale: f32,
    min_scale: f32,
    overlay_padding: u32,
    overlay_color: Argb,
    shape: Shape,
    grid_enabled: bool,
    grid_columns: i32,
    grid_lines: i32,
    grid_color: Argb,
    grid_outline_color: Argb,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            viewport_ratio: DEFAULT_VIEWPORT_RATIO,
            max_scale: DEFAULT_MAXIMUM_SCALE,
            min_scale: DEFAULT_MINIMUM_SCALE,
            overlay_padding: DEFAULT_VIEWPORT_OVERLAY_PADDING,
            overlay_color: DEFAULT_VIEWPORT_OVERLAY_COLOR,
            shape: Shape::default(),
            grid_enabled: DEFAULT_GRID_ENABLED,
            grid_columns: DEFAULT_GRID_COLUMNS,
            grid_lines: DEFAULT_GRID_LINES,
            grid_color: DEFAULT_GRID_COLOR,
            grid_outline_color: DEFAULT_GRID_OUTLINE_COLOR,
        }
    }
}

impl CropConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewport width / height. `0.0` means "use the image's own ratio".
    pub fn viewport_ratio(&self) -> f32 {
        self.viewport_ratio
    }

    pub fn set_viewport_ratio(&mut self, ratio: f32) -> Normalized {
        store_positive(
            "viewport_ratio",
            &mut self.viewport_ratio,
            ratio,
            DEFAULT_VIEWPORT_RATIO,
        )
    }

    pub fn max_scale(&self) -> f32 {
        self.max_scale
    }

    pub fn set_max_scale(&mut self, scale: f32) -> Normalized {
        store_positive("max_scale", &mut self.max_scale, scale, DEFAULT_MAXIMUM_SCALE)
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }

    pub fn set_min_scale(&mut self, scale: f32) -> Normalized {
        store_positive("min_scale", &mut self.min_scale, scale, DEFAULT_MINIMUM_SCALE)
    }

    pub fn overlay_padding(&self) -> u32 {
        self.overlay_padding
    }

    pub fn set_overlay_padding(&mut self, padding: u32) {
        self.overlay_padding = padding;
    }

    pub fn overlay_color(&self) -> Argb {
        self.overlay_color
    }

    pub fn set_overlay_color(&mut self, color: Argb) {
        self.overlay_color = color;
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
    }

    pub fn grid_enabled(&self) -> bool {
        self.grid_enabled
    }

    pub fn set_grid_enabled(&mut self, enabled: bool) {
        self.grid_enabled = enabled;
    }

    pub fn grid_columns(&self) -> i32 {
        self.grid_columns
    }

    pub fn set_grid_columns(&mut self, columns: i32) {
        self.grid_columns = columns;
    }

    pub fn grid_lines(&self) -> i32 {
        self.grid_lines
    }

    pub fn set_grid_lines(&mut self, lines: i32) {
        self.grid_lines = lines;
    }

    pub fn grid_color(&self) -> Argb {
        self.grid_color
    }

    pub fn set_grid_color(&mut self, color: Argb) {
        self.grid_color = color;
    }

    pub fn grid_outline_color(&self) -> Argb {
        self.grid_outline_color
    }

    pub fn set_grid_outline_color(&mut self, color: Argb) {
        self.grid_outline_color = color;
    }
}

// =============================================================================
// Export and processing settings
// =============================================================================

/// Defaults for exports that do not name their own format or quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportConfig {
    pub format: EncodeFormat,
    pub quality: Quality,
}

/// Worker pool settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingConfig {
    /// Maximum number of encode workers.
    /// When absent, defaults to the number of CPU cores. An explicit value is
    /// used as given: jobs block on I/O, so more workers than cores is fine.
    pub max_workers: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `n`, and at least one
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    config.max_workers.map(|n| n.max(1)).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// Everything a settings file can carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub crop: CropConfig,
    pub export: ExportConfig,
    pub processing: ProcessingConfig,
}

// =============================================================================
// Settings file
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    viewport: ViewportSection,
    scale: ScaleSection,
    grid: GridSection,
    export: ExportSection,
    processing: ProcessingSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ViewportSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    ratio: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay_padding: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overlay_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shape: Option<Shape>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ScaleSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GridSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outline_color: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ExportSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<EncodeFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ProcessingSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_workers: Option<usize>,
}

fn parse_color(key: &str, value: &str) -> Result<Argb, ConfigError> {
    value
        .parse()
        .map_err(|e| ConfigError::Validation(format!("{key}: {e}")))
}

impl SettingsFile {
    /// Apply every present value on top of the defaults.
    fn apply(self) -> Result<Settings, ConfigError> {
        let mut settings = Settings::default();
        let crop = &mut settings.crop;

        if let Some(ratio) = self.viewport.ratio {
            crop.set_viewport_ratio(ratio);
        }
        if let Some(padding) = self.viewport.overlay_padding {
            crop.set_overlay_padding(padding);
        }
        if let Some(color) = &self.viewport.overlay_color {
            crop.set_overlay_color(parse_color("viewport.overlay_color", color)?);
        }
        if let Some(shape) = self.viewport.shape {
            crop.set_shape(shape);
        }

        if let Some(max) = self.scale.max {
            crop.set_max_scale(max);
        }
        if let Some(min) = self.scale.min {
            crop.set_min_scale(min);
        }

        if let Some(enabled) = self.grid.enabled {
            crop.set_grid_enabled(enabled);
        }
        if let Some(columns) = self.grid.columns {
            crop.set_grid_columns(columns);
        }
        if let Some(lines) = self.grid.lines {
            crop.set_grid_lines(lines);
        }
        if let Some(color) = &self.grid.color {
            crop.set_grid_color(parse_color("grid.color", color)?);
        }
        if let Some(color) = &self.grid.outline_color {
            crop.set_grid_outline_color(parse_color("grid.outline_color", color)?);
        }

        if let Some(format) = self.export.format {
            settings.export.format = format;
        }
        if let Some(quality) = self.export.quality {
            if quality > 100 {
                return Err(ConfigError::Validation(
                    "export.quality must be 0-100".into(),
                ));
            }
            settings.export.quality = Quality::new(quality);
        }

        settings.processing.max_workers = self.processing.max_workers;
        if settings.processing.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }

        Ok(settings)
    }

    fn capture(settings: &Settings) -> Self {
        let crop = &settings.crop;
        Self {
            viewport: ViewportSection {
                ratio: Some(crop.viewport_ratio()),
                overlay_padding: Some(crop.overlay_padding()),
                overlay_color: Some(crop.overlay_color().to_string()),
                shape: Some(crop.shape()),
            },
            scale: ScaleSection {
                max: Some(crop.max_scale()),
                min: Some(crop.min_scale()),
            },
            grid: GridSection {
                enabled: Some(crop.grid_enabled()),
                columns: Some(crop.grid_columns()),
                lines: Some(crop.grid_lines()),
                color: Some(crop.grid_color().to_string()),
                outline_color: Some(crop.grid_outline_color().to_string()),
            },
            export: ExportSection {
                format: Some(settings.export.format),
                quality: Some(u32::from(settings.export.quality.value())),
            },
            processing: ProcessingSection {
                max_workers: settings.processing.max_workers,
            },
        }
    }
}

impl Settings {
    /// Parse a settings document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: SettingsFile = toml::from_str(content)?;
        file.apply()
    }

    /// Render the effective settings as a complete TOML document.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(&SettingsFile::capture(self))?)
    }
}

/// Load settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = fs::read_to_string(path)?;
    Settings::from_toml_str(&content)
}

/// Returns a fully-commented stock settings file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# crop-export settings
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Viewport
# ---------------------------------------------------------------------------
[viewport]
# Viewport width / height. 0 (or any non-positive value) = match the image.
ratio = 0.0

# Pixels between the viewport and the edge of the view.
overlay_padding = 0

# Color drawn outside the viewport, as #AARRGGBB or #RRGGBB.
overlay_color = "#C8000000"

# Viewport outline: "rectangle" or "oval".
shape = "rectangle"

# ---------------------------------------------------------------------------
# Scale bounds (non-positive values fall back to the defaults)
# ---------------------------------------------------------------------------
[scale]
max = 10.0
min = 0.0

# ---------------------------------------------------------------------------
# Grid overlay
# ---------------------------------------------------------------------------
[grid]
enabled = false
columns = 3
lines = 3
color = "#FFFFFFFF"
outline_color = "#80FFFFFF"

# ---------------------------------------------------------------------------
# Export defaults
# ---------------------------------------------------------------------------
[export]
# Output codec: "jpeg", "png", "webp" or "avif".
format = "jpeg"

# 0 = smallest, 100 = best. Only JPEG and AVIF use it.
quality = 100

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel encode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# Larger values are honoured; jobs mostly wait on I/O.
# max_workers = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Clamp-to-default validation
    // =========================================================================

    #[test]
    fn positive_or_default_accepts_positive() {
        assert_eq!(positive_or_default(2.5, 10.0), Normalized::Accepted(2.5));
        assert!(!positive_or_default(f32::MIN_POSITIVE, 1.0).was_defaulted());
    }

    #[test]
    fn positive_or_default_rejects_zero_negative_and_nan() {
        assert_eq!(
            positive_or_default(0.0, 10.0),
            Normalized::Defaulted {
                rejected: 0.0,
                default: 10.0
            }
        );
        assert_eq!(positive_or_default(-3.0, 10.0).value(), 10.0);
        assert!(positive_or_default(f32::NAN, 10.0).was_defaulted());
        assert!(positive_or_default(f32::NEG_INFINITY, 1.0).was_defaulted());
    }

    #[test]
    fn clamped_setters_default_non_positive_input() {
        let mut config = CropConfig::new();
        for bad in [0.0, -0.0, -1.0, -1000.0] {
            assert!(config.set_viewport_ratio(bad).was_defaulted());
            assert!(config.set_max_scale(bad).was_defaulted());
            assert!(config.set_min_scale(bad).was_defaulted());
            assert_eq!(config.viewport_ratio(), DEFAULT_VIEWPORT_RATIO);
            assert_eq!(config.max_scale(), DEFAULT_MAXIMUM_SCALE);
            assert_eq!(config.min_scale(), DEFAULT_MINIMUM_SCALE);
        }
    }

    #[test]
    fn clamped_setters_store_positive_input_exactly() {
        let mut config = CropConfig::new();
        assert_eq!(config.set_viewport_ratio(1.5), Normalized::Accepted(1.5));
        assert_eq!(config.set_max_scale(4.25), Normalized::Accepted(4.25));
        assert_eq!(config.set_min_scale(0.001), Normalized::Accepted(0.001));
        assert_eq!(config.viewport_ratio(), 1.5);
        assert_eq!(config.max_scale(), 4.25);
        assert_eq!(config.min_scale(), 0.001);
    }

    #[test]
    fn bad_value_after_good_value_resets_to_default() {
        let mut config = CropConfig::new();
        config.set_max_scale(3.0);
        config.set_max_scale(-1.0);
        assert_eq!(config.max_scale(), DEFAULT_MAXIMUM_SCALE);
    }

    #[test]
    fn unvalidated_setters_store_anything() {
        let mut config = CropConfig::new();
        config.set_grid_columns(0);
        config.set_grid_lines(-4);
        config.set_overlay_padding(17);
        config.set_overlay_color(Argb(0));
        config.set_grid_color(Argb(0x1234_5678));
        config.set_grid_outline_color(Argb(0xFF00_FF00));
        config.set_grid_enabled(true);
        config.set_shape(Shape::Oval);

        assert_eq!(config.grid_columns(), 0);
        assert_eq!(config.grid_lines(), -4);
        assert_eq!(config.overlay_padding(), 17);
        assert_eq!(config.overlay_color(), Argb(0));
        assert_eq!(config.grid_color(), Argb(0x1234_5678));
        assert_eq!(config.grid_outline_color(), Argb(0xFF00_FF00));
        assert!(config.grid_enabled());
        assert_eq!(config.shape(), Shape::Oval);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = CropConfig::default();
        assert_eq!(config.viewport_ratio(), 0.0);
        assert_eq!(config.max_scale(), 10.0);
        assert_eq!(config.min_scale(), 0.0);
        assert_eq!(config.overlay_padding(), 0);
        assert_eq!(config.overlay_color(), Argb::from_argb(200, 0, 0, 0));
        assert_eq!(config.shape(), Shape::Rectangle);
        assert!(!config.grid_enabled());
        assert_eq!(config.grid_columns(), 3);
        assert_eq!(config.grid_lines(), 3);
        assert_eq!(config.grid_color(), Argb(0xFFFF_FFFF));
        assert_eq!(config.grid_outline_color().alpha(), 0x80);
    }

    // =========================================================================
    // Argb
    // =========================================================================

    #[test]
    fn argb_parses_both_forms() {
        assert_eq!("#C8000000".parse::<Argb>(), Ok(Argb(0xC800_0000)));
        assert_eq!("#80ffffff".parse::<Argb>(), Ok(Argb(0x80FF_FFFF)));
        assert_eq!("#336699".parse::<Argb>(), Ok(Argb(0xFF33_6699)));
    }

    #[test]
    fn argb_rejects_malformed() {
        for bad in ["C8000000", "#C800", "#GG000000", "#+1234567", ""] {
            assert!(bad.parse::<Argb>().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn argb_channels_and_display() {
        let color = Argb::from_argb(0x12, 0x34, 0x56, 0x78);
        assert_eq!(
            (color.alpha(), color.red(), color.green(), color.blue()),
            (0x12, 0x34, 0x56, 0x78)
        );
        assert_eq!(color.to_string(), "#12345678");
    }

    // =========================================================================
    // Settings file
    // =========================================================================

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
    }

    #[test]
    fn file_values_are_applied() {
        let toml = r##"
[viewport]
ratio = 1.25
overlay_padding = 12
overlay_color = "#40000000"
shape = "oval"

[scale]
max = 4.0
min = 0.5

[grid]
enabled = true
columns = 4
lines = 2
color = "#00FF00"

[export]
format = "png"
quality = 80

[processing]
max_workers = 2
"##;
        let settings = Settings::from_toml_str(toml).unwrap();
        let crop = &settings.crop;
        assert_eq!(crop.viewport_ratio(), 1.25);
        assert_eq!(crop.overlay_padding(), 12);
        assert_eq!(crop.overlay_color(), Argb(0x4000_0000));
        assert_eq!(crop.shape(), Shape::Oval);
        assert_eq!(crop.max_scale(), 4.0);
        assert_eq!(crop.min_scale(), 0.5);
        assert!(crop.grid_enabled());
        assert_eq!(crop.grid_columns(), 4);
        assert_eq!(crop.grid_lines(), 2);
        assert_eq!(crop.grid_color(), Argb(0xFF00_FF00));
        assert_eq!(crop.grid_outline_color(), DEFAULT_GRID_OUTLINE_COLOR);
        assert_eq!(settings.export.format, EncodeFormat::Png);
        assert_eq!(settings.export.quality, Quality::new(80));
        assert_eq!(settings.processing.max_workers, Some(2));
    }

    #[test]
    fn negative_grid_counts_stored_from_file() {
        let settings = Settings::from_toml_str("[grid]\ncolumns = -1\nlines = 0\n").unwrap();
        assert_eq!(settings.crop.grid_columns(), -1);
        assert_eq!(settings.crop.grid_lines(), 0);
    }

    #[test]
    fn file_values_go_through_clamp() {
        let toml = r#"
[viewport]
ratio = -2.0

[scale]
max = 0.0
min = -1.0
"#;
        let settings = Settings::from_toml_str(toml).unwrap();
        assert_eq!(settings.crop, CropConfig::default());
    }

    #[test]
    fn unknown_key_rejected() {
        let result = Settings::from_toml_str("[grid]\nrows = 3\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let result = Settings::from_toml_str("[overlay]\ncolor = \"#000000\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_shape_rejected() {
        let result = Settings::from_toml_str("[viewport]\nshape = \"hexagon\"\n");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn bad_color_is_validation_error() {
        let result = Settings::from_toml_str("[grid]\ncolor = \"white\"\n");
        match result {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("grid.color")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn quality_above_100_rejected() {
        let result = Settings::from_toml_str("[export]\nquality = 101\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn quality_boundary_ok() {
        let settings = Settings::from_toml_str("[export]\nquality = 100\n").unwrap();
        assert_eq!(settings.export.quality.value(), 100);
        let settings = Settings::from_toml_str("[export]\nquality = 0\n").unwrap();
        assert_eq!(settings.export.quality.value(), 0);
    }

    #[test]
    fn zero_workers_rejected() {
        let result = Settings::from_toml_str("[processing]\nmax_workers = 0\n");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn to_toml_parses_back() {
        let mut settings = Settings::default();
        settings.crop.set_viewport_ratio(0.75);
        settings.crop.set_shape(Shape::Oval);
        settings.crop.set_grid_color(Argb(0x7F10_2030));
        settings.export.format = EncodeFormat::Avif;
        settings.processing.max_workers = Some(3);

        let reparsed = Settings::from_toml_str(&settings.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed, settings);
    }

    #[test]
    fn load_settings_reads_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("crop.toml");
        fs::write(&path, "[grid]\nenabled = true\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert!(settings.crop.grid_enabled());
    }

    #[test]
    fn load_settings_missing_file_is_io_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = load_settings(&tmp.path().join("missing.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value = toml::from_str(stock_config_toml()).expect("stock config must parse");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let settings = Settings::from_toml_str(stock_config_toml()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    // =========================================================================
    // Worker count
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_honours_values_above_core_count() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_workers: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores + 64);
    }

    #[test]
    fn effective_threads_at_least_one() {
        let config = ProcessingConfig {
            max_workers: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_workers: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
