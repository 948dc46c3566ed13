//! Image encoding on top of the `image` codecs, with `avif-parse` for AVIF
//! container metadata.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Encode** | `image` codecs for JPEG, PNG, WebP (lossless), AVIF (rav1e) |
//! | **Probe** | `image::ImageReader`, `avif-parse` for AVIF |
//!
//! The module is split into:
//! - **Parameters**: [`EncodeFormat`] and [`Quality`]
//! - **Encode**: in-memory encoding and dimension probing

mod encode;
mod params;

pub use encode::{Dimensions, ImagingError, encode, probe_dimensions, probe_file};
pub use params::{DEFAULT_IMAGE_QUALITY, EncodeFormat, Quality};
