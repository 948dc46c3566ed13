//! # crop-export
//!
//! The toolkit-independent core of an image cropping widget: the crop
//! configuration record, and a pipeline that encodes a cropped image and
//! persists it off the calling thread.
//!
//! A view layer owns a [`CropConfig`](config::CropConfig), lets the user
//! frame a picture, and on "save" hands the resulting raster to a
//! [`Pipeline`](persist::Pipeline). The pipeline returns an
//! [`EncodeHandle`](persist::EncodeHandle) immediately; the caller polls or
//! waits on it to learn the outcome.
//!
//! ```text
//! view ── CropConfig (get/set) ──┐
//!   │                            │
//!   └── DynamicImage ──► Pipeline::encode_to_file / encode_to_stream
//!                            │            (worker pool)
//!                            └──► EncodeHandle ──► Ok(Saved) | Err(PersistError)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `CropConfig` with clamp-to-default validation, TOML settings file, pool sizing |
//! | [`imaging`] | Output formats, quality, in-memory encoding, dimension probing |
//! | [`persist`] | Worker pool, file/stream persistence, completion handles, failure kinds |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Failures Are Reported, Not Swallowed
//!
//! Every job resolves its handle, and a failed job resolves to a
//! [`PersistError`](persist::PersistError) that says which step failed
//! (directory, open, encode, write) with a stable status code. A save button
//! can show "disk full" instead of silently doing nothing.
//!
//! ## An Owned Pool
//!
//! The pipeline owns (or is given) its rayon pool rather than reaching for
//! a process-wide one. The host application decides its size and calls
//! [`Pipeline::shutdown`](persist::Pipeline::shutdown) to drain it.
//!
//! ## Logging
//!
//! The library logs through `tracing` and never installs a subscriber. The
//! level is chosen at runtime by whoever does; the CLI reads `RUST_LOG` or
//! `--log-level`.

pub mod config;
pub mod imaging;
pub mod output;
pub mod persist;

#[cfg(test)]
pub(crate) mod test_helpers;
