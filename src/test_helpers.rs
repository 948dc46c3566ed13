//! Shared test utilities: synthetic images and instrumented sinks.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let (sink, probe) = MemorySink::new();
//! // hand `sink` to the pipeline, then inspect through `probe`
//! assert!(probe.is_closed());
//! assert!(!probe.bytes().is_empty());
//! ```

use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// =========================================================================
// Synthetic images
// =========================================================================

/// Opaque RGB gradient; every pixel depends on its position.
pub fn gradient_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

/// RGBA gradient with varying alpha.
pub fn gradient_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 64, ((x + y) % 256) as u8])
    }))
}

// =========================================================================
// Sinks
// =========================================================================

/// In-memory sink that records whether it has been dropped ("closed").
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

/// Observer side of a [`MemorySink`], usable after the sink moved away.
#[derive(Clone)]
pub struct SinkProbe {
    buffer: Arc<Mutex<Vec<u8>>>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> (Self, SinkProbe) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let probe = SinkProbe {
            buffer: Arc::clone(&buffer),
            closed: Arc::clone(&closed),
        };
        (Self { buffer, closed }, probe)
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl SinkProbe {
    pub fn bytes(&self) -> Vec<u8> {
        self.buffer.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Sink whose every write fails, like a full disk.
pub struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("no space left on device"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that panics on first write.
pub struct PanickingSink;

impl Write for PanickingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        panic!("sink exploded");
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
