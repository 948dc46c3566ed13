//! Job bodies run on the encode pool, plus the in-flight counter used to
//! drain it.

use super::{PersistError, Saved};
use crate::imaging::{EncodeFormat, Quality, encode};
use image::DynamicImage;
use std::any::Any;
use std::fs::{self, File};
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::{debug, warn};

/// Create parents, encode, then create/truncate the file, write, flush and
/// close. The file is closed on every path once opened.
pub(crate) fn write_file(
    image: &DynamicImage,
    format: EncodeFormat,
    quality: Quality,
    path: &Path,
) -> Result<Saved, PersistError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Encoding before the open keeps an existing file intact when the image
    // is unusable.
    let bytes = encode(image, format, quality)?;

    let file = File::create(path).map_err(|source| PersistError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    write_then_close(file, &bytes, format, path, File::sync_all)
}

/// Encode into a caller-owned sink. Closing is the caller's business.
pub(crate) fn write_stream<W: Write + ?Sized>(
    image: &DynamicImage,
    format: EncodeFormat,
    quality: Quality,
    sink: &mut W,
) -> Result<Saved, PersistError> {
    let bytes = encode(image, format, quality)?;
    write_flushed(sink, &bytes, format)
}

fn write_flushed<W: Write + ?Sized>(
    sink: &mut W,
    bytes: &[u8],
    format: EncodeFormat,
) -> Result<Saved, PersistError> {
    sink.write_all(bytes).map_err(PersistError::Write)?;
    sink.flush().map_err(PersistError::Write)?;
    Ok(Saved {
        format,
        bytes_written: bytes.len() as u64,
    })
}

/// Write and flush into `out`, then hand it to `close`. A close failure is
/// logged and never replaces the write result.
fn write_then_close<W, C>(
    mut out: W,
    bytes: &[u8],
    format: EncodeFormat,
    path: &Path,
    close: C,
) -> Result<Saved, PersistError>
where
    W: Write,
    C: FnOnce(&W) -> io::Result<()>,
{
    let result = write_flushed(&mut out, bytes, format);
    if let Err(error) = close(&out) {
        debug!(path = %path.display(), %error, "error closing output file");
    }
    result
}

/// Run `work`, turning a panic into [`PersistError::Panicked`].
pub(crate) fn guarded<F>(work: F) -> Result<Saved, PersistError>
where
    F: FnOnce() -> Result<Saved, PersistError>,
{
    panic::catch_unwind(AssertUnwindSafe(work))
        .unwrap_or_else(|payload| Err(PersistError::Panicked(panic_message(&*payload))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub(crate) fn report(result: &Result<Saved, PersistError>) {
    match result {
        Ok(saved) => debug!(bytes = saved.bytes_written, "encoded image saved"),
        Err(error) => warn!(%error, code = error.status_code(), "error attempting to save image"),
    }
}

/// Count of submitted jobs that have not reported yet.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

/// Held by a job for as long as it runs; dropping it (even while
/// unwinding) marks the job finished.
pub(crate) struct Ticket(Arc<InFlight>);

impl InFlight {
    pub(crate) fn enter(self: &Arc<Self>) -> Ticket {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ticket(Arc::clone(self))
    }

    pub(crate) fn current(&self) -> usize {
        *self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until every issued ticket has been dropped.
    pub(crate) fn wait_idle(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count > 0 {
            count = self
                .idle
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let mut count = self.0.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        if *count == 0 {
            self.0.idle.notify_all();
        }
    }
}
