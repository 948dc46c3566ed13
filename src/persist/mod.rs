//! Background encode-and-persist pipeline.
//!
//! A [`Pipeline`] owns a worker pool. Each call to
//! [`encode_to_file`](Pipeline::encode_to_file) or
//! [`encode_to_stream`](Pipeline::encode_to_stream) schedules exactly one job
//! and returns an [`EncodeHandle`] right away; encoding and all blocking I/O
//! happen on a pool thread.
//!
//! ## Job sequence
//!
//! ```text
//! encode_to_file:   create parent dirs → encode → create/truncate → write → flush → sync+close
//! encode_to_stream: encode → write → flush → (drop sink | hand sink back)
//! ```
//!
//! ## Outcomes
//!
//! A handle always resolves. Work that fails resolves to a [`PersistError`]
//! naming what went wrong; a panicking encoder or sink resolves to
//! [`PersistError::Panicked`]. Nothing is re-raised on the calling thread.
//! Every outcome is also logged through `tracing` from the worker: `debug`
//! for successes, `warn` for failures.
//!
//! ## Concurrency
//!
//! Jobs share the pipeline's pool and run in parallel up to its size, in no
//! particular order. There is no cancellation and no timeout. Each job owns
//! its image (behind an `Arc`, so the caller cannot mutate it meanwhile) and
//! its destination; nothing else is shared. [`Pipeline::shutdown`] blocks until
//! every submitted job has resolved its handle.

mod handle;
mod worker;

pub use handle::{EncodeHandle, Resolution};

use crate::config::{ProcessingConfig, effective_threads};
use crate::imaging::{EncodeFormat, ImagingError, Quality};
use image::DynamicImage;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, debug_span, error};
use worker::InFlight;

/// Status code of a successful save.
pub const STATUS_SAVED: i32 = 0;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Failed to open {} for writing: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("Encode failed: {0}")]
    Encode(#[from] ImagingError),
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),
    #[error("Encode worker panicked: {0}")]
    Panicked(String),
    #[error("Encode worker stopped without reporting a result")]
    Abandoned,
}

impl PersistError {
    /// Stable non-zero code per failure kind.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::CreateDir { .. } => 1,
            Self::Open { .. } => 2,
            Self::Encode(_) => 3,
            Self::Write(_) => 4,
            Self::Panicked(_) => 5,
            Self::Abandoned => 6,
        }
    }
}

/// What a successful job produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Saved {
    pub format: EncodeFormat,
    pub bytes_written: u64,
}

/// [`STATUS_SAVED`] on success, the error's code otherwise.
pub fn status_code(result: &Result<Saved, PersistError>) -> i32 {
    match result {
        Ok(_) => STATUS_SAVED,
        Err(e) => e.status_code(),
    }
}

impl Resolution for Result<Saved, PersistError> {
    fn abandoned() -> Self {
        Err(PersistError::Abandoned)
    }
}

/// Outcome of [`Pipeline::encode_to_stream`].
#[derive(Debug)]
pub struct StreamOutcome<W> {
    pub result: Result<Saved, PersistError>,
    /// The sink, handed back when it was not to be closed. `None` after a
    /// close-when-done job, or if the worker was lost.
    pub sink: Option<W>,
}

impl<W> StreamOutcome<W> {
    pub fn status_code(&self) -> i32 {
        status_code(&self.result)
    }
}

impl<W: Send + 'static> Resolution for StreamOutcome<W> {
    fn abandoned() -> Self {
        Self {
            result: Err(PersistError::Abandoned),
            sink: None,
        }
    }
}

/// Owner of the encode worker pool.
pub struct Pipeline {
    pool: Arc<ThreadPool>,
    in_flight: Arc<InFlight>,
}

impl Pipeline {
    /// Build a pipeline with its own pool, sized by
    /// [`effective_threads`].
    pub fn new(config: &ProcessingConfig) -> Result<Self, ThreadPoolBuildError> {
        let threads = effective_threads(config);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("crop-export-{i}"))
            // Job bodies catch their own panics; this covers anything outside them.
            .panic_handler(|_| error!("encode worker panicked outside a job"))
            .build()?;
        debug!(threads, "encode pool started");
        Ok(Self::with_pool(Arc::new(pool)))
    }

    /// Run jobs on an existing pool, possibly shared with other work.
    pub fn with_pool(pool: Arc<ThreadPool>) -> Self {
        Self {
            pool,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Jobs submitted through this pipeline that have not resolved yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    /// Encode `image` and write it to `path`, replacing any existing file.
    ///
    /// Missing parent directories are created.
    pub fn encode_to_file(
        &self,
        image: impl Into<Arc<DynamicImage>>,
        format: EncodeFormat,
        quality: Quality,
        path: impl Into<PathBuf>,
    ) -> EncodeHandle<Result<Saved, PersistError>> {
        let image = image.into();
        let path = path.into();
        self.submit(move || {
            let span = debug_span!("encode_to_file", path = %path.display(), %format);
            let _entered = span.enter();

            let result = worker::guarded(|| worker::write_file(&image, format, quality, &path));
            worker::report(&result);
            result
        })
    }

    /// Encode `image` into `sink`.
    ///
    /// With `close_when_done` the sink is dropped on the worker once the job
    /// ends, whatever the outcome. Otherwise it comes back in
    /// [`StreamOutcome::sink`], still open, on every path.
    pub fn encode_to_stream<W>(
        &self,
        image: impl Into<Arc<DynamicImage>>,
        format: EncodeFormat,
        quality: Quality,
        sink: W,
        close_when_done: bool,
    ) -> EncodeHandle<StreamOutcome<W>>
    where
        W: Write + Send + 'static,
    {
        let image = image.into();
        self.submit(move || {
            let span = debug_span!("encode_to_stream", %format, close_when_done);
            let _entered = span.enter();

            let mut sink = sink;
            let result = worker::guarded(|| worker::write_stream(&image, format, quality, &mut sink));
            worker::report(&result);

            let sink = if close_when_done {
                drop(sink);
                None
            } else {
                Some(sink)
            };
            StreamOutcome { result, sink }
        })
    }

    /// Wait for every submitted job to resolve, then release the pool.
    pub fn shutdown(self) {
        let pending = self.in_flight.current();
        if pending > 0 {
            debug!(pending, "draining encode pool");
        }
        self.in_flight.wait_idle();
    }

    fn submit<T, F>(&self, job: F) -> EncodeHandle<T>
    where
        T: Resolution,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, handle) = EncodeHandle::channel();
        let ticket = self.in_flight.enter();
        self.pool.spawn(move || {
            // The receiver may be gone; the work still counts as done.
            let _ = tx.send(job());
            drop(ticket);
        });
        handle
    }
}
