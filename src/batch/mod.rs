//! Batch processing with per-image failure isolation.
//!
//! [`BatchRunner::run`] validates the input list up front, then turns every
//! image into exactly one [`Outcome`]. A load or collaborator failure on one
//! image becomes that image's ERROR outcome and the batch carries on. So
//! does a panic raised by a loader or collaborator.
//!
//! With more than one job the images are spread over a rayon pool. Each
//! worker writes only its own output slot, and the indexed collect keeps
//! `Report::outcomes()[i]` aligned with `images[i]`.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::collab::{Frame, ImageLoader};
use crate::detect::{Detector, TypeHint};
use crate::error::ScanError;
use crate::model::{CodeKind, ImageId, Outcome};
use crate::report::Report;

/// Drives the detector over a list of images.
pub struct BatchRunner<'a> {
    loader: &'a dyn ImageLoader,
    detector: Detector<'a>,
    jobs: usize,
}

impl<'a> BatchRunner<'a> {
    /// A sequential runner.
    pub fn new(loader: &'a dyn ImageLoader, detector: Detector<'a>) -> Self {
        Self {
            loader,
            detector,
            jobs: 1,
        }
    }

    /// Number of worker threads; values below 2 run sequentially.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Processes `images` in order and returns one outcome per image.
    ///
    /// Fails only when the input list itself is malformed or the worker pool
    /// cannot start; nothing that happens to an individual image is fatal.
    pub fn run(&self, images: &[PathBuf], hint: TypeHint) -> Result<Report, ScanError> {
        self.run_with_progress(images, hint, &|_| {})
    }

    /// Like [`run`](Self::run), calling `progress` once per finished image.
    ///
    /// With several jobs, `progress` is called from worker threads in
    /// completion order.
    pub fn run_with_progress(
        &self,
        images: &[PathBuf],
        hint: TypeHint,
        progress: &(dyn Fn(&Outcome) + Sync),
    ) -> Result<Report, ScanError> {
        validate_inputs(images)?;

        info!(
            "Scanning {} image(s) with hint '{}' on {} job(s)",
            images.len(),
            hint,
            self.jobs
        );
        let started = Instant::now();

        let process = |path: &PathBuf| {
            let outcome = self.process_image(path, hint);
            progress(&outcome);
            outcome
        };

        let outcomes: Vec<Outcome> = if self.jobs <= 1 {
            images.iter().map(process).collect()
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.jobs)
                .build()
                .map_err(|err| ScanError::ThreadPool(err.to_string()))?;
            pool.install(|| images.par_iter().map(process).collect())
        };

        let report = Report::new(outcomes);
        let summary = report.summary();
        info!(
            "Finished in {:.2?}: {} success, {} without symbols, {} error(s), {} symbol(s)",
            started.elapsed(),
            summary.success,
            summary.no_symbol_found,
            summary.error,
            summary.total_symbols
        );
        Ok(report)
    }

    /// Loads, routes and detects one image. Never fails: errors become an
    /// ERROR outcome.
    pub fn process_image(&self, path: &Path, hint: TypeHint) -> Outcome {
        let id = ImageId::from_path(path);
        // The runner only reads shared state, so nothing is left half-updated
        // when a collaborator unwinds.
        match panic::catch_unwind(AssertUnwindSafe(|| self.scan_image(id.clone(), path, hint))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let detail = format!("panicked: {}", panic_message(payload.as_ref()));
                warn!("{id}: {detail}");
                Outcome::failed(id, hinted_kind(hint), detail)
            }
        }
    }

    fn scan_image(&self, id: ImageId, path: &Path, hint: TypeHint) -> Outcome {
        let pixels = match self.loader.load(path) {
            Ok(pixels) => pixels,
            Err(err) => {
                warn!("{err}");
                return Outcome::failed(id, hinted_kind(hint), err.to_string());
            }
        };

        let detection = self
            .detector
            .detect_routed(&Frame::new(&id, &pixels), hint);

        match detection {
            Ok(detection) => {
                debug!(
                    "{id}: {} symbol(s) via {:?} strategy",
                    detection.symbols.len(),
                    detection.strategy
                );
                Outcome::from_symbols(id, detection.strategy.kind(), detection.symbols)
            }
            Err(source) => {
                let err = ScanError::Collaborator {
                    image: id.clone(),
                    source,
                };
                warn!("{err}");
                Outcome::failed(id, hinted_kind(hint), err.to_string())
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// The classification known before any detection ran.
fn hinted_kind(hint: TypeHint) -> Option<CodeKind> {
    match hint {
        TypeHint::Qr => Some(CodeKind::Qr),
        TypeHint::Barcode => Some(CodeKind::Barcode),
        TypeHint::Auto => None,
    }
}

/// Rejects empty paths and repeated paths before any image is touched.
fn validate_inputs(images: &[PathBuf]) -> Result<(), ScanError> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(images.len());
    for (index, path) in images.iter().enumerate() {
        if path.as_os_str().is_empty() {
            return Err(ScanError::InvalidArgument(format!(
                "image path at index {index} is empty"
            )));
        }
        if !seen.insert(path.as_path()) {
            return Err(ScanError::InvalidArgument(format!(
                "image path '{}' is listed more than once",
                path.display()
            )));
        }
    }
    Ok(())
}
