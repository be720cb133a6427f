//! Recompute-on-change packing with background offload.
//!
//! The caller invokes [`AutoPacker::request`] after every change to the sprite
//! collection or the config. Small collections are packed inline; larger
//! ones on a worker thread. Only the newest request may commit: starting a
//! new one cancels the in-flight worker and its result is never read.

use crate::config::PackingConfig;
use crate::error::{Result, SpriteForgeError};
use crate::model::{PackedBin, SpriteSize};
use crate::packer::{self, PackResult};
use crate::sprite::Sprite;
use crate::trim::{TrimReport, prepare_sprites};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use tracing::{debug, info, warn};

/// Immutable snapshot handed to a packing run. Plain data only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackRequest {
    pub generation: u64,
    pub sizes: Vec<SpriteSize>,
    pub config: PackingConfig,
}

/// Function executed for a request; checks `cancel` between placements.
pub type PackFn = fn(&PackRequest, &AtomicBool) -> Result<PackResult>;

/// Default [`PackFn`]: the pure packer.
pub fn run_request(req: &PackRequest, cancel: &AtomicBool) -> Result<PackResult> {
    packer::pack_cancellable(&req.sizes, &req.config, cancel)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PackMode {
    Inline,
    Worker,
    /// The worker failed and the snapshot was packed on the calling thread.
    Fallback,
}

/// A committed packing result.
#[derive(Debug, Clone, PartialEq)]
pub struct PackOutcome {
    pub generation: u64,
    pub mode: PackMode,
    pub result: PackResult,
    pub trim: TrimReport,
}

enum WorkerReply {
    Done(PackResult),
    Cancelled,
    Failed(String),
}

struct InFlight {
    request: Arc<PackRequest>,
    cancel: Arc<AtomicBool>,
    rx: mpsc::Receiver<(u64, WorkerReply)>,
    trim: TrimReport,
}

pub struct AutoPacker {
    generation: AtomicU64,
    pack_fn: PackFn,
    in_flight: Option<InFlight>,
    latest: Option<PackOutcome>,
}

impl Default for AutoPacker {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoPacker {
    pub fn new() -> Self {
        Self::with_pack_fn(run_request)
    }

    /// Use a custom function for worker runs. Inline runs and fallbacks
    /// always use the plain packer.
    pub fn with_pack_fn(pack_fn: PackFn) -> Self {
        Self {
            generation: AtomicU64::new(0),
            pack_fn,
            in_flight: None,
            latest: None,
        }
    }

    /// Generation of the most recent request.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn latest(&self) -> Option<&PackOutcome> {
        self.latest.as_ref()
    }

    /// Bins of the last committed run (empty before the first commit).
    pub fn bins(&self) -> &[PackedBin] {
        self.latest.as_ref().map_or(&[], |o| o.result.bins.as_slice())
    }

    /// Trim, snapshot and start packing. Returns the new generation.
    ///
    /// Collections up to `worker_threshold` sprites are packed and committed
    /// before this returns; larger ones complete via [`poll`](Self::poll) or
    /// [`wait`](Self::wait).
    pub fn request(&mut self, sprites: &mut [Sprite], cfg: &PackingConfig) -> Result<u64> {
        cfg.validate()?;
        self.cancel_in_flight();

        let trim = prepare_sprites(sprites, cfg);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let request = PackRequest {
            generation,
            sizes: sprites.iter().map(Sprite::packing_size).collect(),
            config: cfg.clone(),
        };

        if request.sizes.is_empty() {
            self.commit(request.generation, PackMode::Inline, PackResult::default(), trim);
            return Ok(generation);
        }

        if request.sizes.len() <= cfg.worker_threshold {
            debug!(generation, sprites = request.sizes.len(), "packing inline");
            let result = packer::pack(&request.sizes, &request.config);
            self.commit(generation, PackMode::Inline, result, trim);
            return Ok(generation);
        }

        let request = Arc::new(request);
        match self.spawn_worker(Arc::clone(&request)) {
            Ok((cancel, rx)) => {
                debug!(generation, sprites = request.sizes.len(), "packing on worker");
                self.in_flight = Some(InFlight {
                    request,
                    cancel,
                    rx,
                    trim,
                });
            }
            Err(e) => {
                warn!(generation, error = %e, "worker unavailable, packing inline");
                let result = packer::pack(&request.sizes, &request.config);
                self.commit(generation, PackMode::Fallback, result, trim);
            }
        }
        Ok(generation)
    }

    /// Non-blocking check for a worker result. Returns the outcome if one was
    /// committed by this call.
    pub fn poll(&mut self) -> Option<&PackOutcome> {
        let reply = {
            let flight = self.in_flight.as_ref()?;
            match flight.rx.try_recv() {
                Ok(msg) => Some(msg),
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => None,
            }
        };
        self.finish(reply)
    }

    /// Block until the in-flight run (if any) completes, then return the
    /// latest committed outcome.
    pub fn wait(&mut self) -> Option<&PackOutcome> {
        if let Some(flight) = self.in_flight.as_ref() {
            let reply = flight.rx.recv().ok();
            self.finish(reply);
        }
        self.latest.as_ref()
    }

    fn finish(&mut self, reply: Option<(u64, WorkerReply)>) -> Option<&PackOutcome> {
        let flight = self.in_flight.take()?;
        let current = self.generation();
        let generation = flight.request.generation;

        let failure = match reply {
            Some((g, _)) if g != current => {
                debug!(stale = g, current, "discarding stale result");
                return None;
            }
            Some((_, WorkerReply::Done(result))) => {
                self.commit(generation, PackMode::Worker, result, flight.trim);
                return self.latest.as_ref();
            }
            // only a superseded run may stop early; the current one must commit
            Some((_, WorkerReply::Cancelled)) => "worker cancelled the current run".to_string(),
            Some((_, WorkerReply::Failed(msg))) => msg,
            None => "worker exited without a result".to_string(),
        };

        warn!(generation, error = %failure, "packing worker failed, falling back to inline packing");
        let result = packer::pack(&flight.request.sizes, &flight.request.config);
        self.commit(generation, PackMode::Fallback, result, flight.trim);
        self.latest.as_ref()
    }

    fn cancel_in_flight(&mut self) {
        if let Some(flight) = self.in_flight.take() {
            flight.cancel.store(true, Ordering::Relaxed);
            debug!(generation = flight.request.generation, "superseded in-flight run");
        }
    }

    fn spawn_worker(
        &self,
        request: Arc<PackRequest>,
    ) -> Result<(Arc<AtomicBool>, mpsc::Receiver<(u64, WorkerReply)>)> {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();
        let pack_fn = self.pack_fn;
        let flag = Arc::clone(&cancel);
        thread::Builder::new()
            .name(format!("spriteforge-pack-{}", request.generation))
            .spawn(move || {
                let outcome = catch_unwind(AssertUnwindSafe(|| pack_fn(&request, &flag)));
                let reply = match outcome {
                    Ok(Ok(result)) => WorkerReply::Done(result),
                    Ok(Err(SpriteForgeError::Cancelled)) => WorkerReply::Cancelled,
                    Ok(Err(e)) => WorkerReply::Failed(e.to_string()),
                    Err(panic) => WorkerReply::Failed(panic_message(panic.as_ref())),
                };
                // receiver is gone when the run was superseded
                let _ = tx.send((request.generation, reply));
            })
            .map_err(|e| SpriteForgeError::WorkerFailure(e.to_string()))?;
        Ok((cancel, rx))
    }

    fn commit(&mut self, generation: u64, mode: PackMode, result: PackResult, trim: TrimReport) {
        info!(
            generation,
            ?mode,
            bins = result.bins.len(),
            rejected = result.rejected.len(),
            "pack committed"
        );
        self.latest = Some(PackOutcome {
            generation,
            mode,
            result,
            trim,
        });
    }
}

impl Drop for AutoPacker {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}

fn panic_message(p: &(dyn Any + Send)) -> String {
    if let Some(s) = p.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = p.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
