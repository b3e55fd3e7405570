//! Background tile loading.
//!
//! One worker thread serves a queue of tile requests. The render side never
//! waits on it: [`TileLoader::request`] returns whatever is known about a
//! tile right away and queues it when nothing is. Requests go to the front
//! of the queue so the tiles asked for most recently load first.
//!
//! All shared state sits behind a single mutex paired with a condvar,
//! following the same in-flight tracking shape as a download tracker:
//! a tile is loaded at most once no matter how many times it is requested
//! while pending.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use aerochart_metrics::metric_defs;
use image::RgbaImage;
use tracing::{debug, error, trace};

use crate::address::{Tile, TileId};
use crate::error::TileError;
use crate::Result;

/// Produces tile bitmaps for the loader.
pub trait TileSource: Send + Sync + 'static {
    /// Loads one tile. Called on the loader thread only.
    fn load(&self, tile: &Tile) -> LoadOutcome;
}

/// Result of loading one tile.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The decoded bitmap.
    Loaded(Arc<RgbaImage>),
    /// Nothing to draw for this tile.
    Absent,
    /// Loading failed. Permanent failures are never retried; others are
    /// retried the next time the tile is requested.
    Failed { permanent: bool },
}

/// What the loader knows about a tile at the time of a request.
#[derive(Debug, Clone)]
pub enum TileStatus {
    /// Loaded and resident.
    Ready(Arc<RgbaImage>),
    /// Queued or loading.
    Pending,
    /// Loaded with nothing to draw.
    Absent,
    /// The last load failed.
    Failed,
}

impl TileStatus {
    /// The bitmap, if loaded.
    pub fn bitmap(&self) -> Option<Arc<RgbaImage>> {
        match self {
            TileStatus::Ready(bitmap) => Some(Arc::clone(bitmap)),
            _ => None,
        }
    }
}

/// Called on the loader thread after a wanted tile has loaded.
pub type ReadyCallback = Box<dyn Fn(TileId) + Send + Sync>;

/// Called on the loader thread each time the queue runs dry.
pub type IdleCallback = Box<dyn Fn() + Send + Sync>;

#[derive(Debug)]
enum SlotState {
    Pending,
    Ready(Arc<RgbaImage>),
    Absent,
    Failed { permanent: bool },
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    /// Cleared when the tile is released while its load is queued or in
    /// flight.
    wanted: bool,
}

#[derive(Debug, Default)]
struct LoaderState {
    queue: VecDeque<Tile>,
    slots: HashMap<TileId, Slot>,
    /// Set from dequeue until the ready callback has returned.
    busy: bool,
    idle_reported: bool,
    shutdown: bool,
}

impl LoaderState {
    fn is_idle(&self) -> bool {
        self.queue.is_empty() && !self.busy
    }
}

struct Shared {
    state: Mutex<LoaderState>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Loads tiles on a background thread and holds the results.
pub struct TileLoader {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl TileLoader {
    /// Starts the worker thread.
    pub fn new<S: TileSource>(
        source: S,
        on_ready: ReadyCallback,
        on_idle: IdleCallback,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(LoaderState {
                // nothing to report until the first request
                idle_reported: true,
                ..LoaderState::default()
            }),
            changed: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("tile-loader".to_string())
            .spawn(move || run_worker(&worker_shared, &source, &on_ready, &on_idle))
            .map_err(|e| TileError::LoaderSpawn(e.to_string()))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Starts a loader without callbacks.
    pub fn without_callbacks<S: TileSource>(source: S) -> Result<Self> {
        Self::new(source, Box::new(|_| {}), Box::new(|| {}))
    }

    /// Returns the tile's status, queueing a load if the tile is unknown or
    /// its last load failed softly.
    pub fn request(&self, tile: &Tile) -> TileStatus {
        let mut state = self.shared.lock();
        let status = match state.slots.get_mut(&tile.id) {
            Some(slot) => {
                slot.wanted = true;
                match &slot.state {
                    SlotState::Ready(bitmap) => return TileStatus::Ready(Arc::clone(bitmap)),
                    SlotState::Pending => return TileStatus::Pending,
                    SlotState::Absent => return TileStatus::Absent,
                    SlotState::Failed { permanent: true } => return TileStatus::Failed,
                    SlotState::Failed { permanent: false } => {}
                }
                slot.state = SlotState::Pending;
                TileStatus::Pending
            }
            None => {
                state.slots.insert(
                    tile.id,
                    Slot {
                        state: SlotState::Pending,
                        wanted: true,
                    },
                );
                TileStatus::Pending
            }
        };

        trace!(tile = ?tile.id, "queueing tile");
        state.queue.push_front(*tile);
        state.idle_reported = false;
        metrics::gauge!(metric_defs::LOADER_QUEUE_DEPTH.name).set(state.queue.len() as f64);
        self.shared.changed.notify_all();
        status
    }

    /// The tile's status without queueing anything.
    pub fn peek(&self, id: &TileId) -> Option<TileStatus> {
        let state = self.shared.lock();
        state.slots.get(id).map(|slot| match &slot.state {
            SlotState::Ready(bitmap) => TileStatus::Ready(Arc::clone(bitmap)),
            SlotState::Pending => TileStatus::Pending,
            SlotState::Absent => TileStatus::Absent,
            SlotState::Failed { .. } => TileStatus::Failed,
        })
    }

    /// Forgets a tile. A queued or in-flight load still runs once, but its
    /// result is discarded unless the tile is requested again first.
    pub fn release(&self, id: &TileId) {
        let mut state = self.shared.lock();
        release_locked(&mut state, id);
    }

    /// Forgets every tile. Pending loads behave as in [`TileLoader::release`].
    pub fn release_all(&self) {
        let mut state = self.shared.lock();
        state.slots.retain(|_, slot| {
            slot.wanted = false;
            matches!(slot.state, SlotState::Pending)
        });
    }

    /// Ids of tiles whose bitmaps are held.
    pub fn resident_ids(&self) -> Vec<TileId> {
        let state = self.shared.lock();
        let mut ids: Vec<TileId> = state
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot.state, SlotState::Ready(_)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Number of queued loads, not counting one in flight.
    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Blocks until the queue is empty and no load is in flight. Returns
    /// `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.lock();
        while !state.is_idle() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            state = self
                .shared
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

impl Drop for TileLoader {
    fn drop(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.changed.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("tile loader thread panicked");
            }
        }
    }
}

fn release_locked(state: &mut LoaderState, id: &TileId) {
    match state.slots.get_mut(id) {
        // the load stays queued; publish drops the slot
        Some(slot) if matches!(slot.state, SlotState::Pending) => slot.wanted = false,
        Some(_) => {
            state.slots.remove(id);
        }
        None => {}
    }
}

fn run_worker(shared: &Shared, source: &dyn TileSource, on_ready: &ReadyCallback, on_idle: &IdleCallback) {
    debug!("tile loader started");
    loop {
        let tile = {
            let mut state = shared.lock();
            loop {
                if state.shutdown {
                    debug!("tile loader stopped");
                    return;
                }
                if let Some(tile) = state.queue.pop_front() {
                    state.busy = true;
                    metrics::gauge!(metric_defs::LOADER_QUEUE_DEPTH.name)
                        .set(state.queue.len() as f64);
                    break tile;
                }
                if !state.idle_reported {
                    state.idle_reported = true;
                    shared.changed.notify_all();
                    drop(state);
                    on_idle();
                    state = shared.lock();
                    continue;
                }
                state = shared
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.load(&tile)))
            .unwrap_or_else(|_| {
                error!(tile = ?tile.id, "tile load panicked");
                LoadOutcome::Failed { permanent: false }
            });

        if let Some(id) = publish(shared, &tile, outcome) {
            on_ready(id);
        }
        shared.lock().busy = false;
        shared.changed.notify_all();
    }
}

/// Stores a finished load. Returns the id to announce when a wanted bitmap
/// became resident.
fn publish(shared: &Shared, tile: &Tile, outcome: LoadOutcome) -> Option<TileId> {
    let mut state = shared.lock();
    let mut ready = None;

    let wanted = state.slots.get(&tile.id).is_some_and(|slot| slot.wanted);
    if !wanted {
        trace!(tile = ?tile.id, "discarding unwanted tile");
        state.slots.remove(&tile.id);
    } else if let Some(slot) = state.slots.get_mut(&tile.id) {
        slot.state = match outcome {
            LoadOutcome::Loaded(bitmap) => {
                metrics::counter!(metric_defs::TILES_LOADED.name).increment(1);
                ready = Some(tile.id);
                SlotState::Ready(bitmap)
            }
            LoadOutcome::Absent => SlotState::Absent,
            LoadOutcome::Failed { permanent } => SlotState::Failed { permanent },
        };
    }

    shared.changed.notify_all();
    ready
}
