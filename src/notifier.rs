//! Solve notification hook.
//!
//! A single process-wide slot holds at most one callback. Solvers call
//! [`notify`] with the current best distance and a read-only [`EngineView`] of
//! the best route; the call is a no-op while the slot is empty. Callbacks run
//! synchronously on the solving thread while the slot's lock is held, so they
//! never run concurrently with themselves. A callback must not call back into
//! this module.

use crate::instance::{Point, TspInstance};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Boxed notification callback
pub type Callback = Box<dyn FnMut(f64, &EngineView<'_>) + Send>;

static SLOT: Mutex<Option<Callback>> = Mutex::new(None);

fn slot() -> MutexGuard<'static, Option<Callback>> {
    // A panicking callback must not disable notifications for good
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Install `callback`, replacing any previous one.
pub fn register<F>(callback: F)
where
    F: FnMut(f64, &EngineView<'_>) + Send + 'static,
{
    *slot() = Some(Box::new(callback));
}

/// Install or clear the callback. `None` empties the slot.
pub fn set(callback: Option<Callback>) {
    *slot() = callback;
}

/// Empty the slot.
pub fn clear() {
    *slot() = None;
}

pub fn is_registered() -> bool {
    slot().is_some()
}

/// Invoke the registered callback, if any.
pub fn notify(distance: f64, view: &EngineView<'_>) {
    if let Some(callback) = slot().as_mut() {
        callback(distance, view);
    }
}

/// Read-only snapshot of a route over an instance, indexed by route position.
#[derive(Debug, Clone, Copy)]
pub struct EngineView<'a> {
    instance: &'a TspInstance,
    tour: &'a [usize],
}

impl<'a> EngineView<'a> {
    pub fn new(instance: &'a TspInstance, tour: &'a [usize]) -> Self {
        EngineView { instance, tour }
    }

    /// Number of points in the route
    pub fn len(&self) -> usize {
        self.tour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tour.is_empty()
    }

    /// Point visited at route position `i`
    pub fn point(&self, i: usize) -> &'a Point {
        self.instance.point(self.tour[i])
    }

    pub fn id(&self, i: usize) -> usize {
        self.point(i).id()
    }

    pub fn x(&self, i: usize) -> f64 {
        self.point(i).x()
    }

    pub fn y(&self, i: usize) -> f64 {
        self.point(i).y()
    }

    /// Point indices in visiting order
    pub fn tour(&self) -> &'a [usize] {
        self.tour
    }
}

/// An owned copy of one notification, enough to redraw the route later
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub distance: f64,
    pub ids: Vec<usize>,
    pub coords: Vec<(f64, f64)>,
}

impl Frame {
    pub fn capture(distance: f64, view: &EngineView<'_>) -> Self {
        let n = view.len();
        Frame {
            distance,
            ids: (0..n).map(|i| view.id(i)).collect(),
            coords: (0..n).map(|i| (view.x(i), view.y(i))).collect(),
        }
    }
}

/// Caller-owned frame sequence fed by the notifier.
///
/// Cloning shares the same underlying sequence.
#[derive(Debug, Clone, Default)]
pub struct FrameRecorder {
    frames: Arc<Mutex<Vec<Frame>>>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback that appends every notification to this recorder.
    pub fn install(&self) {
        let frames = Arc::clone(&self.frames);
        register(move |distance, view| {
            frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(Frame::capture(distance, view));
        });
    }

    /// Copy of the frames recorded so far
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().clone()
    }

    /// Drain the recorded frames
    pub fn take(&self) -> Vec<Frame> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Frame>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
