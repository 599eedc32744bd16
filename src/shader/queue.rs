//! Render-thread work queue.
//!
//! The single logical render thread owns all backend shader-compile and
//! draw-submission operations. Other threads post closures here; the render
//! thread drains the queue once per frame before draw, so every queued
//! callback runs before that frame's submissions.

use crate::backend::RenderBackend;

/// A deferred backend operation.
pub type RenderTask = Box<dyn FnOnce(&mut dyn RenderBackend) + Send>;

pub struct RenderQueue {
    tx: flume::Sender<RenderTask>,
    rx: flume::Receiver<RenderTask>,
}

impl Default for RenderQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self { tx, rx }
    }

    /// Post a task from any thread.
    pub fn post(&self, task: RenderTask) {
        // The receiver lives as long as the queue, so send cannot fail.
        let _ = self.tx.send(task);
    }

    /// Number of tasks currently queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Drain all queued tasks on the render thread. Returns the number of
    /// tasks run.
    pub fn drain(&self, backend: &mut dyn RenderBackend) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task(backend);
            ran += 1;
        }
        ran
    }
}
