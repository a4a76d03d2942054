//! Fixed-size worker pool over a pre-built task list.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

/// Worker count used when the host cannot report its parallelism.
pub const FALLBACK_WORKERS: usize = 4;

/// Logical core count, or `FALLBACK_WORKERS` when unavailable.
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_WORKERS)
}

/// Run `task` over every item on at most `workers` threads.
///
/// Each result is handed to `on_complete` on the calling thread as soon as
/// it arrives, so completion order is unspecified. Returns once every item
/// has been processed.
pub fn run_unordered<T, R, F, C>(items: &[T], workers: usize, task: F, mut on_complete: C)
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
    C: FnMut(R),
{
    if items.is_empty() {
        return;
    }
    let workers = workers.clamp(1, items.len());
    let next = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            let task = &task;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(item) = items.get(index) else {
                    break;
                };
                if sender.send(task(item)).is_err() {
                    break;
                }
            });
        }
        // Workers hold the remaining senders; the drain ends when they exit.
        drop(sender);
        for result in receiver {
            on_complete(result);
        }
    });
}
