//! Bounded scoped-thread fan-out used by the submission, fetch and lookup loops.
//!
//! Workers pull item indices from a shared counter, so at most `workers`
//! calls are in flight at once. Results are returned in input order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Runs `f` over every item on at most `workers` threads.
pub fn map_bounded<T, R, F>(items: &[T], workers: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> R + Sync,
{
    let workers = effective_workers(items.len(), workers);
    if workers <= 1 {
        return items.iter().enumerate().map(|(i, t)| f(i, t)).collect();
    }

    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<R>> = Vec::with_capacity(items.len());
    slots.resize_with(items.len(), || None);

    let (next, f) = (&next, &f);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= items.len() {
                            break;
                        }
                        done.push((i, f(i, &items[i])));
                    }
                    done
                })
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (i, r) in done {
                        slots[i] = Some(r);
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
    });

    slots.into_iter().flatten().collect()
}

/// A fail-fast run that stopped early.
///
/// `completed` holds the successful results that finished before the abort,
/// in input order.
#[derive(Debug)]
pub struct Aborted<R, E> {
    pub error: E,
    pub completed: Vec<R>,
}

/// Like [`map_bounded`], but stops starting new items after the first error.
///
/// Items already in flight finish; the error belonging to the lowest item
/// index is returned. With a single worker this is the plain sequential loop
/// that stops at the first failure.
pub fn try_map_bounded<T, R, E, F>(items: &[T], workers: usize, f: F) -> Result<Vec<R>, Aborted<R, E>>
where
    T: Sync,
    R: Send,
    E: Send,
    F: Fn(usize, &T) -> Result<R, E> + Sync,
{
    let workers = effective_workers(items.len(), workers);
    if workers <= 1 {
        let mut completed = Vec::with_capacity(items.len());
        for (i, t) in items.iter().enumerate() {
            match f(i, t) {
                Ok(v) => completed.push(v),
                Err(error) => return Err(Aborted { error, completed }),
            }
        }
        return Ok(completed);
    }

    let next = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let mut slots: Vec<Option<R>> = Vec::with_capacity(items.len());
    slots.resize_with(items.len(), || None);
    let mut first_err: Option<(usize, E)> = None;

    let (next, abort, f) = (&next, &abort, &f);
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    while !abort.load(Ordering::Acquire) {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= items.len() {
                            break;
                        }
                        let r = f(i, &items[i]);
                        if r.is_err() {
                            abort.store(true, Ordering::Release);
                        }
                        done.push((i, r));
                    }
                    done
                })
            })
            .collect();
        for handle in handles {
            let done = match handle.join() {
                Ok(done) => done,
                Err(panic) => std::panic::resume_unwind(panic),
            };
            for (i, r) in done {
                match r {
                    Ok(v) => slots[i] = Some(v),
                    Err(e) => {
                        if first_err.as_ref().is_none_or(|(j, _)| i < *j) {
                            first_err = Some((i, e));
                        }
                    }
                }
            }
        }
    });

    let completed: Vec<R> = slots.into_iter().flatten().collect();
    match first_err {
        Some((_, error)) => Err(Aborted { error, completed }),
        None => Ok(completed),
    }
}

fn effective_workers(len: usize, workers: usize) -> usize {
    workers.max(1).min(len.max(1))
}
