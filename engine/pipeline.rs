// ========================================================================================
//
//                      THE FAN-OUT / FAN-IN AGGREGATION ENGINE
//
// ========================================================================================
//
// ### Purpose ###
//
// This module is the coordination core of tally. A dispatcher thread feeds
// batch-start offsets into an unbuffered task channel; a pool of worker threads pulls
// offsets, sums each batch under the overflow guard, and pushes one `PartialResult`
// per batch onto the result channel; the collector drains that channel on the calling
// thread and folds the partials into the final outcome.
//
// Channel lifetime doubles as control flow. The dispatcher owns the only task
// sender, so dropping it on exit is the termination signal the workers see. Each
// worker owns a clone of the result sender, so the result channel disconnects
// exactly when the last worker has exited; that disconnect is the join barrier the
// collector waits on. No error ever crosses either channel: everything fallible
// happens before the core runs.

use crate::plan::BatchPlan;
use crate::types::{AggregateOutcome, OverflowEvent, PartialResult, Record};
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded, select};
use log::{debug, warn};
use std::thread;

// ========================================================================================
//                              Cancellation primitives
// ========================================================================================

/// The raising half of the one-shot cancellation signal.
///
/// Raising works by dropping the underlying sender: every [`CancelSignal`] clone
/// observes the channel as disconnected from that point on. Consuming `self` makes
/// the raise naturally idempotent — there is no token left to raise twice.
pub struct CancelToken {
    tx: Sender<()>,
}

impl CancelToken {
    pub fn raise(self) {
        drop(self.tx);
    }
}

/// The broadcast-readable half of the cancellation signal. One clone per observer.
#[derive(Clone)]
pub struct CancelSignal {
    rx: Receiver<()>,
}

impl CancelSignal {
    /// Non-blocking check, used by workers between batches.
    pub fn is_raised(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

/// Creates a linked token/signal pair. Nothing is ever sent on the channel;
/// disconnection IS the signal, so a raise stays visible forever.
pub fn cancel_pair() -> (CancelToken, CancelSignal) {
    let (tx, rx) = bounded(0);
    (CancelToken { tx }, CancelSignal { rx })
}

// ========================================================================================
//                           Dispatcher, worker, collector
// ========================================================================================

/// Feeds batch-start offsets to the pool, one rendezvous handoff at a time.
///
/// Every send races against the cancellation signal; if the signal wins, dispatch
/// stops with no further sends. Dropping `task_tx` on return closes the task
/// channel, which is the sole termination signal for the workers.
fn dispatcher(plan: BatchPlan, task_tx: Sender<usize>, cancel: CancelSignal) {
    for offset in plan.offsets() {
        select! {
            recv(cancel.rx) -> _ => {
                debug!("dispatch cancelled before offset {offset}");
                return;
            }
            send(task_tx, offset) -> handed_off => {
                if handed_off.is_err() {
                    // Every worker is gone; nobody is left to feed.
                    return;
                }
            }
        }
    }
}

/// One pool member. Pulls offsets until the task channel closes, checks the
/// cancellation signal before scanning each batch, and reports exactly one
/// `PartialResult` per batch it accepts.
///
/// Indices within a batch are scanned in increasing order, so overflow
/// diagnostics carry stable positions. Offending pairs are excluded from the
/// batch sum — never saturated, never fatal.
fn worker(
    records: &[Record],
    plan: BatchPlan,
    task_rx: Receiver<usize>,
    result_tx: Sender<PartialResult>,
    cancel: CancelSignal,
) {
    for batch_start in task_rx.iter() {
        if cancel.is_raised() {
            return;
        }
        let end = plan.batch_end(batch_start);
        let mut sum = 0i64;
        let mut overflows = Vec::new();
        for (i, record) in records[batch_start..end].iter().enumerate() {
            if record.trips_overflow_guard() {
                overflows.push(OverflowEvent {
                    index: batch_start + i,
                    a: record.a,
                    b: record.b,
                });
                continue;
            }
            sum += record.wide_sum();
        }
        let partial = PartialResult {
            batch_start,
            sum,
            overflows,
        };
        if result_tx.send(partial).is_err() {
            return;
        }
    }
}

/// Drains the result channel until every worker has exited, folding partial sums
/// into the outcome. Batches arrive in whatever order workers finish; the sum is
/// commutative, so order never affects the total.
///
/// This runs single-threaded on the calling thread, which makes it the one place
/// overflow diagnostics hit the log — workers hand their events over inside the
/// `PartialResult` instead of logging concurrently.
fn collect(result_rx: Receiver<PartialResult>, workers_used: usize) -> AggregateOutcome {
    let mut total = 0i64;
    let mut min_batch_start: Option<usize> = None;
    let mut overflows: Vec<OverflowEvent> = Vec::new();

    for partial in result_rx.iter() {
        total += partial.sum;
        min_batch_start = Some(match min_batch_start {
            Some(seen) => seen.min(partial.batch_start),
            None => partial.batch_start,
        });
        for event in &partial.overflows {
            warn!(
                "overflow detected at index {}: a={}, b={}",
                event.index, event.a, event.b
            );
        }
        overflows.extend(partial.overflows);
    }

    if let Some(lowest) = min_batch_start {
        debug!("lowest batch offset collected: {lowest}");
    }
    overflows.sort_unstable_by_key(|event| event.index);

    AggregateOutcome {
        total,
        workers_used,
        min_batch_start,
        overflows,
    }
}

// ========================================================================================
//                                The aggregate driver
// ========================================================================================

/// Computes the aggregate sum of `records` using up to `requested_workers` threads.
///
/// The request is clamped by the [`BatchPlan`] (at least one worker, never more
/// workers than records), so any count terminates. The call is synchronous: it
/// returns once every dispatched batch has been collected. Running it twice over
/// the same slice yields the same outcome — all coordination state is scoped to
/// the call.
pub fn aggregate(records: &[Record], requested_workers: usize) -> AggregateOutcome {
    let (token, signal) = cancel_pair();
    let outcome = aggregate_with_signal(records, requested_workers, &signal);
    // Dispatch has already drained by the time collection finishes; raising here
    // keeps the signal's lifecycle symmetric with an aborted run.
    token.raise();
    outcome
}

/// [`aggregate`] with the cancellation seam exposed.
///
/// A caller that holds the matching [`CancelToken`] can raise it while this call
/// is in flight: the dispatcher stops handing out offsets and workers stop
/// accepting batches, so the call winds down after the batches already in flight.
/// The returned total then covers only the batches that were dispatched.
pub fn aggregate_with_signal(
    records: &[Record],
    requested_workers: usize,
    cancel: &CancelSignal,
) -> AggregateOutcome {
    let plan = BatchPlan::new(records.len(), requested_workers);
    let (task_tx, task_rx) = bounded::<usize>(0);
    let (result_tx, result_rx) = bounded::<PartialResult>(0);

    thread::scope(|s| {
        {
            let cancel = cancel.clone();
            s.spawn(move || dispatcher(plan, task_tx, cancel));
        }
        for _ in 0..plan.workers() {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let cancel = cancel.clone();
            s.spawn(move || worker(records, plan, task_rx, result_tx, cancel));
        }
        // The collector must not hold senders or receivers of its own: the result
        // channel has to disconnect when the last worker exits, and the task
        // channel when the dispatcher does.
        drop(task_rx);
        drop(result_tx);

        collect(result_rx, plan.workers())
    })
}
