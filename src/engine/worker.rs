//! Cooperative worker boundary.
//!
//! One dedicated thread owns an engine; other threads talk to it only by
//! submitting a search, signaling the shared cancel token, and reading the
//! final result. Overlapping submissions are rejected rather than queued, so
//! the embedding UI always knows whether a search is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::board::position::Position;
use crate::engine::config::EngineConfig;
use crate::engine::facade::{Engine, SearchReport};
use crate::engine::limits::{CancelToken, SearchLimits};
use crate::errors::{EngineError, EngineResult};

enum WorkerRequest {
    Search {
        position: Box<Position>,
        limits: SearchLimits,
        reply: Sender<EngineResult<SearchReport>>,
    },
    Shutdown,
}

/// Handle to one in-flight search. Dropping it without calling `wait`
/// cancels the search and frees the worker for the next submission.
pub struct SearchTicket {
    reply: Receiver<EngineResult<SearchReport>>,
    cancel: CancelToken,
    busy: Arc<AtomicBool>,
}

impl SearchTicket {
    /// Request early termination; the worker notices within a bounded
    /// number of nodes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the search finishes and take its result.
    pub fn wait(self) -> EngineResult<SearchReport> {
        self.reply
            .recv()
            .map_err(|_| EngineError::InternalError("search worker disappeared".to_owned()))?
    }
}

impl Drop for SearchTicket {
    fn drop(&mut self) {
        // An abandoned ticket must not wedge the worker: stop the search if
        // it is still running and release the in-flight slot. The next
        // submission resets the token.
        self.cancel.cancel();
        self.busy.store(false, Ordering::Release);
    }
}

pub struct SearchWorker {
    requests: Sender<WorkerRequest>,
    cancel: CancelToken,
    busy: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    pub fn spawn(config: EngineConfig) -> Self {
        let (tx, rx) = channel::<WorkerRequest>();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        let handle = std::thread::spawn(move || {
            let mut engine = Engine::new(config);
            while let Ok(request) = rx.recv() {
                match request {
                    WorkerRequest::Search {
                        position,
                        limits,
                        reply,
                    } => {
                        let result = engine.search(&position, &limits, &worker_cancel);
                        // The submitter may have given up on the ticket.
                        let _ = reply.send(result);
                    }
                    WorkerRequest::Shutdown => break,
                }
            }
        });

        Self {
            requests: tx,
            cancel,
            busy: Arc::new(AtomicBool::new(false)),
            handle: Some(handle),
        }
    }

    /// Submit a search. Fails with `LimitsError` when one is already in
    /// flight; this boundary deliberately does not queue.
    pub fn submit(
        &self,
        position: Position,
        limits: SearchLimits,
    ) -> EngineResult<SearchTicket> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(EngineError::LimitsError(
                "a search is already in flight".to_owned(),
            ));
        }
        self.cancel.reset();

        let (reply_tx, reply_rx) = channel();
        self.requests
            .send(WorkerRequest::Search {
                position: Box::new(position),
                limits,
                reply: reply_tx,
            })
            .map_err(|_| {
                self.busy.store(false, Ordering::Release);
                EngineError::InternalError("search worker disappeared".to_owned())
            })?;

        Ok(SearchTicket {
            reply: reply_rx,
            cancel: self.cancel.clone(),
            busy: Arc::clone(&self.busy),
        })
    }

    /// Cancel whatever is running; harmless when idle.
    pub fn cancel_current(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        self.cancel.cancel();
        let _ = self.requests.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
