//! Per-request structured logging.

use tracing::info;

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;

/// Emits one structured event per inbound request: method, path, client IP.
///
/// The matching completion line (status, latency) is written by the server
/// dispatch, which is the only place that sees the final response and the
/// clock at both ends.
pub struct Trace;

impl Trace {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Trace {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Trace {
    fn name(&self) -> &'static str {
        "trace"
    }

    fn handle(&self, req: Request) -> StageFuture {
        info!(
            method = %req.method(),
            path = req.path(),
            client = %req.client_ip(),
            "request",
        );
        Box::pin(async move { Flow::Next(req) })
    }
}
