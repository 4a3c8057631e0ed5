//! HTTP server, request dispatch, and graceful shutdown.
//!
//! One connection task per accepted socket, one request task per request.
//! The per-request task is the pipeline's failure boundary: a panic
//! anywhere in a stage or handler aborts that task alone, and the dispatch
//! answers with the generic 500 — the connection, the server, and every
//! other in-flight request keep going.
//!
//! Shutdown follows the usual SIGTERM contract: stop accepting immediately,
//! drain in-flight connections, then return from [`Server::serve`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::request::Request;
use crate::response::Response;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Accepts connections and drives every request through `pipeline`.
    ///
    /// Returns only after a full graceful shutdown: SIGTERM or Ctrl-C,
    /// followed by all in-flight connections completing.
    pub async fn serve(self, pipeline: Pipeline) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let pipeline = Arc::new(pipeline);

        info!(addr = %self.addr, stages = ?pipeline.stage_names(), "gantry listening");

        // Tracks spawned connection tasks so shutdown can drain them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown before the accept queue so a signal stops
                // new connections immediately.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let pipeline = Arc::clone(&pipeline);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // service_fn is invoked once per request on this
                        // connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let pipeline = Arc::clone(&pipeline);
                            async move { dispatch(pipeline, req, remote_addr).await }
                        });

                        // auto::Builder speaks both HTTP/1.1 and HTTP/2,
                        // whichever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("gantry stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Runs one request through the pipeline and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible): every
/// failure mode is turned into an HTTP response here, so hyper never sees
/// an error. The pipeline runs on its own task; if it panics, the
/// [`JoinError`](tokio::task::JoinError) becomes the generic 500 with no
/// internal detail attached.
async fn dispatch(
    pipeline: Arc<Pipeline>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(%method, path, "failed to read request body: {e}");
            return Ok(
                Response::error_json(StatusCode::BAD_REQUEST, "Bad Request").into_inner(),
            );
        }
    };

    let request = Request::new(
        parts.method,
        path.clone(),
        parts.headers,
        body,
        remote_addr.ip(),
    );

    let run = tokio::spawn(async move { pipeline.run(request).await });
    let response = match run.await {
        Ok(response) => response,
        Err(e) => {
            error!(%method, path, "request task failed: {e}");
            Response::internal_error()
        }
    };

    info!(
        %method,
        path,
        status = response.status_code().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "response",
    );
    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal: SIGTERM or SIGINT on Unix,
/// Ctrl-C elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Stage, StageFuture};
    use crate::router::Router;
    use http::Method;

    /// A stage that panics, standing in for any unexpected failure.
    struct Faulty;

    impl Stage for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        fn handle(&self, _req: Request) -> StageFuture {
            Box::pin(async { panic!("stage blew up") })
        }
    }

    #[tokio::test]
    async fn panicking_stage_becomes_generic_500() {
        let pipeline = Arc::new(Pipeline::new(Router::new()).stage(Faulty));
        let request = Request::test(Method::GET, "/user");

        // Same isolation dispatch() uses: the panic is confined to the
        // spawned task and mapped to the canonical 500 body.
        let run = tokio::spawn({
            let pipeline = Arc::clone(&pipeline);
            async move { pipeline.run(request).await }
        });
        let response = match run.await {
            Ok(response) => response,
            Err(_) => Response::internal_error(),
        };

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body(), br#"{"error":"Internal Server Error"}"#);
    }
}
