//! The ordered middleware pipeline.
//!
//! Every request walks the same fixed sequence of [`Stage`]s. A stage either
//! forwards the request (possibly annotated — parsed body, bound params) or
//! short-circuits with a response of its own; the router is the terminal
//! stage and the 404 fallback lives inside it. The contract is an explicit,
//! typed [`Flow`] value instead of a next-callback convention, so pipeline
//! order and branching are verifiable without running a server.
//!
//! Declared order of the standard assembly:
//!
//! ```text
//! security headers → CORS → body parsing → request logging
//!     → rate limiting → static files (/uploads) → router → 404
//! ```
//!
//! Responses travel back out through [`Stage::decorate`] in reverse order,
//! which is how the header-injecting stages (security, CORS) stamp every
//! response — including the ones a later stage produced by short-circuiting.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::Config;
use crate::middleware::{Cors, JsonBody, RateLimit, RateLimiter, SecurityHeaders, StaticFiles, Trace};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// URL prefix the standard assembly serves static files under.
pub const UPLOADS_PREFIX: &str = "/uploads";

/// What a stage decided to do with the request.
pub enum Flow {
    /// Forward to the next stage, unchanged or annotated.
    Next(Request),
    /// Short-circuit: this response is final (modulo outbound decoration).
    Halt(Response),
}

/// A heap-allocated, type-erased future resolving to a [`Flow`].
pub type StageFuture = Pin<Box<dyn Future<Output = Flow> + Send + 'static>>;

/// One discrete unit of request processing.
///
/// `handle` runs on the way in and may short-circuit; `decorate` runs on
/// the way out and defaults to the identity — only header-injecting stages
/// override it.
pub trait Stage: Send + Sync + 'static {
    /// Stable name, used for logging and for asserting assembly order.
    fn name(&self) -> &'static str;

    fn handle(&self, req: Request) -> StageFuture;

    fn decorate(&self, res: Response) -> Response {
        res
    }
}

/// The pipeline assembler: an ordered list of stages plus the terminal
/// router.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    router: Router,
}

impl Pipeline {
    /// An empty pipeline around `router`. Add stages with
    /// [`stage`](Self::stage); they run in registration order.
    pub fn new(router: Router) -> Self {
        Self { stages: Vec::new(), router }
    }

    /// The full standard assembly in declared order, configured from `cfg`.
    ///
    /// Use this when the defaults fit; assemble manually (see
    /// `demos/basic.rs`) when you need a handle on a stage — e.g. the rate
    /// limiter, to run its stale-bucket sweep.
    pub fn standard(cfg: &Config, router: Router) -> Self {
        let limiter = Arc::new(RateLimiter::new(cfg.rate_limit_window, cfg.rate_limit_max));
        Self::new(router)
            .stage(SecurityHeaders::new())
            .stage(Cors::permissive())
            .stage(JsonBody::new())
            .stage(Trace::new())
            .stage(RateLimit::new(limiter))
            .stage(StaticFiles::new(UPLOADS_PREFIX, cfg.upload_dir.clone()))
    }

    /// Appends a stage. Returns `self` so assembly chains.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage names in execution order. Lets tests pin the declared order
    /// without executing anything.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Drives one request through the pipeline and returns the final
    /// response.
    ///
    /// Inbound: stages in registration order, stopping at the first
    /// [`Flow::Halt`]; if none halts, the router dispatches (or answers
    /// 404). Outbound: `decorate` in reverse registration order over
    /// whichever response terminated the run.
    pub async fn run(&self, req: Request) -> Response {
        let mut req = Some(req);
        let mut halted = None;

        for stage in &self.stages {
            match stage.handle(req.take().expect("request present until halt")).await {
                Flow::Next(next) => req = Some(next),
                Flow::Halt(res) => {
                    halted = Some(res);
                    break;
                }
            }
        }

        let res = match halted {
            Some(res) => res,
            None => {
                self.router
                    .dispatch(req.expect("request present when no stage halted"))
                    .await
            }
        };

        self.stages.iter().rev().fold(res, |res, stage| stage.decorate(res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records whether it ran; optionally halts.
    struct Probe {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        halt: bool,
    }

    impl Probe {
        fn new(name: &'static str, calls: &Arc<AtomicUsize>, halt: bool) -> Self {
            Self { name, calls: Arc::clone(calls), halt }
        }
    }

    impl Stage for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle(&self, req: Request) -> StageFuture {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let halt = self.halt;
            Box::pin(async move {
                if halt {
                    Flow::Halt(Response::status(StatusCode::IM_A_TEAPOT))
                } else {
                    Flow::Next(req)
                }
            })
        }
    }

    /// Stamps a header on the way out.
    struct Stamp(&'static str);

    impl Stage for Stamp {
        fn name(&self) -> &'static str {
            "stamp"
        }

        fn handle(&self, req: Request) -> StageFuture {
            Box::pin(async move { Flow::Next(req) })
        }

        fn decorate(&self, res: Response) -> Response {
            res.with_header("x-stamp", self.0)
        }
    }

    fn cfg(rate_limit_max: u32) -> crate::Config {
        crate::Config {
            port: None,
            rate_limit_window: std::time::Duration::from_secs(60),
            rate_limit_max,
            upload_dir: "uploads".into(),
        }
    }

    #[test]
    fn standard_assembly_preserves_declared_order() {
        let pipeline = Pipeline::standard(&cfg(100), Router::new());
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "security-headers",
                "cors",
                "json-body",
                "trace",
                "rate-limit",
                "static-files",
            ],
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_later_stages() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(Router::new())
            .stage(Probe::new("first", &first, true))
            .stage(Probe::new("second", &second, false));

        let res = pipeline.run(Request::test(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stages_run_in_registration_order_then_router() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(Router::new())
            .stage(Probe::new("first", &first, false))
            .stage(Probe::new("second", &second, false));

        let res = pipeline.run(Request::test(Method::GET, "/nowhere")).await;
        // Nothing halted, so the router's 404 fallback answered.
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn decoration_applies_to_short_circuited_responses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(Router::new())
            .stage(Stamp("early"))
            .stage(Probe::new("halter", &calls, true));

        let res = pipeline.run(Request::test(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::IM_A_TEAPOT);
        assert_eq!(res.header("x-stamp"), Some("early"));
    }

    #[tokio::test]
    async fn outbound_decoration_runs_in_reverse_order() {
        // Last writer wins under with_header, so the stamp closest to the
        // router must lose to the outermost one.
        let pipeline = Pipeline::new(Router::new())
            .stage(Stamp("outer"))
            .stage(Stamp("inner"));

        let res = pipeline.run(Request::test(Method::GET, "/")).await;
        assert_eq!(res.header("x-stamp"), Some("outer"));
    }

    #[tokio::test]
    async fn standard_assembly_end_to_end() {
        let router = Router::new().on(Method::GET, "/user", crate::handlers::get_user);
        let pipeline = Pipeline::standard(&cfg(100), router);

        let res = pipeline.run(Request::test(Method::GET, "/user")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(
            res.body(),
            br#"{"success":true,"message":"the user fetched successfully"}"#,
        );
        // Outbound decoration from the header-injecting stages.
        assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn rate_limited_response_still_carries_decorated_headers() {
        let router = Router::new().on(Method::GET, "/user", crate::handlers::get_user);
        let pipeline = Pipeline::standard(&cfg(1), router);

        let first = pipeline.run(Request::test(Method::GET, "/user")).await;
        assert_eq!(first.status_code(), StatusCode::OK);

        let second = pipeline.run(Request::test(Method::GET, "/user")).await;
        assert_eq!(second.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.header("retry-after").is_some());
        assert_eq!(second.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(second.header("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn unmatched_request_gets_the_exact_404_contract() {
        let pipeline = Pipeline::standard(&cfg(100), Router::new());
        let res = pipeline.run(Request::test(Method::DELETE, "/nope")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), br#"{"error":"Not Found"}"#);
    }
}
