//! Security-header injection.

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;
use crate::response::Response;

/// Stamps a conservative hardening header set on every outgoing response.
///
/// Runs first in the standard assembly, which puts its `decorate` last on
/// the way out — every response leaves with these headers, including 404s,
/// 429s, and preflight answers produced by later stages.
pub struct SecurityHeaders;

impl SecurityHeaders {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for SecurityHeaders {
    fn name(&self) -> &'static str {
        "security-headers"
    }

    fn handle(&self, req: Request) -> StageFuture {
        Box::pin(async move { Flow::Next(req) })
    }

    fn decorate(&self, res: Response) -> Response {
        res.with_header("x-content-type-options", "nosniff")
            .with_header("x-frame-options", "DENY")
            .with_header("x-xss-protection", "0")
            .with_header("referrer-policy", "no-referrer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[tokio::test]
    async fn passes_requests_through_untouched() {
        let stage = SecurityHeaders::new();
        let flow = stage.handle(Request::test(Method::GET, "/x")).await;
        match flow {
            Flow::Next(req) => assert_eq!(req.path(), "/x"),
            Flow::Halt(_) => panic!("security stage must never short-circuit"),
        }
    }

    #[test]
    fn injects_the_full_header_set() {
        let res = SecurityHeaders::new().decorate(Response::text("ok"));
        assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
        assert_eq!(res.header("x-frame-options"), Some("DENY"));
        assert_eq!(res.header("x-xss-protection"), Some("0"));
        assert_eq!(res.header("referrer-policy"), Some("no-referrer"));
    }
}
