//! CORS resolution.

use http::{Method, StatusCode};

use crate::pipeline::{Flow, Stage, StageFuture};
use crate::request::Request;
use crate::response::Response;

const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "content-type, authorization";
const MAX_AGE_SECS: &str = "86400";

/// Cross-origin resource sharing.
///
/// Inbound, an `OPTIONS` request is treated as a preflight and answered
/// with `204` plus the allow headers — it never reaches the router.
/// Outbound, every response gets `access-control-allow-origin`.
pub struct Cors {
    allow_origin: String,
}

impl Cors {
    /// Allow any origin (`*`). The bootstrap default.
    pub fn permissive() -> Self {
        Self { allow_origin: "*".to_owned() }
    }

    /// Allow exactly one origin.
    pub fn origin(origin: impl Into<String>) -> Self {
        Self { allow_origin: origin.into() }
    }
}

impl Stage for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    fn handle(&self, req: Request) -> StageFuture {
        Box::pin(async move {
            if req.method() == Method::OPTIONS {
                return Flow::Halt(
                    Response::builder()
                        .status(StatusCode::NO_CONTENT)
                        .header("access-control-allow-methods", ALLOW_METHODS)
                        .header("access-control-allow-headers", ALLOW_HEADERS)
                        .header("access-control-max-age", MAX_AGE_SECS)
                        .no_body(),
                );
            }
            Flow::Next(req)
        })
    }

    fn decorate(&self, res: Response) -> Response {
        res.with_header("access-control-allow-origin", &self.allow_origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn preflight_short_circuits_with_204() {
        let flow = Cors::permissive()
            .handle(Request::test(Method::OPTIONS, "/user"))
            .await;
        let Flow::Halt(res) = flow else {
            panic!("preflight must short-circuit");
        };
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(res.header("access-control-allow-methods"), Some(ALLOW_METHODS));
        assert_eq!(res.header("access-control-allow-headers"), Some(ALLOW_HEADERS));
    }

    #[tokio::test]
    async fn non_preflight_requests_continue() {
        let flow = Cors::permissive().handle(Request::test(Method::GET, "/user")).await;
        assert!(matches!(flow, Flow::Next(_)));
    }

    #[test]
    fn decorate_sets_allow_origin() {
        let res = Cors::permissive().decorate(Response::text("ok"));
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));

        let res = Cors::origin("https://app.example").decorate(Response::text("ok"));
        assert_eq!(
            res.header("access-control-allow-origin"),
            Some("https://app.example"),
        );
    }
}
