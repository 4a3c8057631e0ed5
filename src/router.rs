//! Radix-tree request router and terminal 404 fallback.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. The
//! router is the last stop of the middleware pipeline: whatever no stage
//! short-circuited lands here, and whatever matches nothing becomes the
//! canonical `404 {"error":"Not Found"}`.

use std::collections::HashMap;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; hand it to the [`Pipeline`](crate::Pipeline).
/// Each [`Router::on`] call returns `self` so registrations chain:
///
/// ```rust,no_run
/// use gantry::{Method, Request, Response, Router};
///
/// # async fn get_user(_: Request) -> Response { Response::text("") }
/// # async fn create_user(_: Request) -> Response { Response::text("") }
/// let router = Router::new()
///     .on(Method::GET,  "/users/{id}", get_user)
///     .on(Method::POST, "/users",      create_user);
/// ```
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves
    /// them. Exact paths and parameterized paths coexist in the same tree.
    ///
    /// # Panics
    ///
    /// Panics on a malformed route pattern. Routes are registered at
    /// startup, so this fails loudly before the server ever binds.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Dispatches the request to its matched handler, or answers the
    /// terminal 404 when no route matches.
    pub(crate) async fn dispatch(&self, mut req: Request) -> Response {
        let matched = self.lookup(req.method(), req.path());
        match matched {
            Some((handler, params)) => {
                req.set_params(params);
                handler.call(req).await
            }
            None => Response::not_found(),
        }
    }

    fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = std::sync::Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    async fn hello(_req: Request) -> Response {
        Response::text("hello")
    }

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("missing").to_owned())
    }

    #[tokio::test]
    async fn exact_match_dispatches() {
        let router = Router::new().on(Method::GET, "/hello", hello);
        let res = router.dispatch(Request::test(Method::GET, "/hello")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body(), b"hello");
    }

    #[tokio::test]
    async fn path_params_are_bound() {
        let router = Router::new().on(Method::GET, "/users/{id}", echo_id);
        let res = router.dispatch(Request::test(Method::GET, "/users/42")).await;
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn method_mismatch_falls_through_to_404() {
        let router = Router::new().on(Method::GET, "/hello", hello);
        let res = router.dispatch(Request::test(Method::POST, "/hello")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), br#"{"error":"Not Found"}"#);
    }

    #[tokio::test]
    async fn unknown_path_returns_exact_404_body() {
        let router = Router::new();
        let res = router.dispatch(Request::test(Method::GET, "/nowhere")).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.body(), br#"{"error":"Not Found"}"#);
    }
}
