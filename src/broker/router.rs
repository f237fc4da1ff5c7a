// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::broker::tasks::{HttpRequest, HttpResponse};

pub type RouteHandler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// In-process HTTP router.
///
/// Both the synchronous `ws_api_call` path and the async request worker
/// serve requests through this table, so host-mounted endpoints behave
/// exactly like external URLs. A fallback handler, when mounted, receives
/// everything that misses the exact-path table (e.g. an egress proxy).
pub struct Router {
    routes: RwLock<HashMap<String, Arc<RouteHandler>>>,
    fallback: RwLock<Option<Arc<RouteHandler>>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            fallback: RwLock::new(None),
        }
    }

    pub fn mount<F>(&self, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes
            .write()
            .insert(path.to_string(), Arc::new(handler));
    }

    pub fn mount_fallback<F>(&self, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        *self.fallback.write() = Some(Arc::new(handler));
    }

    pub fn serve(&self, request: &HttpRequest) -> HttpResponse {
        let handler = {
            let routes = self.routes.read();
            routes.get(request.path()).cloned()
        };
        if let Some(handler) = handler {
            return handler(request);
        }
        let fallback = self.fallback.read().clone();
        match fallback {
            Some(handler) => handler(request),
            None => HttpResponse::not_found(),
        }
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

    fn request(url: &str) -> HttpRequest {
        HttpRequest {
            method: "GET".to_string(),
            url: url.to_string(),
            header: HashMap::new(),
            body: b"ping".to_vec(),
            asynchronous: false,
        }
    }

    #[test]
    fn mounted_route_is_served() {
        let router = Router::new();
        router.mount("/echo", |req| HttpResponse::ok(req.body.clone()));

        let resp = router.serve(&request("http://internal.host/echo"));
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.body, b"ping");
    }

    #[test]
    fn unmatched_path_without_fallback_is_404() {
        let router = Router::new();
        let resp = router.serve(&request("/missing"));
        assert_eq!(resp.status_code, 404);
    }

    #[test]
    fn fallback_receives_unmatched_paths() {
        let router = Router::new();
        router.mount_fallback(|req| HttpResponse::ok(req.url.as_bytes().to_vec()));
        let resp = router.serve(&request("https://external.example.com/api"));
        assert_eq!(resp.body, b"https://external.example.com/api");
    }
}
