//! In-process Graph fake: canned replies keyed by method and path, with
//! every call recorded.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use homepage_graph::{ApiVersion, GraphApi, GraphError};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub version: ApiVersion,
    /// Full path including any query string.
    pub path: String,
    pub body: Option<Value>,
    pub if_match: Option<String>,
}

impl Call {
    /// Path without the query string.
    pub fn resource(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }
}

struct Route {
    method: Method,
    resource: String,
    reply: Result<Value, u16>,
}

/// Unrouted requests fail with 404.
#[derive(Default)]
pub struct FakeGraph {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, resource: &str, reply: Value) -> Self {
        self.route(method, resource, Ok(reply))
    }

    pub fn fail(self, method: Method, resource: &str, status: u16) -> Self {
        self.route(method, resource, Err(status))
    }

    fn route(self, method: Method, resource: &str, reply: Result<Value, u16>) -> Self {
        self.routes.lock().unwrap().push(Route {
            method,
            resource: resource.to_string(),
            reply,
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, resource: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.resource() == resource)
            .collect()
    }

    fn answer(
        &self,
        method: Method,
        version: ApiVersion,
        path: &str,
        body: Option<&Value>,
        if_match: Option<&str>,
    ) -> Result<Value, GraphError> {
        let call = Call {
            method,
            version,
            path: path.to_string(),
            body: body.cloned(),
            if_match: if_match.map(str::to_string),
        };
        let resource = call.resource().to_string();
        self.calls.lock().unwrap().push(call);

        let routes = self.routes.lock().unwrap();
        let reply = routes
            .iter()
            .find(|r| r.method == method && r.resource == resource)
            .map(|r| r.reply.clone())
            .unwrap_or(Err(404));

        reply.map_err(|status| GraphError::ApiError {
            status,
            body: format!("{method:?} {resource}"),
        })
    }
}

#[async_trait]
impl GraphApi for FakeGraph {
    async fn get(&self, version: ApiVersion, path: &str) -> Result<Value, GraphError> {
        self.answer(Method::Get, version, path, None, None)
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, GraphError> {
        self.answer(Method::Post, ApiVersion::V1, path, Some(body), None)
    }

    async fn patch(&self, path: &str, body: &Value, if_match: Option<&str>) -> Result<Value, GraphError> {
        self.answer(Method::Patch, ApiVersion::V1, path, Some(body), if_match)
    }
}
