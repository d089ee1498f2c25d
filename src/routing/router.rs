//! Route lookup and parameter extraction.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the command for a (verb, path) pair
//! - Merge route defaults, query string, and form body into parameters
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) path lookup via HashMap, exact match only
//! - Explicit NotFound / MethodNotAllowed rather than silent default

use axum::http::Method;
use std::collections::{BTreeMap, HashMap};

use crate::config::RouteConfig;

/// A compiled route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub command: String,
    pub defaults: BTreeMap<String, String>,
}

/// Outcome of a route lookup.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    Found(&'a Route),
    MethodNotAllowed,
    NotFound,
}

/// Gateway route table.
#[derive(Debug, Default)]
pub struct Router {
    /// path -> (verb -> route)
    routes: HashMap<String, HashMap<Method, Route>>,
}

impl Router {
    /// Compile the configured routes. Earlier entries win on conflicts.
    pub fn from_config(configs: &[RouteConfig]) -> Self {
        let mut routes: HashMap<String, HashMap<Method, Route>> = HashMap::new();

        for config in configs {
            for method in &config.methods {
                let method = match Method::from_bytes(method.to_ascii_uppercase().as_bytes()) {
                    Ok(m) => m,
                    Err(_) => {
                        tracing::warn!(path = %config.path, method = %method, "Ignoring invalid route method");
                        continue;
                    }
                };
                routes
                    .entry(config.path.clone())
                    .or_default()
                    .entry(method)
                    .or_insert_with(|| Route {
                        command: config.command.clone(),
                        defaults: config.defaults.clone(),
                    });
            }
        }

        tracing::debug!(paths = routes.len(), "Route table compiled");
        Self { routes }
    }

    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        match self.routes.get(path) {
            Some(by_method) => match by_method.get(method) {
                Some(route) => RouteMatch::Found(route),
                None => RouteMatch::MethodNotAllowed,
            },
            None => RouteMatch::NotFound,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Merge parameters; later sources override earlier ones:
/// route defaults, then urlencoded form body, then query string.
pub fn collect_params(route: &Route, query: Option<&str>, form_body: Option<&[u8]>) -> BTreeMap<String, String> {
    let mut params = route.defaults.clone();

    if let Some(body) = form_body {
        params.extend(url::form_urlencoded::parse(body).into_owned());
    }
    if let Some(query) = query {
        params.extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
    }

    params
}
