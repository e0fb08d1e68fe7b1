//! Route pattern index and the router wrapper that feeds it.
//!
//! # Responsibilities
//! - Remember every route pattern registered on the service
//! - Resolve a raw request path back to its pattern
//!
//! # Design Decisions
//! - Radix tree lookup via `matchit`, O(path-length)
//! - Method-agnostic: a path that matches a pattern resolves to it whatever
//!   the method
//! - Registering the same pattern twice is a no-op (axum merges method
//!   routers on the same path)

use axum::{routing::MethodRouter, Router};
use matchit::Router as MatchitRouter;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid route pattern `{pattern}`: {source}")]
pub struct RouteError {
    pattern: String,
    #[source]
    source: matchit::InsertError,
}

/// Index of the route patterns a service serves.
#[derive(Clone, Default)]
pub struct RouteTable {
    tree: MatchitRouter<String>,
    patterns: Vec<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_patterns<'a, I>(patterns: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut table = Self::new();
        for pattern in patterns {
            table.insert(pattern)?;
        }
        Ok(table)
    }

    pub fn insert(&mut self, pattern: &str) -> Result<(), RouteError> {
        if self.patterns.iter().any(|p| p == pattern) {
            return Ok(());
        }
        self.tree
            .insert(pattern, pattern.to_owned())
            .map_err(|source| RouteError {
                pattern: pattern.to_owned(),
                source,
            })?;
        self.patterns.push(pattern.to_owned());
        Ok(())
    }

    /// Pattern matching `path`, if any.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.tree.at(path).ok().map(|matched| matched.value.as_str())
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// An [`axum::Router`] that also records its route patterns.
///
/// ```rust,ignore
/// let app = ServiceRouter::new()
///     .route("/users", get(list_users).post(create_user))
///     .route("/users/{id}", get(get_user));
/// let (router, routes) = app.into_parts();
/// ```
pub struct ServiceRouter<S = ()> {
    router: Router<S>,
    routes: RouteTable,
}

impl<S> ServiceRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            routes: RouteTable::new(),
        }
    }

    /// Add a route. Panics on an invalid or conflicting pattern, like
    /// [`Router::route`].
    pub fn route(mut self, path: &str, method_router: MethodRouter<S>) -> Self {
        self.router = self.router.route(path, method_router);
        if let Err(err) = self.routes.insert(path) {
            tracing::warn!(error = %err, "route left out of the metrics route table");
        }
        self
    }

    pub fn with_state<S2>(self, state: S) -> ServiceRouter<S2>
    where
        S2: Clone + Send + Sync + 'static,
    {
        ServiceRouter {
            router: self.router.with_state(state),
            routes: self.routes,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn into_parts(self) -> (Router<S>, RouteTable) {
        (self.router, self.routes)
    }
}

impl<S> Default for ServiceRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
