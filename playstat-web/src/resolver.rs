//! Path-based request resolution.
//!
//! Resolvers form a tree: a [`CompositeResolver`] picks a child by the first
//! path segment and hands it the request with that segment removed, until a
//! leaf produces a [`Response`].

use std::collections::HashMap;

use thiserror::Error;

use crate::error::WebError;
use crate::request::Request;
use crate::response::Response;

pub trait Resolver: Send + Sync {
    /// Whether the request's user may see what this resolver serves.
    fn can_access(&self, request: &Request) -> bool;

    /// `Ok(None)` means nothing exists at this path.
    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError>;

    fn requires_auth(&self, _request: &Request) -> bool {
        true
    }
}

/// Serves a resolver to everyone, authenticated or not.
pub struct NoAuthResolver<R> {
    inner: R,
}

impl<R: Resolver> NoAuthResolver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Resolver> Resolver for NoAuthResolver<R> {
    fn can_access(&self, _request: &Request) -> bool {
        true
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        self.inner.resolve(request)
    }

    fn requires_auth(&self, _request: &Request) -> bool {
        false
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("prefix '{0}' is registered twice")]
    DuplicatePrefix(String),

    #[error("prefix '{0}' is not a single path segment")]
    InvalidPrefix(String),
}

/// Routes by exact, case-sensitive match on the first path segment.
///
/// Requests no child matches are not found: access is granted so the caller
/// can answer 404, and authentication is still required.
pub struct CompositeResolver {
    children: HashMap<String, Box<dyn Resolver>>,
}

impl CompositeResolver {
    pub fn builder() -> CompositeResolverBuilder {
        CompositeResolverBuilder::default()
    }

    fn child(&self, request: &Request) -> Option<(&dyn Resolver, Request)> {
        self.children
            .get(request.path.first_part())
            .map(|child| (child.as_ref(), request.omit_first_in_path()))
    }
}

impl Resolver for CompositeResolver {
    fn can_access(&self, request: &Request) -> bool {
        match self.child(request) {
            Some((child, request)) => child.can_access(&request),
            None => true,
        }
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        match self.child(request) {
            Some((child, request)) => child.resolve(&request),
            None => Ok(None),
        }
    }

    fn requires_auth(&self, request: &Request) -> bool {
        match self.child(request) {
            Some((child, request)) => child.requires_auth(&request),
            None => true,
        }
    }
}

#[derive(Default)]
pub struct CompositeResolverBuilder {
    children: Vec<(String, Box<dyn Resolver>)>,
}

impl CompositeResolverBuilder {
    /// Register `resolver` under `prefix`. `""` matches the root path.
    pub fn add(mut self, prefix: impl Into<String>, resolver: impl Resolver + 'static) -> Self {
        self.children.push((prefix.into(), Box::new(resolver)));
        self
    }

    pub fn build(self) -> Result<CompositeResolver, RouteError> {
        let mut children: HashMap<String, Box<dyn Resolver>> = HashMap::with_capacity(self.children.len());
        for (prefix, resolver) in self.children {
            if prefix.contains('/') {
                return Err(RouteError::InvalidPrefix(prefix));
            }
            if children.contains_key(&prefix) {
                return Err(RouteError::DuplicatePrefix(prefix));
            }
            children.insert(prefix, resolver);
        }
        Ok(CompositeResolver { children })
    }
}
