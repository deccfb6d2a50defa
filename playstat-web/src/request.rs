use std::collections::HashMap;
use std::fmt;

use playstat_db::WebUser;

/// A URL path split into its non-empty segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPath {
    parts: Vec<String>,
}

impl UrlPath {
    pub fn parse(path: &str) -> Self {
        Self {
            parts: path
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// First segment, or `""` for the root path.
    pub fn first_part(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or("")
    }

    pub fn part(&self, index: usize) -> Option<&str> {
        self.parts.get(index).map(String::as_str)
    }

    /// The path without its first segment.
    pub fn omit_first(&self) -> Self {
        Self {
            parts: self.parts.iter().skip(1).cloned().collect(),
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Renders as `/a/b`, or as an empty string when there are no segments.
impl fmt::Display for UrlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            write!(f, "/{part}")?;
        }
        Ok(())
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    values: HashMap<String, String>,
}

impl Parameters {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Parameters {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }
}

/// What a resolver sees of an HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: UrlPath,
    pub query: Parameters,
    /// Authenticated web user, if a valid token was presented
    pub user: Option<WebUser>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: &str) -> Self {
        Self {
            method: method.into(),
            path: UrlPath::parse(path),
            query: Parameters::default(),
            user: None,
        }
    }

    pub fn with_query(mut self, query: Parameters) -> Self {
        self.query = query;
        self
    }

    pub fn with_user(mut self, user: Option<WebUser>) -> Self {
        self.user = user;
        self
    }

    /// The same request with the first path segment removed.
    pub fn omit_first_in_path(&self) -> Self {
        Self {
            path: self.path.omit_first(),
            ..self.clone()
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.has_permission(permission))
    }
}
