use std::io;

use tracing::debug;

use super::ResolverContext;
use crate::error::WebError;
use crate::mime;
use crate::request::Request;
use crate::resolver::Resolver;
use crate::response::Response;

/// Files below the web directory, typed by extension.
///
/// Paths leaving the directory, missing files and unknown extensions are
/// not found.
pub struct StaticFileResolver {
    context: ResolverContext,
}

impl StaticFileResolver {
    pub fn new(context: ResolverContext) -> Self {
        Self { context }
    }
}

impl Resolver for StaticFileResolver {
    fn can_access(&self, _request: &Request) -> bool {
        true
    }

    fn resolve(&self, request: &Request) -> Result<Option<Response>, WebError> {
        let parts = request.path.parts();
        if parts.is_empty() || parts.iter().any(|part| part == ".." || part.starts_with('.')) {
            return Ok(None);
        }
        let Some(mime_type) = parts.last().and_then(|name| mime::from_file_name(name)) else {
            return Ok(None);
        };

        let relative = parts.join("/");
        let file = parts
            .iter()
            .fold(self.context.web_directory.clone(), |path, part| path.join(part));
        let content = match self.context.resources.get_or_load(&relative, || std::fs::read(&file)) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %relative, bytes = content.len(), "serving static file");
        Ok(Some(
            Response::builder()
                .set_mime_type(mime_type)
                .set_content(content.as_slice())
                .build()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use playstat_db::{Database, SessionCache};

    use super::*;
    use crate::cache::ResourceCache;

    async fn resolver(web_directory: PathBuf) -> StaticFileResolver {
        StaticFileResolver::new(ResolverContext {
            db: Database::open_in_memory().await.unwrap(),
            sessions: SessionCache::new(),
            web_directory,
            resources: Arc::new(ResourceCache::new(Duration::from_secs(60))),
            activity_threshold_ms: 30 * 60 * 1000,
        })
    }

    fn web_directory(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("playstat-static-{name}-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("css")).unwrap();
        std::fs::write(dir.join("css").join("style.css"), "body {}").unwrap();
        std::fs::write(dir.join("notes.unknownext"), "?").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_serves_file_with_sniffed_type() {
        let resolver = resolver(web_directory("serve")).await;

        let response = resolver
            .resolve(&Request::new("GET", "/css/style.css"))
            .unwrap()
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.mime_type(), Some(mime::CSS));
        assert_eq!(response.content(), b"body {}");
    }

    #[tokio::test]
    async fn test_unknown_extension_and_missing_file_are_not_found() {
        let resolver = resolver(web_directory("missing")).await;

        assert!(resolver.resolve(&Request::new("GET", "/notes.unknownext")).unwrap().is_none());
        assert!(resolver.resolve(&Request::new("GET", "/css/missing.css")).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_parent_directory_is_rejected() {
        let resolver = resolver(web_directory("escape")).await;

        assert!(resolver.resolve(&Request::new("GET", "/../secret.css")).unwrap().is_none());
        assert!(resolver.resolve(&Request::new("GET", "/.hidden.css")).unwrap().is_none());
    }
}
