//! MIME types served by the web layer.

pub const HTML: &str = "text/html";
pub const CSS: &str = "text/css";
pub const JSON: &str = "application/json";
pub const JAVASCRIPT: &str = "text/javascript";
pub const PLAIN: &str = "text/plain";
pub const IMAGE_GIF: &str = "image/gif";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const IMAGE_SVG: &str = "image/svg+xml";
pub const FAVICON: &str = "image/x-icon";
pub const FONT_TTF: &str = "application/x-font-ttf";
pub const FONT_WOFF: &str = "application/font-woff";
pub const FONT_WOFF2: &str = "application/font-woff2";
pub const FONT_EOT: &str = "application/vnd.ms-fontobject";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type of a file, judged by its extension. `None` for unknown types.
pub fn from_file_name(name: &str) -> Option<&'static str> {
    let (_, extension) = name.rsplit_once('.')?;
    let mime = match extension.to_ascii_lowercase().as_str() {
        "html" | "htm" => HTML,
        "js" | "mjs" => JAVASCRIPT,
        "json" => JSON,
        "css" => CSS,
        "txt" => PLAIN,
        "png" => IMAGE_PNG,
        "jpg" | "jpeg" => IMAGE_JPEG,
        "gif" => IMAGE_GIF,
        "ico" => FAVICON,
        "svg" => IMAGE_SVG,
        "woff" => FONT_WOFF,
        "woff2" => FONT_WOFF2,
        "eot" => FONT_EOT,
        "ttf" => FONT_TTF,
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(from_file_name("index.html"), Some(HTML));
        assert_eq!(from_file_name("js/app.min.js"), Some(JAVASCRIPT));
        assert_eq!(from_file_name("style.CSS"), Some(CSS));
        assert_eq!(from_file_name("fonts/fa.woff2"), Some(FONT_WOFF2));
        assert_eq!(from_file_name("favicon.ico"), Some(FAVICON));
    }

    #[test]
    fn test_unknown_extensions() {
        assert_eq!(from_file_name("archive.tar.gz"), None);
        assert_eq!(from_file_name("README"), None);
    }
}
