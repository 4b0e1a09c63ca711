use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode, Uri},
    response::Response,
};
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Maps a request path onto `static_root`. Anything other than plain
/// components (`..`, absolute paths, prefixes) is refused.
pub(crate) fn resolve(static_root: &Path, uri_path: &str) -> Option<PathBuf> {
    let relative = uri_path.trim_start_matches('/');
    let relative = if relative.is_empty() {
        INDEX_FILE
    } else {
        relative
    };

    let mut path = static_root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("md") => "text/markdown; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

pub(crate) async fn serve(static_root: &Path, uri: &Uri) -> Result<Response, StatusCode> {
    let Some(path) = resolve(static_root, uri.path()) else {
        log::debug!("Refusing static path {}", uri.path());
        return Err(StatusCode::NOT_FOUND);
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("Static file {} unavailable: {err}", path.display());
            return Err(StatusCode::NOT_FOUND);
        }
    };

    HttpResponse::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type(&path))
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn resolves_index_and_nested_paths() {
        let root = Path::new("static");
        assert_eq!(resolve(root, "/"), Some(root.join("index.html")));
        assert_eq!(
            resolve(root, "/history/20240101000000_map_by_user.md"),
            Some(root.join("history").join("20240101000000_map_by_user.md"))
        );
    }

    #[test]
    fn refuses_parent_components() {
        let root = Path::new("static");
        assert_eq!(resolve(root, "/../config/names.json"), None);
        assert_eq!(resolve(root, "/history/../../secret"), None);
    }

    #[tokio::test]
    async fn serves_existing_files_only() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("index.html"), "<html></html>").unwrap();

        let response = serve(temp.path(), &Uri::from_static("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );

        let missing = serve(temp.path(), &Uri::from_static("/nope.js")).await;
        assert!(matches!(missing, Err(StatusCode::NOT_FOUND)));
    }
}
