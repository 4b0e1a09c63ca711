use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query},
    http::{header::CONTENT_TYPE, Response as HttpResponse, StatusCode},
    response::Response,
};
use serde::Deserialize;
use session_indexer::{TreeOutcome, TreeService};
use session_protocol::{serialize_json, TreeResponse};
use std::sync::Arc;

/// Query string of `GET /get-tree`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TreeQuery {
    #[serde(rename = "startingClassName")]
    pub(crate) starting_class_name: Option<String>,
}

pub(crate) fn status_for(outcome: &TreeOutcome) -> StatusCode {
    match outcome {
        TreeOutcome::Built { .. } => StatusCode::OK,
        TreeOutcome::SnapshotFailed { .. } | TreeOutcome::BuildFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Entry for the raw extractor result: a malformed query string still gets
/// the JSON error envelope instead of axum's plain-text rejection.
pub(crate) async fn tree_request(
    service: Arc<TreeService>,
    query: Result<Query<TreeQuery>, QueryRejection>,
) -> (StatusCode, TreeResponse) {
    match query {
        Ok(Query(query)) => tree_endpoint(service, query).await,
        Err(rejection) => {
            let message = rejection.body_text();
            log::warn!("Rejected tree request: {message}");
            (rejection.status(), TreeResponse::error(message, None))
        }
    }
}

/// Validates the root parameter, then builds on the blocking pool.
pub(crate) async fn tree_endpoint(
    service: Arc<TreeService>,
    query: TreeQuery,
) -> (StatusCode, TreeResponse) {
    let root = match TreeService::parse_root(query.starting_class_name.as_deref()) {
        Ok(root) => root,
        Err(message) => {
            log::warn!("Rejected tree request: {message}");
            return (StatusCode::BAD_REQUEST, TreeResponse::error(message, None));
        }
    };

    match tokio::task::spawn_blocking(move || service.get_tree(root)).await {
        Ok(outcome) => (status_for(&outcome), outcome.into_response()),
        Err(err) => {
            log::error!("Tree build task aborted: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                TreeResponse::error(format!("Tree build task aborted: {err}"), None),
            )
        }
    }
}

pub(crate) fn health_report(service: &TreeService) -> serde_json::Value {
    let builder = service.builder();
    serde_json::json!({
        "status": "ok",
        "registry_categories": builder.registry().categories(),
        "data_root": builder.data_root().display().to_string(),
        "history_dir": service.snapshots().dir().display().to_string(),
    })
}

pub(crate) fn build_response(
    status: StatusCode,
    response: &TreeResponse,
) -> Result<Response, StatusCode> {
    let bytes = serialize_json(response)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_bytes();

    HttpResponse::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use session_indexer::{MemoryTree, MemoryWriter, NameRegistry, SnapshotWriter, TreeBuilder};
    use session_protocol::TreeNode;

    fn service(tree: MemoryTree, sink: Arc<MemoryWriter>) -> Arc<TreeService> {
        let registry = Arc::new(NameRegistry::new([
            ("user", vec!["user"]),
            ("activity", vec!["walk", "run"]),
            ("data_type", vec!["accel"]),
        ]));
        let builder = TreeBuilder::new(registry, Arc::new(tree), "data");
        Arc::new(TreeService::new(
            builder,
            SnapshotWriter::new("static/history", sink),
            "session_map",
        ))
    }

    fn query(value: Option<&str>) -> TreeQuery {
        TreeQuery {
            starting_class_name: value.map(str::to_string),
        }
    }

    fn layout() -> MemoryTree {
        MemoryTree::new("data")
            .with_file("user_01/walk_01/accel.csv")
            .with_file("user_01/run_01/accel.csv")
    }

    #[tokio::test]
    async fn unsupported_root_is_rejected_before_traversal() {
        let sink = Arc::new(MemoryWriter::new());
        let (status, body) = tree_endpoint(service(layout(), sink.clone()), query(Some("foo"))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.tree, None);
        assert!(body.error_msg.unwrap().contains("foo"));
        assert!(sink.files().is_empty());
    }

    #[tokio::test]
    async fn missing_root_defaults_to_user() {
        let sink = Arc::new(MemoryWriter::new());
        let (status, body) = tree_endpoint(service(layout(), sink.clone()), query(None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.error_msg, None);
        let tree = body.tree.unwrap();
        assert_eq!(tree[0].name, "user");
        assert_eq!(sink.files().len(), 1);
        let name = sink.files().keys().next().unwrap().display().to_string();
        assert!(name.ends_with("_session_map_by_user.md"), "{name}");
    }

    #[tokio::test]
    async fn snapshot_failure_is_500_with_tree() {
        let (status, body) = tree_endpoint(
            service(layout(), Arc::new(MemoryWriter::failing())),
            query(Some("activity")),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.error_msg.is_some());
        let names: Vec<String> = body
            .tree
            .unwrap()
            .into_iter()
            .map(|node: TreeNode| node.name)
            .collect();
        assert_eq!(names, vec!["walk", "run"]);
    }

    #[tokio::test]
    async fn build_failure_is_500_without_tree() {
        let tree = MemoryTree::new("data").with_unreadable("user_01");
        let (status, body) =
            tree_endpoint(service(tree, Arc::new(MemoryWriter::new())), query(Some("user"))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.tree, None);
        assert!(body.error_msg.is_some());
    }

    async fn request(service: Arc<TreeService>, uri: &str) -> (StatusCode, TreeResponse) {
        let uri: axum::http::Uri = uri.parse().unwrap();
        tree_request(service, Query::<TreeQuery>::try_from_uri(&uri)).await
    }

    #[tokio::test]
    async fn query_string_selects_root_by_wire_name() {
        let sink = Arc::new(MemoryWriter::new());
        let (status, body) = request(
            service(layout(), sink.clone()),
            "/get-tree?startingClassName=activity",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<String> = body.tree.unwrap().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["walk", "run"]);
        let name = sink.files().keys().next().unwrap().display().to_string();
        assert!(name.ends_with("_session_map_by_activity.md"), "{name}");
    }

    #[tokio::test]
    async fn bare_path_builds_user_tree() {
        let (status, body) =
            request(service(layout(), Arc::new(MemoryWriter::new())), "/get-tree").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.error_msg, None);
        assert_eq!(body.tree.unwrap()[0].name, "user");
    }

    #[tokio::test]
    async fn unknown_root_in_query_is_400_with_null_tree() {
        let sink = Arc::new(MemoryWriter::new());
        let (status, body) = request(
            service(layout(), sink.clone()),
            "/get-tree?startingClassName=foo",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value =
            serde_json::from_str(&serialize_json(&body).unwrap()).unwrap();
        assert_eq!(json["tree"], serde_json::Value::Null);
        assert!(json["error_msg"].as_str().unwrap().contains("foo"));
        assert!(sink.files().is_empty());
    }

    #[tokio::test]
    async fn malformed_query_still_answers_with_json_envelope() {
        let sink = Arc::new(MemoryWriter::new());
        let (status, body) = request(
            service(layout(), sink.clone()),
            "/get-tree?startingClassName=user&startingClassName=foo",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.tree, None);
        assert!(body.error_msg.unwrap().contains("duplicate field"));
        assert!(sink.files().is_empty());

        let response = build_response(status, &TreeResponse::error("x", None)).unwrap();
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn health_report_describes_configuration() {
        let report = health_report(&service(layout(), Arc::new(MemoryWriter::new())));
        assert_eq!(report["status"], "ok");
        assert_eq!(
            report["registry_categories"],
            serde_json::json!(["activity", "data_type", "user"])
        );
        assert_eq!(report["data_root"], "data");
        assert_eq!(report["history_dir"], "static/history");
    }

    #[test]
    fn response_is_json() {
        let response = build_response(StatusCode::BAD_REQUEST, &TreeResponse::error("x", None)).unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
