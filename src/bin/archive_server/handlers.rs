use super::*;

#[derive(Debug, serde::Deserialize)]
pub(super) struct ArchiveQuery {
    sha: Option<String>,
}

pub(super) async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub(super) async fn require_bearer(
    State(state): State<Arc<AppState>>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let Some(expected) = state.token.as_deref() else {
        return next.run(req).await;
    };

    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return unauthorized();
    };
    let Ok(value) = value.to_str() else {
        return unauthorized();
    };
    let Some(token) = value.strip_prefix("Bearer ") else {
        return unauthorized();
    };
    if token != expected {
        return unauthorized();
    }

    next.run(req).await
}

pub(super) async fn get_archive(
    State(state): State<Arc<AppState>>,
    Path(project): Path<String>,
    Query(q): Query<ArchiveQuery>,
) -> Response {
    let sha = q.sha.unwrap_or_else(|| "main".to_string());
    if !is_plain_component(&project) || !is_plain_component(&sha) {
        return bad_request("project and sha must be plain path components");
    }

    if state
        .fail_remaining
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        warn!(project = %project, sha = %sha, "injected failure");
        return unavailable();
    }

    let project_dir = state.data_dir.join(&project);
    if !project_dir.is_dir() {
        return not_found("Project");
    }
    let revision_dir = project_dir.join(&sha);
    if !revision_dir.is_dir() {
        return not_found("File");
    }

    let wrapper = format!("{}-{}", project, sha);
    let packed = tokio::task::spawn_blocking(move || {
        treefetch::pack::pack_dir_to_vec(&revision_dir, &wrapper)
    })
    .await;
    let bytes = match packed {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(err)) => return internal_error(err.into()),
        Err(err) => return internal_error(anyhow::anyhow!("pack task failed: {}", err)),
    };

    info!(project = %project, sha = %sha, bytes = bytes.len(), "serving archive");
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}-{}.tar.gz\"", project, sha),
            ),
        ],
        axum::body::Bytes::from(bytes),
    )
        .into_response()
}

fn is_plain_component(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.contains(['/', '\\'])
        && !s.chars().any(char::is_control)
}
