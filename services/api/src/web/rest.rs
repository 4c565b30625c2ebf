//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the HTTP endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{protocol::PostView, state::AppState};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use hunt_core::domain::NewPost;
use std::sync::Arc;
use tracing::{debug, error, info};
use utoipa::OpenApi;
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        admin_handler,
        wp_admin_handler,
        upload_post_handler,
    ),
    components(
        schemas(PostView)
    ),
    tags(
        (
            name = "Treasure Hunt API",
            description = "Treasure hunt HTTP endpoints. Gameplay runs over the /ws socket."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Static Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Nothing to see here", body = String))
)]
pub async fn root_handler() -> impl IntoResponse {
    (StatusCode::OK, "hé non!")
}

#[utoipa::path(
    get,
    path = "/admin",
    responses((status = 200, description = "Not the admin", body = String))
)]
pub async fn admin_handler() -> impl IntoResponse {
    (StatusCode::OK, "dommage!")
}

#[utoipa::path(
    get,
    path = "/wp-admin",
    responses((status = 200, description = "Not WordPress", body = String))
)]
pub async fn wp_admin_handler() -> impl IntoResponse {
    (StatusCode::OK, "wordpress, c'est la hess")
}

//=========================================================================================
// Upload Handler
//=========================================================================================

/// Upload the two renditions of a post image.
///
/// Accepts a multipart/form-data request with the file parts `lowResImg` and
/// `highResImg`, and a text part `idQuestions` holding comma-separated question ids.
#[utoipa::path(
    post,
    path = "/getBothImgs",
    request_body(
        content_type = "multipart/form-data",
        description = "Both image files and the question ids."
    ),
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 400, description = "Bad request (e.g., missing part or malformed id)"),
        (status = 401, description = "Missing or wrong admin key"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_post_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut low_res: Option<UploadedFile> = None;
    let mut high_res: Option<UploadedFile> = None;
    let mut id_questions: Option<Vec<Uuid>> = None;

    // 1. Read every part into memory; nothing touches the disk yet
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "lowResImg" | "highResImg" => {
                let file_name = sanitize_file_name(field.file_name()).ok_or_else(|| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Part '{}' must carry a file name", name),
                    )
                })?;
                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;

                let file = UploadedFile { file_name, data };
                if name == "lowResImg" {
                    low_res = Some(file);
                } else {
                    high_res = Some(file);
                }
            }
            "idQuestions" => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read idQuestions: {}", e),
                    )
                })?;
                let ids = parse_id_list(&text).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
                id_questions = Some(ids);
            }
            other => debug!("Ignoring multipart part '{}'", other),
        }
    }

    // 2. Validate the whole form
    let (Some(low_res), Some(high_res), Some(id_questions)) = (low_res, high_res, id_questions)
    else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Multipart form must include lowResImg, highResImg and idQuestions".to_string(),
        ));
    };

    // 3. Store both renditions
    for file in [&low_res, &high_res] {
        let path = app_state.config.upload_dir.join(&file.file_name);
        tokio::fs::write(&path, &file.data).await.map_err(|e| {
            error!("Failed to write upload to {}: {:?}", path.display(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to store file".to_string(),
            )
        })?;
    }

    let post = app_state
        .repo
        .create_post(NewPost {
            id_questions,
            source_low_res: low_res.file_name,
            source_high_res: high_res.file_name,
        })
        .await
        .map_err(|e| {
            error!("Failed to create post: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create post".to_string(),
            )
        })?;

    info!("Files stored. Post {} created.", post.id);
    Ok((StatusCode::CREATED, Json(PostView::from(post))))
}

/// One image part, held in memory until the whole form has been validated.
struct UploadedFile {
    file_name: String,
    data: Bytes,
}

/// Keeps only the last path component of a client-supplied file name.
fn sanitize_file_name(raw: Option<&str>) -> Option<String> {
    let base = raw?.rsplit(['/', '\\']).next()?.trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, String> {
    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            Uuid::parse_str(id).map_err(|_| format!("'{}' is not a valid question id", id))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if ids.is_empty() {
        return Err("idQuestions must name at least one question".to_string());
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_lose_their_directories() {
        assert_eq!(sanitize_file_name(Some("map.jpg")).as_deref(), Some("map.jpg"));
        assert_eq!(sanitize_file_name(Some("../../etc/passwd")).as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name(Some("C:\\tmp\\map.jpg")).as_deref(), Some("map.jpg"));
        assert_eq!(sanitize_file_name(Some("imgs/..")), None);
        assert_eq!(sanitize_file_name(Some("")), None);
        assert_eq!(sanitize_file_name(None), None);
    }

    #[test]
    fn id_list_is_comma_separated() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(parse_id_list(&format!("{}, {},", a, b)), Ok(vec![a, b]));
        assert!(parse_id_list("").is_err());
        assert!(parse_id_list("abc").is_err());
    }
}
