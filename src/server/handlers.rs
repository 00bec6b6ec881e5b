use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use futures::stream::{self, Stream};
use serde::Deserialize;
use tempfile::TempPath;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::pipeline::{video_extension, SourceVideo, DOWNLOAD_FILE_NAME};
use crate::server::pages;
use crate::server::state::AppState;
use crate::speech::Language;

const STREAM_CHUNK_BYTES: usize = 64 * 1024;

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Html(pages::error_page(message))).into_response()
}

pub async fn index_handler() -> Html<String> {
    Html(pages::upload_form())
}

pub async fn health_handler() -> &'static str {
    "ok"
}

/// Streams the video field to a staging file under the work root.
async fn stage_upload(state: &AppState, mut field: Field<'_>, file_name: &str) -> Result<TempPath, Response> {
    let staged = state.pipeline.staging_file().await.map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("Could not accept the uploaded video: {}", e.detail()))
    })?;
    let io_failure = |e: std::io::Error| {
        log::warn!("Cannot write upload {}: {}", file_name, e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, "Could not accept the uploaded video: cannot store the upload")
    };

    let mut file = tokio::fs::File::create(&staged).await.map_err(io_failure)?;
    let mut received = 0usize;
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                received += chunk.len();
                file.write_all(&chunk).await.map_err(io_failure)?;
            }
            Ok(None) => break,
            Err(e) => {
                log::warn!("Upload of {} interrupted: {}", file_name, e);
                return Err(error_response(e.status(), &format!("Could not read the upload: {}", e.body_text())));
            }
        }
    }
    file.flush().await.map_err(io_failure)?;

    log::debug!("Staged {} ({} bytes)", file_name, received);
    Ok(staged)
}

pub async fn process_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, TempPath)> = None;
    let mut language = Language::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Rejected upload: {}", e);
                return error_response(e.status(), &format!("Could not read the upload: {}", e.body_text()));
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if let Err(e) = video_extension(&file_name) {
                    return error_response(StatusCode::BAD_REQUEST, &format!("Could not accept the uploaded video: {}", e.detail()));
                }
                match stage_upload(&state, field, &file_name).await {
                    Ok(staged) => upload = Some((file_name, staged)),
                    Err(response) => return response,
                }
            }
            "language" => {
                let value = match field.text().await {
                    Ok(value) => value,
                    Err(e) => return error_response(e.status(), &e.body_text()),
                };
                language = match value.parse() {
                    Ok(language) => language,
                    Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.detail()),
                };
            }
            other => log::debug!("Ignoring form field '{}'", other),
        }
    }

    let Some((file_name, file)) = upload else {
        return error_response(StatusCode::BAD_REQUEST, "Please upload a video file.");
    };
    log::info!("Received {}, voice language {}", file_name, language);

    match state.pipeline.run(SourceVideo::Staged { file_name, file }, language).await {
        Ok(output) => Html(pages::result_page(&output)).into_response(),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_response(status, &e.user_message())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputQuery {
    pub download: Option<String>,
}

impl OutputQuery {
    fn wants_attachment(&self) -> bool {
        matches!(self.download.as_deref(), Some("1") | Some("true") | Some(""))
    }
}

pub async fn output_handler(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<OutputQuery>,
) -> Response {
    let Some(path) = state.outputs().path_for(&run_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            log::error!("Cannot open {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            log::error!("Cannot stat {}: {}", path.display(), e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let disposition = if query.wants_attachment() { "attachment" } else { "inline" };
    (
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::CONTENT_DISPOSITION, format!("{}; filename=\"{}\"", disposition, DOWNLOAD_FILE_NAME)),
        ],
        Body::from_stream(file_chunks(file)),
    )
        .into_response()
}

/// Reads a file as a stream of fixed-size chunks.
fn file_chunks(file: tokio::fs::File) -> impl Stream<Item = std::io::Result<Vec<u8>>> + Send + 'static {
    stream::try_unfold(file, |mut file| async move {
        let mut buffer = vec![0u8; STREAM_CHUNK_BYTES];
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buffer.truncate(read);
        Ok(Some((buffer, file)))
    })
}
