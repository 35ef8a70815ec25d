// ============================================================
// HTTP API
// ============================================================
// Upload, convert, download. Sessions are keyed by UUID so concurrent
// users never share a "current file"; each request names its session
// explicitly.

use crate::application::use_cases::convert_columns::convert_columns;
use crate::application::use_cases::load_table::{load_table, LoadOutcome};
use crate::domain::error::AppError;
use crate::domain::session::SessionContext;
use crate::domain::source_format::SourceFormat;
use crate::domain::table::ConversionRequest;
use actix_cors::Cors;
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::MultipartForm;
use actix_web::dev::Server;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use uuid::Uuid;

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::storage;

pub struct AppState {
    pub config: AppConfig,
    pub sessions: Mutex<HashMap<Uuid, SessionContext>>,
}

#[derive(Debug, MultipartForm)]
struct UploadForm {
    #[multipart(rename = "file")]
    file: TempFile,
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    session_id: Uuid,
    #[serde(flatten)]
    outcome: LoadOutcome,
}

#[derive(Deserialize)]
struct ConvertPayload {
    session_id: Uuid,
    #[serde(flatten)]
    conversion: ConversionRequest,
}

#[derive(Deserialize)]
struct DownloadQuery {
    session: Uuid,
}

#[post("/upload")]
async fn upload(data: web::Data<AppState>, form: MultipartForm<UploadForm>) -> impl Responder {
    let filename = match form.file.file_name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => return bad_request("Nenhum arquivo enviado"),
    };

    if form.file.size == 0 {
        return bad_request("Arquivo vazio");
    }

    let format = match SourceFormat::from_filename(&filename) {
        Ok(format) => format,
        Err(e) => return error_response(&e),
    };

    let session_id = Uuid::new_v4();
    let session_dir = match storage::ensure_session_dir(&data.config.upload_root, session_id) {
        Ok(dir) => dir,
        Err(e) => return error_response(&AppError::from(e)),
    };

    // The upload keeps a stable name inside its session directory; the
    // original name only survives in the session context.
    let stored_path = session_dir.join(format!("current_file.{}", format.extension()));
    if let Err(e) = fs::copy(form.file.file.path(), &stored_path) {
        return error_response(&AppError::from(e));
    }

    let outcome = match load_table(&stored_path, format, &filename) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(%session_id, error = %e, "upload rejected");
            return error_response(&e);
        }
    };

    tracing::info!(%session_id, filename, header_row = outcome.header_row, "file uploaded");

    let session = SessionContext::new(stored_path, format, filename, outcome.header_row);
    data.sessions.lock().unwrap().insert(session_id, session);

    HttpResponse::Ok().json(UploadResponse {
        success: true,
        session_id,
        outcome,
    })
}

#[post("/convert")]
async fn convert(data: web::Data<AppState>, payload: web::Json<ConvertPayload>) -> impl Responder {
    if !(payload.conversion.divisor > 0.0) {
        return bad_request("Divisor deve ser maior que zero");
    }

    let Some(mut session) = data
        .sessions
        .lock()
        .unwrap()
        .get(&payload.session_id)
        .cloned()
    else {
        return bad_request("Nenhum arquivo carregado.");
    };

    let session_dir = match storage::ensure_session_dir(&data.config.upload_root, payload.session_id)
    {
        Ok(dir) => dir,
        Err(e) => return error_response(&AppError::from(e)),
    };

    match convert_columns(&mut session, &session_dir, &payload.conversion) {
        Ok(outcome) => {
            tracing::info!(
                session_id = %payload.session_id,
                converted = outcome.converted_columns.len(),
                errors = outcome.errors.len(),
                "conversion finished"
            );
            data.sessions
                .lock()
                .unwrap()
                .insert(payload.session_id, session);
            HttpResponse::Ok().json(outcome)
        }
        Err(e) => {
            tracing::error!(session_id = %payload.session_id, error = %e, "conversion failed");
            error_response(&e)
        }
    }
}

#[get("/download")]
async fn download(data: web::Data<AppState>, query: web::Query<DownloadQuery>) -> impl Responder {
    let artifact = data
        .sessions
        .lock()
        .unwrap()
        .get(&query.session)
        .and_then(|session| session.output.clone());

    let Some(artifact) = artifact else {
        return not_found("Nenhum arquivo convertido disponível");
    };

    match fs::read(&artifact.path) {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/octet-stream")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(artifact.filename)],
            })
            .body(bytes),
        Err(e) => {
            tracing::error!(session_id = %query.session, error = %e, "download failed");
            not_found("Nenhum arquivo convertido disponível")
        }
    }
}

fn error_message(err: &AppError) -> &str {
    match err {
        AppError::Internal(m)
        | AppError::NotFound(m)
        | AppError::ValidationError(m)
        | AppError::ParseError(m)
        | AppError::IoError(m) => m,
    }
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = serde_json::json!({ "error": error_message(err) });
    match err {
        AppError::ValidationError(_) | AppError::ParseError(_) => {
            HttpResponse::BadRequest().json(body)
        }
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": message }))
}

pub fn start_server(config: AppConfig) -> std::io::Result<Server> {
    let bind_addr = (config.host.clone(), config.port);
    let state = web::Data::new(AppState {
        config,
        sessions: Mutex::new(HashMap::new()),
    });

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new().wrap(cors).app_data(state.clone()).service(
            web::scope("/api")
                .service(upload)
                .service(convert)
                .service(download),
        )
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, test};

    fn state_with_tempdir(dir: &std::path::Path) -> web::Data<AppState> {
        web::Data::new(AppState {
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                upload_root: dir.to_path_buf(),
            },
            sessions: Mutex::new(HashMap::new()),
        })
    }

    #[actix_web::test]
    async fn convert_without_session_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state_with_tempdir(dir.path()))
                .service(web::scope("/api").service(convert)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/convert")
            .set_json(serde_json::json!({
                "session_id": Uuid::new_v4(),
                "columns": ["Preço"],
                "divisor": 1000.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Nenhum arquivo carregado.");
    }

    #[actix_web::test]
    async fn convert_rejects_non_positive_divisor() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state_with_tempdir(dir.path()))
                .service(web::scope("/api").service(convert)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/convert")
            .set_json(serde_json::json!({
                "session_id": Uuid::new_v4(),
                "columns": ["Preço"],
                "divisor": 0.0
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn download_without_output_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state_with_tempdir(dir.path()))
                .service(web::scope("/api").service(download)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/api/download?session={}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
