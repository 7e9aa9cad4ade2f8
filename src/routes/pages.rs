use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tera::Context;

use crate::render::{self, Certificate};
use crate::state::AppState;

pub async fn index() -> impl IntoResponse {
    let tera = crate::templates::get();
    let rendered = tera
        .render("index.html", &Context::new())
        .unwrap_or_else(|_| "Template error: index.html".to_string());
    Html(rendered)
}

#[derive(Deserialize)]
pub struct CertificateForm {
    pub name: Option<String>,
    pub course: Option<String>,
    pub date: Option<String>,
    pub job: Option<String>,
}

/// Renders the certificate and streams it back as a download. The Drive
/// copy is spawned off after the response body is built; its failure is
/// logged and never surfaces to the caller.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CertificateForm>,
) -> Response {
    let required = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let (Some(name), Some(course), Some(date)) = (
        required(&form.name),
        required(&form.course),
        required(&form.date),
    ) else {
        return Redirect::to("/").into_response();
    };

    let cert = Certificate {
        name,
        course,
        date,
        job: form.job,
    };

    let png = match render::render_certificate(&state.config, &cert) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("certificate render failed: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "certificate rendering failed")
                .into_response();
        }
    };

    match &state.uploader {
        Some(uploader) => {
            let uploader = uploader.clone();
            let filename = format!("certificate_{}_{}.png", cert.name, cert.course);
            let bytes = png.clone();
            tokio::spawn(async move {
                match uploader.upload(bytes, &filename).await {
                    Ok(file) => tracing::info!(
                        id = %file.id,
                        link = file.web_view_link.as_deref().unwrap_or("-"),
                        "certificate copy uploaded"
                    ),
                    Err(e) => tracing::error!("certificate upload failed: {e}"),
                }
            });
        }
        None => tracing::debug!("no uploader configured; skipping Drive copy"),
    }

    Response::builder()
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CONTENT_DISPOSITION,
            "attachment; filename=certificate.png",
        )
        .body(axum::body::Body::from(png))
        .unwrap()
        .into_response()
}
