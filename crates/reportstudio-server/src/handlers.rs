//! HTTP handlers.
//!
//! JSON in, JSON out, except the two render endpoints which return binary
//! documents with an attachment disposition. Rendering is CPU-bound and
//! runs on a blocking thread; everything else is thin I/O around the LLM
//! client and the settings store.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use genpdf::fonts::{FontData, FontFamily};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{info, warn};

use reportstudio_engine::docx::DocxBackend;
use reportstudio_engine::pdf::PdfBackend;
use reportstudio_engine::{assembly, markdown, RenderRequest};

use crate::config::SettingsStore;
use crate::error::{ApiError, Result};
use crate::llm::{ChatParams, LlmClient, LlmError, Provider};
use crate::mermaid;
use crate::prompts::{self, MERMAID_SYSTEM_PROMPT};

const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<RwLock<SettingsStore>>,
    pub llm: LlmClient,
    /// Loaded once at startup; `None` disables PDF output.
    pub pdf_fonts: Option<FontFamily<FontData>>,
    pub mono_fonts: Option<FontFamily<FontData>>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub pdf_enabled: bool,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        pdf_enabled: state.pdf_fonts.is_some(),
    })
}

async fn active_provider(state: &AppState) -> (Provider, String, Option<String>) {
    let settings = state.settings.read().await;
    let provider = settings.active_provider();
    (
        provider,
        settings.base_url(provider),
        settings.api_key(provider),
    )
}

#[derive(Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// POST /api/generate — natural-language prompt to Mermaid source.
pub async fn generate_diagram(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<serde_json::Value>> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }

    let (provider, base_url, api_key) = active_provider(&state).await;

    let raw = match provider {
        Provider::Ollama => {
            let model = body
                .model
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(provider.default_model());
            let prompt = format!("{MERMAID_SYSTEM_PROMPT}\n\nDescription: {}", body.prompt);
            state
                .llm
                .generate_ollama(&base_url, model, &prompt)
                .await?
        }
        _ => {
            if api_key.is_none() {
                return Err(LlmError::MissingApiKey(provider.as_str()).into());
            }
            let model = body
                .model
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(provider.default_model());
            state
                .llm
                .chat(
                    &base_url,
                    api_key.as_deref(),
                    ChatParams {
                        model,
                        system: MERMAID_SYSTEM_PROMPT,
                        user: &format!("Description: {}", body.prompt),
                        temperature: 0.1,
                        max_tokens: 2000,
                    },
                )
                .await?
        }
    };

    let code = mermaid::strip_fence(&raw);
    if !mermaid::is_valid_mermaid(&code) {
        warn!(provider = provider.as_str(), "response contained no Mermaid code");
        return Err(ApiError::InvalidContent(
            "invalid response: no Mermaid code detected".to_string(),
        ));
    }

    info!(provider = provider.as_str(), "diagram generated");
    Ok(Json(json!({ "mermaid": code })))
}

#[derive(Deserialize)]
pub struct ReportBody {
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub meta: ReportMeta,
}

fn default_template() -> String {
    "client_formal".to_string()
}

#[derive(Deserialize, Default)]
pub struct ReportMeta {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub participants: Option<String>,
}

/// POST /api/generate-report — raw meeting notes to structured Markdown.
pub async fn generate_report(
    State(state): State<AppState>,
    Json(body): Json<ReportBody>,
) -> Result<Json<serde_json::Value>> {
    if body.notes.trim().is_empty() {
        return Err(ApiError::BadRequest("notes are required".to_string()));
    }
    let template = prompts::find_template(&body.template).ok_or_else(|| {
        ApiError::BadRequest(format!("unknown template: {}", body.template))
    })?;

    let (provider, base_url, api_key) = active_provider(&state).await;
    if provider.requires_api_key() && api_key.is_none() {
        return Err(LlmError::MissingApiKey(provider.as_str()).into());
    }

    // Temporal context so the model can resolve relative dates.
    let now = Local::now();
    let mut user_prompt = format!(
        "TEMPORAL CONTEXT: today is {} (year {}).\n\n",
        now.format("%d/%m/%Y"),
        now.format("%Y")
    );
    if let Some(participants) = body.meta.participants.as_deref().filter(|p| !p.is_empty()) {
        user_prompt.push_str(&format!("Participants: {participants}\n\n"));
    }
    if let Some(date) = body.meta.date.as_deref().filter(|d| !d.is_empty()) {
        user_prompt.push_str(&format!("Meeting date: {date}\n\n"));
    }
    user_prompt.push_str(&format!("Meeting notes:\n\n{}", body.notes));

    let raw = state
        .llm
        .chat(
            &provider.chat_base(&base_url),
            api_key.as_deref(),
            ChatParams {
                model: provider.default_model(),
                system: template.system_prompt,
                user: &user_prompt,
                temperature: 0.3,
                max_tokens: 3000,
            },
        )
        .await?;

    let report = markdown::extract_markdown(&raw);
    info!(provider = provider.as_str(), template = template.id, "report generated");
    Ok(Json(json!({ "report": report })))
}

/// GET /api/ai/models — models for the active provider.
pub async fn get_ai_models(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let (provider, base_url, api_key) = active_provider(&state).await;
    if provider.requires_api_key() && api_key.is_none() {
        return Err(LlmError::MissingApiKey(provider.as_str()).into());
    }
    let models = state
        .llm
        .list_models(provider, &base_url, api_key.as_deref())
        .await?;
    info!(provider = provider.as_str(), count = models.len(), "models listed");
    Ok(Json(json!({ "models": models, "provider": provider.as_str() })))
}

#[derive(Deserialize)]
pub struct ProviderSettingsBody {
    pub provider: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// POST /api/ai/test — probe a provider with explicit settings.
pub async fn test_ai_provider(
    State(state): State<AppState>,
    Json(body): Json<ProviderSettingsBody>,
) -> Result<Json<serde_json::Value>> {
    let provider = parse_provider(&body.provider)?;
    let base_url = effective_base_url(provider, &body.base_url);
    let api_key = Some(body.api_key.as_str()).filter(|k| !k.trim().is_empty());

    let models = state.llm.list_models(provider, &base_url, api_key).await?;
    info!(provider = provider.as_str(), count = models.len(), "provider probe succeeded");
    Ok(Json(json!({ "success": true, "models": models })))
}

/// POST /api/ai/settings — persist provider settings and make it active.
pub async fn save_ai_settings(
    State(state): State<AppState>,
    Json(body): Json<ProviderSettingsBody>,
) -> Result<Json<serde_json::Value>> {
    let provider = parse_provider(&body.provider)?;
    let base_url = effective_base_url(provider, &body.base_url);

    let mut settings = state.settings.write().await;
    settings.set_base_url(provider, &base_url);
    settings.set_api_key(provider, body.api_key.trim());
    settings.set_active_provider(provider);
    settings
        .save()
        .map_err(|err| ApiError::Internal(format!("saving settings failed: {err}")))?;

    info!(provider = provider.as_str(), "provider settings saved");
    Ok(Json(json!({
        "success": true,
        "provider": provider.as_str(),
        "base_url": base_url,
    })))
}

/// GET /api/settings — active provider configuration, key presence only.
pub async fn get_settings(State(state): State<AppState>) -> Json<serde_json::Value> {
    let settings = state.settings.read().await;
    let provider = settings.active_provider();
    Json(json!({
        "active_provider": provider.as_str(),
        "base_url": settings.base_url(provider),
        "has_api_key": settings.api_key(provider).is_some(),
    }))
}

#[derive(Deserialize)]
pub struct RenderBody {
    #[serde(default)]
    pub project: RenderRequest,
}

/// POST /api/generate-pdf
pub async fn generate_pdf(
    State(state): State<AppState>,
    Json(body): Json<RenderBody>,
) -> Result<Response> {
    let fonts = state.pdf_fonts.clone().ok_or_else(|| {
        ApiError::Internal("PDF fonts are not available; check --fonts-dir".to_string())
    })?;
    let mono = state.mono_fonts.clone();

    let project = body.project;
    let filename = assembly::output_filename(&project.config.title, "pdf");

    let bytes = tokio::task::spawn_blocking(move || {
        let mut backend = PdfBackend::new(&project.config, fonts, mono);
        assembly::render_document(&project, &mut backend);
        backend.finish()
    })
    .await
    .map_err(|err| ApiError::Internal(format!("render task failed: {err}")))??;

    info!(%filename, size = bytes.len(), "PDF generated");
    Ok(attachment(bytes, "application/pdf", &filename))
}

/// POST /api/generate-docx
pub async fn generate_docx(
    State(_state): State<AppState>,
    Json(body): Json<RenderBody>,
) -> Result<Response> {
    let project = body.project;
    let filename = assembly::output_filename(&project.config.title, "docx");

    let bytes = tokio::task::spawn_blocking(move || {
        let mut backend = DocxBackend::new(&project.config);
        assembly::render_document(&project, &mut backend);
        backend.finish()
    })
    .await
    .map_err(|err| ApiError::Internal(format!("render task failed: {err}")))??;

    info!(%filename, size = bytes.len(), "DOCX generated");
    Ok(attachment(bytes, DOCX_MIME, &filename))
}

fn parse_provider(value: &str) -> Result<Provider> {
    Provider::parse(value)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown provider: {value}")))
}

fn effective_base_url(provider: Provider, requested: &str) -> String {
    let requested = requested.trim().trim_end_matches('/');
    if requested.is_empty() {
        provider.default_base_url().to_string()
    } else {
        requested.to_string()
    }
}

fn attachment(bytes: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
