//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        FfmpegAudioExtractor, InMemorySessionStore, OllamaAnswerAdapter, OpenAiTranscribeAdapter,
        PdfExtractAdapter,
    },
    config::Config,
    error::ApiError,
    files::ensure_upload_dirs,
    web::{jobs::JobRunner, rest::ApiDoc, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Prepare the Upload Directories ---
    ensure_upload_dirs(&config).await?;
    info!(
        pdf = %config.upload_dir_pdf.display(),
        video = %config.upload_dir_video.display(),
        temp = %config.upload_dir_temp.display(),
        "Upload directories ready"
    );

    // --- 3. Initialize Service Adapters ---
    let mut openai_config = OpenAIConfig::new();
    if let Some(key) = config.openai_api_key.as_deref() {
        openai_config = openai_config.with_api_key(key);
    }
    if let Some(base) = config.transcribe_api_base.as_deref() {
        openai_config = openai_config.with_api_base(base);
    }
    let openai_client = Client::with_config(openai_config);

    let transcribe_adapter = Arc::new(OpenAiTranscribeAdapter::new(
        openai_client,
        config.transcribe_model.clone(),
    ));
    let qa_adapter = Arc::new(OllamaAnswerAdapter::new(
        reqwest::Client::new(),
        config.ollama_url.clone(),
        config.answer_model.clone(),
    ));
    let pdf_adapter = Arc::new(PdfExtractAdapter::new());
    let audio_adapter = Arc::new(FfmpegAudioExtractor::new(config.ffmpeg_path.clone()));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store: Arc::new(InMemorySessionStore::new()),
        config: config.clone(),
        jobs: Arc::new(JobRunner::new(config.max_concurrent_jobs)),
        pdf_adapter,
        audio_adapter,
        transcribe_adapter,
        qa_adapter,
    });

    // --- 5. Create the Web Router ---
    let cors = CorsLayer::new()
        .allow_origin(
            format!("http://{}", config.bind_address)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = router(app_state)
        .layer(cors)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
