//! Main Entrypoint for the Interview API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading prompt templates.
//! 3. Initializing shared services (the completion client and question bank).
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use interview_api::{
    config::{Config, QuestionSource},
    results::ResultStore,
    router::create_router,
    state::AppState,
};
use interview_core::{
    curriculum::{LlmQuestionBank, QuestionBank},
    llm_client::OpenAICompatibleClient,
};
use std::{collections::HashMap, fs, net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

/// A helper function to load prompts from a directory.
fn load_prompts(prompts_path: &std::path::Path) -> anyhow::Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    for entry in std::fs::read_dir(prompts_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load Prompts ---
    let prompts = load_prompts(&config.prompts_path).with_context(|| {
        format!(
            "Failed to read prompts from {}",
            config.prompts_path.display()
        )
    })?;
    let persona = prompts.get("interviewer_persona").cloned();
    if persona.is_none() {
        info!("No interviewer_persona.md found; using the built-in persona.");
    }

    // --- 4. Initialize Shared Services ---
    let mut openai_config = OpenAIConfig::new().with_api_key(&config.openai_api_key);
    if let Some(api_base) = &config.openai_api_base {
        openai_config = openai_config.with_api_base(api_base);
    }

    let question_bank: Option<Arc<dyn QuestionBank>> = match config.question_source {
        QuestionSource::Llm => {
            if !prompts.contains_key("generate_questions") {
                warn!("generate_questions.md not found; falling back to open questions.");
            }
            Some(Arc::new(LlmQuestionBank::new(
                openai_config.clone(),
                config.chat_model.clone(),
                prompts,
            )))
        }
        QuestionSource::None => None,
    };

    let app_state = Arc::new(AppState {
        completion: Arc::new(OpenAICompatibleClient::new(
            openai_config,
            config.chat_model.clone(),
        )),
        question_bank,
        results: Arc::new(ResultStore::new()),
        persona,
        config: Arc::new(config.clone()),
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        model = %config.chat_model,
        question_source = ?config.question_source,
        question_count = config.orchestrator.question_count,
        completion_policy = ?config.orchestrator.completion_policy,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
