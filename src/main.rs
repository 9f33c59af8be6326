//! Research assistant HTTP server entry point.

use std::process::ExitCode;
use std::sync::Arc;

use research_assistant::{
    init_tracing, research_toolkit, serve, Agent, AppConfig, AppState, GeminiClient,
    LanguageModel, Result, TelemetryConfig,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration comes first: without a credential nothing may bind.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            init_tracing(&TelemetryConfig::default());
            error!(error = %err, "invalid configuration, refusing to start");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(&config.telemetry);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "research assistant stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AppConfig) -> Result<()> {
    let model = Arc::new(GeminiClient::from_config(&config.model)?);
    info!(
        model = model.model(),
        max_steps = config.agent.max_steps,
        timeout_secs = config.model.timeout_secs,
        "loaded configuration"
    );

    let tools = research_toolkit(Arc::clone(&model) as Arc<dyn LanguageModel>);
    let agent = Agent::new(model, tools).with_max_steps(config.agent.max_steps);
    let state =
        AppState::new(Arc::new(agent)).with_error_details(config.server.expose_error_details);

    serve(&config.server, state).await
}
