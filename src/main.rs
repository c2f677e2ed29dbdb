use anyhow::Context;
use text2sql::{
    agents::Agent,
    api,
    cli::{
        Cli, Commands,
        init::{self, InitConfig, InitResult},
        output::Output,
    },
    db::{DatabaseService, SchemaFormat, seed_sample_data},
    AppConfig, AppState, ConfigLoader,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    // `init` runs before any configuration exists
    if let Some(Commands::Init {
        path,
        force,
        provider,
        host,
        port,
        database_url,
    }) = cli.command
    {
        let result = init::run(
            InitConfig {
                path,
                force,
                provider,
                host,
                port,
                database_url,
            },
            &output,
        );
        return match result {
            InitResult::Success | InitResult::AlreadyExists => Ok(()),
            InitResult::Error(e) => Err(anyhow::anyhow!(e)),
        };
    }

    let (config_path, required) = cli.config_source();
    let mut config = ConfigLoader::new()
        .with_file(&config_path)
        .require_file(required)
        .load()
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    let _log_guard = text2sql::utils::logging::init_logging(&config.logging);

    match cli.command {
        None => serve(config, &output).await,
        Some(Commands::Serve { host, port }) => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config, &output).await
        }
        Some(Commands::Ask {
            question,
            show_plan,
        }) => ask(config, &question, show_plan, &output).await,
        Some(Commands::Schema { format }) => {
            let format: SchemaFormat = format.parse()?;
            let database = DatabaseService::connect(&config.database).await?;
            output.answer(&database.get_schema(format).await?);
            Ok(())
        }
        Some(Commands::Seed) => {
            let database = DatabaseService::connect(&config.database).await?;
            let inserted = seed_sample_data(&database).await?;
            output.success(&format!(
                "Sample data ready in {} ({} rows inserted)",
                config.database.url, inserted
            ));
            Ok(())
        }
        Some(Commands::Init { .. }) => Ok(()),
    }
}

async fn serve(config: AppConfig, output: &Output) -> anyhow::Result<()> {
    let addr = config.bind_address();
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize application state")?;

    output.banner();
    output.kv("address", &format!("http://{}", addr));
    output.kv("database", state.database.database_type());
    output.kv("agents", &state.registry.names().join(", "));

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn ask(
    config: AppConfig,
    question: &str,
    show_plan: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let state = AppState::from_config(config).await?;

    if !show_plan {
        let response = state
            .orchestrator
            .process(&text2sql::types::AgentRequest::new(question))
            .await?;
        if let (true, Some(answer)) = (response.success, response.summary()) {
            output.answer(answer);
            return Ok(());
        }
        anyhow::bail!(response
            .error
            .unwrap_or_else(|| "No answer produced".to_string()));
    }

    let orchestration = state.orchestrator.orchestrate(question).await;

    output.header("Plan");
    output.kv("coordination", &orchestration.plan.coordination_plan);
    for subtask in &orchestration.plan.subtasks {
        output.plan_step(subtask);
    }

    output.header("Results");
    for result in &orchestration.results {
        output.subtask_result(result);
    }

    output.header("Answer");
    output.answer(&orchestration.answer);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
