use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hisho_gateway::agent::{AgentConfig, ChatClient, SecretaryAgent};
use hisho_gateway::api::{ApiServer, ApiState};
use hisho_gateway::db::{self, SessionRepo, SessionStore};
use hisho_gateway::voice::{SpeechToText, TextToSpeech};
use hisho_gateway::{Config, InteractionHandler, SecretaryTools, TodoList};

/// Hisho - voice secretary web gateway
#[derive(Parser)]
#[command(name = "hisho", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long, env = "HISHO_PORT", default_value = "7860")]
    port: u16,

    /// Data directory (session database)
    #[arg(long, env = "HISHO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Static files directory (web UI)
    #[arg(long, env = "HISHO_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,hisho_gateway=info",
        1 => "info,hisho_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Fails fast when OPENAI_API_KEY is absent, before anything binds
    let config = Config::load(cli.data_dir, cli.static_dir)?;

    tracing::info!(
        port = cli.port,
        data_dir = %config.data_dir.display(),
        "starting hisho gateway"
    );

    std::fs::create_dir_all(&config.data_dir)?;
    let pool = db::init(config.data_dir.join("hisho.db"))?;
    let sessions: Arc<dyn SessionStore> = Arc::new(SessionRepo::new(pool.clone()));

    let todos = TodoList::new();
    let tools = SecretaryTools::new(todos.clone());

    let transcriber = SpeechToText::new(config.api_key.clone(), config.voice.stt_model.clone())?;
    let synthesizer = TextToSpeech::new(config.api_key.clone(), config.voice.tts_model.clone())?;

    let agent = SecretaryAgent::new(
        ChatClient::new(config.api_key.clone())?,
        tools,
        Arc::clone(&sessions),
        AgentConfig {
            session_key: config.session_key.clone(),
            instructions: hisho_gateway::persona::SECRETARY_INSTRUCTIONS.to_string(),
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            max_iterations: config.llm.max_iterations,
        },
    );

    let handler = InteractionHandler::new(
        Arc::new(transcriber),
        Arc::new(synthesizer),
        Arc::new(agent),
        sessions,
        todos,
        config.session_key.clone(),
    );

    let state = Arc::new(ApiState {
        db: pool,
        handler: Arc::new(handler),
    });

    ApiServer::new(state, cli.port, config.static_dir)
        .run()
        .await?;

    Ok(())
}
