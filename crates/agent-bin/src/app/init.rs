//! Agent initialization.

use super::faults::{install_panic_hook, FaultReporter, FaultSink};
use agent_config_and_utils::{parse_level, Config, CoreError, Paths};
use credential_store::FileCredentialStore;
use operator_channel::{
    poll_operator_messages, TelegramClient, TelegramOperator, TelegramResult,
};
use process_controller::ShellProcessController;
use session_supervisor::{spawn_supervisor, ConnectionEvent, Ports, SupervisorSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use transport_bridge::{connect_with_retry, EventSink};

const BRIDGE_CONNECT_RETRIES: u32 = 10;
const BRIDGE_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Run the agent until a shutdown signal arrives.
pub async fn run_agent(config: Config, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    paths.ensure_dirs()?;

    info!("Starting session-warden");
    info!(
        telegram_token = %config.redacted_token(),
        telegram_chat_id = ?config.telegram_chat_id,
        restart_command = %config.restart_command,
        base_dir = %paths.base_dir().display(),
        "Configuration loaded"
    );

    let (token, chat_id) = operator_credentials(&config)?;
    let telegram = TelegramClient::new(config.telegram_api_base()?.as_str(), token)?;
    verify_bot_token(&telegram).await?;
    let operator = TelegramOperator::new(telegram.clone(), chat_id);

    let credentials = FileCredentialStore::new(config.credentials_dir(&paths));
    info!(path = %credentials.dir().display(), "Credential store ready");

    let process = ShellProcessController::new(
        config.restart_command.clone(),
        Duration::from_secs(config.restart_timeout_secs),
    );

    let socket_path = config.transport_socket(&paths);
    let (bridge, reader) = connect_with_retry(
        &socket_path,
        Duration::from_secs(config.transport_command_timeout_secs),
        BRIDGE_CONNECT_RETRIES,
        BRIDGE_RETRY_DELAY,
    )
    .await?;
    info!(path = %socket_path.display(), "Transport bridge connected");

    let ports = Ports {
        transport: Arc::new(bridge.clone()),
        credentials: Arc::new(credentials),
        operator: Arc::new(operator),
        process: Arc::new(process),
    };
    let settings = SupervisorSettings {
        confirm_token: config.confirm_token.clone(),
        main_command: config.main_command.clone(),
    };
    let (handle, supervisor_task) = spawn_supervisor(ports, settings);

    let sink: Arc<dyn FaultSink> = Arc::new(handle.clone());
    install_panic_hook(Arc::clone(&sink));
    let reporter = FaultReporter::new(sink);

    let events = handle.clone();
    let event_sink: EventSink =
        Arc::new(move |event: ConnectionEvent| events.connection_event(event).is_ok());
    bridge.set_event_sink(Arc::clone(&event_sink));
    reporter.spawn("transport bridge reader", async move {
        reader.run(move |event| event_sink(event)).await
    });

    let texts = handle.clone();
    let poll_timeout_secs = config.telegram_poll_timeout_secs;
    reporter.spawn("operator poller", async move {
        let result = poll_operator_messages(telegram, chat_id, poll_timeout_secs, move |text| {
            texts.operator_text(text).is_ok()
        })
        .await;
        operator_poller_exit(result)
    });

    handle.start()?;

    tokio::select! {
        _ = shutdown_signal() => {
            info!("Received shutdown signal, exiting...");
        }
        _ = supervisor_task => {
            warn!("Session supervisor stopped unexpectedly");
        }
    }

    Ok(())
}

/// Validate the configuration and print what the agent would run with.
pub fn check_config(config: &Config, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    println!("Configuration OK");
    println!("  config file:        {}", paths.config_file().display());
    println!("  telegram token:     {}", config.redacted_token());
    if let Some(chat_id) = config.telegram_chat_id {
        println!("  telegram chat id:   {}", chat_id);
    }
    println!("  log level:          {}", parse_level(&config.log_level));
    println!("  restart command:    {}", config.restart_command);
    println!("  transport socket:   {}", config.transport_socket(paths).display());
    println!("  credentials dir:    {}", config.credentials_dir(paths).display());
    println!("  log file:           {}", paths.log_file().display());
    Ok(())
}

/// Fail startup on a token the Bot API refuses. Network trouble is only logged.
async fn verify_bot_token(client: &TelegramClient) -> Result<(), CoreError> {
    match client.get_me().await {
        Ok(bot) => {
            info!(bot_id = bot.id, username = ?bot.username, "Telegram bot token accepted");
            Ok(())
        }
        Err(e) if e.is_rejected_token() => Err(CoreError::Config(format!(
            "Telegram rejected the bot token: {}",
            e
        ))),
        Err(e) => {
            warn!(error = %e, "Could not verify Telegram bot token; continuing");
            Ok(())
        }
    }
}

/// A token revoked while running stops the poller. That is an operator
/// channel problem, not a session fault, so it is logged instead of reported.
fn operator_poller_exit(result: TelegramResult<()>) -> TelegramResult<()> {
    match result {
        Err(e) if e.is_rejected_token() => {
            error!(
                error = %e,
                "Telegram rejected the bot token; operator commands are unavailable until restart"
            );
            Ok(())
        }
        other => other,
    }
}

fn operator_credentials(config: &Config) -> Result<(String, i64), CoreError> {
    match (config.telegram_token.clone(), config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => Ok((token, chat_id)),
        _ => Err(CoreError::Config(
            "telegram_token and telegram_chat_id are required".to_string(),
        )),
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Could not install SIGTERM handler; waiting for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
