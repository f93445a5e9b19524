use std::env;

use serde_json::{Map, Value};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    bridge::{InboundEvent, StdioTransport},
    data_backend::openmensa_parser::MenuClient,
    db_operations::ConfigStore,
    errors::BridgeError,
    session::{Session, SessionEvent},
};

/// Host envelope for the settings page response, next to the watch keys.
pub const SETTINGS_KEY: &str = "settings";

pub fn logger_init(module_path: &str) {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .filter_module(
            module_path,
            if env::var(pretty_env_logger::env_logger::DEFAULT_FILTER_ENV).unwrap_or_default()
                == "debug"
            {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
        )
        .init();
}

/// One line from the host: either a watch message or a settings response.
pub fn parse_host_line(line: &str) -> Result<SessionEvent, BridgeError> {
    let dict: Map<String, Value> = serde_json::from_str(line)?;

    match dict.get(SETTINGS_KEY) {
        Some(Value::String(response)) => Ok(SessionEvent::SettingsSaved(response.clone())),
        Some(response) => Ok(SessionEvent::SettingsSaved(response.to_string())),
        None => InboundEvent::decode(&dict).map(SessionEvent::Inbound),
    }
}

/// Feeds host lines into the session until the reader ends, then asks the
/// session to stop.
pub async fn forward_host_lines<R: AsyncBufRead + Unpin>(
    reader: R,
    events_tx: mpsc::Sender<SessionEvent>,
) {
    let mut lines = reader.lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match parse_host_line(&line) {
                Ok(event) => {
                    if events_tx.send(event).await.is_err() {
                        return;
                    }
                }
                Err(e) => log::warn!("dropping message {:?}: {}", line, e),
            },
            Ok(None) => break,
            Err(e) => {
                log::error!("reading watch link failed: {}", e);
                break;
            }
        }
    }

    if events_tx.send(SessionEvent::Shutdown).await.is_err() {
        log::debug!("session already stopped");
    }
}

/// Runs one session with the watch link on stdin/stdout.
pub async fn run_stdio_session(config: ConfigStore, client: MenuClient) {
    let (events_tx, events_rx) = mpsc::channel(16);

    {
        let events_tx = events_tx.clone();
        tokio::spawn(async move {
            forward_host_lines(BufReader::new(tokio::io::stdin()), events_tx).await;
        });
    }

    Session::new(config, client, StdioTransport::stdout(), events_tx)
        .run(events_rx)
        .await;
}
