use std::future::Future;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use facilmap_client::events::EVENT_NAMES;
use facilmap_client::types::{Bbox, BboxWithZoom, ExportFormat, FindPadsQuery, GetPadQuery, LineExportRequest};
use facilmap_client::{Client, ClientConfig, ClientError, ClientEvent, EventName, ProtocolVersion, ReconnectPolicy};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("gave up reconnecting to {0}")]
    ReconnectFailed(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "facilmap", about = "FacilMap realtime client")]
struct Cli {
    #[arg(long, env = "FACILMAP_SERVER", default_value = "https://facilmap.org/")]
    server: String,

    #[arg(long, env = "FACILMAP_PROTOCOL", default_value = "v3")]
    protocol: ProtocolVersion,

    #[arg(long, env = "FACILMAP_RECONNECT_ATTEMPTS", help = "Give up after this many reconnect attempts")]
    reconnect_attempts: Option<u32>,

    #[arg(long, default_value_t = 30, help = "Seconds to wait for one-shot requests")]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Attach to a pad and print every change as a JSON line.
    Watch(WatchArgs),
    /// Look up a pad by id.
    GetPad { pad_id: String },
    /// Search public pads.
    FindPads {
        query: String,
        #[arg(long)]
        start: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print the server's guess of this client's location.
    Geoip,
    /// Export one line of a pad.
    ExportLine(ExportLineArgs),
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, env = "FACILMAP_PAD_ID")]
    pad_id: Option<String>,

    #[arg(long, value_parser = parse_bbox, help = "top,bottom,left,right")]
    bbox: Option<Bbox>,

    #[arg(long, default_value_t = 10)]
    zoom: u32,

    #[arg(long, default_value_t = false)]
    history: bool,
}

#[derive(Args, Debug)]
struct ExportLineArgs {
    #[arg(long, env = "FACILMAP_PAD_ID")]
    pad_id: String,

    line_id: u64,

    #[arg(long, default_value = "gpx", value_parser = parse_export_format)]
    format: ExportFormat,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::new(cli.server)
        .with_protocol(cli.protocol)
        .with_reconnect(ReconnectPolicy { max_attempts: cli.reconnect_attempts, ..ReconnectPolicy::default() });
    let limit = Duration::from_secs(cli.timeout);

    match cli.command {
        Command::Watch(args) => {
            if let Some(pad_id) = &args.pad_id {
                config = config.with_pad_id(pad_id.clone());
            }
            run_watch(config, args).await
        }
        Command::GetPad { pad_id } => {
            let client = Client::connect(config)?;
            let pad = within(limit, client.get_pad(GetPadQuery { map_id: pad_id })).await?;
            finish(&client, &pad)
        }
        Command::FindPads { query, start, limit: page } => {
            let client = Client::connect(config)?;
            let found = within(limit, client.find_pads(FindPadsQuery { query, start, limit: page })).await?;
            finish(&client, &found)
        }
        Command::Geoip => {
            let client = Client::connect(config)?;
            let bbox = within(limit, client.geoip()).await?;
            finish(&client, &bbox)
        }
        Command::ExportLine(args) => {
            let client = Client::connect(config)?;
            within(limit, client.set_pad_id(args.pad_id)).await?;
            let request = LineExportRequest { id: args.line_id, format: args.format };
            let exported = within(limit, client.export_line(request)).await?;
            client.disconnect();
            println!("{exported}");
            Ok(())
        }
    }
}

async fn run_watch(config: ClientConfig, args: WatchArgs) -> Result<(), CliError> {
    let server = config.server.clone();
    tracing::info!(%server, pad_id = ?args.pad_id, "watch: connecting");
    let client = Client::connect(config)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    for name in watched_events() {
        let tx = tx.clone();
        client.on(name, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    drop(tx);

    let mut subscribed = false;
    loop {
        let event = tokio::select! {
            event = rx.recv() => event,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(event) = event else {
            break;
        };
        println!("{}", serde_json::to_string(&event_line(&event))?);

        match event {
            ClientEvent::Connect if !subscribed => {
                subscribed = true;
                subscribe(&client, &args).await?;
            }
            ClientEvent::ReconnectFailed => {
                tracing::warn!(%server, "watch: giving up");
                client.disconnect();
                return Err(CliError::ReconnectFailed(server));
            }
            _ => {}
        }
    }

    client.disconnect();
    Ok(())
}

/// Bbox and history subscriptions are replayed by the client after a
/// reconnect, so they are only requested once.
async fn subscribe(client: &Client, args: &WatchArgs) -> Result<(), CliError> {
    if let Some(bbox) = args.bbox {
        client.update_bbox(BboxWithZoom { bbox, zoom: args.zoom, except: None }).await?;
    }
    if args.history && args.pad_id.is_some() {
        client.listen_to_history().await?;
    }
    Ok(())
}

/// Pad pushes plus the connection lifecycle.
fn watched_events() -> Vec<EventName> {
    let lifecycle = [
        EventName::Connect,
        EventName::Disconnect,
        EventName::ConnectError,
        EventName::ReconnectFailed,
        EventName::Route,
        EventName::ClearRoute,
        EventName::ServerError,
    ];
    EVENT_NAMES.into_iter().filter(|name| name.push_event().is_some()).chain(lifecycle).collect()
}

fn event_line(event: &ClientEvent) -> Value {
    json!({ "event": event.name().as_str(), "data": event.payload_json() })
}

async fn within<T>(limit: Duration, request: impl Future<Output = Result<T, ClientError>>) -> Result<T, CliError> {
    tokio::time::timeout(limit, request).await.map_err(|_| CliError::Timeout(limit))?.map_err(CliError::from)
}

fn finish(client: &Client, value: &impl Serialize) -> Result<(), CliError> {
    client.disconnect();
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn parse_bbox(raw: &str) -> Result<Bbox, String> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|error| format!("invalid coordinate `{part}`: {error}")))
        .collect::<Result<Vec<_>, _>>()?;
    let [top, bottom, left, right] = parts[..] else {
        return Err(format!("expected top,bottom,left,right, got {} values", parts.len()));
    };
    Ok(Bbox { top, bottom, left, right })
}

fn parse_export_format(raw: &str) -> Result<ExportFormat, String> {
    serde_json::from_value(Value::String(raw.to_owned()))
        .map_err(|_| format!("unknown export format `{raw}`; expected gpx, gpx-trk, gpx-rte or geojson"))
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
