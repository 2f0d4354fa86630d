mod render;

use std::io::IsTerminal;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use frames::{Frame, Status};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("server returned error for {syscall}: {message}")]
    ServerError { syscall: String, message: String },
    #[error("nothing to change; pass --cadence, --hearts or --mood")]
    EmptyUpdate,
}

#[derive(Parser, Debug)]
#[command(name = "chatctl", about = "Control panel and live tail for the livechat overlay")]
struct Cli {
    #[arg(long, env = "LIVECHAT_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    /// Disable ANSI colors (also off when stdout is not a terminal).
    #[arg(long, default_value_t = false)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Ping,
    /// Show or change panel parameters.
    Controls(ControlsCommand),
    /// Submit a manual chat message.
    Say(SayArgs),
    /// Throw hearts.
    Heart {
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Print the visible feed once.
    Feed,
    /// Follow the live feed over the websocket.
    Tail(TailArgs),
}

#[derive(Args, Debug)]
struct ControlsCommand {
    #[command(subcommand)]
    command: ControlsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ControlsSubcommand {
    Show,
    Set(SetArgs),
}

#[derive(Args, Debug)]
struct SetArgs {
    /// Message cadence in ms (100..=3000).
    #[arg(long)]
    cadence: Option<u32>,
    /// Heart cadence in ms (0 = off, else 100..=10000).
    #[arg(long)]
    hearts: Option<u32>,
    /// neutral, happy or hostile.
    #[arg(long)]
    mood: Option<String>,
    /// Send over the websocket instead of REST.
    #[arg(long, default_value_t = false)]
    ws: bool,
}

#[derive(Args, Debug)]
struct SayArgs {
    /// Display name; a random one is picked when omitted.
    #[arg(long)]
    user: Option<String>,
    text: String,
}

#[derive(Args, Debug)]
struct TailArgs {
    /// Exit after this many chat entries.
    #[arg(long)]
    max: Option<usize>,
    /// Also print heart events.
    #[arg(long, default_value_t = false)]
    hearts: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext {
        base_url: cli.base_url,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::Controls(controls) => run_controls(&ctx, controls).await,
        Command::Say(args) => run_say(&ctx, args).await,
        Command::Heart { count } => run_heart(&ctx, count).await,
        Command::Feed => run_feed(&ctx).await,
        Command::Tail(args) => run_tail(&ctx, args).await,
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_ping(cli: &CliContext) -> Result<(), CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}/healthz", cli.base_url.trim_end_matches('/'));
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            syscall: format!("HTTP {}", status.as_u16()),
            message: "health check failed".to_owned(),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_controls(cli: &CliContext, controls: ControlsCommand) -> Result<(), CliError> {
    match controls.command {
        ControlsSubcommand::Show => {
            let json = api_request(cli, reqwest::Method::GET, "/api/controls", None).await?;
            println!("{}", render::render_controls(&json));
            Ok(())
        }
        ControlsSubcommand::Set(args) => {
            let body = update_body(&args)?;
            let json = if args.ws {
                ws_request(cli, frames::CONTROL_UPDATE, body).await?.data
            } else {
                api_request(cli, reqwest::Method::PATCH, "/api/controls", Some(body)).await?
            };
            println!("{}", render::render_controls(&json));
            Ok(())
        }
    }
}

async fn run_say(cli: &CliContext, args: SayArgs) -> Result<(), CliError> {
    let mut body = Map::new();
    body.insert("text".to_owned(), Value::String(args.text));
    if let Some(user) = args.user {
        body.insert("username".to_owned(), Value::String(user));
    }
    let json = api_request(cli, reqwest::Method::POST, "/api/messages", Some(Value::Object(body))).await?;

    match json.get("entry") {
        Some(entry) => println!("{}", render::render_entry(entry, cli.color)),
        None => eprintln!("blank message ignored"),
    }
    Ok(())
}

async fn run_heart(cli: &CliContext, count: usize) -> Result<(), CliError> {
    for _ in 0..count {
        api_request(cli, reqwest::Method::POST, "/api/hearts", None).await?;
    }
    eprintln!("threw {count} heart(s)");
    Ok(())
}

async fn run_feed(cli: &CliContext) -> Result<(), CliError> {
    let json = api_request(cli, reqwest::Method::GET, "/api/feed", None).await?;
    let snapshot = request_frame(frames::FEED_SNAPSHOT, json);
    for line in render::render_frame(&snapshot, cli.color) {
        println!("{line}");
    }
    Ok(())
}

async fn run_tail(cli: &CliContext, args: TailArgs) -> Result<(), CliError> {
    let mut stream = connect(cli).await?;
    let mut entries = 0_usize;

    loop {
        let frame = recv_next(&mut stream, None).await?;
        if frame.syscall == frames::HEART_SPAWN && !args.hearts {
            continue;
        }
        for line in render::render_frame(&frame, cli.color) {
            println!("{line}");
        }
        if frame.syscall == frames::CHAT_ENTRY {
            entries = entries.saturating_add(1);
            if args.max.is_some_and(|limit| entries >= limit) {
                break;
            }
        }
    }

    let _ = stream.close(None).await;
    Ok(())
}

fn update_body(args: &SetArgs) -> Result<Value, CliError> {
    let mut body = Map::new();
    if let Some(cadence) = args.cadence {
        body.insert("cadence_ms".to_owned(), Value::from(cadence));
    }
    if let Some(hearts) = args.hearts {
        body.insert("heart_cadence_ms".to_owned(), Value::from(hearts));
    }
    if let Some(mood) = &args.mood {
        body.insert("mood".to_owned(), Value::String(mood.clone()));
    }
    if body.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    Ok(Value::Object(body))
}

// =============================================================================
// HTTP
// =============================================================================

async fn api_request(
    cli: &CliContext,
    method: reqwest::Method,
    path: &str,
    body: Option<Value>,
) -> Result<Value, CliError> {
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.base_url.trim_end_matches('/'), path);

    let request = client.request(method, &url);
    let request = if let Some(json) = body {
        request.json(&json)
    } else {
        request
    };

    let response = request.send().await?;
    let status = response.status();
    let value = response
        .json::<Value>()
        .await
        .unwrap_or_else(|_| Value::Null);

    if !status.is_success() {
        return Err(CliError::ServerError {
            syscall: format!("HTTP {}", status.as_u16()),
            message: value.to_string(),
        });
    }

    Ok(value)
}

// =============================================================================
// WEBSOCKET
// =============================================================================

fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base_url = base_url.trim_end_matches('/');
    if let Some(rest) = base_url.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws"));
    }
    if let Some(rest) = base_url.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

async fn connect(cli: &CliContext) -> Result<WsStream, CliError> {
    let (mut stream, _) = connect_async(ws_url(&cli.base_url)?)
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;
    wait_for_session_connected(&mut stream).await?;
    Ok(stream)
}

/// Send one request frame and wait for its terminal reply.
async fn ws_request(cli: &CliContext, syscall: &str, data: Value) -> Result<Frame, CliError> {
    let mut stream = connect(cli).await?;
    let req = request_frame(syscall, data);
    let req_id = req.id.clone();
    stream
        .send(Message::text(frames::encode_frame(&req)))
        .await
        .map_err(|error| CliError::WsConnect(Box::new(error)))?;
    let reply = wait_for_terminal_response(&mut stream, &req_id, syscall).await;
    let _ = stream.close(None).await;
    reply
}

async fn wait_for_session_connected(stream: &mut WsStream) -> Result<(), CliError> {
    loop {
        let frame = recv_next(stream, Some(Duration::from_secs(5))).await?;
        if frame.syscall == frames::SESSION_CONNECTED {
            return Ok(());
        }
    }
}

async fn wait_for_terminal_response(stream: &mut WsStream, request_id: &str, syscall: &str) -> Result<Frame, CliError> {
    loop {
        let frame = recv_next(stream, Some(Duration::from_secs(15))).await?;
        if frame.parent_id.as_deref() != Some(request_id) {
            continue;
        }
        if frame.syscall != syscall {
            continue;
        }
        if !frame.status.is_terminal() {
            continue;
        }
        if frame.status == Status::Error {
            let message = frame.data_str("message").unwrap_or("unknown websocket error").to_owned();
            return Err(CliError::ServerError { syscall: frame.syscall, message });
        }
        return Ok(frame);
    }
}

async fn recv_next(stream: &mut WsStream, timeout: Option<Duration>) -> Result<Frame, CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message.map_err(|error| CliError::WsConnect(Box::new(error)))? {
                Message::Text(text) => {
                    return frames::decode_frame(text.as_str()).map_err(CliError::from);
                }
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| CliError::Timeout)?,
        None => fut.await,
    }
}

fn request_frame(syscall: &str, data: Value) -> Frame {
    Frame {
        id: Uuid::new_v4().to_string(),
        parent_id: None,
        ts: now_ms(),
        from: None,
        syscall: syscall.to_owned(),
        status: Status::Request,
        data,
    }
}

fn now_ms() -> i64 {
    let Ok(duration) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(duration.as_millis()).unwrap_or(0)
}
