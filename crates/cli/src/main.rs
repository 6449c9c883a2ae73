use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use wxcallback::{config, handle_callback, signature, xml, Callback, CallbackQuery, InboundMessage, ReplyBuilder};

#[derive(Parser)]
#[command(name = "wxcallback")]
#[command(about = "Sign, verify, decode and build chat-platform callback messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Print the signature the platform would send for a timestamp and nonce.
    Sign {
        /// Config file path (default: WXCALLBACK_CONFIG_PATH or ~/.wxcallback/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Token (default: WECHAT_TOKEN env or wechat.token in config)
        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        timestamp: String,

        #[arg(long)]
        nonce: String,
    },

    /// Authenticate a callback. Prints the echostr for a handshake, or the decoded push as JSON.
    Check {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        #[arg(long)]
        token: Option<String>,

        #[arg(long)]
        signature: String,

        #[arg(long)]
        timestamp: String,

        #[arg(long)]
        nonce: String,

        /// Handshake challenge; when set the body is not read.
        #[arg(long)]
        echostr: Option<String>,

        /// Push body file (default: stdin)
        #[arg(long, value_name = "FILE")]
        body: Option<PathBuf>,
    },

    /// Decode a push body to JSON without authenticating it.
    Decode {
        /// XML file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Encode a JSON document into callback XML.
    Encode {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// JSON file (default: stdin)
        file: Option<PathBuf>,
    },

    /// Build a reply to an inbound push (read from --inbound or stdin).
    Reply {
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Inbound push XML file (default: stdin)
        #[arg(long, value_name = "FILE")]
        inbound: Option<PathBuf>,

        /// CreateTime to stamp (default: now)
        #[arg(long)]
        time: Option<i64>,

        /// Reply kind: text, image, voice, video, music, news, transfer_customer_service
        kind: String,

        /// Kind-specific fields in order (news: title description url picurl, repeated)
        fields: Vec<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Version) => {
            println!("wxcallback {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Commands::Sign {
            config,
            token,
            timestamp,
            nonce,
        }) => run_sign(config, token, &timestamp, &nonce),
        Some(Commands::Check {
            config,
            token,
            signature,
            timestamp,
            nonce,
            echostr,
            body,
        }) => {
            let query = CallbackQuery {
                signature,
                timestamp,
                nonce,
                echostr,
            };
            run_check(config, token, query, body)
        }
        Some(Commands::Decode { file }) => run_decode(file),
        Some(Commands::Encode { config, file }) => run_encode(config, file),
        Some(Commands::Reply {
            config,
            inbound,
            time,
            kind,
            fields,
        }) => run_reply(config, inbound, time, &kind, &fields),
        None => {
            println!("Run with --help for usage");
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// Read a file, or stdin when no path is given.
fn read_input(path: Option<PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(&p).with_context(|| format!("reading {}", p.display())),
        None => {
            let mut s = String::new();
            std::io::stdin()
                .read_to_string(&mut s)
                .context("reading stdin")?;
            Ok(s)
        }
    }
}

fn resolve_token(config_path: Option<PathBuf>, token: Option<String>) -> anyhow::Result<String> {
    if let Some(t) = token.filter(|t| !t.is_empty()) {
        return Ok(t);
    }
    let (config, path) = config::load_config(config_path)?;
    config::resolve_token(&config).with_context(|| {
        format!(
            "no token: pass --token, set WECHAT_TOKEN, or set wechat.token in {}",
            path.display()
        )
    })
}

fn run_sign(
    config_path: Option<PathBuf>,
    token: Option<String>,
    timestamp: &str,
    nonce: &str,
) -> anyhow::Result<()> {
    let token = resolve_token(config_path, token)?;
    println!("{}", signature::sign(timestamp, nonce, &token));
    Ok(())
}

fn run_check(
    config_path: Option<PathBuf>,
    token: Option<String>,
    query: CallbackQuery,
    body: Option<PathBuf>,
) -> anyhow::Result<()> {
    let token = resolve_token(config_path, token)?;
    let body = if query.echostr.is_some() {
        String::new()
    } else {
        read_input(body)?
    };
    match handle_callback(&query, &body, &token)? {
        Callback::Handshake(echostr) => println!("{}", echostr),
        Callback::Message(msg) => println!("{}", serde_json::to_string_pretty(&msg)?),
    }
    Ok(())
}

fn run_decode(file: Option<PathBuf>) -> anyhow::Result<()> {
    let body = read_input(file)?;
    let msg = InboundMessage::from_xml(&body)?;
    println!("{}", serde_json::to_string_pretty(&msg)?);
    Ok(())
}

fn run_encode(config_path: Option<PathBuf>, file: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let input = read_input(file)?;
    let json: serde_json::Value = serde_json::from_str(&input).context("parsing JSON input")?;
    let out = xml::encode_with_item_tag(&xml::Value::from(json), &config::resolve_item_tag(&config))?;
    println!("{}", out);
    Ok(())
}

fn run_reply(
    config_path: Option<PathBuf>,
    inbound: Option<PathBuf>,
    time: Option<i64>,
    kind: &str,
    fields: &[String],
) -> anyhow::Result<()> {
    let (config, _) = config::load_config(config_path)?;
    let envelope = InboundMessage::from_xml(&read_input(inbound)?)?;
    let builder = ReplyBuilder::new().with_item_tag(config::resolve_item_tag(&config));
    let create_time = time.unwrap_or_else(wxcallback::now_timestamp);
    let out = builder.build_from_fields(&envelope, kind, fields, create_time)?;
    println!("{}", out);
    Ok(())
}
