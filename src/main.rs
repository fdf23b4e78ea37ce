//! `ravealert` - build a CAP v1.2 alert from flat command-line parameters
//! (or load one from a file) and deliver it to an inbound listener.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ravealert_cap::{
    parse_alert, serialize_alert, Alert, Category, Parameter, ResponseType, Scope, Status,
};
use ravealert_core::{init_logging, AppConfig};
use ravealert_outbound::{build_alert, send_with_config, BuildParams};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// RaveAlert - CAP v1.2 alert sender
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener URL (overrides configuration)
    #[arg(long)]
    url: Option<String>,

    /// Basic-auth username (overrides configuration)
    #[arg(long)]
    username: Option<String>,

    /// Basic-auth password (overrides configuration)
    #[arg(long, env = "RAVE_OUTBOUND__PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Send an existing CAP XML file instead of building an alert
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Event text for the built alert
    #[arg(short, long)]
    event: Option<String>,

    /// Headline text
    #[arg(short = 'H', long)]
    headline: Option<String>,

    /// Description text (bilingual, `english --- french`)
    #[arg(short, long)]
    description: Option<String>,

    /// Instruction text
    #[arg(short, long)]
    instruction: Option<String>,

    /// Associated web page
    #[arg(short, long)]
    web: Option<String>,

    /// Contact text
    #[arg(long)]
    contact: Option<String>,

    /// Alert status
    #[arg(short, long, default_value = "Test")]
    status: Status,

    /// Alert scope
    #[arg(short = 'S', long, default_value = "Private")]
    scope: Scope,

    /// Info language code
    #[arg(short, long, default_value = "en-CA")]
    language: String,

    /// Event category (repeatable)
    #[arg(long = "category", default_values_t = [Category::Geo])]
    category: Vec<Category>,

    /// Recommended response type (repeatable)
    #[arg(short = 'r', long = "response-type", default_values_t = [ResponseType::None])]
    response_type: Vec<ResponseType>,

    /// Extra info parameter as `name=value` (repeatable)
    #[arg(short, long = "parameter", value_parser = parse_parameter)]
    parameter: Vec<Parameter>,

    /// Area description; geocodes and areas are attached only when present
    #[arg(long)]
    area_desc: Option<String>,

    /// Print the serialized alert instead of sending it
    #[arg(long)]
    stdout_only: bool,

    /// Log level (overrides configuration)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_parameter(raw: &str) -> std::result::Result<Parameter, String> {
    let (value_name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))?;
    if value_name.is_empty() {
        return Err(format!("parameter name is empty in {raw:?}"));
    }
    Ok(Parameter {
        value_name: value_name.to_string(),
        value: value.to_string(),
    })
}

fn load_alert(path: &PathBuf) -> Result<Alert> {
    let xml = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_alert(&xml).with_context(|| format!("failed to parse {}", path.display()))
}

fn alert_from_args(args: &Args) -> Alert {
    let mut params = BuildParams {
        status: args.status,
        scope: args.scope,
        language: args.language.clone(),
        category: args.category.clone(),
        response_type: args.response_type.clone(),
        headline: args.headline.clone(),
        description: args.description.clone(),
        instruction: args.instruction.clone(),
        web: args.web.clone(),
        contact: args.contact.clone(),
        parameter: args.parameter.clone(),
        area_desc: args.area_desc.clone(),
        ..BuildParams::default()
    };
    if let Some(event) = &args.event {
        params.event = event.clone();
    }
    build_alert(params)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_logging(&config.logging)?;

    if let Some(url) = &args.url {
        config.outbound.url = url.clone();
    }
    if let Some(username) = &args.username {
        config.outbound.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        config.outbound.password = Some(password.clone());
    }

    if args.file.is_none() && args.event.is_none() && args.headline.is_none() {
        bail!("nothing to send: provide --file, or at least --event or --headline");
    }

    let alert = match &args.file {
        Some(path) => load_alert(path)?,
        None => alert_from_args(&args),
    };
    debug!(identifier = %alert.identifier, "alert ready");

    if args.stdout_only {
        print!("{}", serialize_alert(&alert));
        return Ok(());
    }

    send_with_config(&alert, &config.outbound)
        .await
        .context("delivery failed")?;
    println!("sent {}", alert.identifier);
    Ok(())
}
