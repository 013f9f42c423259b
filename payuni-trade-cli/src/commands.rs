//! Subcommand handlers.

use std::{
    io::{self, Read},
    path::Path,
    time::Duration,
};

use anyhow::{Context, bail};
use payuni_trade::{
    ClientConfig, TradeClient, TradeMode, TradeOutcome,
    envelope::{self, EncryptedEnvelope, FieldMap},
    trade::{DEFAULT_BATCH_SPACING, Delivery, ModeFamily},
};
use serde_json::json;
use tracing::{debug, info};

use crate::cli::{CallbackArgs, Commands, OpenArgs, QueryArgs, SealArgs, TradeArgs};

/// Runs a subcommand and returns the process exit code.
pub async fn run(command: Commands, config_path: Option<&Path>) -> anyhow::Result<u8> {
    match command {
        Commands::Seal(args) => seal(&args, config_path),
        Commands::Open(args) => open(&args, config_path),
        Commands::Trade(args) => trade(args, config_path).await,
        Commands::Callback(args) => callback(&args, config_path),
        Commands::Query(args) => query(args, config_path).await,
        Commands::Modes => {
            print!("{}", modes_table());
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => ClientConfig::from_env().context("failed to read PAYUNI_* environment"),
    }
}

fn client(path: Option<&Path>) -> anyhow::Result<TradeClient> {
    let config = load_config(path)?;
    debug!(base_url = config.base_url(), "client configured");
    TradeClient::new(config).context("failed to build trade client")
}

fn field_map(pairs: Vec<(String, String)>) -> FieldMap {
    pairs.into_iter().collect()
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn seal(args: &SealArgs, config_path: Option<&Path>) -> anyhow::Result<u8> {
    let config = load_config(config_path)?;
    let sealed = envelope::seal(&field_map(args.fields.clone()), &config.keys)?;
    print_json(&json!({
        "EncryptInfo": sealed.encrypt_info.as_str(),
        "HashInfo": sealed.hash_info.as_str(),
    }))?;
    Ok(0)
}

fn open(args: &OpenArgs, config_path: Option<&Path>) -> anyhow::Result<u8> {
    let config = load_config(config_path)?;
    let encrypt_info = EncryptedEnvelope::from_wire(args.encrypt_info.trim());
    let fields = envelope::open(&encrypt_info, args.hash_info.trim(), &config.keys)?;
    print_json(&fields)?;
    Ok(0)
}

async fn trade(args: TradeArgs, config_path: Option<&Path>) -> anyhow::Result<u8> {
    let client = client(config_path)?;
    let outcome = client
        .universal_trade(field_map(args.fields), &args.mode, args.version.as_deref())
        .await?;

    match outcome {
        TradeOutcome::Fields(fields) => print_json(&fields)?,
        TradeOutcome::Redirect(form) if args.html => print!("{}", form.to_html()),
        TradeOutcome::Redirect(form) => print_json(&form)?,
    }
    Ok(0)
}

fn read_payload(raw: &str) -> anyhow::Result<String> {
    if raw == "-" {
        let mut body = String::new();
        io::stdin().read_to_string(&mut body).context("failed to read callback from stdin")?;
        return Ok(body);
    }
    if let Some(path) = raw.strip_prefix('@') {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read callback from {path}"));
    }
    Ok(raw.to_owned())
}

fn callback(args: &CallbackArgs, config_path: Option<&Path>) -> anyhow::Result<u8> {
    let client = client(config_path)?;
    let body = read_payload(&args.payload)?;
    let outcome = client.result_process(body.trim())?;
    if let TradeOutcome::Fields(fields) = outcome {
        print_json(&fields)?;
    }
    Ok(0)
}

async fn query(args: QueryArgs, config_path: Option<&Path>) -> anyhow::Result<u8> {
    if args.trade_nos.is_empty() {
        bail!("at least one --trade-no is required");
    }

    let client = client(config_path)?;
    let spacing = args.spacing_ms.map_or(DEFAULT_BATCH_SPACING, Duration::from_millis);
    let results = client.batch_query(&args.mer_id, args.trade_nos.as_slice(), spacing).await;

    let failed = results.iter().filter(|r| r.result.is_err()).count();
    info!(total = results.len(), failed, "batch query finished");

    let report: Vec<_> = results
        .into_iter()
        .map(|entry| match entry.result {
            Ok(outcome) => json!({ "trade_no": entry.trade_no, "fields": outcome.fields() }),
            Err(err) => json!({
                "trade_no": entry.trade_no,
                "error": err.to_string(),
                "retryable": err.is_retryable(),
            }),
        })
        .collect();
    print_json(&report)?;

    Ok(u8::from(failed > 0))
}

fn modes_table() -> String {
    TradeMode::ALL
        .iter()
        .map(|mode| {
            let spec = mode.spec();
            let delivery = match spec.delivery {
                Delivery::BrowserRedirect => "redirect",
                Delivery::Backend => "backend",
            };
            let family = match spec.family {
                ModeFamily::Payment => "payment",
                ModeFamily::TradeManagement => "trade",
                ModeFamily::CreditBind => "credit_bind",
            };
            format!(
                "{:<22} {:<28} {:<12} {:<9} {}\n",
                mode.as_str(),
                spec.endpoint,
                family,
                delivery,
                spec.default_version
            )
        })
        .collect()
}
