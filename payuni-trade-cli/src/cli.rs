//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::observability::LogFormat;

/// Seal, open and dispatch PAYUNi trade envelopes.
///
/// Merchant key material comes from `--config` or the `PAYUNI_KEY`,
/// `PAYUNI_IV`, `PAYUNI_ENV` and `PAYUNI_BASE_URL` environment variables.
#[derive(Parser, Debug)]
#[command(name = "payuni-trade", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format; defaults to `LOG_FORMAT` or pretty.
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Path to a TOML client configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encrypt and hash a set of fields.
    Seal(SealArgs),

    /// Verify and decrypt an `EncryptInfo` / `HashInfo` pair.
    Open(OpenArgs),

    /// Run a trade against the gateway.
    Trade(TradeArgs),

    /// Process a return or notify callback body.
    Callback(CallbackArgs),

    /// Query several trades one after another.
    Query(QueryArgs),

    /// List the supported trade modes.
    Modes,
}

#[derive(Args, Debug)]
pub struct SealArgs {
    /// Field to include, as `NAME=VALUE`. Repeatable.
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Hex `EncryptInfo` value.
    #[arg(long)]
    pub encrypt_info: String,

    /// `HashInfo` value.
    #[arg(long)]
    pub hash_info: String,
}

#[derive(Args, Debug)]
pub struct TradeArgs {
    /// Trade mode, for example `upp` or `trade_query`.
    #[arg(short, long)]
    pub mode: String,

    /// Protocol version; defaults to the mode's version.
    #[arg(long = "api-version")]
    pub version: Option<String>,

    /// Field to include, as `NAME=VALUE`. Repeatable.
    #[arg(short, long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Print redirect forms as an HTML page instead of JSON.
    #[arg(long)]
    pub html: bool,
}

#[derive(Args, Debug)]
pub struct CallbackArgs {
    /// JSON body, `@path` to read a file, or `-` for stdin.
    pub payload: String,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Merchant identifier.
    #[arg(long)]
    pub mer_id: String,

    /// Gateway trade number. Repeatable.
    #[arg(long = "trade-no", required = true)]
    pub trade_nos: Vec<String>,

    /// Pause between queries, in milliseconds.
    #[arg(long)]
    pub spacing_ms: Option<u64>,
}

/// Parses a `NAME=VALUE` pair.
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(parse_field("MerID=ABC"), Ok(("MerID".to_owned(), "ABC".to_owned())));
        assert_eq!(
            parse_field("ReturnURL=https://a/?x=1"),
            Ok(("ReturnURL".to_owned(), "https://a/?x=1".to_owned()))
        );
        assert_eq!(parse_field("Empty="), Ok(("Empty".to_owned(), String::new())));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=ABC").is_err());
    }

    #[test]
    fn test_cli_parse_trade() {
        let cli = Cli::try_parse_from([
            "payuni-trade",
            "-vv",
            "trade",
            "--mode",
            "trade_query",
            "-f",
            "MerID=ABC",
            "--field",
            "TradeNo=X1",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Trade(args) = cli.command else { panic!("expected trade") };
        assert_eq!(args.mode, "trade_query");
        assert!(args.version.is_none());
        assert_eq!(args.fields.len(), 2);
        assert!(!args.html);
    }

    #[test]
    fn test_cli_parse_global_config_after_subcommand() {
        let args = ["payuni-trade", "modes", "--config", "payuni.toml", "--log-format", "json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("payuni.toml")));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Commands::Modes));
    }

    #[test]
    fn test_cli_parse_query_requires_trade_no() {
        assert!(Cli::try_parse_from(["payuni-trade", "query", "--mer-id", "ABC"]).is_err());

        let cli = Cli::try_parse_from([
            "payuni-trade",
            "query",
            "--mer-id",
            "ABC",
            "--trade-no",
            "T1",
            "--trade-no",
            "T2",
            "--spacing-ms",
            "0",
        ])
        .unwrap();
        let Commands::Query(args) = cli.command else { panic!("expected query") };
        assert_eq!(args.trade_nos, ["T1", "T2"]);
        assert_eq!(args.spacing_ms, Some(0));
    }

    #[test]
    fn test_cli_rejects_malformed_field() {
        assert!(Cli::try_parse_from(["payuni-trade", "seal", "--field", "MerID"]).is_err());
    }
}
