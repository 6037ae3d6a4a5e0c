use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use snip_crypto::DigestAlgorithm;
use snip_store::BackendKind;
use snip_types::UrlEncoding;

#[derive(Parser)]
#[command(
    name = "snip",
    about = "snip: short identifiers for URLs over pluggable key-value stores",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file; flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP shortener
    Serve(ServeArgs),
    /// Store a URL and print its short form
    Shorten(ShortenArgs),
    /// Print the URL stored under an identifier
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Bind address for the HTTP listener
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Args)]
pub struct ShortenArgs {
    pub url: String,
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Identifier, with or without the URL prefix
    pub id: String,
    #[command(flatten)]
    pub overrides: Overrides,
}

/// Settings shared by every subcommand that opens a store.
#[derive(Args, Default)]
pub struct Overrides {
    /// Prefix placed before the identifier in short URLs
    #[arg(long)]
    pub url_prefix: Option<String>,

    /// Storage backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Directory for the files backend
    #[arg(long)]
    pub store_folder: Option<PathBuf>,

    /// Redis URL for the redis backend
    #[arg(long)]
    pub redis_url: Option<String>,

    /// PostgreSQL URL for the postgres backend
    #[arg(long)]
    pub database_url: Option<String>,

    /// Table for the postgres backend
    #[arg(long)]
    pub table: Option<String>,

    /// Digest algorithm, e.g. sha256-48, keyed-48, random-64
    #[arg(long)]
    pub digest: Option<DigestAlgorithm>,

    /// Identifier encoding: base32, base64-url or hex
    #[arg(long)]
    pub encoding: Option<UrlEncoding>,

    /// Max insert attempts per URL, the first one included
    #[arg(long)]
    pub max_retry_save: Option<u32>,

    /// Random bytes appended to the digest input on each retry
    #[arg(long)]
    pub add_random_bytes: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Files,
    Memory,
    #[value(alias = "external-cache")]
    Redis,
    #[value(alias = "external-table")]
    Postgres,
}

impl From<BackendKind> for BackendArg {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Files => Self::Files,
            BackendKind::Memory => Self::Memory,
            BackendKind::Redis => Self::Redis,
            BackendKind::Postgres => Self::Postgres,
        }
    }
}
