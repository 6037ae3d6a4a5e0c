use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use snip_server::{ApiError, ServerConfig, SnipServer};
use snip_store::StoreConfig;
use snip_types::ErrorKind;

use crate::cli::*;

const DEFAULT_TABLE: &str = "urls";
const DEFAULT_TIMEOUT_MS: u64 = 5_000;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_ref())?;
    match cli.command {
        Command::Serve(args) => {
            if let Some(bind) = args.bind {
                config.bind_addr = bind;
            }
            args.overrides.apply(&mut config)?;
            cmd_serve(config).await
        }
        Command::Shorten(args) => {
            args.overrides.apply(&mut config)?;
            cmd_shorten(config, &args.url).await
        }
        Command::Resolve(args) => {
            args.overrides.apply(&mut config)?;
            cmd_resolve(config, &args.id).await
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

async fn cmd_serve(config: ServerConfig) -> anyhow::Result<()> {
    println!(
        "snip on {} ({} store, {} digest)",
        config.bind_addr.to_string().bold(),
        config.store.backend().name().cyan(),
        config.digest.name().cyan()
    );
    SnipServer::new(config).await?.serve().await?;
    Ok(())
}

async fn cmd_shorten(config: ServerConfig, url: &str) -> anyhow::Result<()> {
    let server = SnipServer::new(config).await?;
    match server.state().shorten(url).await {
        Ok(short) => {
            println!("{short}");
            Ok(())
        }
        Err(e @ ApiError::Validation(_)) => anyhow::bail!("{} {e}", "rejected:".red().bold()),
        Err(e) => Err(e.into()),
    }
}

async fn cmd_resolve(config: ServerConfig, id: &str) -> anyhow::Result<()> {
    let id = id.strip_prefix(config.url_prefix.as_str()).unwrap_or(id).to_string();
    let server = SnipServer::new(config).await?;
    match server.state().lookup(&id).await {
        Ok(payload) => {
            println!("{}", String::from_utf8_lossy(&payload));
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::KeyNotFound => {
            anyhow::bail!("{} {}", "not found:".red().bold(), id.yellow())
        }
        Err(e) => Err(e.into()),
    }
}

impl Overrides {
    /// Fold command-line flags into `config`. Flags win over the file.
    pub fn apply(&self, config: &mut ServerConfig) -> anyhow::Result<()> {
        if let Some(prefix) = &self.url_prefix {
            config.url_prefix = prefix.clone();
        }
        if let Some(digest) = self.digest {
            config.digest = digest;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(max) = self.max_retry_save {
            config.assign.max_attempts = max;
        }
        if let Some(bytes) = self.add_random_bytes {
            config.assign.entropy_bytes = bytes;
        }
        config.store = self.store_config(&config.store)?;
        Ok(())
    }

    fn touches_store(&self) -> bool {
        self.backend.is_some()
            || self.store_folder.is_some()
            || self.redis_url.is_some()
            || self.database_url.is_some()
            || self.table.is_some()
    }

    fn store_config(&self, current: &StoreConfig) -> anyhow::Result<StoreConfig> {
        if !self.touches_store() {
            return Ok(current.clone());
        }
        let backend = self
            .backend
            .unwrap_or_else(|| BackendArg::from(current.backend()));
        // Switching backends keeps the configured timeout.
        let timeout_ms = current
            .timeout()
            .map_or(DEFAULT_TIMEOUT_MS, |t| t.as_millis() as u64);

        let store = match backend {
            BackendArg::Files => {
                let dir = match (&self.store_folder, current) {
                    (Some(dir), _) => dir.clone(),
                    (None, StoreConfig::Files { dir, .. }) => dir.clone(),
                    (None, _) => PathBuf::from("_storage"),
                };
                StoreConfig::Files { dir, timeout_ms }
            }
            BackendArg::Memory => StoreConfig::Memory,
            BackendArg::Redis => {
                let url = match (&self.redis_url, current) {
                    (Some(url), _) => url.clone(),
                    (None, StoreConfig::Redis { url, .. }) => url.clone(),
                    (None, _) => anyhow::bail!("the redis backend needs --redis-url"),
                };
                StoreConfig::Redis { url, timeout_ms }
            }
            BackendArg::Postgres => {
                let (url, table, max_connections, create_table) = match current {
                    StoreConfig::Postgres {
                        url,
                        table,
                        max_connections,
                        create_table,
                        ..
                    } => (Some(url.clone()), table.clone(), *max_connections, *create_table),
                    _ => (None, DEFAULT_TABLE.to_string(), 10, false),
                };
                let url = self
                    .database_url
                    .clone()
                    .or(url)
                    .context("the postgres backend needs --database-url")?;
                StoreConfig::Postgres {
                    url,
                    table: self.table.clone().unwrap_or(table),
                    max_connections,
                    timeout_ms,
                    create_table,
                }
            }
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use snip_crypto::DigestAlgorithm;

    fn overrides(args: &[&str]) -> Overrides {
        let argv = ["snip", "serve"].iter().chain(args.iter()).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Serve(args) => args.overrides,
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn no_flags_keep_config() {
        let mut config = ServerConfig::default();
        overrides(&[]).apply(&mut config).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn store_folder_overrides_files_dir() {
        let mut config = ServerConfig::default();
        overrides(&["--store-folder", "/tmp/x"]).apply(&mut config).unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Files {
                dir: "/tmp/x".into(),
                timeout_ms: 5_000
            }
        );
    }

    #[test]
    fn assignment_flags() {
        let mut config = ServerConfig::default();
        overrides(&["--max-retry-save", "3", "--add-random-bytes", "2", "--digest", "blake3-48"])
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.assign.max_attempts, 3);
        assert_eq!(config.assign.entropy_bytes, 2);
        assert_eq!(config.digest, DigestAlgorithm::Blake3W48);
    }

    #[test]
    fn redis_needs_url() {
        let mut config = ServerConfig::default();
        assert!(overrides(&["--backend", "redis"]).apply(&mut config).is_err());

        overrides(&["--backend", "redis", "--redis-url", "redis://h:6379"])
            .apply(&mut config)
            .unwrap();
        assert_eq!(
            config.store,
            StoreConfig::Redis {
                url: "redis://h:6379".into(),
                timeout_ms: 5_000
            }
        );
    }

    #[test]
    fn postgres_defaults_table() {
        let mut config = ServerConfig::default();
        overrides(&["--backend", "postgres", "--database-url", "postgres://db"])
            .apply(&mut config)
            .unwrap();
        let StoreConfig::Postgres { url, table, .. } = &config.store else {
            panic!("expected postgres");
        };
        assert_eq!(url, "postgres://db");
        assert_eq!(table, "urls");
    }

    #[test]
    fn table_flag_keeps_configured_url() {
        let mut config = ServerConfig::from_toml_str(
            "[store]\nbackend = \"postgres\"\nurl = \"postgres://cfg\"\ntable = \"a\"\n",
        )
        .unwrap();
        overrides(&["--table", "b"]).apply(&mut config).unwrap();
        let StoreConfig::Postgres { url, table, .. } = &config.store else {
            panic!("expected postgres");
        };
        assert_eq!(url, "postgres://cfg");
        assert_eq!(table, "b");
    }

    #[tokio::test]
    async fn shorten_and_resolve_with_files_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            store: StoreConfig::Files {
                dir: dir.path().to_path_buf(),
                timeout_ms: 1_000,
            },
            digest: DigestAlgorithm::Sha256W48,
            ..Default::default()
        };
        cmd_shorten(config.clone(), "http://example.com").await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        assert!(cmd_shorten(config.clone(), "example.com").await.is_err());
        assert!(cmd_resolve(config, "AAAAAAAA").await.is_err());
    }
}
