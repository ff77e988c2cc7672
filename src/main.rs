//! rpc-target
//!
//! Dials an RPC endpoint the way the client library does and reports the
//! outcome, or the underlying cause when the dial fails.
//!
//! ```text
//! flags / config file
//!     → TargetConfig (validated)
//!     → Target::configure_settings
//!     → Target::update(target)
//!         → dial orchestrator → tracked connector + credentials → transport
//!     → connection details or the chosen error
//!
//! --watch: config file changes re-configure and re-dial the target
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use rpc_target::config::{read_config, validate_config, ConfigError, ConfigWatcher, TlsConfig};
use rpc_target::observability::logging::init_logging;
use rpc_target::{Network, Target, TargetConfig};

#[derive(Parser, Debug)]
#[command(name = "rpc-target")]
#[command(about = "Connect to an RPC endpoint and report why a dial fails", long_about = None)]
struct Cli {
    /// TOML configuration file. Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to dial, e.g. "localhost:50051" or "dns:///svc:443".
    #[arg(short, long)]
    target: Option<String>,

    /// Network kind: tcp or unix.
    #[arg(long)]
    network: Option<String>,

    /// Overall dial deadline in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Return the first failure instead of retrying until the deadline.
    #[arg(long)]
    fail_fast: bool,

    /// Connect without TLS.
    #[arg(long, conflicts_with_all = ["cacert", "cert", "key", "servername", "insecure"])]
    plaintext: bool,

    /// PEM file with the certificates to trust.
    #[arg(long)]
    cacert: Option<String>,

    /// PEM client certificate for mutual TLS.
    #[arg(long, requires = "key")]
    cert: Option<String>,

    /// PEM private key for --cert.
    #[arg(long, requires = "cert")]
    key: Option<String>,

    /// Name to verify the server certificate against.
    #[arg(long)]
    servername: Option<String>,

    /// Accept any server certificate.
    #[arg(long)]
    insecure: bool,

    /// Authority to present instead of the target.
    #[arg(long)]
    authority: Option<String>,

    /// Keep running and re-dial when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

impl Cli {
    fn apply(&self, config: &mut TargetConfig) {
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(network) = &self.network {
            config.network = network.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.dial.timeout_ms = ms;
        }
        if self.fail_fast {
            config.dial.fail_fast = true;
        }
        if let Some(authority) = &self.authority {
            config.dial.authority = Some(authority.clone());
        }

        if self.plaintext {
            config.tls = None;
            return;
        }
        let wants_tls = self.cacert.is_some()
            || self.cert.is_some()
            || self.servername.is_some()
            || self.insecure;
        if wants_tls {
            let tls = config.tls.get_or_insert_with(TlsConfig::default);
            if let Some(path) = &self.cacert {
                tls.ca_cert_path = Some(path.clone());
            }
            if let (Some(cert), Some(key)) = (&self.cert, &self.key) {
                tls.client_cert_path = Some(cert.clone());
                tls.client_key_path = Some(key.clone());
            }
            if let Some(name) = &self.servername {
                tls.server_name = Some(name.clone());
            }
            if self.insecure {
                tls.insecure_skip_verify = true;
            }
        }
    }

    fn load(&self) -> Result<TargetConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => TargetConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.load() {
        Ok(config) => config,
        Err(e) => {
            init_logging("info");
            tracing::error!("Invalid configuration: {}", e);
            eprintln!("rpc-target: {}", e);
            return ExitCode::from(2);
        }
    };

    init_logging(&config.observability.log_level);
    tracing::info!("rpc-target v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rpc-target: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: TargetConfig) -> Result<(), Box<dyn std::error::Error>> {
    let network: Network = config.network.parse()?;
    let target = Arc::new(Target::with_network(network));
    target.configure_settings(config.dial_settings()?);

    tracing::info!(
        target_endpoint = %config.target,
        network = %network,
        timeout_ms = config.dial.timeout_ms,
        fail_fast = config.dial.fail_fast,
        tls = config.tls.is_some(),
        "Configuration loaded"
    );

    target.update(&config.target).await?;
    report(&target);

    if !cli.watch {
        return Ok(());
    }
    let Some(path) = cli.config.as_deref() else {
        return Ok(());
    };

    let (watcher, mut updates) = ConfigWatcher::new(path);
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                break;
            }
            Some(mut new_config) = updates.recv() => {
                cli.apply(&mut new_config);
                if let Err(errors) = validate_config(&new_config) {
                    tracing::error!(
                        "Reloaded config rejected: {}",
                        ConfigError::Validation(errors)
                    );
                    continue;
                }
                if new_config.network != config.network {
                    tracing::warn!(
                        network = %new_config.network,
                        "Network changes require a restart, keeping {}",
                        network
                    );
                }
                match new_config.dial_settings() {
                    Ok(settings) => target.configure_settings(settings),
                    Err(e) => {
                        tracing::error!("Failed to load credentials: {}", e);
                        continue;
                    }
                }
                match target.update(&new_config.target).await {
                    Ok(()) => report(&target),
                    Err(e) => tracing::error!(
                        target_endpoint = %new_config.target,
                        error = %e,
                        "Re-dial failed, keeping previous target"
                    ),
                }
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn report(target: &Target) {
    let (Some(endpoint), Some(conn)) = (target.endpoint(), target.current()) else {
        return;
    };
    let auth = conn.auth_info();
    println!(
        "connected to {} ({}) via {} [{}{}]",
        endpoint,
        conn.addr(),
        conn.authority(),
        auth.auth_type,
        auth.protocol_version
            .as_deref()
            .map(|v| format!(" {}", v))
            .unwrap_or_default(),
    );
}
