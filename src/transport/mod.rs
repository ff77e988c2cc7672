//! Dial primitives.
//!
//! # Data Flow
//! ```text
//! dial_context(ctx, target, options)
//!     → options.rs (validate + fold options)
//!     → target.rs (target → addresses + authority)
//!     → round: one concurrent attempt per address
//!           connector.dial → credentials.client_handshake
//!     → first success wins; otherwise backoff and retry until the deadline
//! ```
//!
//! # Design Decisions
//! - Attempt failures are discarded (traced at debug) unless `ReturnFirstError` is set
//! - Deadline expiry surfaces as a generic `DeadlineExceeded`
//! - Callers that want the real cause observe it through their own connector
//!   and credentials (see the `tracking` module)

pub mod options;
pub mod target;

use futures_util::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::time;

use crate::credentials::TransportCredentials;
use crate::error::DialError;
use crate::net::{ClientConn, Connector, DialContext};
use crate::observability::metrics;

pub use options::{DialOption, DialOptions};
pub use target::{resolve, ResolvedTarget};

/// Dial `target`, retrying until a connection is established or the context
/// deadline passes.
pub async fn dial_context(
    ctx: &DialContext,
    target: &str,
    options: &[DialOption],
) -> Result<ClientConn, DialError> {
    let opts = DialOptions::parse(options)?;
    let resolved = target::resolve(target)?;
    let authority = opts
        .authority()
        .map_or_else(|| resolved.authority.clone(), str::to_string);

    let mut round: u32 = 0;
    loop {
        if ctx.is_expired() {
            return Err(deadline_exceeded(ctx, target));
        }
        round += 1;

        let round_ctx = ctx.child(opts.connect_timeout());
        let outcome = time::timeout_at(
            round_ctx.deadline(),
            run_round(&round_ctx, &opts, &resolved.addresses, &authority),
        )
        .await;

        match outcome {
            Ok(Ok(conn)) => {
                tracing::debug!(
                    endpoint = %target,
                    addr = %conn.addr(),
                    connection_id = %conn.id(),
                    round,
                    "Connection established"
                );
                return Ok(conn);
            }
            Ok(Err(err)) => {
                tracing::debug!(endpoint = %target, round, error = %err, "Dial round failed");
                if opts.returns_first_error() {
                    return Err(err);
                }
            }
            Err(_) => {
                tracing::debug!(endpoint = %target, round, "Dial round timed out");
                if opts.returns_first_error() {
                    return Err(deadline_exceeded(&round_ctx, target));
                }
            }
        }

        let delay = opts.backoff().delay(round);
        if delay >= ctx.remaining() {
            time::sleep_until(ctx.deadline()).await;
            return Err(deadline_exceeded(ctx, target));
        }
        time::sleep(delay).await;
    }
}

/// Dial `target` and return the first failure instead of retrying.
///
/// Meant for interactive use where immediate, accurate feedback matters more
/// than riding out a server restart.
pub async fn blocking_dial(
    ctx: &DialContext,
    connector: Arc<dyn Connector>,
    target: &str,
    credentials: Option<Arc<dyn TransportCredentials>>,
    options: &[DialOption],
) -> Result<ClientConn, DialError> {
    let mut options = options.to_vec();
    options.push(match credentials {
        Some(creds) => DialOption::TransportCredentials(creds),
        None => DialOption::Insecure,
    });
    options.push(DialOption::ContextDialer(connector));
    options.push(DialOption::ReturnFirstError);

    dial_context(ctx, target, &options).await
}

/// Race one attempt per address; the first success wins.
async fn run_round(
    ctx: &DialContext,
    opts: &DialOptions,
    addresses: &[String],
    authority: &str,
) -> Result<ClientConn, DialError> {
    let mut attempts: FuturesUnordered<_> = addresses
        .iter()
        .map(|addr| attempt(ctx, opts, addr, authority))
        .collect();

    let mut last_err = None;
    while let Some(result) = attempts.next().await {
        match result {
            Ok(conn) => {
                metrics::record_dial_attempt("success");
                return Ok(conn);
            }
            Err(err) => {
                metrics::record_dial_attempt(err.kind());
                tracing::trace!(error = %err, "Dial attempt failed");
                if opts.returns_first_error() {
                    return Err(err);
                }
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| DialError::InvalidTarget("no addresses to dial".into())))
}

async fn attempt(
    ctx: &DialContext,
    opts: &DialOptions,
    addr: &str,
    authority: &str,
) -> Result<ClientConn, DialError> {
    let raw = opts.dialer.dial(ctx, addr).await?;
    let (stream, auth_info) = opts
        .credentials
        .client_handshake(ctx, authority, raw)
        .await?;
    Ok(ClientConn::new(
        addr.to_string(),
        authority.to_string(),
        stream,
        auth_info,
    ))
}

fn deadline_exceeded(ctx: &DialContext, target: &str) -> DialError {
    DialError::DeadlineExceeded {
        target: target.to_string(),
        timeout: ctx.timeout(),
    }
}
