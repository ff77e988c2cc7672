//! Target name resolution.
//!
//! Supported forms:
//! - `dns:///host:port` and `passthrough:///addr`: one address
//! - `ipv4:a:p,b:p` and `ipv6:[a]:p,[b]:p`: several addresses, dialed concurrently
//! - anything else: used verbatim (host names are resolved by the connector)

use crate::error::DialError;

/// A target broken into dialable addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub addresses: Vec<String>,
    pub authority: String,
}

pub fn resolve(target: &str) -> Result<ResolvedTarget, DialError> {
    let target = target.trim();
    if target.is_empty() {
        return Err(DialError::InvalidTarget("empty target".into()));
    }

    let addresses: Vec<String> = if let Some(rest) = strip_scheme(target, "dns") {
        vec![rest.to_string()]
    } else if let Some(rest) = strip_scheme(target, "passthrough") {
        vec![rest.to_string()]
    } else if let Some(list) = target
        .strip_prefix("ipv4:")
        .or_else(|| target.strip_prefix("ipv6:"))
    {
        list.split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(String::from)
            .collect()
    } else {
        vec![target.to_string()]
    };

    match addresses.first() {
        Some(first) if !first.is_empty() => Ok(ResolvedTarget {
            authority: first.clone(),
            addresses,
        }),
        _ => Err(DialError::InvalidTarget(format!("no addresses in {target:?}"))),
    }
}

/// Strip `scheme://authority/` and return the endpoint part.
fn strip_scheme<'a>(target: &'a str, scheme: &str) -> Option<&'a str> {
    let rest = target.strip_prefix(scheme)?.strip_prefix(':')?;
    let rest = rest.strip_prefix("//")?;
    // The optional authority segment ends at the next slash.
    let (_, endpoint) = rest.split_once('/')?;
    Some(endpoint)
}
