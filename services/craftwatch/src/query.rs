//! On-demand server query
//!
//! Shares the probes and name resolution with the poll loop but never
//! touches the monitor state or the surfaces.

use crate::config::ServerConfig;
use crate::names;
use crate::probe::Prober;

/// Answer to a single query command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryReport {
    /// The status probe itself failed
    Unreachable { address: String, reason: String },
    /// The server answered
    Online {
        address: String,
        online_count: u32,
        max_count: u32,
        names: Vec<String>,
    },
}

impl QueryReport {
    /// One-line summary used for logs and plain-text replies
    pub fn description(&self) -> String {
        match self {
            QueryReport::Unreachable { address, reason } => {
                format!(
                    "🔴 Could not reach the server at `{}`.\n```{}```",
                    address, reason
                )
            }
            QueryReport::Online {
                online_count: 0, ..
            } => "Nobody is online right now.".to_string(),
            QueryReport::Online {
                online_count,
                max_count,
                names,
                ..
            } if !names.is_empty() => format!(
                "**{}/{}** players online:\n{}",
                online_count,
                max_count,
                names.join(", ")
            ),
            QueryReport::Online {
                online_count,
                max_count,
                ..
            } => format!(
                "**{}/{}** players online.\n(Names not provided by server ping.)",
                online_count, max_count
            ),
        }
    }
}

/// Probe the server and build a detailed report
pub async fn query(prober: &Prober, server: &ServerConfig) -> QueryReport {
    let address = server.address();

    let status = match prober.probe_status().await {
        Ok(status) if status.reachable => status,
        Ok(_) => {
            return QueryReport::Unreachable {
                address,
                reason: "server reported itself unreachable".to_string(),
            }
        }
        Err(e) => {
            tracing::debug!("Query could not reach {}: {}", address, e);
            return QueryReport::Unreachable {
                address,
                reason: e.to_string(),
            };
        }
    };

    let admin = if status.online_count > 0 {
        prober.probe_admin_query().await
    } else {
        None
    };

    let names = names::resolve(&status, admin.as_ref());

    QueryReport::Online {
        address,
        online_count: status.online_count,
        max_count: status.max_count,
        names,
    }
}
