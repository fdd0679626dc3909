//! Player name resolution
//!
//! The admin query lists every online player; the status ping only carries
//! an optional, possibly truncated sample. Admin names win when present.

use crate::probe::{AdminQueryResult, ServerStatus};

/// Pick the best available list of online player names
pub fn resolve(status: &ServerStatus, admin: Option<&AdminQueryResult>) -> Vec<String> {
    if status.online_count == 0 {
        return Vec::new();
    }

    match admin {
        Some(admin) if !admin.names.is_empty() => admin.names.clone(),
        _ => status.sample_names.clone(),
    }
}

/// Parse the admin `list` reply, e.g.
/// `"There are 2 of a max of 20 players online: Steve, Alex"`
///
/// Everything after the first colon is a comma separated name list. A reply
/// without a colon lists nobody.
pub fn parse_player_list(raw: &str) -> Vec<String> {
    let Some((_, names)) = raw.split_once(':') else {
        return Vec::new();
    };

    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
