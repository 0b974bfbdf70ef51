//! Who sees whom, in what order, at what precision.
//!
//! A candidate is visible to the caller when the candidate has a location and
//! the two share at least one guild through their *effective* guild sets:
//! the guild ids in their sharing settings that are also on the supported
//! allow-list. Candidates come back nearest first, with coordinates rounded
//! to [`REDACTION_DECIMALS`](crate::models::location::REDACTION_DECIMALS).

use std::collections::HashSet;

use tracing::warn;

use crate::models::{Coords, GuildId, GuildInfo, Location, UserRecord, VisibleUser};
use crate::services::geo_service::geodesic_km;

/// How the caller themself is treated in the peer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityPolicy {
    /// Put the caller at index 0 with their exact location. Only applies when
    /// the caller has a location.
    pub include_self_first: bool,
}

impl VisibilityPolicy {
    /// `GET /users`: older app builds expect themselves as the first entry.
    pub const V1: Self = Self {
        include_self_first: true,
    };

    /// `GET /v2/users`: peers only. Own location comes from `GET /me`.
    pub const V2: Self = Self {
        include_self_first: false,
    };
}

/// Guild ids `user` consents to share with that the service supports.
pub fn effective_guilds<'a>(
    user: &'a UserRecord,
    allow_list: &HashSet<GuildId>,
) -> HashSet<&'a str> {
    user.settings
        .guild_ids
        .iter()
        .filter(|id| allow_list.contains(*id))
        .map(String::as_str)
        .collect()
}

/// Compute the caller's peer list from `population`.
///
/// Pure: no I/O, nothing in `population` is modified. Iteration order of
/// `population` is the tie-breaker for equal distances and the output order
/// when the caller has no location.
pub fn compute_visible_peers<'a, I>(
    caller: &UserRecord,
    population: I,
    allow_list: &HashSet<GuildId>,
    policy: VisibilityPolicy,
) -> Vec<VisibleUser>
where
    I: IntoIterator<Item = &'a UserRecord>,
{
    let caller_guilds = effective_guilds(caller, allow_list);
    let origin = caller_origin(caller);

    let mut ranked: Vec<(f64, VisibleUser)> = Vec::new();
    for candidate in population {
        if candidate.id == caller.id {
            continue;
        }
        let Some(location) = candidate.location.as_ref() else {
            continue;
        };
        if let Err(e) = location.coords.check() {
            warn!(user_id = %candidate.id, "Skipping candidate with bad location: {}", e);
            continue;
        }

        let candidate_guilds = effective_guilds(candidate, allow_list);
        if candidate_guilds.is_disjoint(&caller_guilds) {
            continue;
        }

        let common_guilds = common_guilds(candidate, &caller_guilds);
        if common_guilds.is_empty() {
            continue;
        }

        let distance = origin
            .map(|o| geodesic_km(&o, &location.coords))
            .unwrap_or(0.0);
        ranked.push((
            distance,
            visible_user(candidate, location.redacted(), common_guilds),
        ));
    }

    // sort_by is stable: equal distances keep population order.
    if origin.is_some() {
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let mut peers = Vec::with_capacity(ranked.len() + 1);
    if policy.include_self_first {
        if let (Some(_), Some(location)) = (origin, caller.location.as_ref()) {
            // A caller sharing no supported guild sees nobody, not even themself.
            let own_guilds = common_guilds(caller, &caller_guilds);
            if !own_guilds.is_empty() {
                peers.push(visible_user(caller, location.clone(), own_guilds));
            }
        }
    }
    peers.extend(ranked.into_iter().map(|(_, peer)| peer));
    peers
}

fn caller_origin(caller: &UserRecord) -> Option<Coords> {
    let location = caller.location.as_ref()?;
    match location.coords.check() {
        Ok(()) => Some(location.coords),
        Err(e) => {
            warn!(user_id = %caller.id, "Caller location unusable, not sorting: {}", e);
            None
        }
    }
}

fn common_guilds(user: &UserRecord, shared_with: &HashSet<&str>) -> Vec<GuildInfo> {
    user.guilds
        .iter()
        .filter(|g| shared_with.contains(g.id.as_str()))
        .cloned()
        .collect()
}

fn visible_user(user: &UserRecord, location: Location, common_guilds: Vec<GuildInfo>) -> VisibleUser {
    VisibleUser {
        id: user.id.clone(),
        name: user.username.clone(),
        avatar_url: user.avatar_url_or_default(),
        location,
        common_guilds,
    }
}
