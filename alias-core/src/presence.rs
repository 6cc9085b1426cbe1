use alias_types::{Player, PresenceMeta};
use std::collections::HashSet;

/// Who is tracked on one topic, in the order they first announced themselves.
///
/// `K` identifies the underlying connection, so a client re-tracking keeps its
/// place while a reconnect under a new connection lands at the end.
#[derive(Debug, Clone)]
pub struct PresenceRoster<K> {
    members: Vec<(K, PresenceMeta)>,
}

impl<K: PartialEq + Clone> PresenceRoster<K> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Record or refresh a member. Returns true when the member is new.
    pub fn track(&mut self, key: K, meta: PresenceMeta) -> bool {
        if let Some(entry) = self.members.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = meta;
            false
        } else {
            self.members.push((key, meta));
            true
        }
    }

    pub fn untrack(&mut self, key: &K) -> Option<PresenceMeta> {
        let index = self.members.iter().position(|(k, _)| k == key)?;
        Some(self.members.remove(index).1)
    }

    /// Full membership; presence is always delivered whole, never as deltas.
    pub fn snapshot(&self) -> Vec<PresenceMeta> {
        self.members.iter().map(|(_, meta)| meta.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<K: PartialEq + Clone> Default for PresenceRoster<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuild the roster from a presence snapshot.
///
/// Presence only says who is reachable, so scores and host flags of players
/// already known are carried over. Newcomers start at zero with whatever host
/// claim they announced. With several claims only the lowest claimed id keeps
/// the flag. With no claim left the lowest id takes over, unless the previous
/// roster held nothing but ourselves: a fresh joiner has no history to fail
/// over from and waits for the host's full-state replace instead.
pub fn merge_presence(previous: &[Player], snapshot: &[PresenceMeta]) -> Vec<Player> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Player> = snapshot
        .iter()
        .filter(|meta| seen.insert(meta.id.as_str()))
        .map(|meta| match previous.iter().find(|p| p.id == meta.id) {
            Some(existing) => Player {
                id: meta.id.clone(),
                name: meta.name.clone(),
                score: existing.score,
                is_host: existing.is_host,
            },
            None => Player {
                id: meta.id.clone(),
                name: meta.name.clone(),
                score: 0,
                is_host: meta.is_host,
            },
        })
        .collect();

    let fresh_join = previous.len() <= 1
        && merged
            .iter()
            .any(|p| !previous.iter().any(|known| known.id == p.id));
    normalize_host(&mut merged, !fresh_join);
    merged
}

fn normalize_host(players: &mut [Player], allow_failover: bool) {
    let claimed = players.iter().filter(|p| p.is_host).map(|p| p.id.clone()).min();
    let chosen = match claimed {
        Some(id) => Some(id),
        None if allow_failover => players.iter().map(|p| p.id.clone()).min(),
        None => None,
    };

    if let Some(host_id) = chosen {
        for player in players.iter_mut() {
            player.is_host = player.id == host_id;
        }
    }
}
