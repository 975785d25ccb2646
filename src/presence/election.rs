//! Seniority rule deciding which peer acts on behalf of the session.
use super::roster::{JoinTimestamp, PeerId};

/// Picks the peer with the lowest join timestamp.
///
/// Identical timestamps are resolved by the lexicographic order of the peer id so that
/// every peer holding the same presence set elects the same leader.
pub fn elect_leader<'a, I>(peers: I) -> Option<&'a PeerId>
where
    I: IntoIterator<Item = (&'a PeerId, &'a JoinTimestamp)>,
{
    peers
        .into_iter()
        .min_by(|(peer_a, joined_a), (peer_b, joined_b)| {
            joined_a.cmp(joined_b).then_with(|| peer_a.cmp(peer_b))
        })
        .map(|(peer, _)| peer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, JoinTimestamp)]) -> Vec<(PeerId, JoinTimestamp)> {
        entries
            .iter()
            .map(|(id, joined)| (PeerId::new(*id), *joined))
            .collect()
    }

    #[test]
    fn lowest_timestamp_wins() {
        let peers = pairs(&[("b", 200), ("a", 100), ("c", 300)]);
        let leader = elect_leader(peers.iter().map(|(peer, joined)| (peer, joined)));
        assert_eq!(leader.map(PeerId::as_str), Some("a"));
    }

    #[test]
    fn election_ignores_input_order() {
        let forward = pairs(&[("x", 40), ("y", 10), ("z", 25)]);
        let mut reversed = forward.clone();
        reversed.reverse();

        let first = elect_leader(forward.iter().map(|(peer, joined)| (peer, joined))).cloned();
        let second = elect_leader(reversed.iter().map(|(peer, joined)| (peer, joined))).cloned();
        assert_eq!(first, second);
        assert_eq!(first, Some(PeerId::new("y")));
    }

    #[test]
    fn ties_resolve_by_peer_id() {
        let peers = pairs(&[("peer-b", 100), ("peer-a", 100)]);
        let leader = elect_leader(peers.iter().map(|(peer, joined)| (peer, joined)));
        assert_eq!(leader.map(PeerId::as_str), Some("peer-a"));
    }

    #[test]
    fn empty_set_has_no_leader() {
        let peers: Vec<(PeerId, JoinTimestamp)> = Vec::new();
        assert!(elect_leader(peers.iter().map(|(peer, joined)| (peer, joined))).is_none());
    }
}
