//! Routing policy lookup.
//!
//! The network ships with a precomputed policy: for every origin-destination
//! pair, the set of equally optimal next-hop stations. The engine never
//! computes shortest paths; it only executes this table, deciding for each
//! passenger cohort whether to ride the current line or to transfer through
//! an intermediate station.

use thiserror::Error;

use crate::network::Network;
use crate::rng::SimRng;

/// Where a cohort goes next from its current station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Stay on (or board) the line through the current station, traveling
    /// in `direction`.
    SameLine { direction: usize },

    /// Walk to the logical station `via` of the same interchange and travel
    /// from there in `direction`.
    Transfer { via: usize, direction: usize },
}

/// Hole in the routing tables discovered while executing the policy.
///
/// These are data defects, not runtime conditions: a consistent policy
/// always yields a candidate and a direction. The engine treats them as
/// fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no stored policy from station {from} to station {to}")]
    NoPolicy { from: usize, to: usize },

    #[error("direction table has no entry from transfer station {via} toward {to}")]
    MissingDirection { via: usize, to: usize },
}

/// Decide the next hop for a cohort at `from` bound for `to`.
///
/// `current_line` is the line of the train the cohort is aboard, or `None`
/// when the cohort is at its origin and not yet riding.
///
/// Selection among the stored candidates:
/// 1. a single candidate is taken as-is;
/// 2. otherwise the first candidate on `current_line` wins, so equally
///    optimal paths never force a needless transfer;
/// 3. otherwise one candidate is drawn uniformly from the simulation-owned
///    RNG, spreading load across replicas while staying reproducible.
///
/// The chosen candidate `n` is interpreted through the direction table:
/// adjacent on one line means `SameLine`, anything else means a transfer
/// via `n` heading `directions[n][to]`.
pub fn route(
    network: &Network,
    from: usize,
    to: usize,
    current_line: Option<u32>,
    rng: &mut SimRng,
) -> Result<Decision, RoutingError> {
    let candidates = network.candidates(from, to);
    let next = match candidates {
        [] => return Err(RoutingError::NoPolicy { from, to }),
        [only] => *only,
        _ => {
            let same_line = current_line.and_then(|line| {
                candidates.iter().copied().find(|&n| network.line_of(n) == line)
            });
            match same_line {
                Some(n) => n,
                None => candidates[rng.choose_index(candidates.len())],
            }
        }
    };

    match network.direction_between(from, next) {
        Some(direction) => Ok(Decision::SameLine { direction }),
        None => {
            let direction = network
                .direction_between(next, to)
                .ok_or(RoutingError::MissingDirection { via: next, to })?;
            Ok(Decision::Transfer { via: next, direction })
        }
    }
}
