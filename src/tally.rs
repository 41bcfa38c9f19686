//! Vote tallying and result classification.
//!
//! Pure computation over ballot counts; all I/O happens in the callers.
//! Standings are recomputed on demand rather than cached, so a fresh read
//! always reflects every stored ballot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// Result classification for a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Standing {
    Leading,
    Contested,
    Rejected,
}

/// One candidate's live standing in an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    pub candidate_id: Id,
    pub votes: u64,
    /// Rejection count; only ever non-zero in single-candidate elections.
    pub vote_lost: u64,
    pub is_leading: bool,
    pub status: Option<Standing>,
    /// Integer percentage, rounded half-up. Of the yes/no split in
    /// single-candidate elections, of all votes cast otherwise.
    pub percentage: u32,
}

/// Compute standings for every participating candidate.
///
/// `vote_candidates` is the candidate reference of each stored vote;
/// `rejections` is the election's rejection count and only contributes in
/// the single-candidate case. Candidates with no votes still appear, at
/// zero. A vote referencing an unknown candidate is a programming error
/// upstream (casting validates participation) and is ignored here.
pub fn tally(
    candidates: &[Id],
    vote_candidates: impl IntoIterator<Item = Id>,
    rejections: u64,
) -> Vec<CandidateTally> {
    let mut counts: HashMap<Id, u64> = candidates.iter().map(|id| (*id, 0)).collect();
    for candidate_id in vote_candidates {
        match counts.get_mut(&candidate_id) {
            Some(count) => *count += 1,
            None => debug_assert!(false, "vote for non-participant {candidate_id}"),
        }
    }

    if let [single] = candidates {
        return vec![tally_referendum(*single, counts[single], rejections)];
    }

    let total: u64 = counts.values().sum();
    let top = counts.values().copied().max().unwrap_or(0);
    let top_is_unique = counts.values().filter(|&&v| v == top).count() == 1;

    candidates
        .iter()
        .map(|&candidate_id| {
            let votes = counts[&candidate_id];
            // Top candidates are classified even at zero votes: an all-zero
            // field is an N-way tie.
            let status = if votes == top {
                if top_is_unique {
                    Some(Standing::Leading)
                } else {
                    Some(Standing::Contested)
                }
            } else {
                None
            };
            CandidateTally {
                candidate_id,
                votes,
                vote_lost: 0,
                is_leading: status == Some(Standing::Leading),
                status,
                percentage: percentage(votes, total),
            }
        })
        .collect()
}

/// Single-candidate (referendum) classification: votes against rejections.
fn tally_referendum(candidate_id: Id, votes: u64, rejections: u64) -> CandidateTally {
    let status = match votes.cmp(&rejections) {
        std::cmp::Ordering::Greater => Standing::Leading,
        std::cmp::Ordering::Equal => Standing::Contested,
        std::cmp::Ordering::Less => Standing::Rejected,
    };
    CandidateTally {
        candidate_id,
        votes,
        vote_lost: rejections,
        is_leading: status == Standing::Leading,
        status: Some(status),
        percentage: percentage(votes, votes + rejections),
    }
}

/// Integer percentage, rounded half-up; 0 when the denominator is 0.
fn percentage(part: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Id> {
        (0..n).map(|_| Id::new()).collect()
    }

    #[test]
    fn referendum_leading() {
        // 5 votes, 2 rejections: round(5/7 * 100) = 71, Leading.
        let candidates = ids(1);
        let votes = std::iter::repeat(candidates[0]).take(5);
        let result = tally(&candidates, votes, 2);

        assert_eq!(result.len(), 1);
        let standing = &result[0];
        assert_eq!(standing.votes, 5);
        assert_eq!(standing.vote_lost, 2);
        assert_eq!(standing.percentage, 71);
        assert_eq!(standing.status, Some(Standing::Leading));
        assert!(standing.is_leading);
    }

    #[test]
    fn referendum_contested_and_rejected() {
        let candidates = ids(1);

        let tied = tally(&candidates, std::iter::repeat(candidates[0]).take(3), 3);
        assert_eq!(tied[0].status, Some(Standing::Contested));
        assert!(!tied[0].is_leading);
        assert_eq!(tied[0].percentage, 50);

        let lost = tally(&candidates, std::iter::repeat(candidates[0]).take(1), 4);
        assert_eq!(lost[0].status, Some(Standing::Rejected));
        assert!(!lost[0].is_leading);
        assert_eq!(lost[0].percentage, 20);
    }

    #[test]
    fn referendum_no_ballots() {
        let candidates = ids(1);
        let result = tally(&candidates, std::iter::empty(), 0);
        assert_eq!(result[0].percentage, 0);
        assert_eq!(result[0].status, Some(Standing::Contested));
    }

    #[test]
    fn two_way_tie_is_contested() {
        // A and B with 3 votes each: both Contested, neither leading, 50% each.
        let candidates = ids(2);
        let votes = std::iter::repeat(candidates[0])
            .take(3)
            .chain(std::iter::repeat(candidates[1]).take(3));
        let result = tally(&candidates, votes, 0);

        for standing in &result {
            assert_eq!(standing.status, Some(Standing::Contested));
            assert!(!standing.is_leading);
            assert_eq!(standing.percentage, 50);
        }
    }

    #[test]
    fn unique_leader() {
        let candidates = ids(3);
        let votes = std::iter::repeat(candidates[0])
            .take(4)
            .chain(std::iter::repeat(candidates[1]).take(2))
            .chain(std::iter::repeat(candidates[2]).take(2));
        let result = tally(&candidates, votes, 0);

        assert_eq!(result[0].status, Some(Standing::Leading));
        assert!(result[0].is_leading);
        assert_eq!(result[0].percentage, 50);
        for standing in &result[1..] {
            assert_eq!(standing.status, None);
            assert!(!standing.is_leading);
            assert_eq!(standing.percentage, 25);
        }

        // Votes sum to the total ballot count.
        let total: u64 = result.iter().map(|s| s.votes).sum();
        assert_eq!(total, 8);
    }

    #[test]
    fn zero_votes_all_round() {
        let candidates = ids(3);
        let result = tally(&candidates, std::iter::empty(), 0);
        for standing in &result {
            assert_eq!(standing.votes, 0);
            assert_eq!(standing.percentage, 0);
            // Everyone ties on zero: a three-way contest, nobody leading.
            assert_eq!(standing.status, Some(Standing::Contested));
            assert!(!standing.is_leading);
        }
    }

    #[test]
    fn candidates_with_no_votes_still_appear() {
        let candidates = ids(2);
        let result = tally(&candidates, std::iter::once(candidates[0]), 0);
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].votes, 0);
        assert_eq!(result[0].percentage, 100);
    }

    #[test]
    fn percentages_sum_to_roughly_one_hundred() {
        let candidates = ids(3);
        let votes = std::iter::repeat(candidates[0])
            .take(1)
            .chain(std::iter::repeat(candidates[1]).take(1))
            .chain(std::iter::repeat(candidates[2]).take(1));
        let result = tally(&candidates, votes, 0);
        let sum: u32 = result.iter().map(|s| s.percentage).sum();
        // 33 + 33 + 33: rounding slack of up to one point per candidate.
        assert!((97..=103).contains(&sum));
    }

    #[test]
    fn rounding_is_half_up() {
        // 1 of 8 = 12.5% -> 13.
        let candidates = ids(2);
        let votes = std::iter::repeat(candidates[0])
            .take(1)
            .chain(std::iter::repeat(candidates[1]).take(7));
        let result = tally(&candidates, votes, 0);
        assert_eq!(result[0].percentage, 13);
        assert_eq!(result[1].percentage, 88);
    }
}
