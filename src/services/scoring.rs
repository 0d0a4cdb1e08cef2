//! Outcome computation for a completing session.
//!
//! Pure arithmetic over already-fetched rows, so the whole thing is
//! unit-testable without a database.

use std::cmp::Ordering;
use std::collections::HashMap;

use clap::ValueEnum;

use crate::db::models::{QuizResultRow, ResponseWeightRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoringPolicy {
    /// Sum answer weights into a total, then match it against min_score
    /// threshold bands (highest threshold not exceeding the total wins).
    Weighted,
    /// One vote per answer-result mapping, weight ignored; plurality wins.
    Voting,
}

/// The resolver's output: at most one primary result, the scalar that
/// becomes the session's lead_score, and the lead flag copied off the
/// primary result.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub primary: Option<QuizResultRow>,
    pub score: f64,
    pub is_lead: bool,
}

pub fn resolve(
    policy: ScoringPolicy,
    responses: &[ResponseWeightRow],
    results: &[QuizResultRow],
) -> Resolution {
    let (primary, score) = match policy {
        ScoringPolicy::Weighted => resolve_weighted(responses, results),
        ScoringPolicy::Voting => resolve_voting(responses, results),
    };

    let is_lead = primary.as_ref().map(|r| r.is_lead).unwrap_or(false);

    Resolution {
        primary,
        score,
        is_lead,
    }
}

fn resolve_weighted(
    responses: &[ResponseWeightRow],
    results: &[QuizResultRow],
) -> (Option<QuizResultRow>, f64) {
    let total: f64 = responses.iter().map(|r| r.weight).sum();

    let mut by_threshold: Vec<&QuizResultRow> = results.iter().collect();
    by_threshold.sort_by(|a, b| {
        b.min_score
            .partial_cmp(&a.min_score)
            .unwrap_or(Ordering::Equal)
    });

    // Highest threshold the total clears; below every band, the lowest
    // threshold acts as the catch-all.
    let primary = by_threshold
        .iter()
        .find(|r| r.min_score <= total)
        .copied()
        .or_else(|| by_threshold.last().copied())
        .cloned();

    (primary, total)
}

fn resolve_voting(
    responses: &[ResponseWeightRow],
    results: &[QuizResultRow],
) -> (Option<QuizResultRow>, f64) {
    let mut votes: HashMap<i64, i64> = HashMap::new();
    for response in responses {
        *votes.entry(response.result_id).or_insert(0) += 1;
    }

    // Plurality, with a deterministic tie-break: lowest display_order,
    // then creation order.
    let winner = results
        .iter()
        .filter_map(|result| votes.get(&result.id).map(|count| (result, *count)))
        .max_by(|(a, count_a), (b, count_b)| {
            count_a
                .cmp(count_b)
                .then_with(|| b.display_order.cmp(&a.display_order))
                .then_with(|| b.id.cmp(&a.id))
        });

    match winner {
        Some((result, count)) => (Some(result.clone()), count as f64),
        // No votes cast at all: fall back to the first result by display
        // order, scoring zero.
        None => {
            let fallback = results
                .iter()
                .min_by_key(|r| (r.display_order, r.id))
                .cloned();
            (fallback, 0.0)
        }
    }
}
