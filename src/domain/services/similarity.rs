//! Cosine similarity and brute-force ranking over candidate chunks.
//!
//! Ranking is a linear scan: every candidate is scored against the query.
//! Callers see only [`rank`] and [`most_similar`], so an index can replace
//! the scan without changing their signatures.

use std::cmp::Ordering;

use crate::domain::{DocumentChunk, ScoredChunk, SearchQuery};

pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// `dot(a, b) / (|a| * |b|)`, clamped to `[-1, 1]`.
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let norm_a = magnitude(a);
    let norm_b = magnitude(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot_product(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Scores, filters, sorts and truncates `candidates` against `query_embedding`.
///
/// Candidates without an embedding are skipped. In hybrid mode a candidate
/// must also contain the query text, compared case-insensitively, before it
/// is scored. Equal scores keep their candidate order.
pub fn rank(
    query_embedding: &[f32],
    candidates: Vec<DocumentChunk>,
    query: &SearchQuery,
) -> Vec<ScoredChunk> {
    let needle = query.is_hybrid().then(|| query.query().to_lowercase());

    let mut scored: Vec<ScoredChunk> = candidates
        .into_iter()
        .filter(|chunk| {
            query
                .document_id()
                .map_or(true, |doc| chunk.document_id() == doc)
        })
        .filter(|chunk| {
            needle
                .as_deref()
                .map_or(true, |n| chunk.content().to_lowercase().contains(n))
        })
        .filter_map(|chunk| {
            let score = cosine_similarity(query_embedding, chunk.embedding()?);
            query
                .accepts_score(score)
                .then(|| ScoredChunk::new(chunk, score))
        })
        .collect();

    // `sort_by` is stable, which preserves candidate order on ties.
    scored.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));
    scored.truncate(query.limit());
    scored
}

/// The single best candidate, with no threshold applied.
pub fn most_similar(query_embedding: &[f32], candidates: Vec<DocumentChunk>) -> Option<ScoredChunk> {
    let mut best: Option<ScoredChunk> = None;
    for chunk in candidates {
        let Some(vector) = chunk.embedding() else {
            continue;
        };
        let score = cosine_similarity(query_embedding, vector);
        if !score.is_finite() {
            continue;
        }
        if best.as_ref().map_or(true, |b| score > b.score()) {
            best = Some(ScoredChunk::new(chunk, score));
        }
    }
    best
}
