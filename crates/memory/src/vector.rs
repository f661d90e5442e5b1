//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Category-filtered top-k ranking over indexed documents

use ragchat_core::retrieval::{Category, IndexedDocument, SearchHit};

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank documents of one category by cosine similarity to `query`.
///
/// Returns at most `limit` hits sorted by descending score. Ties keep
/// insertion order.
pub fn vector_search<'a>(
    documents: impl IntoIterator<Item = &'a IndexedDocument>,
    query: &[f32],
    category: Category,
    limit: usize,
) -> Vec<SearchHit> {
    let mut scored: Vec<SearchHit> = documents
        .into_iter()
        .filter(|doc| doc.category == category)
        .map(|doc| SearchHit {
            id: doc.id.clone(),
            text: doc.text.clone(),
            source_tag: doc.category.as_tag().to_string(),
            score: cosine_similarity(&doc.embedding, query),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}
