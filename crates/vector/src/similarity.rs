//! Cosine similarity and top-N selection

use ndarray::ArrayView1;
use snipvec_common::{Result, SnipvecError};

use crate::record::ScoredRecord;

/// Fail unless both vectors have the same dimension
pub fn validate_lengths(a: &[f64], b: &[f64]) -> Result<()> {
    if a.len() != b.len() {
        return Err(SnipvecError::length_mismatch(a.len(), b.len()));
    }
    Ok(())
}

/// Cosine similarity of two vectors, in [-1, 1].
///
/// A zero-magnitude vector on either side scores `0.0`.
pub fn cosine_score(a: &[f64], b: &[f64]) -> Result<f64> {
    validate_lengths(a, b)?;

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(a.dot(&b) / (norm_a * norm_b))
}

/// Sort descending by score and keep at most `max_count` entries.
///
/// The sort is stable: equal scores keep their incoming order.
pub fn top_n(mut scored: Vec<ScoredRecord>, max_count: usize) -> Vec<ScoredRecord> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(max_count);
    scored
}
