// Vector operations used by the in-memory similarity search.

/// Cosine similarity between two vectors. Returns 0.0–1.0.
///
/// Mismatched lengths, empty or zero vectors score 0.0; negative
/// similarity is clamped to 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = f64::from(*x);
        let y = f64::from(*y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !denom.is_finite() || denom < f64::EPSILON {
        return 0.0;
    }

    let raw = dot / denom;
    if !raw.is_finite() {
        return 0.0;
    }

    #[allow(clippy::cast_possible_truncation)]
    let sim = raw.clamp(0.0, 1.0) as f32;
    sim
}

/// Sort `(item, score)` pairs by descending score, dropping scores below
/// `min_score`, and keep at most `limit`.
pub fn top_k_above<T>(mut scored: Vec<(T, f32)>, min_score: f32, limit: usize) -> Vec<(T, f32)> {
    scored.retain(|(_, score)| score.is_finite() && *score >= min_score);
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}
