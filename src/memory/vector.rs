// Vector helpers for the hybrid similarity query: cosine, blob codec, weighted fusion.

use std::collections::HashMap;

/// Cosine similarity clamped to 0.0–1.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a, norm_b) =
        a.iter()
            .zip(b)
            .fold((0.0_f64, 0.0_f64, 0.0_f64), |(dot, na, nb), (x, y)| {
                let (x, y) = (f64::from(*x), f64::from(*y));
                (dot + x * y, na + x * x, nb + y * y)
            });

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

/// Serialize an embedding to little-endian bytes for a BLOB column.
pub fn vec_to_bytes(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn bytes_to_vec(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| {
            let arr: [u8; 4] = chunk.try_into().unwrap_or([0; 4]);
            f32::from_le_bytes(arr)
        })
        .collect()
}

/// Weighted fusion of vector and keyword hits, best first.
///
/// Keyword scores are normalised by the best keyword hit so both inputs
/// live on the same 0–1 scale.
pub fn hybrid_merge(
    vector_results: &[(String, f32)],
    keyword_results: &[(String, f32)],
    vector_weight: f32,
    keyword_weight: f32,
    limit: usize,
) -> Vec<(String, f32)> {
    let mut fused: HashMap<&str, f32> = HashMap::new();

    for (id, score) in vector_results {
        *fused.entry(id.as_str()).or_default() += vector_weight * score;
    }

    let best_keyword = keyword_results
        .iter()
        .map(|(_, s)| *s)
        .fold(0.0_f32, f32::max);
    let best_keyword = if best_keyword < f32::EPSILON {
        1.0
    } else {
        best_keyword
    };

    for (id, score) in keyword_results {
        *fused.entry(id.as_str()).or_default() += keyword_weight * (score / best_keyword);
    }

    let mut ranked: Vec<(String, f32)> = fused
        .into_iter()
        .map(|(id, score)| (id.to_string(), score))
        .collect();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.truncate(limit);
    ranked
}
