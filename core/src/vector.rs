use std::collections::BTreeMap;

/// Sparse term -> weight mapping.
pub type DocumentVector = BTreeMap<String, f64>;

/// Elementwise union-sum: keys from either side, shared keys added.
pub fn sum_vectors(a: &DocumentVector, b: &DocumentVector) -> DocumentVector {
    let mut out = a.clone();
    for (term, w) in b {
        *out.entry(term.clone()).or_insert(0.0) += w;
    }
    out
}

pub fn norm(v: &DocumentVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

pub fn dot(a: &DocumentVector, b: &DocumentVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|other| w * other))
        .sum()
}

/// Cosine of the angle between two sparse vectors; 0 when either has zero norm.
pub fn cosine_similarity(a: &DocumentVector, b: &DocumentVector) -> f64 {
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        return 0.0;
    }
    dot(a, b) / denom
}
