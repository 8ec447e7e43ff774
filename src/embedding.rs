//! Embedding vectors and the similarity math used to rank them.
//!
//! An [`Embedding`] records whether its vector came from the embedding
//! service ([`Embedding::Real`]) or was substituted after a service failure
//! ([`Embedding::Fallback`]). Fallback vectors are all zeros, so they score
//! 0 against everything and never clear the relevance threshold.

/// A fixed-length vector for one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub enum Embedding {
    /// Vector returned by the embedding service.
    Real(Vec<f32>),
    /// Zero vector substituted after a service failure.
    Fallback(Vec<f32>),
}

impl Embedding {
    /// Build the zero-vector fallback for the given dimensionality.
    pub fn fallback(dimension: usize) -> Self {
        Self::Fallback(vec![0.0; dimension])
    }

    /// The raw vector, regardless of provenance.
    pub fn vector(&self) -> &[f32] {
        match self {
            Self::Real(v) | Self::Fallback(v) => v,
        }
    }

    /// Number of components in the vector.
    pub fn dimension(&self) -> usize {
        self.vector().len()
    }

    /// True when this vector was substituted after a service failure.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Cosine similarity between two vectors.
///
/// Vectors of different lengths score 0, and a zero-magnitude vector on
/// either side also scores 0 rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3, -1.2, 0.5, 2.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let v = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0; 3];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = vec![1.0, 0.0, 2.0];
        let b = vec![0.5, 1.5, -1.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        let a = vec![1.0, 2.0];
        let b = vec![-1.0, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn fallback_is_all_zeros() {
        let e = Embedding::fallback(8);
        assert!(e.is_fallback());
        assert_eq!(e.dimension(), 8);
        assert!(e.vector().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn real_embedding_keeps_its_vector() {
        let e = Embedding::Real(vec![0.1, 0.2]);
        assert!(!e.is_fallback());
        assert_eq!(e.vector(), &[0.1, 0.2]);
    }
}
