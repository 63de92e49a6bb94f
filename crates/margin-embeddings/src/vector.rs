//! Vector math primitives.
//!
//! Embeddings are only comparable when produced by the same model, so every
//! binary operation checks dimensions instead of silently truncating.

use crate::{EmbeddingError, EmbeddingResult};

fn check_dimensions(a: &[f32], b: &[f32]) -> EmbeddingResult<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(())
}

/// Compute dot product between two vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
    check_dimensions(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Euclidean (L2) length of a vector.
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Compute cosine similarity between two vectors.
///
/// Returns `dot(a, b) / (|a| * |b|)`. Callers must not pass zero vectors:
/// the result is then `NaN`. The embedding service never hands out zero
/// vectors, so this only matters for hand-built inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
    let dot = dot_product(a, b)?;
    Ok(dot / (magnitude(a) * magnitude(b)))
}

/// Compute Euclidean distance between two vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> EmbeddingResult<f32> {
    check_dimensions(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt())
}

/// Scale a vector to unit length.
///
/// A vector with magnitude exactly zero is returned unchanged.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = magnitude(v);
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Element-wise mean of equally sized vectors.
pub fn average(vectors: &[Vec<f32>]) -> EmbeddingResult<Vec<f32>> {
    let Some(first) = vectors.first() else {
        return Err(EmbeddingError::InvalidInput(
            "cannot average an empty set of vectors".to_string(),
        ));
    };

    let mut sum = vec![0.0f32; first.len()];
    for v in vectors {
        check_dimensions(first, v)?;
        for (acc, x) in sum.iter_mut().zip(v.iter()) {
            *acc += x;
        }
    }

    let n = vectors.len() as f32;
    Ok(sum.into_iter().map(|x| x / n).collect())
}

/// Reduce a vector to at most `target_dim` components by averaging contiguous
/// groups of `ceil(len / target_dim)` components.
///
/// Deterministic and lossy; meant for 2D/3D visualization only. Reduced
/// vectors must never be compared against full-dimension ones.
pub fn reduce_dimensions(v: &[f32], target_dim: usize) -> Vec<f32> {
    if target_dim == 0 {
        return Vec::new();
    }
    if target_dim >= v.len() {
        return v.to_vec();
    }

    let group = v.len().div_ceil(target_dim);
    v.chunks(group)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 0.001);
        assert!((v[1] - 0.8).abs() < 0.001);

        // Check unit length
        assert!((magnitude(&v) - 1.0).abs() < 0.001);
    }

    #[test]
    fn normalize_zero_vector_is_unchanged() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0];
        let b = [1.0, 0.0];
        let c = [0.0, 1.0];
        let d = [-1.0, 0.0];

        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < 0.001); // Same direction
        assert!(cosine_similarity(&a, &c).unwrap().abs() < 0.001); // Orthogonal
        assert!((cosine_similarity(&a, &d).unwrap() + 1.0).abs() < 0.001); // Opposite
    }

    #[test]
    fn cosine_similarity_is_symmetric() {
        let pairs = [
            (vec![0.3, -1.2, 4.0], vec![2.0, 0.5, -0.7]),
            (vec![1.0, 1.0, 1.0], vec![0.1, 0.2, 0.3]),
            (vec![-5.0, 2.5, 0.01], vec![-4.0, 3.0, 1.0]),
        ];
        for (a, b) in &pairs {
            let ab = cosine_similarity(a, b).unwrap();
            let ba = cosine_similarity(b, a).unwrap();
            assert!((ab - ba).abs() < 1e-6);
        }
    }

    #[test]
    fn self_similarity_is_one() {
        for v in [vec![0.2, 0.9, -0.4], vec![10.0, 0.0, 0.0], vec![-3.0, -3.0, 1.5]] {
            assert!((cosine_similarity(&v, &v).unwrap() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn cosine_similarity_rejects_mismatched_dimensions() {
        let err = cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn cosine_similarity_of_zero_vector_is_nan() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).unwrap().is_nan());
    }

    #[test]
    fn test_euclidean_distance() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];

        assert!((euclidean_distance(&a, &b).unwrap() - 5.0).abs() < 0.001);
        assert!(euclidean_distance(&a, &a).unwrap() < 0.001);
    }

    #[test]
    fn average_is_element_wise() {
        let avg = average(&[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(avg, vec![2.0, 4.0]);

        assert_eq!(average(&[vec![0.5, 0.5]]).unwrap(), vec![0.5, 0.5]);
        assert!(average(&[]).is_err());
        assert!(average(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn reduce_dimensions_groups_contiguous_components() {
        let v = [1.0, 3.0, 5.0, 7.0, 9.0, 11.0];
        assert_eq!(reduce_dimensions(&v, 3), vec![2.0, 6.0, 10.0]);
        assert_eq!(reduce_dimensions(&v, 2), vec![3.0, 9.0]);
    }

    #[test]
    fn reduce_dimensions_uneven_and_degenerate() {
        // 5 components into 2 groups of (3, 2)
        let v = [1.0, 2.0, 3.0, 10.0, 20.0];
        assert_eq!(reduce_dimensions(&v, 2), vec![2.0, 15.0]);
        assert_eq!(reduce_dimensions(&v, 8), v.to_vec());
        assert!(reduce_dimensions(&v, 0).is_empty());
    }
}
