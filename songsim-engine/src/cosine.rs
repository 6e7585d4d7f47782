/// Compute the magnitude (L2 norm) of a feature vector.
pub fn compute_magnitude(vector: &[f32]) -> f64 {
	vector
		.iter()
		.map(|&v| {
			let vf = v as f64;
			vf * vf
		})
		.sum::<f64>()
		.sqrt()
}

/// Cosine similarity using pre-computed magnitudes.
/// Returns 0.0 for zero-magnitude vectors or dimension mismatches.
/// Result clamped to [-1.0, 1.0].
pub fn cosine_similarity_with_magnitude(a: &[f32], b: &[f32], mag_a: f64, mag_b: f64) -> f64 {
	if a.len() != b.len() || a.is_empty() {
		return 0.0;
	}

	let denom = mag_a * mag_b;
	if denom == 0.0 {
		return 0.0;
	}

	let dot: f64 = a
		.iter()
		.zip(b)
		.map(|(&x, &y)| (x as f64) * (y as f64))
		.sum();

	let result = dot / denom;
	if !result.is_finite() {
		return 0.0;
	}
	result.clamp(-1.0, 1.0)
}

/// Cosine distance (`1 - similarity`), in [0.0, 2.0].
/// A zero-magnitude side counts as similarity 0, i.e. distance 1.
pub fn cosine_distance_with_magnitude(a: &[f32], b: &[f32], mag_a: f64, mag_b: f64) -> f64 {
	1.0 - cosine_similarity_with_magnitude(a, b, mag_a, mag_b)
}

/// Element-wise mean of equally sized vectors. Returns an empty vector when
/// `vectors` is empty.
pub fn mean_vector<'a, I>(vectors: I) -> Vec<f32>
where
	I: IntoIterator<Item = &'a [f32]>,
{
	let mut sum: Vec<f64> = Vec::new();
	let mut count = 0usize;
	for v in vectors {
		if sum.is_empty() {
			sum = vec![0.0; v.len()];
		}
		for (acc, &x) in sum.iter_mut().zip(v) {
			*acc += x as f64;
		}
		count += 1;
	}
	if count == 0 {
		return Vec::new();
	}
	sum.into_iter().map(|s| (s / count as f64) as f32).collect()
}
