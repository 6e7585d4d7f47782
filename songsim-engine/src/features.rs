use crate::cosine::compute_magnitude;
use crate::error::LoadError;

/// Fixed-dimension feature vectors, one per catalog row, stored contiguously.
/// Magnitudes are computed once at construction.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
	dimension: usize,
	values: Vec<f32>,
	magnitudes: Vec<f64>,
}

impl FeatureStore {
	/// Build a store from per-row vectors. Every vector must have
	/// `dimension` components.
	pub fn new(dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self, LoadError> {
		let mut values = Vec::with_capacity(dimension * vectors.len());
		let mut magnitudes = Vec::with_capacity(vectors.len());
		for (row, vector) in vectors.into_iter().enumerate() {
			if vector.len() != dimension {
				return Err(LoadError::Corruption(format!(
					"feature vector {} has {} components, expected {}",
					row,
					vector.len(),
					dimension
				)));
			}
			magnitudes.push(compute_magnitude(&vector));
			values.extend(vector);
		}
		Ok(Self {
			dimension,
			values,
			magnitudes,
		})
	}

	/// Like [`FeatureStore::new`] but takes the dimension from the first
	/// vector.
	pub fn from_rows(vectors: Vec<Vec<f32>>) -> Result<Self, LoadError> {
		let dimension = vectors.first().map(Vec::len).unwrap_or(0);
		Self::new(dimension, vectors)
	}

	pub fn dimension(&self) -> usize {
		self.dimension
	}

	pub fn len(&self) -> usize {
		self.magnitudes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.magnitudes.is_empty()
	}

	/// Feature vector of `row`. Panics if `row` is out of range.
	pub fn vector(&self, row: usize) -> &[f32] {
		let start = row * self.dimension;
		&self.values[start..start + self.dimension]
	}

	/// L2 norm of `row`'s vector.
	pub fn magnitude(&self, row: usize) -> f64 {
		self.magnitudes[row]
	}

	pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
		(0..self.len()).map(move |row| self.vector(row))
	}
}
