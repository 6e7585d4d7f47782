// ---------------------------------------------------------------------------
// Filter engine: narrow the candidate pool around a reference row
// ---------------------------------------------------------------------------
//
// A pool is a list of original row positions. Tracks and feature vectors
// are both read through those positions, so they cannot drift apart, and
// the shared catalog / feature store are never copied or mutated.
// ---------------------------------------------------------------------------

use crate::catalog::{normalize, Catalog};
use crate::error::RecommendError;
use crate::features::FeatureStore;
use crate::types::{FilterDimension, FilterSpec, Track};

/// Attribute values of the reference row that filters compare against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAttributes {
	/// Trimmed, lowercased artists string.
	pub artists: String,
	pub genre: String,
	pub album: String,
}

impl ReferenceAttributes {
	pub fn of(track: &Track) -> Self {
		Self {
			artists: normalize(&track.artists),
			genre: track.genre.clone(),
			album: track.album.clone(),
		}
	}
}

/// Read-only view of the rows that survived filtering.
#[derive(Debug, Clone)]
pub struct CandidatePool<'a> {
	catalog: &'a Catalog,
	features: &'a FeatureStore,
	rows: Vec<usize>,
}

impl<'a> CandidatePool<'a> {
	/// Original row positions in ascending order.
	pub fn rows(&self) -> &[usize] {
		&self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// `(row, track, feature vector)` triples in row order.
	pub fn iter(&self) -> impl Iterator<Item = (usize, &'a Track, &'a [f32])> + '_ {
		let catalog = self.catalog;
		let features = self.features;
		self.rows
			.iter()
			.map(move |&row| (row, catalog.track(row), features.vector(row)))
	}

	pub fn features(&self) -> &'a FeatureStore {
		self.features
	}
}

/// Narrow the catalog to rows sharing every requested attribute with
/// `reference_row`. Artist compares by case-insensitive substring, genre
/// and album by exact equality.
///
/// Fails with [`RecommendError::InsufficientData`] when one row or fewer
/// survive.
pub fn apply<'a>(
	filters: &FilterSpec,
	reference_row: usize,
	catalog: &'a Catalog,
	features: &'a FeatureStore,
) -> Result<CandidatePool<'a>, RecommendError> {
	let reference = ReferenceAttributes::of(catalog.track(reference_row));

	let rows: Vec<usize> = (0..catalog.len())
		.filter(|&row| {
			filters
				.iter()
				.all(|dimension| matches(dimension, &reference, catalog, row))
		})
		.collect();

	if rows.len() <= 1 {
		return Err(RecommendError::InsufficientData {
			filters: filters.clone(),
			pool_size: rows.len(),
		});
	}

	Ok(CandidatePool {
		catalog,
		features,
		rows,
	})
}

fn matches(
	dimension: FilterDimension,
	reference: &ReferenceAttributes,
	catalog: &Catalog,
	row: usize,
) -> bool {
	match dimension {
		FilterDimension::Artist => catalog.artists_key(row).contains(reference.artists.as_str()),
		FilterDimension::Genre => catalog.track(row).genre == reference.genre,
		FilterDimension::Album => catalog.track(row).album == reference.album,
	}
}
