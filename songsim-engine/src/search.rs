use std::collections::BTreeSet;

use crate::cosine::{compute_magnitude, cosine_distance_with_magnitude, mean_vector};
use crate::error::RecommendError;
use crate::filter::CandidatePool;
use crate::types::{Candidate, FilterSpec};

/// Mean of the seed rows' feature vectors, read from the unfiltered store.
pub fn query_vector(seeds: &BTreeSet<usize>, pool: &CandidatePool<'_>) -> Vec<f32> {
	let features = pool.features();
	mean_vector(seeds.iter().map(|&row| features.vector(row)))
}

/// Nearest pool rows to the seeds' mean vector by cosine distance.
///
/// Fetches `min(pool size, top_k + seeds)` neighbours, ascending by
/// distance (ties go to the lower row), then drops every seed row.
/// `filters` only labels the error when nothing is left.
pub fn nearest(
	seeds: &BTreeSet<usize>,
	pool: &CandidatePool<'_>,
	top_k: usize,
	filters: &FilterSpec,
) -> Result<Vec<Candidate>, RecommendError> {
	let query = query_vector(seeds, pool);
	let query_mag = compute_magnitude(&query);
	let features = pool.features();

	let mut scored: Vec<Candidate> = pool
		.iter()
		.map(|(row, _, vector)| Candidate {
			row,
			distance: cosine_distance_with_magnitude(
				&query,
				vector,
				query_mag,
				features.magnitude(row),
			),
		})
		.collect();

	scored.sort_by(|a, b| {
		a.distance
			.total_cmp(&b.distance)
			.then_with(|| a.row.cmp(&b.row))
	});

	let k_effective = pool.len().min(top_k.saturating_add(seeds.len()));
	scored.truncate(k_effective);
	scored.retain(|c| !seeds.contains(&c.row));

	if scored.is_empty() {
		return Err(RecommendError::EmptyCandidateSet(filters.clone()));
	}
	Ok(scored)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::Catalog;
	use crate::features::FeatureStore;
	use crate::filter;
	use crate::types::{FilterDimension, Track};

	fn track(title: &str, genre: &str) -> Track {
		Track {
			id: title.into(),
			title: title.into(),
			artists: "X".into(),
			album: "M".into(),
			genre: genre.into(),
			popularity: 0,
		}
	}

	fn fixture() -> (Catalog, FeatureStore) {
		let catalog = Catalog::new(vec![
			track("A", "pop"),
			track("B", "pop"),
			track("C", "rock"),
			track("D", "pop"),
			track("E", "rock"),
		]);
		let features = FeatureStore::from_rows(vec![
			vec![1.0, 0.0],
			vec![0.95, 0.05],
			vec![0.0, 1.0],
			vec![0.6, 0.4],
			vec![0.8, 0.2],
		])
		.unwrap();
		(catalog, features)
	}

	fn seeds(rows: &[usize]) -> BTreeSet<usize> {
		rows.iter().copied().collect()
	}

	#[test]
	fn orders_by_distance_and_excludes_seed() {
		let (catalog, features) = fixture();
		let pool = filter::apply(&FilterSpec::none(), 0, &catalog, &features).unwrap();
		let hits = nearest(&seeds(&[0]), &pool, 10, &FilterSpec::none()).unwrap();
		let rows: Vec<usize> = hits.iter().map(|c| c.row).collect();
		assert_eq!(rows, vec![1, 4, 3, 2]);
		assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
	}

	#[test]
	fn over_fetches_by_seed_count() {
		let (catalog, features) = fixture();
		let pool = filter::apply(&FilterSpec::none(), 0, &catalog, &features).unwrap();
		// k_effective = 1 + 1 seed; the seed itself is nearest and dropped.
		let hits = nearest(&seeds(&[0]), &pool, 1, &FilterSpec::none()).unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].row, 1);
	}

	#[test]
	fn query_vector_is_mean_of_seeds() {
		let (catalog, features) = fixture();
		let pool = filter::apply(&FilterSpec::none(), 0, &catalog, &features).unwrap();
		let query = query_vector(&seeds(&[0, 2]), &pool);
		assert_eq!(query, vec![0.5, 0.5]);
	}

	#[test]
	fn seeds_outside_the_pool_still_shape_the_query() {
		let (catalog, features) = fixture();
		let genre = [FilterDimension::Genre].into_iter().collect::<FilterSpec>();
		// Reference row 2 is rock; seed 0 (pop) is not in the pool.
		let pool = filter::apply(&genre, 2, &catalog, &features).unwrap();
		let hits = nearest(&seeds(&[0, 2]), &pool, 5, &genre).unwrap();
		let rows: Vec<usize> = hits.iter().map(|c| c.row).collect();
		assert_eq!(rows, vec![4]);
	}

	#[test]
	fn only_seeds_left_is_an_empty_candidate_set() {
		let catalog = Catalog::new(vec![track("A", "pop"), track("B", "pop")]);
		let features = FeatureStore::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
		let pool = filter::apply(&FilterSpec::none(), 0, &catalog, &features).unwrap();
		let err = nearest(&seeds(&[0, 1]), &pool, 3, &FilterSpec::none()).unwrap_err();
		assert_eq!(err, RecommendError::EmptyCandidateSet(FilterSpec::none()));
	}

	#[test]
	fn equal_distances_keep_row_order() {
		let catalog = Catalog::new(vec![track("A", "pop"), track("B", "pop"), track("C", "pop")]);
		let features =
			FeatureStore::from_rows(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]]).unwrap();
		let pool = filter::apply(&FilterSpec::none(), 0, &catalog, &features).unwrap();
		let hits = nearest(&seeds(&[0]), &pool, 5, &FilterSpec::none()).unwrap();
		let rows: Vec<usize> = hits.iter().map(|c| c.row).collect();
		assert_eq!(rows, vec![1, 2]);
	}
}
