// ---------------------------------------------------------------------------
// Recommender: immutable service context and the recommendation pipeline
// ---------------------------------------------------------------------------
//
// Built once at start-up from a catalog and its parallel feature store and
// never mutated afterwards; every request borrows it read-only. A request
// runs Resolve → Filter → Search → Rank to completion. The first failing
// stage ends the request and nothing partial is returned.
// ---------------------------------------------------------------------------

use crate::catalog::Catalog;
use crate::error::{LoadError, RecommendError};
use crate::features::FeatureStore;
use crate::types::{
	CatalogInfo, FilterDimension, Recommendation, RecommendType, RecommendationRequest, SearchBy,
};
use crate::{filter, ranker, resolver, search};

pub struct Recommender {
	catalog: Catalog,
	features: FeatureStore,
	model_version: Option<String>,
}

impl Recommender {
	/// Pair a catalog with its feature store. Row `i` of the catalog must be
	/// described by vector `i` of the store.
	pub fn new(catalog: Catalog, features: FeatureStore) -> Result<Self, LoadError> {
		if catalog.len() != features.len() {
			return Err(LoadError::Mismatch {
				rows: catalog.len(),
				vectors: features.len(),
			});
		}
		Ok(Self {
			catalog,
			features,
			model_version: None,
		})
	}

	pub fn with_model_version(mut self, version: Option<String>) -> Self {
		self.model_version = version;
		self
	}

	/// Run the full pipeline for one request.
	///
	/// The reference row for filtering is the lowest matched row.
	pub fn recommend(
		&self,
		request: &RecommendationRequest,
	) -> Result<Vec<Recommendation>, RecommendError> {
		let seeds = resolver::resolve(&request.queries, request.search_by, &self.catalog)?;
		let reference_row = match seeds.first() {
			Some(&row) => row,
			None => return Err(RecommendError::NoMatch(request.queries.clone())),
		};

		let pool = filter::apply(&request.filters, reference_row, &self.catalog, &self.features)?;
		let candidates = search::nearest(&seeds, &pool, request.top_k, &request.filters)?;

		Ok(ranker::rank(
			&candidates,
			&self.catalog,
			request.recommend_type,
			request.top_k,
		))
	}

	pub fn info(&self) -> CatalogInfo {
		CatalogInfo {
			model_version: self
				.model_version
				.clone()
				.unwrap_or_else(|| "unknown".to_string()),
			dataset_size: self.catalog.len(),
			feature_dimension: self.features.dimension(),
			available_filters: FilterDimension::ALL.iter().map(|d| d.as_str()).collect(),
			available_search_by: SearchBy::ALL.iter().map(|s| s.as_str()).collect(),
			available_recommend_types: RecommendType::ALL.iter().map(|r| r.as_str()).collect(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{FilterSpec, Track};

	fn track(title: &str, artists: &str, album: &str, genre: &str, popularity: u32) -> Track {
		Track {
			id: format!("id-{}", title),
			title: title.into(),
			artists: artists.into(),
			album: album.into(),
			genre: genre.into(),
			popularity,
		}
	}

	/// Catalog from the worked example: B is closest to A, C is far away.
	fn abc() -> Recommender {
		let catalog = Catalog::new(vec![
			track("A", "X", "M1", "pop", 50),
			track("B", "X", "M1", "pop", 80),
			track("C", "Y", "M2", "rock", 10),
		]);
		let features =
			FeatureStore::from_rows(vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]]).unwrap();
		Recommender::new(catalog, features).unwrap()
	}

	fn song_titles(recs: &[Recommendation]) -> Vec<String> {
		recs.iter()
			.filter_map(|r| match r {
				Recommendation::Song(s) => Some(s.track_name.clone()),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn worked_example_returns_nearest_song() {
		let recs = abc().recommend(&RecommendationRequest::single("A").top_k(1)).unwrap();
		assert_eq!(song_titles(&recs), vec!["B"]);
	}

	#[test]
	fn worked_example_top_two_excludes_seed() {
		let recs = abc().recommend(&RecommendationRequest::single("A").top_k(2)).unwrap();
		let titles = song_titles(&recs);
		assert_eq!(titles[0], "B");
		assert!(!titles.contains(&"A".to_string()));
	}

	#[test]
	fn worked_example_with_genre_filter() {
		let request = RecommendationRequest::single("A")
			.top_k(2)
			.filters([FilterDimension::Genre].into_iter().collect());
		let recs = abc().recommend(&request).unwrap();
		assert_eq!(song_titles(&recs), vec!["B"]);
	}

	#[test]
	fn unknown_query_is_no_match() {
		let err = abc().recommend(&RecommendationRequest::single("zzz")).unwrap_err();
		assert_eq!(err, RecommendError::NoMatch(vec!["zzz".into()]));
		let err = abc().recommend(&RecommendationRequest::single("")).unwrap_err();
		assert!(matches!(err, RecommendError::NoMatch(_)));
	}

	#[test]
	fn filter_to_singleton_is_insufficient() {
		let request = RecommendationRequest::single("C")
			.filters([FilterDimension::Genre].into_iter().collect());
		let err = abc().recommend(&request).unwrap_err();
		assert!(matches!(err, RecommendError::InsufficientData { pool_size: 1, .. }));
	}

	#[test]
	fn artist_search_seeds_are_excluded() {
		let request = RecommendationRequest::single("x")
			.search_by(SearchBy::Artist)
			.top_k(5);
		let recs = abc().recommend(&request).unwrap();
		assert_eq!(song_titles(&recs), vec!["C"]);
	}

	#[test]
	fn every_row_seeded_leaves_nothing() {
		let catalog = Catalog::new(vec![
			track("A", "X", "M1", "pop", 1),
			track("B", "X", "M1", "pop", 2),
		]);
		let features = FeatureStore::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
		let recommender = Recommender::new(catalog, features).unwrap();
		let request = RecommendationRequest::single("x").search_by(SearchBy::Artist);
		let err = recommender.recommend(&request).unwrap_err();
		assert_eq!(err, RecommendError::EmptyCandidateSet(FilterSpec::none()));
	}

	#[test]
	fn artist_type_groups_results() {
		let request = RecommendationRequest::new(vec!["C".into()])
			.recommend_type(RecommendType::Artist)
			.top_k(5);
		let recs = abc().recommend(&request).unwrap();
		assert_eq!(recs.len(), 1);
		assert_eq!(recs[0].popularity(), 80);
	}

	#[test]
	fn batch_queries_share_one_pipeline() {
		let request = RecommendationRequest::new(vec!["A".into(), "B".into()]).top_k(5);
		let recs = abc().recommend(&request).unwrap();
		assert_eq!(song_titles(&recs), vec!["C"]);
	}

	/// Two genres interleaved: A, C, E are pop; B, D are rock.
	fn mixed_genres() -> Recommender {
		let catalog = Catalog::new(vec![
			track("A", "X", "M1", "pop", 10),
			track("B", "Y", "M2", "rock", 20),
			track("C", "X", "M1", "pop", 30),
			track("D", "Y", "M2", "rock", 40),
			track("E", "Z", "M3", "pop", 60),
		]);
		let features = FeatureStore::from_rows(vec![
			vec![1.0, 0.0],
			vec![0.0, 1.0],
			vec![0.9, 0.1],
			vec![0.1, 0.9],
			vec![0.7, 0.3],
		])
		.unwrap();
		Recommender::new(catalog, features).unwrap()
	}

	#[test]
	fn filter_follows_lowest_matched_row() {
		let recommender = mixed_genres();
		let genre: FilterSpec = [FilterDimension::Genre].into_iter().collect();

		// Query order does not matter: A (row 0, pop) is the reference.
		let request = RecommendationRequest::new(vec!["B".into(), "A".into()]).filters(genre.clone());
		let recs = recommender.recommend(&request).unwrap();
		assert_eq!(song_titles(&recs), vec!["E", "C"]);

		// B (row 1, rock) outranks C (row 2, pop), so the pool is rock.
		let request = RecommendationRequest::new(vec!["C".into(), "B".into()]).filters(genre);
		let recs = recommender.recommend(&request).unwrap();
		assert_eq!(song_titles(&recs), vec!["D"]);
	}

	#[test]
	fn repeated_requests_are_identical() {
		let recommender = abc();
		let request = RecommendationRequest::single("B").top_k(3);
		let first = recommender.recommend(&request).unwrap();
		let second = recommender.recommend(&request).unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn mismatched_store_is_rejected() {
		let catalog = Catalog::new(vec![track("A", "X", "M1", "pop", 1)]);
		let features = FeatureStore::from_rows(vec![vec![1.0], vec![2.0]]).unwrap();
		assert!(matches!(
			Recommender::new(catalog, features),
			Err(LoadError::Mismatch { rows: 1, vectors: 2 })
		));
	}

	#[test]
	fn info_describes_loaded_data() {
		let info = abc().with_model_version(Some("v1.0".into())).info();
		assert_eq!(info.model_version, "v1.0");
		assert_eq!(info.dataset_size, 3);
		assert_eq!(info.feature_dimension, 2);
		assert_eq!(info.available_filters, vec!["artist", "genre", "album"]);
	}

	#[test]
	fn recommender_is_shareable_across_threads() {
		fn assert_send_sync<T: Send + Sync>() {}
		assert_send_sync::<Recommender>();
	}
}
