use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecommendError;

/// Result cap used when a request does not name one.
pub const DEFAULT_TOP_K: usize = 5;

// ---------------------------------------------------------------------------
// Catalog rows
// ---------------------------------------------------------------------------

/// One recommendable song. `artists` holds the comma-separated display form
/// (`"Artist A, Artist B"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
	pub id: String,
	pub title: String,
	pub artists: String,
	pub album: String,
	pub genre: String,
	pub popularity: u32,
}

// ---------------------------------------------------------------------------
// Request dimensions
// ---------------------------------------------------------------------------

/// Catalog field a free-text query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchBy {
	#[default]
	Song,
	Artist,
	Album,
}

impl SearchBy {
	pub const ALL: [SearchBy; 3] = [SearchBy::Song, SearchBy::Artist, SearchBy::Album];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Song => "song",
			Self::Artist => "artist",
			Self::Album => "album",
		}
	}
}

impl FromStr for SearchBy {
	type Err = RecommendError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"song" => Ok(Self::Song),
			"artist" => Ok(Self::Artist),
			"album" => Ok(Self::Album),
			other => Err(RecommendError::InvalidSearchDimension(other.to_string())),
		}
	}
}

/// Granularity of the returned recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendType {
	#[default]
	Song,
	Artist,
	Album,
}

impl RecommendType {
	pub const ALL: [RecommendType; 3] =
		[RecommendType::Song, RecommendType::Artist, RecommendType::Album];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Song => "song",
			Self::Artist => "artist",
			Self::Album => "album",
		}
	}
}

impl FromStr for RecommendType {
	type Err = RecommendError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"song" => Ok(Self::Song),
			"artist" => Ok(Self::Artist),
			"album" => Ok(Self::Album),
			other => Err(RecommendError::InvalidRecommendType(other.to_string())),
		}
	}
}

/// Attribute a candidate pool can be narrowed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
	Artist,
	Genre,
	Album,
}

impl FilterDimension {
	pub const ALL: [FilterDimension; 3] =
		[FilterDimension::Artist, FilterDimension::Genre, FilterDimension::Album];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Artist => "artist",
			Self::Genre => "genre",
			Self::Album => "album",
		}
	}
}

impl FromStr for FilterDimension {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"artist" => Ok(Self::Artist),
			"genre" => Ok(Self::Genre),
			"album" => Ok(Self::Album),
			other => Err(format!(
				"unknown filter '{}': choose 'artist', 'genre', or 'album'",
				other
			)),
		}
	}
}

/// Set of dimensions that must all match the reference row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec(BTreeSet<FilterDimension>);

impl FilterSpec {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn contains(&self, dimension: FilterDimension) -> bool {
		self.0.contains(&dimension)
	}

	pub fn iter(&self) -> impl Iterator<Item = FilterDimension> + '_ {
		self.0.iter().copied()
	}
}

impl FromIterator<FilterDimension> for FilterSpec {
	fn from_iter<I: IntoIterator<Item = FilterDimension>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl fmt::Display for FilterSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.0.is_empty() {
			return f.write_str("none");
		}
		let names: Vec<&str> = self.0.iter().map(FilterDimension::as_str).collect();
		write!(f, "[{}]", names.join(", "))
	}
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A fully validated request as seen by the pipeline. Single and batch
/// requests differ only in how many queries they carry.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
	pub queries: Vec<String>,
	pub search_by: SearchBy,
	pub filters: FilterSpec,
	pub recommend_type: RecommendType,
	pub top_k: usize,
}

impl RecommendationRequest {
	pub fn new(queries: Vec<String>) -> Self {
		Self {
			queries,
			search_by: SearchBy::default(),
			filters: FilterSpec::none(),
			recommend_type: RecommendType::default(),
			top_k: DEFAULT_TOP_K,
		}
	}

	pub fn single(query: impl Into<String>) -> Self {
		Self::new(vec![query.into()])
	}

	pub fn search_by(mut self, search_by: SearchBy) -> Self {
		self.search_by = search_by;
		self
	}

	pub fn filters(mut self, filters: FilterSpec) -> Self {
		self.filters = filters;
		self
	}

	pub fn recommend_type(mut self, recommend_type: RecommendType) -> Self {
		self.recommend_type = recommend_type;
		self
	}

	pub fn top_k(mut self, top_k: usize) -> Self {
		self.top_k = top_k;
		self
	}
}

// ---------------------------------------------------------------------------
// Search and ranking output
// ---------------------------------------------------------------------------

/// A nearest-neighbour hit, identified by its catalog row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
	pub row: usize,
	pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecommendation {
	pub track_id: String,
	pub track_name: String,
	pub artist: String,
	pub album: String,
	pub genre: String,
	pub popularity: u32,
}

impl From<&Track> for SongRecommendation {
	fn from(track: &Track) -> Self {
		Self {
			track_id: track.id.clone(),
			track_name: track.title.clone(),
			artist: track.artists.clone(),
			album: track.album.clone(),
			genre: track.genre.clone(),
			popularity: track.popularity,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRecommendation {
	pub artist: String,
	pub popularity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecommendation {
	pub album: String,
	pub artist: String,
	pub popularity: u32,
}

/// One ranked result entry; its shape follows the request's recommend type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Recommendation {
	Song(SongRecommendation),
	Artist(ArtistRecommendation),
	Album(AlbumRecommendation),
}

impl Recommendation {
	pub fn popularity(&self) -> u32 {
		match self {
			Self::Song(s) => s.popularity,
			Self::Artist(a) => a.popularity,
			Self::Album(a) => a.popularity,
		}
	}
}

/// Static description of the loaded data set.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogInfo {
	pub model_version: String,
	pub dataset_size: usize,
	pub feature_dimension: usize,
	pub available_filters: Vec<&'static str>,
	pub available_search_by: Vec<&'static str>,
	pub available_recommend_types: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_known_dimensions() {
		assert_eq!("artist".parse::<SearchBy>(), Ok(SearchBy::Artist));
		assert_eq!("album".parse::<RecommendType>(), Ok(RecommendType::Album));
		assert_eq!("genre".parse::<FilterDimension>(), Ok(FilterDimension::Genre));
	}

	#[test]
	fn unknown_search_by_is_rejected() {
		assert_eq!(
			"genre".parse::<SearchBy>(),
			Err(RecommendError::InvalidSearchDimension("genre".into()))
		);
	}

	#[test]
	fn unknown_recommend_type_is_rejected() {
		assert_eq!(
			"playlist".parse::<RecommendType>(),
			Err(RecommendError::InvalidRecommendType("playlist".into()))
		);
	}

	#[test]
	fn filter_spec_collapses_duplicates_and_displays_sorted() {
		let spec: FilterSpec = [
			FilterDimension::Album,
			FilterDimension::Artist,
			FilterDimension::Album,
		]
		.into_iter()
		.collect();
		assert_eq!(spec.to_string(), "[artist, album]");
		assert!(spec.contains(FilterDimension::Artist));
		assert!(!spec.contains(FilterDimension::Genre));
		assert_eq!(FilterSpec::none().to_string(), "none");
	}

	#[test]
	fn request_builder_defaults() {
		let req = RecommendationRequest::single("Hello");
		assert_eq!(req.search_by, SearchBy::Song);
		assert_eq!(req.recommend_type, RecommendType::Song);
		assert_eq!(req.top_k, DEFAULT_TOP_K);
		assert!(req.filters.is_empty());
	}

	#[test]
	fn song_entry_serializes_with_wire_names() {
		let rec = Recommendation::Song(SongRecommendation {
			track_id: "1".into(),
			track_name: "B".into(),
			artist: "X".into(),
			album: "M1".into(),
			genre: "pop".into(),
			popularity: 80,
		});
		let value = serde_json::to_value(&rec).unwrap();
		assert_eq!(value["track_name"], "B");
		assert_eq!(value["artist"], "X");
		assert_eq!(value["popularity"], 80);
	}
}
