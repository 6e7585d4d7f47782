use thiserror::Error;

use crate::types::FilterSpec;

/// Failures of the recommendation pipeline. Every variant is terminal for
/// the request that produced it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecommendError {
	#[error("Invalid search type '{0}': choose 'song', 'artist', or 'album'")]
	InvalidSearchDimension(String),
	#[error("No matches found for queries: {0:?}")]
	NoMatch(Vec<String>),
	#[error("Not enough data with the filter {filters} to make recommendations ({pool_size} rows left)")]
	InsufficientData { filters: FilterSpec, pool_size: usize },
	#[error("No recommendations found with the filter {0}: try removing or changing the filter")]
	EmptyCandidateSet(FilterSpec),
	#[error("Invalid recommend type '{0}': choose 'song', 'artist', or 'album'")]
	InvalidRecommendType(String),
}

impl RecommendError {
	pub fn code(&self) -> &str {
		match self {
			Self::InvalidSearchDimension(_) => "INVALID_SEARCH_DIMENSION",
			Self::NoMatch(_) => "NO_MATCH",
			Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
			Self::EmptyCandidateSet(_) => "EMPTY_CANDIDATE_SET",
			Self::InvalidRecommendType(_) => "INVALID_RECOMMEND_TYPE",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"code": self.code(),
			"message": self.to_string(),
		})
	}
}

/// Failures while reading the catalog or the feature store from disk.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Corruption: {0}")]
	Corruption(String),
	#[error("Serialization: {0}")]
	Serialization(String),
	#[error("Feature store has {vectors} vectors but the catalog has {rows} rows")]
	Mismatch { rows: usize, vectors: usize },
}

/// Errors surfaced by the JSON-RPC boundary.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Recommend(#[from] RecommendError),
	#[error("Invalid params: {0}")]
	InvalidParams(String),
	#[error("Load error: {0}")]
	Load(#[from] LoadError),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl EngineError {
	pub fn code(&self) -> &str {
		match self {
			Self::Recommend(e) => e.code(),
			Self::InvalidParams(_) => "INVALID_PARAMS",
			Self::Load(_) => "LOAD_ERROR",
			Self::Io(_) => "IO_ERROR",
			Self::Json(_) => "JSON_ERROR",
		}
	}
}
