use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::{FilterDimension, FilterSpec, RecommendationRequest, RecommendType, SearchBy};

// ── JSON-RPC 2.0 error codes ──────────────────────────────────────────────

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const RECOMMEND_ERROR: i32 = -32000;

// ── JSON-RPC 2.0 framing ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JsonRpcIncoming {
	pub jsonrpc: Option<String>,
	/// Numeric ids only. A line with a string id does not parse and is
	/// answered with `PARSE_ERROR` under id 0.
	pub id: Option<u64>,
	pub method: Option<String>,
	#[serde(default)]
	pub params: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
	pub jsonrpc: &'static str,
	pub id: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub result: Option<serde_json::Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
	pub code: i32,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<serde_json::Value>,
}

// ── Request params ────────────────────────────────────────────────────────

/// `query` may be a bare string or a list holding exactly one string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QueryInput {
	One(String),
	Many(Vec<String>),
}

impl QueryInput {
	fn into_single(self) -> Result<String, EngineError> {
		match self {
			Self::One(q) => Ok(q),
			Self::Many(mut list) if list.len() == 1 => Ok(list.remove(0)),
			Self::Many(_) => Err(EngineError::InvalidParams(
				"'query' must be a list with exactly one string".into(),
			)),
		}
	}
}

/// `filter_by` may be omitted, null, one dimension name, or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilterInput {
	One(String),
	Many(Vec<String>),
}

fn filter_spec(input: Option<FilterInput>) -> Result<FilterSpec, EngineError> {
	let names = match input {
		None => return Ok(FilterSpec::none()),
		Some(FilterInput::One(name)) => vec![name],
		Some(FilterInput::Many(names)) => names,
	};
	names
		.iter()
		.map(|n| n.parse::<FilterDimension>().map_err(EngineError::InvalidParams))
		.collect()
}

fn search_by(raw: Option<String>) -> Result<SearchBy, EngineError> {
	match raw {
		Some(s) => Ok(s.parse()?),
		None => Ok(SearchBy::default()),
	}
}

fn recommend_type(raw: Option<String>) -> Result<RecommendType, EngineError> {
	match raw {
		Some(s) => Ok(s.parse()?),
		None => Ok(RecommendType::default()),
	}
}

fn top_k(raw: Option<usize>, default_top_k: usize) -> Result<usize, EngineError> {
	match raw {
		Some(0) => Err(EngineError::InvalidParams(
			"number of recommendations must be at least 1".into(),
		)),
		Some(k) => Ok(k),
		None => Ok(default_top_k),
	}
}

/// Params of `recommend`.
#[derive(Debug, Deserialize)]
pub struct RecommendParams {
	pub query: QueryInput,
	#[serde(default)]
	pub search_by: Option<String>,
	#[serde(default)]
	pub filter_by: Option<FilterInput>,
	#[serde(default)]
	pub top_k: Option<usize>,
	#[serde(default)]
	pub recommend_type: Option<String>,
}

impl RecommendParams {
	pub fn into_request(self, default_top_k: usize) -> Result<RecommendationRequest, EngineError> {
		Ok(RecommendationRequest {
			queries: vec![self.query.into_single()?],
			search_by: search_by(self.search_by)?,
			filters: filter_spec(self.filter_by)?,
			recommend_type: recommend_type(self.recommend_type)?,
			top_k: top_k(self.top_k, default_top_k)?,
		})
	}
}

/// Params of `recommend/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchRecommendParams {
	pub queries: Vec<String>,
	#[serde(default)]
	pub search_by: Option<String>,
	#[serde(default)]
	pub filter_by: Option<FilterInput>,
	#[serde(default, alias = "top_k")]
	pub number_of_recommendation: Option<usize>,
	#[serde(default)]
	pub recommend_type: Option<String>,
}

impl BatchRecommendParams {
	pub fn into_request(self, default_top_k: usize) -> Result<RecommendationRequest, EngineError> {
		if self.queries.is_empty() {
			return Err(EngineError::InvalidParams(
				"'queries' must be a non-empty list".into(),
			));
		}
		Ok(RecommendationRequest {
			queries: self.queries,
			search_by: search_by(self.search_by)?,
			filters: filter_spec(self.filter_by)?,
			recommend_type: recommend_type(self.recommend_type)?,
			top_k: top_k(self.number_of_recommendation, default_top_k)?,
		})
	}
}

/// Deserialize method params, mapping failures to `InvalidParams`.
pub fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, EngineError> {
	serde_json::from_value(params).map_err(|e| EngineError::InvalidParams(e.to_string()))
}
