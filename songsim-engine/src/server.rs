// ---------------------------------------------------------------------------
// RecommendServer: JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Reads one JSON-RPC 2.0 request per line, validates its params into a
// `RecommendationRequest`, runs it against the shared `Recommender` and
// writes exactly one response line. Requests are handled one at a time and
// leave no state behind.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead, Write};

use crate::error::EngineError;
use crate::protocol::*;
use crate::recommender::Recommender;
use crate::transport::NdjsonTransport;
use crate::types::{Recommendation, DEFAULT_TOP_K};

// ── Server configuration ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub default_top_k: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			default_top_k: DEFAULT_TOP_K,
		}
	}
}

// ── Server ────────────────────────────────────────────────────────────────

pub struct RecommendServer<W: Write = io::Stdout> {
	config: ServerConfig,
	recommender: Recommender,
	transport: NdjsonTransport<W>,
}

impl<W: Write> RecommendServer<W> {
	pub fn new(config: ServerConfig, recommender: Recommender, transport: NdjsonTransport<W>) -> Self {
		Self {
			config,
			recommender,
			transport,
		}
	}

	pub fn into_transport(self) -> NdjsonTransport<W> {
		self.transport
	}

	/// Main loop: read requests line by line until EOF.
	pub fn run<R: BufRead>(&mut self, reader: R) -> Result<(), EngineError> {
		for line_result in reader.lines() {
			let line = line_result?;
			let trimmed = line.trim();
			if trimmed.is_empty() {
				continue;
			}

			let msg: JsonRpcIncoming = match serde_json::from_str(trimmed) {
				Ok(m) => m,
				Err(e) => {
					tracing::warn!("Parse error: {}", e);
					self.transport
						.write_error(0, PARSE_ERROR, "Parse error: invalid JSON", None);
					continue;
				}
			};

			self.dispatch(msg);
		}

		Ok(())
	}

	// ── Dispatch ──────────────────────────────────────────────────────────

	fn dispatch(&mut self, msg: JsonRpcIncoming) {
		let id = msg.id.unwrap_or(0);
		let method = match msg.method {
			Some(m) => m,
			None => {
				self.transport
					.write_error(id, INVALID_PARAMS, "Missing method", None);
				return;
			}
		};
		tracing::debug!(id, method = %method, "Dispatching request");

		let result = match method.as_str() {
			"health" => Ok(serde_json::json!({ "status": "ok", "message": "API is healthy" })),
			"info" => serde_json::to_value(self.recommender.info()).map_err(EngineError::from),
			"recommend" => self.handle_recommend(msg.params),
			"recommend/batch" => self.handle_recommend_batch(msg.params),
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => {
				tracing::warn!(id, method = %method, code = e.code(), "Request failed: {}", e);
				let (code, data) = match &e {
					EngineError::Recommend(inner) => (RECOMMEND_ERROR, inner.to_json_rpc_error()),
					EngineError::InvalidParams(_) => (
						INVALID_PARAMS,
						serde_json::json!({ "code": e.code(), "message": e.to_string() }),
					),
					EngineError::Load(_) | EngineError::Io(_) | EngineError::Json(_) => (
						INTERNAL_ERROR,
						serde_json::json!({ "code": e.code(), "message": e.to_string() }),
					),
				};
				self.transport.write_error(id, code, e.to_string(), Some(data));
			}
		}
	}

	// ── Handlers ──────────────────────────────────────────────────────────

	fn handle_recommend(&self, params: serde_json::Value) -> Result<serde_json::Value, EngineError> {
		let p: RecommendParams = parse_params(params)?;
		let request = p.into_request(self.config.default_top_k)?;
		let recommendations = self.recommender.recommend(&request)?;
		recommendations_response(&recommendations)
	}

	fn handle_recommend_batch(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: BatchRecommendParams = parse_params(params)?;
		let request = p.into_request(self.config.default_top_k)?;
		let recommendations = self.recommender.recommend(&request)?;
		recommendations_response(&recommendations)
	}
}

fn recommendations_response(
	recommendations: &[Recommendation],
) -> Result<serde_json::Value, EngineError> {
	Ok(serde_json::json!({ "recommendations": serde_json::to_value(recommendations)? }))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::Catalog;
	use crate::features::FeatureStore;
	use crate::types::Track;
	use serde_json::{json, Value};

	fn track(title: &str, genre: &str, popularity: u32) -> Track {
		Track {
			id: title.to_lowercase(),
			title: title.into(),
			artists: "X".into(),
			album: "M1".into(),
			genre: genre.into(),
			popularity,
		}
	}

	fn server() -> RecommendServer<Vec<u8>> {
		let catalog = Catalog::new(vec![
			track("A", "pop", 50),
			track("B", "pop", 80),
			track("C", "rock", 10),
		]);
		let features =
			FeatureStore::from_rows(vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]]).unwrap();
		let recommender = Recommender::new(catalog, features).unwrap();
		RecommendServer::new(
			ServerConfig::default(),
			recommender,
			NdjsonTransport::with_writer(Vec::new()),
		)
	}

	fn exchange(input: &str) -> Vec<Value> {
		let mut server = server();
		server.run(input.as_bytes()).unwrap();
		let out = String::from_utf8(server.into_transport().into_inner()).unwrap();
		out.lines().map(|l| serde_json::from_str(l).unwrap()).collect()
	}

	fn request(id: u64, method: &str, params: Value) -> String {
		json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string()
	}

	#[test]
	fn recommend_returns_ranked_songs() {
		let responses = exchange(&request(1, "recommend", json!({ "query": "a", "top_k": 1 })));
		assert_eq!(responses.len(), 1);
		assert_eq!(responses[0]["id"], 1);
		let recs = responses[0]["result"]["recommendations"].as_array().unwrap();
		assert_eq!(recs.len(), 1);
		assert_eq!(recs[0]["track_name"], "B");
	}

	#[test]
	fn core_failure_carries_code() {
		let responses = exchange(&request(4, "recommend", json!({ "query": "nothing" })));
		let error = &responses[0]["error"];
		assert_eq!(error["code"], RECOMMEND_ERROR);
		assert_eq!(error["data"]["code"], "NO_MATCH");
	}

	#[test]
	fn invalid_params_are_reported() {
		let responses = exchange(&request(2, "recommend", json!({ "query": ["a", "b"] })));
		assert_eq!(responses[0]["error"]["code"], INVALID_PARAMS);
	}

	#[test]
	fn unknown_method_and_bad_json() {
		let input = format!("{}\nnot json\n\n", request(3, "nope", json!({})));
		let responses = exchange(&input);
		assert_eq!(responses.len(), 2);
		assert_eq!(responses[0]["error"]["code"], METHOD_NOT_FOUND);
		assert_eq!(responses[1]["error"]["code"], PARSE_ERROR);
	}

	#[test]
	fn batch_and_info_share_one_stream() {
		let input = [
			request(1, "recommend/batch", json!({ "queries": ["A", "B"], "recommend_type": "artist" })),
			request(2, "info", Value::Null),
			request(3, "health", Value::Null),
		]
		.join("\n");
		let responses = exchange(&input);
		assert_eq!(responses.len(), 3);

		// Only C is left once both seeds are excluded.
		let recs = responses[0]["result"]["recommendations"].as_array().unwrap();
		assert_eq!(recs, &vec![json!({ "artist": "X", "popularity": 10 })]);

		assert_eq!(responses[1]["result"]["dataset_size"], 3);
		assert_eq!(responses[2]["result"]["status"], "ok");
		assert_eq!(responses[2]["result"]["message"], "API is healthy");
	}
}
