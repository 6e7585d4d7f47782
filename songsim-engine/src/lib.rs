pub mod catalog;
pub mod config;
pub mod cosine;
pub mod error;
pub mod features;
pub mod filter;
pub mod persistence;
pub mod protocol;
pub mod ranker;
pub mod recommender;
pub mod resolver;
pub mod search;
pub mod server;
pub mod transport;
pub mod types;

pub use error::{EngineError, LoadError, RecommendError};
pub use recommender::Recommender;
pub use types::{
	FilterDimension, FilterSpec, Recommendation, RecommendationRequest, RecommendType, SearchBy,
};
