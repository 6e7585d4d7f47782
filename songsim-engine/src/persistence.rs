// ---------------------------------------------------------------------------
// Loading the dataset and the feature store from disk
// ---------------------------------------------------------------------------
//
// Dataset file: CSV with a header row, or a JSON array of row objects.
// Either way the columns read are `track_id`, `track_name`, `artists`,
// `album_name`, `track_genre` and `popularity`; other columns (such as an
// exported index column) are ignored. `.csv` / `.csv.gz` files are CSV,
// anything else is JSON.
//
// Feature file: JSON object
//   { "version": 1, "dimension": D, "modelVersion": "...", "vectors": [...] }
// where each vector is base64 of its f32 little-endian bytes, one per
// cleaned dataset row, in row order.
//
// Either file may be gzip-compressed; compression is detected from the
// magic bytes.
// ---------------------------------------------------------------------------

use std::fs;
use std::io::Read;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::{GzDecoder, GzEncoder};
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, RawTrack};
use crate::error::LoadError;
use crate::features::FeatureStore;
use crate::recommender::Recommender;

pub const FEATURE_FILE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Vector encode / decode
// ---------------------------------------------------------------------------

/// Encode a vector as base64 of its f32 little-endian bytes.
pub fn encode_vector(vector: &[f32]) -> String {
	let bytes: Vec<u8> = vector.iter().flat_map(|f| f.to_le_bytes()).collect();
	STANDARD.encode(&bytes)
}

/// Decode a base64 f32 little-endian string back to a vector.
pub fn decode_vector(encoded: &str) -> Result<Vec<f32>, LoadError> {
	let bytes = STANDARD
		.decode(encoded)
		.map_err(|e| LoadError::Corruption(format!("Invalid base64: {}", e)))?;
	if bytes.len() % 4 != 0 {
		return Err(LoadError::Corruption("Invalid vector length".into()));
	}
	Ok(bytes
		.chunks_exact(4)
		.map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
		.collect())
}

// ---------------------------------------------------------------------------
// Gzip
// ---------------------------------------------------------------------------

pub fn compress(data: &[u8]) -> Result<Vec<u8>, LoadError> {
	let mut encoder = GzEncoder::new(data, Compression::new(6));
	let mut compressed = Vec::new();
	encoder.read_to_end(&mut compressed)?;
	Ok(compressed)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, LoadError> {
	let mut decoder = GzDecoder::new(data);
	let mut decompressed = Vec::new();
	decoder.read_to_end(&mut decompressed)?;
	Ok(decompressed)
}

/// Check if data starts with gzip magic bytes (0x1f, 0x8b).
pub fn is_gzipped(data: &[u8]) -> bool {
	data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

fn read_maybe_gzipped(path: &Path) -> Result<Vec<u8>, LoadError> {
	let raw = fs::read(path)?;
	if is_gzipped(&raw) {
		decompress(&raw)
	} else {
		Ok(raw)
	}
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
	Csv,
	Json,
}

impl DatasetFormat {
	/// Pick the format from the file name, ignoring a trailing `.gz`.
	pub fn from_path(path: &Path) -> Self {
		let name = path
			.file_name()
			.map(|n| n.to_string_lossy().to_ascii_lowercase())
			.unwrap_or_default();
		let name = name.strip_suffix(".gz").unwrap_or(&name);
		if name.ends_with(".csv") {
			Self::Csv
		} else {
			Self::Json
		}
	}
}

fn read_csv_rows(bytes: &[u8]) -> Result<Vec<RawTrack>, csv::Error> {
	let mut reader = csv::Reader::from_reader(bytes);
	reader.deserialize().collect()
}

/// Read and clean the dataset file.
pub fn load_catalog(path: &Path) -> Result<Catalog, LoadError> {
	let bytes = read_maybe_gzipped(path)?;
	let format = DatasetFormat::from_path(path);
	let rows: Vec<RawTrack> = match format {
		DatasetFormat::Csv => read_csv_rows(&bytes)
			.map_err(|e| LoadError::Serialization(format!("{}: {}", path.display(), e)))?,
		DatasetFormat::Json => serde_json::from_slice(&bytes)
			.map_err(|e| LoadError::Serialization(format!("{}: {}", path.display(), e)))?,
	};

	let (catalog, report) = Catalog::from_raw(rows);
	tracing::info!(
		path = %path.display(),
		format = ?format,
		raw_rows = report.raw_rows,
		duplicate_titles = report.duplicate_titles,
		incomplete_rows = report.incomplete_rows,
		rows = catalog.len(),
		"Dataset loaded"
	);
	Ok(catalog)
}

// ---------------------------------------------------------------------------
// Feature file
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureFile {
	version: u32,
	dimension: usize,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	model_version: Option<String>,
	vectors: Vec<String>,
}

/// Decoded feature file.
#[derive(Debug)]
pub struct LoadedFeatures {
	pub store: FeatureStore,
	pub model_version: Option<String>,
}

pub fn load_features(path: &Path) -> Result<LoadedFeatures, LoadError> {
	let bytes = read_maybe_gzipped(path)?;
	let file: FeatureFile = serde_json::from_slice(&bytes)
		.map_err(|e| LoadError::Serialization(format!("{}: {}", path.display(), e)))?;

	if file.version != FEATURE_FILE_VERSION {
		return Err(LoadError::Corruption(format!(
			"Unsupported feature file version: {}",
			file.version
		)));
	}

	let vectors = file
		.vectors
		.iter()
		.map(|v| decode_vector(v))
		.collect::<Result<Vec<_>, _>>()?;
	let store = FeatureStore::new(file.dimension, vectors)?;

	tracing::info!(
		path = %path.display(),
		vectors = store.len(),
		dimension = store.dimension(),
		"Feature store loaded"
	);
	Ok(LoadedFeatures {
		store,
		model_version: file.model_version,
	})
}

/// Write a feature file, gzip-compressed when `gzip` is set.
pub fn write_features(
	path: &Path,
	store: &FeatureStore,
	model_version: Option<&str>,
	gzip: bool,
) -> Result<(), LoadError> {
	let file = FeatureFile {
		version: FEATURE_FILE_VERSION,
		dimension: store.dimension(),
		model_version: model_version.map(str::to_string),
		vectors: store.iter().map(encode_vector).collect(),
	};
	let json = serde_json::to_vec(&file).map_err(|e| LoadError::Serialization(e.to_string()))?;
	let bytes = if gzip { compress(&json)? } else { json };
	fs::write(path, bytes)?;
	Ok(())
}

/// Load both files and pair them into a ready service context.
pub fn load_recommender(dataset: &Path, features: &Path) -> Result<Recommender, LoadError> {
	let catalog = load_catalog(dataset)?;
	let loaded = load_features(features)?;
	Ok(Recommender::new(catalog, loaded.store)?.with_model_version(loaded.model_version))
}
