// ---------------------------------------------------------------------------
// Catalog: immutable track table indexed by row position
// ---------------------------------------------------------------------------
//
// Rows are cleaned once when the catalog is built and never change again.
// Lowercased match keys are computed alongside each row so query resolution
// and filtering never re-normalize catalog strings per request.
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::types::Track;

// ---------------------------------------------------------------------------
// Raw input rows
// ---------------------------------------------------------------------------

/// A dataset row as found on disk. Any field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrack {
	#[serde(default)]
	pub track_id: Option<String>,
	#[serde(default)]
	pub track_name: Option<String>,
	#[serde(default)]
	pub artists: Option<String>,
	#[serde(default)]
	pub album_name: Option<String>,
	#[serde(default)]
	pub track_genre: Option<String>,
	#[serde(default, deserialize_with = "deserialize_popularity")]
	pub popularity: Option<u32>,
}

/// Popularity may arrive as an integer, a whole-number float (`55.0`, as
/// exported from dataframe tools) or a numeric string. Missing, null or
/// empty values are `None`.
fn deserialize_popularity<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(Option::<Popularity>::deserialize(deserializer)?.and_then(|p| p.0))
}

struct Popularity(Option<u32>);

impl<'de> Deserialize<'de> for Popularity {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(PopularityVisitor)
	}
}

#[derive(Clone, Copy)]
struct PopularityVisitor;

impl<'de> Visitor<'de> for PopularityVisitor {
	type Value = Popularity;

	fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("a non-negative whole number")
	}

	fn visit_u64<E: de::Error>(self, v: u64) -> Result<Popularity, E> {
		u32::try_from(v)
			.map(|p| Popularity(Some(p)))
			.map_err(|_| E::custom(format!("popularity {} out of range", v)))
	}

	fn visit_i64<E: de::Error>(self, v: i64) -> Result<Popularity, E> {
		u64::try_from(v)
			.map_err(|_| E::custom(format!("popularity {} is negative", v)))
			.and_then(|v| self.visit_u64(v))
	}

	fn visit_f64<E: de::Error>(self, v: f64) -> Result<Popularity, E> {
		if v.fract() != 0.0 || v < 0.0 || v > u32::MAX as f64 {
			return Err(E::custom(format!("popularity {} is not a whole number", v)));
		}
		Ok(Popularity(Some(v as u32)))
	}

	fn visit_str<E: de::Error>(self, v: &str) -> Result<Popularity, E> {
		let v = v.trim();
		if v.is_empty() {
			return Ok(Popularity(None));
		}
		match v.parse::<u64>() {
			Ok(n) => self.visit_u64(n),
			Err(_) => v
				.parse::<f64>()
				.map_err(|_| E::custom(format!("popularity '{}' is not a number", v)))
				.and_then(|n| self.visit_f64(n)),
		}
	}

	fn visit_unit<E: de::Error>(self) -> Result<Popularity, E> {
		Ok(Popularity(None))
	}
}

impl RawTrack {
	fn into_track(self) -> Option<Track> {
		Some(Track {
			id: self.track_id?,
			title: self.track_name?,
			artists: self.artists?.replace(';', ", "),
			album: self.album_name?,
			genre: self.track_genre?,
			popularity: self.popularity?,
		})
	}
}

/// What cleaning removed while building a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
	pub raw_rows: usize,
	pub duplicate_titles: usize,
	pub incomplete_rows: usize,
}

// ---------------------------------------------------------------------------
// Match keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct MatchKeys {
	title: String,
	artists: String,
	album: String,
}

impl MatchKeys {
	fn for_track(track: &Track) -> Self {
		Self {
			title: normalize(&track.title),
			artists: track.artists.to_lowercase(),
			album: normalize(&track.album),
		}
	}
}

/// Trim and lowercase, the normalization applied to queries and to the
/// catalog fields they are compared against.
pub fn normalize(text: &str) -> String {
	text.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Read-only table of tracks. Row positions are stable for the catalog's
/// lifetime and line up with the feature store.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	tracks: Vec<Track>,
	keys: Vec<MatchKeys>,
}

impl Catalog {
	/// Build a catalog from already clean tracks, in the given order.
	pub fn new(tracks: Vec<Track>) -> Self {
		let keys = tracks.iter().map(MatchKeys::for_track).collect();
		Self { tracks, keys }
	}

	/// Build a catalog from raw rows: rows repeating an earlier title are
	/// dropped first (exact title, first occurrence wins, incomplete rows
	/// included), then rows missing any field. Artist separators `;` become
	/// `", "`.
	pub fn from_raw(rows: Vec<RawTrack>) -> (Self, CleaningReport) {
		let mut report = CleaningReport {
			raw_rows: rows.len(),
			..Default::default()
		};

		let mut seen_titles: HashSet<Option<String>> = HashSet::new();
		let mut tracks = Vec::with_capacity(rows.len());
		for row in rows {
			if !seen_titles.insert(row.track_name.clone()) {
				report.duplicate_titles += 1;
				continue;
			}
			match row.into_track() {
				Some(track) => tracks.push(track),
				None => report.incomplete_rows += 1,
			}
		}

		(Self::new(tracks), report)
	}

	pub fn len(&self) -> usize {
		self.tracks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tracks.is_empty()
	}

	/// Panics if `row` is out of range; callers only pass rows obtained from
	/// this catalog.
	pub fn track(&self, row: usize) -> &Track {
		&self.tracks[row]
	}

	pub fn tracks(&self) -> &[Track] {
		&self.tracks
	}

	/// Trimmed, lowercased title of `row`.
	pub fn title_key(&self, row: usize) -> &str {
		&self.keys[row].title
	}

	/// Lowercased artists display string of `row`.
	pub fn artists_key(&self, row: usize) -> &str {
		&self.keys[row].artists
	}

	/// Trimmed, lowercased album of `row`.
	pub fn album_key(&self, row: usize) -> &str {
		&self.keys[row].album
	}
}
