use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::types::{
	AlbumRecommendation, ArtistRecommendation, Candidate, RecommendType, Recommendation,
	SongRecommendation,
};

/// Turn distance-ordered candidates into the final result list.
///
/// Duplicate titles (trimmed, case-insensitive) are dropped keeping the
/// closest one. Rows are then shaped per `recommend_type`: one entry per
/// song, or one entry per artists string / (album, artists) pair carrying
/// the group's highest popularity. Entries are stably sorted by descending
/// popularity, so ties keep their similarity order, and cut to `top_k`.
pub fn rank(
	candidates: &[Candidate],
	catalog: &Catalog,
	recommend_type: RecommendType,
	top_k: usize,
) -> Vec<Recommendation> {
	let songs = distinct_songs(candidates, catalog);

	let mut ranked: Vec<Recommendation> = match recommend_type {
		RecommendType::Song => songs.into_iter().map(Recommendation::Song).collect(),
		RecommendType::Artist => group_max(songs, |s| s.artist.clone())
			.into_iter()
			.map(|s| {
				Recommendation::Artist(ArtistRecommendation {
					artist: s.artist,
					popularity: s.popularity,
				})
			})
			.collect(),
		RecommendType::Album => group_max(songs, |s| (s.album.clone(), s.artist.clone()))
			.into_iter()
			.map(|s| {
				Recommendation::Album(AlbumRecommendation {
					album: s.album,
					artist: s.artist,
					popularity: s.popularity,
				})
			})
			.collect(),
	};

	ranked.sort_by(|a, b| b.popularity().cmp(&a.popularity()));
	ranked.truncate(top_k);
	ranked
}

fn distinct_songs(candidates: &[Candidate], catalog: &Catalog) -> Vec<SongRecommendation> {
	let mut seen: HashSet<&str> = HashSet::new();
	candidates
		.iter()
		.filter(|c| seen.insert(catalog.title_key(c.row)))
		.map(|c| SongRecommendation::from(catalog.track(c.row)))
		.collect()
}

/// Collapse songs sharing a key into the first one seen, raised to the
/// group's maximum popularity. Groups keep first-seen order.
fn group_max<K, F>(songs: Vec<SongRecommendation>, key: F) -> Vec<SongRecommendation>
where
	K: std::hash::Hash + Eq,
	F: Fn(&SongRecommendation) -> K,
{
	let mut index: HashMap<K, usize> = HashMap::new();
	let mut groups: Vec<SongRecommendation> = Vec::new();
	for song in songs {
		let k = key(&song);
		if let Some(&i) = index.get(&k) {
			let group = &mut groups[i];
			group.popularity = group.popularity.max(song.popularity);
		} else {
			index.insert(k, groups.len());
			groups.push(song);
		}
	}
	groups
}
