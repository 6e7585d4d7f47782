use std::collections::BTreeSet;

use crate::catalog::{normalize, Catalog};
use crate::error::RecommendError;
use crate::types::SearchBy;

/// Resolve free-text queries to the catalog rows they name.
///
/// Queries are trimmed and lowercased. Song and album queries must equal the
/// normalized title / album; artist queries match any row whose artists
/// string contains them. Matches of all queries are unioned; the returned
/// set iterates in ascending row order. Queries that are blank after
/// trimming never match anything.
pub fn resolve(
	queries: &[String],
	search_by: SearchBy,
	catalog: &Catalog,
) -> Result<BTreeSet<usize>, RecommendError> {
	let normalized: Vec<String> = queries
		.iter()
		.map(|q| normalize(q))
		.filter(|q| !q.is_empty())
		.collect();

	let mut matched = BTreeSet::new();
	for query in &normalized {
		for row in 0..catalog.len() {
			let hit = match search_by {
				SearchBy::Song => catalog.title_key(row) == query,
				SearchBy::Album => catalog.album_key(row) == query,
				SearchBy::Artist => catalog.artists_key(row).contains(query.as_str()),
			};
			if hit {
				matched.insert(row);
			}
		}
	}

	if matched.is_empty() {
		return Err(RecommendError::NoMatch(queries.to_vec()));
	}
	Ok(matched)
}
