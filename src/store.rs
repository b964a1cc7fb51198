use std::cmp::Ordering;

use neo4rs::{query, Graph, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

const SIMILAR_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("graph error: {0}")]
    Graph(#[from] neo4rs::Error),
    #[error("row decode error: {0}")]
    RowDecode(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackRow {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub popularity: i64,
    pub tempo: f64,
    pub energy: f64,
    pub danceability: f64,
    pub duration_ms: i64,
    pub album_name: String,
    pub playlist_name: String,
    pub subgenre: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarRow {
    pub track_id: String,
    pub track_name: String,
    pub artist_name: String,
    pub popularity: i64,
    pub energy: f64,
    pub danceability: f64,
    pub tempo: f64,
    pub album_name: String,
    pub subgenre: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy)]
struct AudioTraits {
    energy: f64,
    danceability: f64,
    tempo: f64,
}

#[derive(Debug, Clone)]
struct CandidatePath {
    track_id: String,
    track_name: String,
    artist_name: String,
    popularity: i64,
    traits: AudioTraits,
    album_name: String,
    playlist_name: String,
    subgenre: String,
    similarity: f64,
}

pub struct MusicGraph {
    graph: Graph,
}

impl MusicGraph {
    pub fn connect(config: &Config) -> Result<Self, Error> {
        let graph = Graph::new(
            config.neo4j_uri.as_str(),
            config.neo4j_username.as_str(),
            config.neo4j_password.as_str(),
        )?;
        Ok(Self { graph })
    }

    pub async fn songs_by_characteristics(
        &self,
        artist: Option<&str>,
        playlist_name: Option<&str>,
    ) -> Result<Vec<TrackRow>, Error> {
        let artist = normalize_filter(artist);
        let playlist_name = normalize_filter(playlist_name);

        let query_text = characteristic_query_text(artist.is_some(), playlist_name.is_some());
        let mut query = query(query_text.as_str());
        if let Some(artist) = artist {
            query = query.param("artist", artist);
        }
        if let Some(playlist_name) = playlist_name {
            query = query.param("playlist_name", playlist_name);
        }

        let mut result = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(TrackRow {
                track_id: column(&row, "track_id")?,
                track_name: column(&row, "track_name")?,
                artist_name: column(&row, "artist_name")?,
                popularity: column(&row, "popularity")?,
                tempo: column(&row, "tempo")?,
                energy: column(&row, "energy")?,
                danceability: column(&row, "danceability")?,
                duration_ms: column(&row, "duration_ms")?,
                album_name: column(&row, "album_name")?,
                playlist_name: column(&row, "playlist_name")?,
                subgenre: column(&row, "subgenre")?,
            });
        }

        debug!(rows = rows.len(), "characteristic search");
        Ok(rows)
    }

    pub async fn similar_songs(&self, track_name: &str) -> Result<Vec<SimilarRow>, Error> {
        let query = query(
            "MATCH (t:Track {name: $track_name})-[:INCLUDED_IN]->(p:Playlist)\n\
             MATCH (t)-[:PERFORMED_BY]->(:Artist)\n\
             MATCH (p)<-[:INCLUDED_IN]-(similar:Track)-[:PERFORMED_BY]->(a:Artist)\n\
             MATCH (similar)-[:PART_OF]->(al:Album)\n\
             WHERE similar.name <> $track_name\n\
             RETURN DISTINCT\n\
                 t.energy AS anchor_energy,\n\
                 t.danceability AS anchor_danceability,\n\
                 t.tempo AS anchor_tempo,\n\
                 similar.id AS track_id,\n\
                 similar.name AS track_name,\n\
                 a.name AS artist_name,\n\
                 similar.popularity AS popularity,\n\
                 similar.energy AS energy,\n\
                 similar.danceability AS danceability,\n\
                 similar.tempo AS tempo,\n\
                 al.name AS album_name,\n\
                 p.name AS playlist_name,\n\
                 p.subgenre AS subgenre",
        )
        .param("track_name", track_name);

        let mut result = self.graph.execute(query).await?;
        let mut paths = Vec::new();
        while let Some(row) = result.next().await? {
            let anchor = AudioTraits {
                energy: column(&row, "anchor_energy")?,
                danceability: column(&row, "anchor_danceability")?,
                tempo: column(&row, "anchor_tempo")?,
            };
            let traits = AudioTraits {
                energy: column(&row, "energy")?,
                danceability: column(&row, "danceability")?,
                tempo: column(&row, "tempo")?,
            };
            paths.push(CandidatePath {
                track_id: column(&row, "track_id")?,
                track_name: column(&row, "track_name")?,
                artist_name: column(&row, "artist_name")?,
                popularity: column(&row, "popularity")?,
                traits,
                album_name: column(&row, "album_name")?,
                playlist_name: column(&row, "playlist_name")?,
                subgenre: column(&row, "subgenre")?,
                similarity: similarity_score(anchor, traits),
            });
        }

        let rows = rank_similar(paths);
        debug!(rows = rows.len(), "similarity search");
        Ok(rows)
    }
}

fn column<T: DeserializeOwned>(row: &Row, name: &'static str) -> Result<T, Error> {
    row.get(name)
        .map_err(|e| Error::RowDecode(format!("{}: {}", name, e)))
}

fn normalize_filter(value: Option<&str>) -> Option<&str> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn characteristic_query_text(with_artist: bool, with_playlist: bool) -> String {
    let mut text = String::from(
        "MATCH (t:Track)-[:PERFORMED_BY]->(a:Artist)\n\
         MATCH (t)-[:PART_OF]->(al:Album)\n\
         MATCH (t)-[:INCLUDED_IN]->(p:Playlist)\n",
    );

    let mut conditions = Vec::new();
    if with_artist {
        conditions.push("a.name CONTAINS $artist");
    }
    if with_playlist {
        conditions.push("p.name CONTAINS $playlist_name");
    }
    if !conditions.is_empty() {
        text.push_str("WHERE ");
        text.push_str(&conditions.join(" AND "));
        text.push('\n');
    }

    text.push_str(
        "RETURN DISTINCT\n\
             t.id AS track_id,\n\
             t.name AS track_name,\n\
             a.name AS artist_name,\n\
             t.popularity AS popularity,\n\
             t.tempo AS tempo,\n\
             t.energy AS energy,\n\
             t.danceability AS danceability,\n\
             t.duration_ms AS duration_ms,\n\
             al.name AS album_name,\n\
             p.name AS playlist_name,\n\
             p.subgenre AS subgenre\n\
         ORDER BY popularity DESC, track_id ASC\n\
         LIMIT 15",
    );

    text
}

// Only the tempo difference is scaled down; energy and danceability stay at full weight.
fn similarity_score(anchor: AudioTraits, candidate: AudioTraits) -> f64 {
    (anchor.energy - candidate.energy).abs()
        + (anchor.danceability - candidate.danceability).abs()
        + (anchor.tempo - candidate.tempo).abs() / 100.0
}

fn rank_similar(mut paths: Vec<CandidatePath>) -> Vec<SimilarRow> {
    // One row per candidate track; among shared playlists the lexicographically
    // smallest name wins the attribution.
    paths.sort_by(|a, b| {
        a.track_id
            .cmp(&b.track_id)
            .then_with(|| a.playlist_name.cmp(&b.playlist_name))
            .then_with(|| {
                a.similarity
                    .partial_cmp(&b.similarity)
                    .unwrap_or(Ordering::Equal)
            })
    });
    paths.dedup_by(|a, b| a.track_id == b.track_id);

    paths.sort_by(|a, b| {
        a.similarity
            .partial_cmp(&b.similarity)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.popularity.cmp(&a.popularity))
            .then_with(|| a.track_id.cmp(&b.track_id))
    });
    paths.truncate(SIMILAR_LIMIT);

    paths
        .into_iter()
        .map(|path| SimilarRow {
            track_id: path.track_id,
            track_name: path.track_name,
            artist_name: path.artist_name,
            popularity: path.popularity,
            energy: path.traits.energy,
            danceability: path.traits.danceability,
            tempo: path.traits.tempo,
            album_name: path.album_name,
            subgenre: path.subgenre,
            similarity: path.similarity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(energy: f64, danceability: f64, tempo: f64) -> AudioTraits {
        AudioTraits {
            energy,
            danceability,
            tempo,
        }
    }

    fn path(
        track_id: &str,
        popularity: i64,
        playlist_name: &str,
        subgenre: &str,
        similarity: f64,
    ) -> CandidatePath {
        CandidatePath {
            track_id: track_id.to_string(),
            track_name: format!("track {}", track_id),
            artist_name: "artist".to_string(),
            popularity,
            traits: traits(0.5, 0.5, 120.0),
            album_name: "album".to_string(),
            playlist_name: playlist_name.to_string(),
            subgenre: subgenre.to_string(),
            similarity,
        }
    }

    #[test]
    fn normalize_filter_drops_blank_input() {
        assert_eq!(normalize_filter(None), None);
        assert_eq!(normalize_filter(Some("")), None);
        assert_eq!(normalize_filter(Some("   ")), None);
        assert_eq!(normalize_filter(Some(" Daft Punk ")), Some("Daft Punk"));
    }

    #[test]
    fn characteristic_query_without_filters_has_no_where() {
        let text = characteristic_query_text(false, false);
        assert!(!text.contains("WHERE"));
        assert!(text.contains("ORDER BY popularity DESC, track_id ASC"));
        assert!(text.contains("LIMIT 15"));
    }

    #[test]
    fn characteristic_query_keeps_only_present_filters() {
        let artist_only = characteristic_query_text(true, false);
        assert!(artist_only.contains("WHERE a.name CONTAINS $artist\n"));
        assert!(!artist_only.contains("$playlist_name"));

        let playlist_only = characteristic_query_text(false, true);
        assert!(playlist_only.contains("WHERE p.name CONTAINS $playlist_name\n"));
        assert!(!playlist_only.contains("$artist\n"));

        let both = characteristic_query_text(true, true);
        assert!(both.contains("WHERE a.name CONTAINS $artist AND p.name CONTAINS $playlist_name"));
    }

    #[test]
    fn similarity_scales_only_tempo() {
        let score = similarity_score(traits(0.8, 0.6, 120.0), traits(0.5, 0.6, 100.0));
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn similarity_is_symmetric_in_differences() {
        let a = traits(0.2, 0.9, 80.0);
        let b = traits(0.7, 0.1, 140.0);
        let forward = similarity_score(a, b);
        let backward = similarity_score(b, a);
        assert!((forward - backward).abs() < 1e-9);
    }

    #[test]
    fn rank_orders_by_similarity_then_popularity() {
        let ranked = rank_similar(vec![
            path("a", 10, "P", "pop", 0.4),
            path("b", 90, "P", "pop", 0.1),
            path("c", 50, "P", "pop", 0.1),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.track_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn rank_breaks_full_ties_by_track_id() {
        let ranked = rank_similar(vec![
            path("z", 50, "P", "pop", 0.2),
            path("a", 50, "P", "pop", 0.2),
        ]);
        let ids: Vec<&str> = ranked.iter().map(|r| r.track_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "z"]);
    }

    #[test]
    fn rank_truncates_to_five() {
        let paths = (0..8)
            .map(|i| path(&format!("t{}", i), 10, "P", "pop", i as f64 * 0.1))
            .collect();
        assert_eq!(rank_similar(paths).len(), 5);
    }

    #[test]
    fn rank_keeps_one_row_per_candidate() {
        let ranked = rank_similar(vec![
            path("a", 10, "Workout", "edm", 0.3),
            path("a", 10, "Chill", "lofi", 0.3),
            path("a", 10, "Party", "house", 0.3),
        ]);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn rank_attributes_smallest_playlist_name() {
        let ranked = rank_similar(vec![
            path("a", 10, "Workout", "edm", 0.3),
            path("a", 10, "Chill", "lofi", 0.3),
        ]);
        assert_eq!(ranked[0].subgenre, "lofi");
    }
}
