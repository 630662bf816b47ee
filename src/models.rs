use crate::user_models::UserSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Genres offered by the clients. Stored genres are free text.
pub const GENRES: &[&str] = &["Rock", "Pop", "Metal", "Jazz", "Electrónica", "Folk", "Otro"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Fácil", alias = "easy")]
    Easy,
    #[serde(rename = "Intermedia", alias = "medium")]
    Medium,
    #[serde(rename = "Difícil", alias = "hard")]
    Hard,
    #[serde(rename = "Muy difícil", alias = "very_hard")]
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::VeryHard,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Fácil",
            Difficulty::Medium => "Intermedia",
            Difficulty::Hard => "Difícil",
            Difficulty::VeryHard => "Muy difícil",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        match wanted.as_str() {
            "easy" | "fácil" | "facil" => Ok(Difficulty::Easy),
            "medium" | "intermedia" => Ok(Difficulty::Medium),
            "hard" | "difícil" | "dificil" => Ok(Difficulty::Hard),
            "very_hard" | "very-hard" | "muy difícil" | "muy dificil" => Ok(Difficulty::VeryHard),
            _ => Err(format!(
                "Unknown difficulty '{}'. Use easy, medium, hard or very_hard",
                s
            )),
        }
    }
}

/// One row of `canciones_sugeridas.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSuggestion {
    #[serde(rename = "youtube_id")]
    pub video_id: String,
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(rename = "titulo_cancion")]
    pub title: String,
    #[serde(rename = "artista")]
    pub artist: String,
    #[serde(rename = "genero")]
    pub genre: String,
    #[serde(rename = "dificultad")]
    pub difficulty: Difficulty,
    #[serde(rename = "sugerido_por")]
    pub suggested_by: String,
    #[serde(rename = "fecha_sugerencia")]
    pub suggestion_date: NaiveDate,
    #[serde(rename = "notas")]
    pub notes: String,
    /// Derived from `votos.json`; unreadable cells decode as 0.
    #[serde(rename = "votos_count", default, deserialize_with = "lenient_count")]
    pub vote_count: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Whole(u64),
    Fraction(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match RawCount::deserialize(deserializer)? {
        RawCount::Whole(n) => n as f64,
        RawCount::Fraction(n) => n,
        RawCount::Text(text) => text.trim().parse::<f64>().unwrap_or(0.0),
        RawCount::Other(_) => 0.0,
    };

    if count.is_finite() && count > 0.0 {
        Ok(count.min(u32::MAX as f64) as u32)
    } else {
        Ok(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongTable(pub Vec<SongSuggestion>);

impl SongTable {
    pub fn contains(&self, video_id: &str) -> bool {
        self.0.iter().any(|s| s.video_id == video_id)
    }

    pub fn get(&self, video_id: &str) -> Option<&SongSuggestion> {
        self.0.iter().find(|s| s.video_id == video_id)
    }
}

/// `votos.json`: video id, then username, to an active/retracted like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteTable(pub BTreeMap<String, BTreeMap<String, bool>>);

impl VoteTable {
    pub fn set(&mut self, video_id: &str, username: &str, value: bool) {
        self.0
            .entry(video_id.to_string())
            .or_default()
            .insert(username.to_string(), value);
    }

    /// Retracted votes count the same as no vote.
    pub fn is_active(&self, video_id: &str, username: &str) -> bool {
        self.0
            .get(video_id)
            .and_then(|votes| votes.get(username))
            .copied()
            .unwrap_or(false)
    }

    pub fn count(&self, video_id: &str) -> u32 {
        self.0
            .get(video_id)
            .map(|votes| votes.values().filter(|v| **v).count() as u32)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub genre: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    MostVoted,
    Title,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "most_voted" | "votes" => Ok(SortOrder::MostVoted),
            "title" => Ok(SortOrder::Title),
            _ => Err(format!(
                "Unknown sort '{}'. Use newest, oldest, most_voted or title",
                s
            )),
        }
    }
}

/// Query string of `GET /songs`. List values are comma separated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SongQuery {
    pub genre: Option<String>,
    pub difficulty: Option<String>,
    pub suggested_by: Option<String>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub genres: Vec<String>,
    pub difficulties: Vec<Difficulty>,
    pub suggested_by: Vec<String>,
    pub sort: SortOrder,
}

impl SongFilter {
    pub fn from_query(query: &SongQuery) -> Result<Self, String> {
        let difficulties = split_list(query.difficulty.as_deref())
            .iter()
            .map(|d| d.parse())
            .collect::<Result<Vec<Difficulty>, String>>()?;

        Ok(Self {
            genres: split_list(query.genre.as_deref()),
            difficulties,
            suggested_by: split_list(query.suggested_by.as_deref()),
            sort: query.sort.unwrap_or_default(),
        })
    }

    pub fn matches(&self, song: &SongSuggestion) -> bool {
        (self.genres.is_empty() || self.genres.contains(&song.genre))
            && (self.difficulties.is_empty() || self.difficulties.contains(&song.difficulty))
            && (self.suggested_by.is_empty() || self.suggested_by.contains(&song.suggested_by))
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub value: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteResponse {
    pub video_id: String,
    pub vote_count: u32,
    pub voted: bool,
}

/// A suggestion as shown to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongView {
    #[serde(flatten)]
    pub song: SongSuggestion,
    pub thumbnail_url: String,
    pub watch_url: String,
    pub voted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SongListResponse {
    pub songs: Vec<SongView>,
}

/// `GET /me`: who is logged in and what they suggested.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub user: UserSummary,
    pub suggestions: Vec<SongSuggestion>,
}
