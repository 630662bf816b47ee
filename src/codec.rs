//! Flat-file encodings for the three persisted collections.
//!
//! Users and votes are JSON objects keyed by their natural key; songs are a
//! CSV table with a fixed header row.

use crate::error::CodecError;
use crate::models::{SongSuggestion, SongTable, VoteTable};
use crate::user_models::UserTable;

pub const USERS_PATH: &str = "usuarios.json";
pub const SONGS_PATH: &str = "canciones_sugeridas.csv";
pub const VOTES_PATH: &str = "votos.json";

pub const SONG_HEADER: [&str; 10] = [
    "youtube_id",
    "url",
    "titulo_cancion",
    "artista",
    "genero",
    "dificultad",
    "sugerido_por",
    "fecha_sugerencia",
    "notas",
    "votos_count",
];

/// A collection persisted as a single file in the remote store.
pub trait FlatFile: Sized + Clone + Send + Sync + 'static {
    const PATH: &'static str;

    fn decode(content: &str) -> Result<Self, CodecError>;

    fn encode(&self) -> Result<String, CodecError>;

    /// Value used when the file is missing or cannot be decoded.
    fn empty() -> Self;

    /// Value written the first time the file is missing.
    fn bootstrap() -> Self {
        Self::empty()
    }
}

impl FlatFile for UserTable {
    const PATH: &'static str = USERS_PATH;

    fn decode(content: &str) -> Result<Self, CodecError> {
        Ok(UserTable(serde_json::from_str(content)?))
    }

    fn encode(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    fn empty() -> Self {
        UserTable::default()
    }

    fn bootstrap() -> Self {
        UserTable::bootstrap()
    }
}

impl FlatFile for VoteTable {
    const PATH: &'static str = VOTES_PATH;

    fn decode(content: &str) -> Result<Self, CodecError> {
        Ok(VoteTable(serde_json::from_str(content)?))
    }

    fn encode(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }

    fn empty() -> Self {
        VoteTable::default()
    }
}

impl FlatFile for SongTable {
    const PATH: &'static str = SONGS_PATH;

    fn decode(content: &str) -> Result<Self, CodecError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(content.as_bytes());

        let songs = reader
            .deserialize::<SongSuggestion>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SongTable(songs))
    }

    fn encode(&self) -> Result<String, CodecError> {
        // Header is written by hand so an empty table still carries it.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        writer.write_record(SONG_HEADER)?;
        for song in &self.0 {
            writer.serialize(song)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CodecError::Csv(e.into_error().into()))?;
        String::from_utf8(bytes).map_err(|_| CodecError::Utf8)
    }

    fn empty() -> Self {
        SongTable::default()
    }
}
