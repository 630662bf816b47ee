use crate::error::{AppError, AppResult};
use crate::models::{SongFilter, SongSuggestion, SongTable, SongView, SortOrder, SuggestionRequest};
use crate::session::Session;
use crate::stats::Statistics;
use crate::storage::Repository;
use crate::youtube::{extract_video_id, thumbnail_url, watch_url, VideoInfo};
use std::sync::Arc;
use tracing::{debug, info};

/// Suggestions in `canciones_sugeridas.csv` and likes in `votos.json`.
pub struct SongStorage {
    repo: Arc<Repository>,
}

impl SongStorage {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    pub async fn submit_suggestion(
        &self,
        session: &Session,
        request: SuggestionRequest,
    ) -> AppResult<SongSuggestion> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(AppError::validation("Please enter the YouTube URL"));
        }
        let video_id = extract_video_id(url).ok_or_else(|| {
            AppError::validation("Invalid YouTube URL. Please check it and try again")
        })?;
        if request.genre.trim().is_empty() {
            return Err(AppError::validation("Genre is required"));
        }

        let _writer = self.repo.write_lock().await;
        let mut songs = self.repo.load_songs().await?;
        if songs.contains(&video_id) {
            return Err(AppError::DuplicateSong(video_id));
        }

        let title = match request.title.trim() {
            "" => VideoInfo::for_id(&video_id).title,
            title => title.to_string(),
        };

        let song = SongSuggestion {
            video_id,
            source_url: url.to_string(),
            title,
            artist: request.artist.trim().to_string(),
            genre: request.genre.trim().to_string(),
            difficulty: request.difficulty,
            suggested_by: session.display_name.clone(),
            suggestion_date: self.repo.today(),
            notes: request.notes,
            vote_count: 0,
        };

        songs.0.push(song.clone());
        self.repo.save_songs(&songs).await?;

        info!(video_id = %song.video_id, by = %session.username, "Song suggested");
        Ok(song)
    }

    /// Records a like (`true`) or its retraction (`false`) and refreshes
    /// the stored counts. Returns the song's new count.
    pub async fn vote(&self, video_id: &str, username: &str, value: bool) -> AppResult<u32> {
        let _writer = self.repo.write_lock().await;
        let songs = self.repo.load_songs().await?;
        if !songs.contains(video_id) {
            return Err(AppError::SongNotFound(video_id.to_string()));
        }

        let mut votes = self.repo.load_votes().await?;
        votes.set(video_id, username, value);
        self.repo.save_votes(&votes).await?;
        info!(video_id, username, value, "Vote recorded");

        let songs = self.rewrite_vote_counts().await?;
        Ok(songs.get(video_id).map(|s| s.vote_count).unwrap_or(0))
    }

    /// Rewrites every stored count from the votes file.
    pub async fn recompute_vote_counts(&self) -> AppResult<SongTable> {
        let _writer = self.repo.write_lock().await;
        self.rewrite_vote_counts().await
    }

    async fn rewrite_vote_counts(&self) -> AppResult<SongTable> {
        let mut songs = self.repo.load_songs().await?;
        let votes = self.repo.load_votes().await?;

        for song in songs.0.iter_mut() {
            song.vote_count = votes.count(&song.video_id);
        }

        self.repo.save_songs(&songs).await?;
        debug!(songs = songs.0.len(), "Vote counts recomputed");
        Ok(songs)
    }

    pub async fn has_voted(&self, video_id: &str, username: &str) -> AppResult<bool> {
        let votes = self.repo.load_votes().await?;
        Ok(votes.is_active(video_id, username))
    }

    pub async fn vote_count(&self, video_id: &str) -> AppResult<u32> {
        let votes = self.repo.load_votes().await?;
        Ok(votes.count(video_id))
    }

    /// Counts shown here come from the votes file, not the stored column.
    pub async fn list_songs(&self, filter: &SongFilter, viewer: &Session) -> AppResult<Vec<SongView>> {
        let songs = self.repo.load_songs().await?;
        let votes = self.repo.load_votes().await?;

        let mut selected: Vec<SongSuggestion> = songs
            .0
            .into_iter()
            .filter(|s| filter.matches(s))
            .map(|mut song| {
                song.vote_count = votes.count(&song.video_id);
                song
            })
            .collect();
        sort_songs(&mut selected, filter.sort);

        Ok(selected
            .into_iter()
            .map(|song| SongView {
                thumbnail_url: thumbnail_url(&song.video_id),
                watch_url: watch_url(&song.video_id),
                voted: votes.is_active(&song.video_id, &viewer.username),
                song,
            })
            .collect())
    }

    pub async fn songs_by(&self, display_name: &str) -> AppResult<Vec<SongSuggestion>> {
        let songs = self.repo.load_songs().await?;
        Ok(songs
            .0
            .into_iter()
            .filter(|s| s.suggested_by == display_name)
            .collect())
    }

    pub async fn statistics(&self) -> AppResult<Statistics> {
        let songs = self.repo.load_songs().await?;
        Ok(Statistics::from_songs(&songs.0))
    }
}

fn sort_songs(songs: &mut [SongSuggestion], order: SortOrder) {
    match order {
        SortOrder::Newest => songs.sort_by(|a, b| b.suggestion_date.cmp(&a.suggestion_date)),
        SortOrder::Oldest => songs.sort_by(|a, b| a.suggestion_date.cmp(&b.suggestion_date)),
        SortOrder::MostVoted => songs.sort_by(|a, b| b.vote_count.cmp(&a.vote_count)),
        SortOrder::Title => songs.sort_by(|a, b| a.title.cmp(&b.title)),
    }
}
