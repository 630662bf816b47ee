use crate::models::{Difficulty, SongSuggestion};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSong {
    pub video_id: String,
    pub title: String,
    pub artist: String,
    pub vote_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSong {
    pub suggestion_date: NaiveDate,
    pub title: String,
    pub artist: String,
    pub suggested_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_songs: usize,
    pub by_genre: Vec<LabelCount>,
    pub by_difficulty: Vec<LabelCount>,
    pub top_songs: Vec<TopSong>,
    pub top_contributors: Vec<LabelCount>,
    pub recent: Vec<RecentSong>,
}

impl Statistics {
    pub fn from_songs(songs: &[SongSuggestion]) -> Self {
        let by_difficulty = Difficulty::ALL
            .iter()
            .map(|difficulty| LabelCount {
                label: difficulty.label().to_string(),
                count: songs.iter().filter(|s| s.difficulty == *difficulty).count(),
            })
            .filter(|entry| entry.count > 0)
            .collect();

        let mut by_votes: Vec<&SongSuggestion> = songs.iter().collect();
        by_votes.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
        let top_songs = by_votes
            .into_iter()
            .take(TOP)
            .map(|s| TopSong {
                video_id: s.video_id.clone(),
                title: s.title.clone(),
                artist: s.artist.clone(),
                vote_count: s.vote_count,
            })
            .collect();

        let mut by_date: Vec<&SongSuggestion> = songs.iter().collect();
        by_date.sort_by(|a, b| b.suggestion_date.cmp(&a.suggestion_date));
        let recent = by_date
            .into_iter()
            .take(TOP)
            .map(|s| RecentSong {
                suggestion_date: s.suggestion_date,
                title: s.title.clone(),
                artist: s.artist.clone(),
                suggested_by: s.suggested_by.clone(),
            })
            .collect();

        let mut top_contributors = count_by(songs, |s| &s.suggested_by);
        top_contributors.truncate(TOP);

        Self {
            total_songs: songs.len(),
            by_genre: count_by(songs, |s| &s.genre),
            by_difficulty,
            top_songs,
            top_contributors,
            recent,
        }
    }
}

/// Counts per label, most frequent first, ties by label.
fn count_by<F>(songs: &[SongSuggestion], key: F) -> Vec<LabelCount>
where
    F: Fn(&SongSuggestion) -> &String,
{
    let mut counts: HashMap<&String, usize> = HashMap::new();
    for song in songs {
        *counts.entry(key(song)).or_default() += 1;
    }

    let mut counts: Vec<LabelCount> = counts
        .into_iter()
        .map(|(label, count)| LabelCount {
            label: label.clone(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(id: &str, genre: &str, difficulty: Difficulty, by: &str, day: u32, votes: u32) -> SongSuggestion {
        SongSuggestion {
            video_id: id.to_string(),
            source_url: String::new(),
            title: format!("Song {}", id),
            artist: "Band".to_string(),
            genre: genre.to_string(),
            difficulty,
            suggested_by: by.to_string(),
            suggestion_date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            notes: String::new(),
            vote_count: votes,
        }
    }

    #[test]
    fn empty_board_has_empty_stats() {
        assert_eq!(Statistics::from_songs(&[]), Statistics::default());
    }

    #[test]
    fn counts_and_rankings() {
        let songs = vec![
            song("a", "Rock", Difficulty::Hard, "Ana", 1, 2),
            song("b", "Rock", Difficulty::Easy, "Luis", 3, 5),
            song("c", "Pop", Difficulty::Hard, "Ana", 2, 0),
            song("d", "Jazz", Difficulty::VeryHard, "Ana", 4, 1),
        ];
        let stats = Statistics::from_songs(&songs);

        assert_eq!(stats.total_songs, 4);
        assert_eq!(stats.by_genre[0], LabelCount { label: "Rock".to_string(), count: 2 });
        assert_eq!(stats.by_genre.len(), 3);

        let difficulty_labels: Vec<&str> = stats.by_difficulty.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(difficulty_labels, vec!["Fácil", "Difícil", "Muy difícil"]);

        assert_eq!(stats.top_songs[0].video_id, "b");
        assert_eq!(stats.top_songs[1].video_id, "a");

        assert_eq!(stats.top_contributors[0], LabelCount { label: "Ana".to_string(), count: 3 });
        assert_eq!(stats.recent[0].title, "Song d");
        assert_eq!(stats.recent[3].title, "Song a");
    }
}
