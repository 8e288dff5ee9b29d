//! # Votes Module
//!
//! Star ratings and comments on dishes, stored in a JSON document keyed by
//! `"{user}_{dishId}_{date}"`. A later vote with the same key replaces the
//! earlier one; votes are never deleted.

use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::menu_errors::MenuError;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// One user's vote on one dish for one menu date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "piatto_id")]
    pub dish_id: u32,
    #[serde(rename = "voto")]
    pub rating: u8,
    #[serde(rename = "commento", default)]
    pub comment: String,
    #[serde(rename = "username")]
    pub user: String,
    #[serde(rename = "data_menu")]
    pub date: String,
    pub timestamp: String,
}

/// A comment left with a vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteComment {
    pub user: String,
    pub comment: String,
}

/// Aggregated votes of one dish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishVoteStats {
    pub ratings: Vec<u8>,
    /// Mean rating rounded to two decimals
    pub average: f64,
    pub count: usize,
    pub comments: Vec<VoteComment>,
}

/// Vote document on disk
#[derive(Debug, Clone)]
pub struct VoteStore {
    path: PathBuf,
}

impl VoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every stored vote by key; empty when the document does not exist
    pub fn load(&self) -> Result<BTreeMap<String, Vote>, MenuError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, votes: &BTreeMap<String, Vote>) -> Result<(), MenuError> {
        fs::write(&self.path, serde_json::to_string_pretty(votes)?)?;
        Ok(())
    }

    /// Record a vote, replacing any earlier vote with the same key
    pub fn cast(
        &self,
        user: &str,
        dish_id: u32,
        rating: u8,
        comment: &str,
        date: &str,
    ) -> Result<Vote, MenuError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(MenuError::InvalidVote(format!(
                "rating {rating} outside {MIN_RATING}..={MAX_RATING}"
            )));
        }

        let mut votes = self.load()?;
        let vote = Vote {
            dish_id,
            rating,
            comment: comment.trim().to_string(),
            user: user.to_string(),
            date: date.to_string(),
            timestamp: Local::now().to_rfc3339(),
        };
        votes.insert(vote_key(user, dish_id, date), vote.clone());
        self.save(&votes)?;

        info!("Vote recorded: {} gave dish {} {} stars on {}", user, dish_id, rating, date);
        Ok(vote)
    }

    /// Votes of a user for a menu date, by dish id
    pub fn votes_of(&self, user: &str, date: &str) -> Result<BTreeMap<u32, Vote>, MenuError> {
        Ok(self
            .load()?
            .into_values()
            .filter(|v| v.user == user && v.date == date)
            .map(|v| (v.dish_id, v))
            .collect())
    }

    /// Per-dish statistics for a menu date
    pub fn statistics(&self, date: &str) -> Result<BTreeMap<u32, DishVoteStats>, MenuError> {
        let mut stats: BTreeMap<u32, DishVoteStats> = BTreeMap::new();

        for vote in self.load()?.into_values().filter(|v| v.date == date) {
            let entry = stats.entry(vote.dish_id).or_insert_with(|| DishVoteStats {
                ratings: Vec::new(),
                average: 0.0,
                count: 0,
                comments: Vec::new(),
            });
            entry.ratings.push(vote.rating);
            if !vote.comment.is_empty() {
                entry.comments.push(VoteComment {
                    user: vote.user,
                    comment: vote.comment,
                });
            }
        }

        for entry in stats.values_mut() {
            entry.count = entry.ratings.len();
            let sum: u32 = entry.ratings.iter().map(|r| u32::from(*r)).sum();
            let mean = f64::from(sum) / entry.count as f64;
            entry.average = (mean * 100.0).round() / 100.0;
        }

        Ok(stats)
    }
}

/// Storage key of a vote
pub fn vote_key(user: &str, dish_id: u32, date: &str) -> String {
    format!("{user}_{dish_id}_{date}")
}
