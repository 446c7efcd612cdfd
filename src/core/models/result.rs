use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Attempt payload as submitted. `answers` is an arbitrary mapping; it is
/// stored serialized and must round-trip exactly.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultCreate {
    pub quiz_id: i32,
    pub score: f64,
    pub answers: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ResultInsertion {
    pub user_id: i32,
    pub quiz_id: i32,
    pub score: f64,
    pub answers: serde_json::Value,
}

/// One recorded attempt joined with the metadata of the quiz it was taken on,
/// `answers` deserialized.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub result_id: i32,
    pub score: f64,
    pub answers: serde_json::Value,
    pub completed_at: NaiveDateTime,
    pub quiz_id: i32,
    pub quiz_name: String,
    pub category: String,
    pub difficulty: String,
}

/// Aggregates over every attempt of one user. Averages and extremes are NULL
/// for a user with no recorded attempts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OverallStats {
    pub total_quizzes: i64,
    pub average_score: Option<f64>,
    pub highest_score: Option<f64>,
    pub lowest_score: Option<f64>,
    pub unique_quizzes: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CategoryStat {
    pub category: String,
    pub quizzes_taken: i64,
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub overall_stats: OverallStats,
    pub category_stats: Vec<CategoryStat>,
}
