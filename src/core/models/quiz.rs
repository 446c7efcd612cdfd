use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::question::Question;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Quiz {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub difficulty: String,
    pub created_at: NaiveDate,
}

/// Raw creation payload. Field presence is checked in the core, not by the
/// deserializer, so a missing field can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuizCreate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuizInsertion {
    pub name: String,
    pub description: String,
    pub image: String,
    pub category: String,
    pub difficulty: String,
}

#[derive(Debug, Serialize)]
pub struct QuizWithQuestions {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}
