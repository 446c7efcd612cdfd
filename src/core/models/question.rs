use serde::{Deserialize, Serialize};

/// A stored question with `choices` already deserialized back to an array.
/// Rows carry choices as a serialized blob, so this is mapped explicitly at
/// the storage boundary instead of deriving `FromRow`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: i32,
    pub quiz_id: i32,
    pub question_text: String,
    pub choices: Vec<String>,
    pub correct_answer_index: i32,
    pub explanation: String,
    pub category: String,
    pub difficulty: String,
    pub image: String,
}

/// One record of a batch import. Every field is optional so that presence
/// can be checked per record and reported per index.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuestionCandidate {
    pub quiz_id: Option<i32>,
    pub question_text: Option<String>,
    pub choices: Option<Vec<String>>,
    pub correct_answer_index: Option<i32>,
    pub explanation: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuestionInsertion {
    pub quiz_id: i32,
    pub question_text: String,
    pub choices: Vec<String>,
    pub correct_answer_index: i32,
    pub explanation: String,
    pub category: String,
    pub difficulty: String,
    pub image: String,
}
