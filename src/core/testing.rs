//! In-memory implementation of the storage traits, backing the core tests.
//! Mirrors the storage-boundary behavior of the real engine: `choices` and
//! `answers` are held serialized and mapped back on read, and transactional
//! scopes stage against a snapshot that only lands on commit.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

use crate::core::db::{Manager, QuestionCommon, QuizCommon, ResultCommon, Storer, TxStorer, UserCommon};
use crate::core::models::question::{Question, QuestionCandidate, QuestionInsertion};
use crate::core::models::quiz::{Quiz, QuizCreate, QuizInsertion};
use crate::core::models::result::{CategoryStat, OverallStats, ResultInsertion, ResultRecord};
use crate::core::models::user::User;
use crate::error::Error;

pub fn quiz_create(name: &str, category: &str) -> QuizCreate {
    QuizCreate {
        name: Some(name.to_owned()),
        description: Some("desc".to_owned()),
        image: Some("cover.png".to_owned()),
        category: Some(category.to_owned()),
        difficulty: Some("Medium".to_owned()),
    }
}

pub fn candidate(quiz_id: Option<i32>) -> QuestionCandidate {
    QuestionCandidate {
        quiz_id,
        question_text: Some("What is the capital of France?".to_owned()),
        choices: Some(vec!["Paris".to_owned(), "London".to_owned()]),
        correct_answer_index: Some(0),
        explanation: Some("Paris is the capital of France.".to_owned()),
        category: Some("Geography".to_owned()),
        difficulty: Some("Easy".to_owned()),
        image: Some("paris.jpg".to_owned()),
    }
}

#[derive(Debug, Clone)]
struct StoredQuestion {
    id: i32,
    quiz_id: i32,
    question_text: String,
    choices: String,
    correct_answer_index: i32,
    explanation: String,
    category: String,
    difficulty: String,
    image: String,
}

impl StoredQuestion {
    fn to_question(&self) -> Result<Question, Error> {
        Ok(Question {
            id: self.id,
            quiz_id: self.quiz_id,
            question_text: self.question_text.clone(),
            choices: serde_json::from_str(&self.choices)?,
            correct_answer_index: self.correct_answer_index,
            explanation: self.explanation.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct StoredResult {
    id: i32,
    user_id: i32,
    quiz_id: i32,
    score: f64,
    answers: String,
    completed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    quizzes: Vec<Quiz>,
    questions: Vec<StoredQuestion>,
    users: Vec<User>,
    results: Vec<StoredResult>,
    next_quiz_id: i32,
    next_question_id: i32,
    next_user_id: i32,
    next_result_id: i32,
    clock: i64,
}

impl State {
    // Monotonic stand-in for NOW(); strictly increasing so ordering by
    // completed_at is unambiguous in tests.
    fn tick(&mut self) -> NaiveDateTime {
        self.clock += 1;
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::seconds(self.clock)
    }

    pub fn remove_quiz(&mut self, id: i32) {
        self.quizzes.retain(|q| q.id != id);
    }

    pub fn quiz_count(&self) -> usize {
        self.quizzes.len()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemManager {
    shared: Arc<Mutex<State>>,
}

impl MemManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutate<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.shared.lock().unwrap())
    }
}

impl Manager for MemManager {
    type Store = MemStore;
    type TxStore = MemStore;

    async fn db(&self) -> Result<MemStore, Error> {
        Ok(MemStore {
            shared: self.shared.clone(),
            tx: None,
        })
    }

    async fn tx(&self) -> Result<MemStore, Error> {
        let snapshot = self.shared.lock().unwrap().clone();
        Ok(MemStore {
            shared: self.shared.clone(),
            tx: Some(snapshot),
        })
    }
}

/// Direct handles write through immediately; transactional handles write to
/// the snapshot and publish it on commit, so dropping one without committing
/// discards everything it staged.
pub struct MemStore {
    shared: Arc<Mutex<State>>,
    tx: Option<State>,
}

impl MemStore {
    fn with<R>(&mut self, f: impl FnOnce(&mut State) -> R) -> R {
        match self.tx.as_mut() {
            Some(state) => f(state),
            None => f(&mut self.shared.lock().unwrap()),
        }
    }
}

impl QuizCommon for MemStore {
    async fn insert(&mut self, data: QuizInsertion) -> Result<i32, Error> {
        Ok(self.with(|state| {
            state.next_quiz_id += 1;
            let id = state.next_quiz_id;
            state.quizzes.push(Quiz {
                id,
                name: data.name,
                description: data.description,
                image: data.image,
                category: data.category,
                difficulty: data.difficulty,
                created_at: Utc::now().date_naive(),
            });
            id
        }))
    }

    async fn get(&mut self, id: i32) -> Result<Option<Quiz>, Error> {
        Ok(self.with(|state| state.quizzes.iter().find(|q| q.id == id).cloned()))
    }

    async fn exists(&mut self, id: i32) -> Result<bool, Error> {
        Ok(self.with(|state| state.quizzes.iter().any(|q| q.id == id)))
    }

    async fn query(&mut self, category: Option<&str>) -> Result<Vec<Quiz>, Error> {
        Ok(self.with(|state| {
            state
                .quizzes
                .iter()
                .filter(|q| category.map_or(true, |c| q.category == c))
                .cloned()
                .collect()
        }))
    }

    async fn categories(&mut self) -> Result<Vec<String>, Error> {
        Ok(self.with(|state| {
            state
                .quizzes
                .iter()
                .map(|q| q.category.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }))
    }

    async fn samples(&mut self, category: &str, limit: i64) -> Result<Vec<Quiz>, Error> {
        // Deterministic stand-in for ORDER BY RANDOM(): first `limit` rows.
        Ok(self.with(|state| {
            state
                .quizzes
                .iter()
                .filter(|q| q.category == category)
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }

    async fn delete(&mut self, id: i32) -> Result<u64, Error> {
        Ok(self.with(|state| {
            let before = state.quizzes.len();
            state.quizzes.retain(|q| q.id != id);
            (before - state.quizzes.len()) as u64
        }))
    }
}

impl QuestionCommon for MemStore {
    async fn insert(&mut self, data: QuestionInsertion) -> Result<i32, Error> {
        let choices = serde_json::to_string(&data.choices)?;
        Ok(self.with(|state| {
            state.next_question_id += 1;
            let id = state.next_question_id;
            state.questions.push(StoredQuestion {
                id,
                quiz_id: data.quiz_id,
                question_text: data.question_text,
                choices,
                correct_answer_index: data.correct_answer_index,
                explanation: data.explanation,
                category: data.category,
                difficulty: data.difficulty,
                image: data.image,
            });
            id
        }))
    }

    async fn get(&mut self, id: i32) -> Result<Question, Error> {
        let stored = self.with(|state| state.questions.iter().find(|q| q.id == id).cloned());
        stored.ok_or(Error::QuestionNotFound(id))?.to_question()
    }

    async fn by_quiz(&mut self, quiz_id: i32) -> Result<Vec<Question>, Error> {
        let stored = self.with(|state| {
            state
                .questions
                .iter()
                .filter(|q| q.quiz_id == quiz_id)
                .cloned()
                .collect::<Vec<_>>()
        });
        stored.iter().map(StoredQuestion::to_question).collect()
    }

    async fn delete(&mut self, id: i32) -> Result<u64, Error> {
        Ok(self.with(|state| {
            let before = state.questions.len();
            state.questions.retain(|q| q.id != id);
            (before - state.questions.len()) as u64
        }))
    }

    async fn delete_by_quiz(&mut self, quiz_id: i32) -> Result<u64, Error> {
        Ok(self.with(|state| {
            let before = state.questions.len();
            state.questions.retain(|q| q.quiz_id != quiz_id);
            (before - state.questions.len()) as u64
        }))
    }
}

impl UserCommon for MemStore {
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        Ok(self.with(|state| state.users.iter().find(|u| u.email == email).cloned()))
    }

    async fn insert(&mut self, email: &str) -> Result<i32, Error> {
        Ok(self.with(|state| {
            state.next_user_id += 1;
            let id = state.next_user_id;
            let created_at = state.tick();
            state.users.push(User {
                id,
                email: email.to_owned(),
                created_at,
            });
            id
        }))
    }
}

impl ResultCommon for MemStore {
    async fn insert(&mut self, data: ResultInsertion) -> Result<i32, Error> {
        let answers = serde_json::to_string(&data.answers)?;
        Ok(self.with(|state| {
            state.next_result_id += 1;
            let id = state.next_result_id;
            let completed_at = state.tick();
            state.results.push(StoredResult {
                id,
                user_id: data.user_id,
                quiz_id: data.quiz_id,
                score: data.score,
                answers,
                completed_at,
            });
            id
        }))
    }

    async fn by_user(&mut self, user_id: i32) -> Result<Vec<ResultRecord>, Error> {
        let joined = self.with(|state| {
            state
                .results
                .iter()
                .filter(|r| r.user_id == user_id)
                .filter_map(|r| {
                    state
                        .quizzes
                        .iter()
                        .find(|q| q.id == r.quiz_id)
                        .map(|q| (r.clone(), q.clone()))
                })
                .collect::<Vec<_>>()
        });
        let mut records = joined
            .into_iter()
            .map(|(r, q)| {
                Ok(ResultRecord {
                    result_id: r.id,
                    score: r.score,
                    answers: serde_json::from_str(&r.answers)?,
                    completed_at: r.completed_at,
                    quiz_id: q.id,
                    quiz_name: q.name,
                    category: q.category,
                    difficulty: q.difficulty,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(records)
    }

    async fn overall_stats(&mut self, user_id: i32) -> Result<OverallStats, Error> {
        Ok(self.with(|state| {
            let scores: Vec<f64> = state
                .results
                .iter()
                .filter(|r| r.user_id == user_id)
                .map(|r| r.score)
                .collect();
            let unique: BTreeSet<i32> = state
                .results
                .iter()
                .filter(|r| r.user_id == user_id)
                .map(|r| r.quiz_id)
                .collect();
            OverallStats {
                total_quizzes: scores.len() as i64,
                average_score: if scores.is_empty() {
                    None
                } else {
                    Some(scores.iter().sum::<f64>() / scores.len() as f64)
                },
                highest_score: scores.iter().copied().reduce(f64::max),
                lowest_score: scores.iter().copied().reduce(f64::min),
                unique_quizzes: unique.len() as i64,
            }
        }))
    }

    async fn category_stats(&mut self, user_id: i32) -> Result<Vec<CategoryStat>, Error> {
        Ok(self.with(|state| {
            let mut grouped: BTreeMap<String, (i64, f64)> = BTreeMap::new();
            for r in state.results.iter().filter(|r| r.user_id == user_id) {
                if let Some(quiz) = state.quizzes.iter().find(|q| q.id == r.quiz_id) {
                    let entry = grouped.entry(quiz.category.clone()).or_default();
                    entry.0 += 1;
                    entry.1 += r.score;
                }
            }
            grouped
                .into_iter()
                .map(|(category, (taken, sum))| CategoryStat {
                    category,
                    quizzes_taken: taken,
                    average_score: Some(sum / taken as f64),
                })
                .collect()
        }))
    }
}

impl Storer for MemStore {}

impl TxStorer for MemStore {
    async fn commit(mut self) -> Result<(), Error> {
        if let Some(state) = self.tx.take() {
            *self.shared.lock().unwrap() = state;
        }
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), Error> {
        self.tx = None;
        Ok(())
    }
}
