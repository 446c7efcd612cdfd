use crate::core::models::{
    question::{Question, QuestionInsertion},
    quiz::{Quiz, QuizInsertion},
    result::{CategoryStat, OverallStats, ResultInsertion, ResultRecord},
    user::User,
};
use crate::error::Error;

pub trait QuizCommon {
    async fn insert(&mut self, data: QuizInsertion) -> Result<i32, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Quiz>, Error>;
    async fn exists(&mut self, id: i32) -> Result<bool, Error>;
    async fn query(&mut self, category: Option<&str>) -> Result<Vec<Quiz>, Error>;
    async fn categories(&mut self) -> Result<Vec<String>, Error>;
    async fn samples(&mut self, category: &str, limit: i64) -> Result<Vec<Quiz>, Error>;
    async fn delete(&mut self, id: i32) -> Result<u64, Error>;
}

pub trait QuestionCommon {
    async fn insert(&mut self, data: QuestionInsertion) -> Result<i32, Error>;
    async fn get(&mut self, id: i32) -> Result<Question, Error>;
    async fn by_quiz(&mut self, quiz_id: i32) -> Result<Vec<Question>, Error>;
    async fn delete(&mut self, id: i32) -> Result<u64, Error>;
    async fn delete_by_quiz(&mut self, quiz_id: i32) -> Result<u64, Error>;
}

pub trait UserCommon {
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error>;
    async fn insert(&mut self, email: &str) -> Result<i32, Error>;
}

pub trait ResultCommon {
    async fn insert(&mut self, data: ResultInsertion) -> Result<i32, Error>;
    async fn by_user(&mut self, user_id: i32) -> Result<Vec<ResultRecord>, Error>;
    async fn overall_stats(&mut self, user_id: i32) -> Result<OverallStats, Error>;
    async fn category_stats(&mut self, user_id: i32) -> Result<Vec<CategoryStat>, Error>;
}

/// One acquired storage scope. Implementations back this with a pooled
/// connection or an open transaction; either way the scope is released on
/// drop.
pub trait Storer: QuizCommon + QuestionCommon + UserCommon + ResultCommon {}

/// A transactional scope. Dropping without `commit` rolls back.
pub trait TxStorer: Storer {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}

/// Hands out storage scopes: `db` for single-statement work, `tx` for writes
/// that must land atomically.
pub trait Manager {
    type Store: Storer;
    type TxStore: TxStorer;

    async fn db(&self) -> Result<Self::Store, Error>;
    async fn tx(&self) -> Result<Self::TxStore, Error>;
}
