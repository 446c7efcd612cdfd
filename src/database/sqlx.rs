use chrono::NaiveDateTime;
use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, query_scalar, Executor, FromRow, PgPool, Postgres, Transaction};

use crate::core::db::{Manager, QuestionCommon, QuizCommon, ResultCommon, Storer, TxStorer, UserCommon};
use crate::core::models::question::{Question, QuestionInsertion};
use crate::core::models::quiz::{Quiz, QuizInsertion};
use crate::core::models::result::{CategoryStat, OverallStats, ResultInsertion, ResultRecord};
use crate::core::models::user::User;
use crate::error::Error;

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

/// Row shape of the questions table; `choices` stays serialized in the
/// column and is mapped at this boundary.
#[derive(Debug, FromRow)]
struct QuestionRow {
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

impl QuestionRow {
    fn into_question(self) -> Result<Question, Error> {
        Ok(Question {
            id: self.id,
            quiz_id: self.quiz_id,
            question_text: self.question_text,
            choices: serde_json::from_str(&self.choices)?,
            correct_answer_index: self.correct_answer_index,
            explanation: self.explanation,
            category: self.category,
            difficulty: self.difficulty,
            image: self.image,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResultRow {
    result_id: i32,
    score: f64,
    answers: String,
    completed_at: NaiveDateTime,
    quiz_id: i32,
    quiz_name: String,
    category: String,
    difficulty: String,
}

impl ResultRow {
    fn into_record(self) -> Result<ResultRecord, Error> {
        Ok(ResultRecord {
            result_id: self.result_id,
            score: self.score,
            answers: serde_json::from_str(&self.answers)?,
            completed_at: self.completed_at,
            quiz_id: self.quiz_id,
            quiz_name: self.quiz_name,
            category: self.category,
            difficulty: self.difficulty,
        })
    }
}

impl<E> QuizCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: QuizInsertion) -> Result<i32, Error> {
        let id = query_scalar(
            "INSERT INTO quiz (name, description, image, category, difficulty, created_at)
            VALUES ($1, $2, $3, $4, $5, CURRENT_DATE)
            RETURNING id",
        )
        .bind(data.name)
        .bind(data.description)
        .bind(data.image)
        .bind(data.category)
        .bind(data.difficulty)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Quiz>, Error> {
        let quiz = query_as("SELECT * FROM quiz WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(quiz)
    }

    async fn exists(&mut self, id: i32) -> Result<bool, Error> {
        let exists = query_scalar("SELECT EXISTS(SELECT * FROM quiz WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(exists)
    }

    async fn query(&mut self, category: Option<&str>) -> Result<Vec<Quiz>, Error> {
        let quizzes = query_as("SELECT * FROM quiz WHERE ($1 IS NULL OR category = $1) ORDER BY id")
            .bind(category)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(quizzes)
    }

    async fn categories(&mut self) -> Result<Vec<String>, Error> {
        let categories = query_scalar("SELECT DISTINCT category FROM quiz ORDER BY category")
            .fetch_all(&mut self.executor)
            .await?;
        Ok(categories)
    }

    async fn samples(&mut self, category: &str, limit: i64) -> Result<Vec<Quiz>, Error> {
        let quizzes = query_as("SELECT * FROM quiz WHERE category = $1 ORDER BY RANDOM() LIMIT $2")
            .bind(category)
            .bind(limit)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(quizzes)
    }

    async fn delete(&mut self, id: i32) -> Result<u64, Error> {
        let res = query("DELETE FROM quiz WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }
}

impl<E> QuestionCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: QuestionInsertion) -> Result<i32, Error> {
        let choices = serde_json::to_string(&data.choices)?;
        let id = query_scalar(
            "INSERT INTO questions (quiz_id, question_text, choices, correct_answer_index, explanation, category, difficulty, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id",
        )
        .bind(data.quiz_id)
        .bind(data.question_text)
        .bind(choices)
        .bind(data.correct_answer_index)
        .bind(data.explanation)
        .bind(data.category)
        .bind(data.difficulty)
        .bind(data.image)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn get(&mut self, id: i32) -> Result<Question, Error> {
        let row: QuestionRow = query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_one(&mut self.executor)
            .await?;
        row.into_question()
    }

    async fn by_quiz(&mut self, quiz_id: i32) -> Result<Vec<Question>, Error> {
        let rows: Vec<QuestionRow> = query_as("SELECT * FROM questions WHERE quiz_id = $1 ORDER BY id")
            .bind(quiz_id)
            .fetch_all(&mut self.executor)
            .await?;
        rows.into_iter().map(QuestionRow::into_question).collect()
    }

    async fn delete(&mut self, id: i32) -> Result<u64, Error> {
        let res = query("DELETE FROM questions WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(res.rows_affected())
    }

    async fn delete_by_quiz(&mut self, quiz_id: i32) -> Result<u64, Error> {
        let res = query("DELETE FROM questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected())
    }
}

impl<E> UserCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(user)
    }

    async fn insert(&mut self, email: &str) -> Result<i32, Error> {
        let id = query_scalar("INSERT INTO users (email, created_at) VALUES ($1, NOW()) RETURNING id")
            .bind(email)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(id)
    }
}

impl<E> ResultCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: ResultInsertion) -> Result<i32, Error> {
        let answers = serde_json::to_string(&data.answers)?;
        let id = query_scalar(
            "INSERT INTO quiz_results (user_id, quiz_id, score, answers, completed_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING id",
        )
        .bind(data.user_id)
        .bind(data.quiz_id)
        .bind(data.score)
        .bind(answers)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }

    async fn by_user(&mut self, user_id: i32) -> Result<Vec<ResultRecord>, Error> {
        let rows: Vec<ResultRow> = query_as(
            "SELECT
                qr.id AS result_id,
                qr.score,
                qr.answers,
                qr.completed_at,
                q.id AS quiz_id,
                q.name AS quiz_name,
                q.category,
                q.difficulty
            FROM quiz_results AS qr
            JOIN quiz AS q ON qr.quiz_id = q.id
            WHERE qr.user_id = $1
            ORDER BY qr.completed_at DESC",
        )
        .bind(user_id)
        .fetch_all(&mut self.executor)
        .await?;
        rows.into_iter().map(ResultRow::into_record).collect()
    }

    async fn overall_stats(&mut self, user_id: i32) -> Result<OverallStats, Error> {
        let stats = query_as(
            "SELECT
                COUNT(*) AS total_quizzes,
                AVG(score) AS average_score,
                MAX(score) AS highest_score,
                MIN(score) AS lowest_score,
                COUNT(DISTINCT quiz_id) AS unique_quizzes
            FROM quiz_results
            WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(stats)
    }

    async fn category_stats(&mut self, user_id: i32) -> Result<Vec<CategoryStat>, Error> {
        let stats = query_as(
            "SELECT
                q.category,
                COUNT(*) AS quizzes_taken,
                AVG(qr.score) AS average_score
            FROM quiz_results AS qr
            JOIN quiz AS q ON qr.quiz_id = q.id
            WHERE qr.user_id = $1
            GROUP BY q.category
            ORDER BY q.category",
        )
        .bind(user_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(stats)
    }
}

impl Storer for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Storer for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStorer for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}

pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx::new(tx))
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx::new(conn))
    }
}

impl Manager for PgSqlxManager {
    type Store = PgSqlx<PoolConnection<Postgres>>;
    type TxStore = PgSqlx<Transaction<'static, Postgres>>;

    async fn db(&self) -> Result<Self::Store, Error> {
        self.acquire().await
    }

    async fn tx(&self) -> Result<Self::TxStore, Error> {
        self.begin().await
    }
}
