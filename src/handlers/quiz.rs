use std::collections::BTreeMap;

use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::core;
use crate::core::models::question::{Question, QuestionCandidate};
use crate::core::models::quiz::{Quiz, QuizCreate};
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    category: Option<String>,
}

pub async fn list(Query(ListParams { category }): Query<ListParams>, db: Data<PgSqlxManager>) -> Result<Json<Vec<Quiz>>, Error> {
    let mut conn = db.acquire().await?;
    let quizzes = core::quiz::query_quizzes(&mut conn, category.as_deref()).await?;
    Ok(Json(quizzes))
}

pub async fn create(Json(data): Json<QuizCreate>, db: Data<PgSqlxManager>) -> Result<HttpResponse, Error> {
    let mut conn = db.acquire().await?;
    let quiz = core::quiz::create_quiz(&mut conn, data).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(quiz))
}

#[derive(Debug, Deserialize)]
pub struct CreateWithQuestions {
    pub quiz: QuizCreate,
    pub questions: Vec<QuestionCandidate>,
}

#[derive(Debug, Serialize)]
pub struct QuizBundle {
    success: bool,
    quiz: Quiz,
    questions: Vec<Question>,
    total_questions: usize,
}

pub async fn create_with_questions(Json(CreateWithQuestions { quiz, questions }): Json<CreateWithQuestions>, db: Data<PgSqlxManager>) -> Result<HttpResponse, Error> {
    let tx = db.begin().await?;
    let (quiz, questions) = core::quiz::create_quiz_with_questions(tx, quiz, questions).await?;
    Ok(HttpResponse::build(StatusCode::CREATED).json(QuizBundle {
        success: true,
        quiz,
        total_questions: questions.len(),
        questions,
    }))
}

pub async fn detail(quiz_id: Path<(i32,)>, db: Data<PgSqlxManager>) -> Result<Json<Quiz>, Error> {
    let quiz_id = quiz_id.into_inner().0;
    let mut conn = db.acquire().await?;
    let quiz = core::quiz::quiz_detail(&mut conn, quiz_id).await?;
    Ok(Json(quiz))
}

#[derive(Debug, Serialize)]
pub struct QuizDeleted {
    success: bool,
    message: String,
    questions_deleted: u64,
}

pub async fn remove(quiz_id: Path<(i32,)>, db: Data<PgSqlxManager>) -> Result<Json<QuizDeleted>, Error> {
    let quiz_id = quiz_id.into_inner().0;
    let questions_deleted = core::quiz::delete_quiz(db.get_ref(), quiz_id).await?;
    Ok(Json(QuizDeleted {
        success: true,
        message: format!("Quiz with ID {} was deleted successfully", quiz_id),
        questions_deleted,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SampleParams {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CategorySamples {
    success: bool,
    samples: BTreeMap<String, Vec<Quiz>>,
    total_categories: usize,
    quizzes_per_category: i64,
}

pub async fn category_samples(Query(SampleParams { limit }): Query<SampleParams>, db: Data<PgSqlxManager>) -> Result<Json<CategorySamples>, Error> {
    let limit = limit.unwrap_or(3);
    let mut conn = db.acquire().await?;
    let samples = core::quiz::category_samples(&mut conn, limit).await?;
    Ok(Json(CategorySamples {
        success: true,
        total_categories: samples.len(),
        samples,
        quizzes_per_category: limit,
    }))
}
