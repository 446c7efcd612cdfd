use std::collections::BTreeMap;

use log::{info, warn};

use crate::core::db::{Manager, QuestionCommon, QuizCommon, Storer, TxStorer};
use crate::core::models::question::{Question, QuestionCandidate};
use crate::core::models::quiz::{Quiz, QuizCreate, QuizInsertion};
use crate::error::Error;

use super::question::check_candidate;
use super::require;

fn validate(create: QuizCreate) -> Result<QuizInsertion, Error> {
    let QuizCreate {
        name,
        description,
        image,
        category,
        difficulty,
    } = create;
    let mut missing = Vec::new();
    let name = require(name, "name", &mut missing);
    let description = require(description, "description", &mut missing);
    let image = require(image, "image", &mut missing);
    let category = require(category, "category", &mut missing);
    let difficulty = require(difficulty, "difficulty", &mut missing);
    if let (Some(name), Some(description), Some(image), Some(category), Some(difficulty)) = (name, description, image, category, difficulty) {
        Ok(QuizInsertion {
            name,
            description,
            image,
            category,
            difficulty,
        })
    } else {
        Err(Error::Validation(format!("missing required fields: {}", missing.join(", "))))
    }
}

pub async fn create_quiz<D>(db: &mut D, create: QuizCreate) -> Result<Quiz, Error>
where
    D: Storer,
{
    let data = validate(create)?;
    let id = QuizCommon::insert(db, data).await?;
    let quiz = QuizCommon::get(db, id).await?.ok_or(Error::QuizNotFound(id))?;
    info!("quiz {} created in category {}", quiz.id, quiz.category);
    Ok(quiz)
}

/// Creates a quiz together with all of its questions in one transaction.
/// Unlike the batch importer this is all-or-nothing: any invalid question
/// aborts the scope and nothing is committed.
pub async fn create_quiz_with_questions<T>(mut tx: T, quiz: QuizCreate, questions: Vec<QuestionCandidate>) -> Result<(Quiz, Vec<Question>), Error>
where
    T: TxStorer,
{
    let data = validate(quiz)?;
    let quiz_id = QuizCommon::insert(&mut tx, data).await?;
    let quiz = QuizCommon::get(&mut tx, quiz_id).await?.ok_or(Error::QuizNotFound(quiz_id))?;
    let mut inserted = Vec::with_capacity(questions.len());
    for (index, candidate) in questions.into_iter().enumerate() {
        let data = check_candidate(candidate, Some(quiz_id)).map_err(|e| Error::Validation(format!("question at index {}: {}", index, e)))?;
        let id = QuestionCommon::insert(&mut tx, data).await?;
        inserted.push(QuestionCommon::get(&mut tx, id).await?);
    }
    tx.commit().await?;
    info!("quiz {} created with {} questions", quiz.id, inserted.len());
    Ok((quiz, inserted))
}

pub async fn query_quizzes<D>(db: &mut D, category: Option<&str>) -> Result<Vec<Quiz>, Error>
where
    D: Storer,
{
    QuizCommon::query(db, category).await
}

pub async fn quiz_detail<D>(db: &mut D, id: i32) -> Result<Quiz, Error>
where
    D: Storer,
{
    QuizCommon::get(db, id).await?.ok_or(Error::QuizNotFound(id))
}

pub async fn categories<D>(db: &mut D) -> Result<Vec<String>, Error>
where
    D: Storer,
{
    QuizCommon::categories(db).await
}

/// Up to `limit` quizzes per distinct category, sampled at random.
pub async fn category_samples<D>(db: &mut D, limit: i64) -> Result<BTreeMap<String, Vec<Quiz>>, Error>
where
    D: Storer,
{
    let mut samples = BTreeMap::new();
    for category in QuizCommon::categories(db).await? {
        let quizzes = QuizCommon::samples(db, &category, limit).await?;
        samples.insert(category, quizzes);
    }
    Ok(samples)
}

/// Deletes a quiz and every question referencing it as one atomic unit.
/// Returns the number of dependent questions removed.
pub async fn delete_quiz<M>(manager: &M, id: i32) -> Result<u64, Error>
where
    M: Manager,
{
    let mut conn = manager.db().await?;
    if !QuizCommon::exists(&mut conn, id).await? {
        return Err(Error::QuizNotFound(id));
    }
    drop(conn);
    let mut tx = manager.tx().await?;
    let questions_deleted = QuestionCommon::delete_by_quiz(&mut tx, id).await?;
    // The affected-row count of the final delete is the atomicity gate: a
    // concurrent delete landing after the existence check must not leave the
    // question deletions committed on their own.
    if QuizCommon::delete(&mut tx, id).await? == 0 {
        tx.rollback().await?;
        warn!("quiz {} vanished mid-delete, rolled back", id);
        return Err(Error::DeleteFailed(id));
    }
    tx.commit().await?;
    info!("quiz {} deleted along with {} questions", id, questions_deleted);
    Ok(questions_deleted)
}
