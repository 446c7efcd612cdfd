use log::info;
use serde::Serialize;
use thiserror::Error as ThisError;

use crate::core::db::{QuestionCommon, QuizCommon, Storer, TxStorer};
use crate::core::models::question::{Question, QuestionCandidate, QuestionInsertion};
use crate::core::models::quiz::QuizWithQuestions;
use crate::error::Error;

use super::require;

#[derive(Debug, ThisError)]
pub enum CandidateError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("correct_answer_index {index} out of range for {len} choices")]
    IndexOutOfRange { index: i32, len: usize },
}

/// Checks one candidate for field presence and answer-index bounds. With
/// `assigned_quiz_id` the candidate's own `quiz_id` is ignored and the given
/// one used instead (quiz-with-questions creation, where the id is only known
/// after the quiz insert).
pub(crate) fn check_candidate(candidate: QuestionCandidate, assigned_quiz_id: Option<i32>) -> Result<QuestionInsertion, CandidateError> {
    let QuestionCandidate {
        quiz_id,
        question_text,
        choices,
        correct_answer_index,
        explanation,
        category,
        difficulty,
        image,
    } = candidate;
    let quiz_id = assigned_quiz_id.or(quiz_id);
    let mut missing = Vec::new();
    let quiz_id = require(quiz_id, "quiz_id", &mut missing);
    let question_text = require(question_text, "question_text", &mut missing);
    let choices = require(choices, "choices", &mut missing);
    let correct_answer_index = require(correct_answer_index, "correct_answer_index", &mut missing);
    let explanation = require(explanation, "explanation", &mut missing);
    let category = require(category, "category", &mut missing);
    let difficulty = require(difficulty, "difficulty", &mut missing);
    let image = require(image, "image", &mut missing);
    if let (Some(quiz_id), Some(question_text), Some(choices), Some(correct_answer_index), Some(explanation), Some(category), Some(difficulty), Some(image)) =
        (quiz_id, question_text, choices, correct_answer_index, explanation, category, difficulty, image)
    {
        if correct_answer_index < 0 || correct_answer_index as usize >= choices.len() {
            return Err(CandidateError::IndexOutOfRange {
                index: correct_answer_index,
                len: choices.len(),
            });
        }
        Ok(QuestionInsertion {
            quiz_id,
            question_text,
            choices,
            correct_answer_index,
            explanation,
            category,
            difficulty,
            image,
        })
    } else {
        Err(CandidateError::MissingFields(missing))
    }
}

#[derive(Debug, Serialize)]
pub struct ImportFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub results: Vec<Question>,
    pub errors: Vec<ImportFailure>,
}

/// Inserts as many candidates as are valid, in input order, never aborting
/// the batch because one record is invalid. Successful inserts are committed
/// together at the end; an invalid record costs only itself. A storage fault
/// still aborts the whole scope.
pub async fn import_questions<T>(mut tx: T, candidates: Vec<QuestionCandidate>) -> Result<ImportOutcome, Error>
where
    T: TxStorer,
{
    let mut results = Vec::new();
    let mut errors = Vec::new();
    for (index, candidate) in candidates.into_iter().enumerate() {
        let data = match check_candidate(candidate, None) {
            Ok(data) => data,
            Err(e) => {
                errors.push(ImportFailure { index, error: e.to_string() });
                continue;
            }
        };
        if !QuizCommon::exists(&mut tx, data.quiz_id).await? {
            errors.push(ImportFailure {
                index,
                error: format!("Quiz with ID {} not found", data.quiz_id),
            });
            continue;
        }
        let id = QuestionCommon::insert(&mut tx, data).await?;
        results.push(QuestionCommon::get(&mut tx, id).await?);
    }
    tx.commit().await?;
    info!("imported {} questions, {} rejected", results.len(), errors.len());
    Ok(ImportOutcome { results, errors })
}

pub async fn quiz_questions<D>(db: &mut D, quiz_id: i32) -> Result<QuizWithQuestions, Error>
where
    D: Storer,
{
    let quiz = QuizCommon::get(db, quiz_id).await?.ok_or(Error::QuizNotFound(quiz_id))?;
    let questions = QuestionCommon::by_quiz(db, quiz_id).await?;
    Ok(QuizWithQuestions { quiz, questions })
}

pub async fn delete_question<D>(db: &mut D, id: i32) -> Result<(), Error>
where
    D: Storer,
{
    if QuestionCommon::delete(db, id).await? == 0 {
        return Err(Error::QuestionNotFound(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Manager;
    use crate::core::quiz::create_quiz;
    use crate::core::testing::{candidate, quiz_create, MemManager};

    #[tokio::test]
    async fn partial_failure_keeps_valid_records() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let quiz = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();

        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, vec![candidate(Some(quiz.id)), candidate(Some(99)), candidate(Some(quiz.id))])
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 1);
        assert_eq!(outcome.errors[0].error, "Quiz with ID 99 not found");

        let mut db = manager.db().await.unwrap();
        let stored = quiz_questions(&mut db, quiz.id).await.unwrap();
        assert_eq!(stored.questions.len(), 2);
    }

    #[tokio::test]
    async fn missing_fields_are_reported_per_index() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let quiz = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();

        let mut incomplete = candidate(Some(quiz.id));
        incomplete.question_text = None;
        incomplete.image = None;

        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, vec![incomplete, candidate(Some(quiz.id))]).await.unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 0);
        assert_eq!(outcome.errors[0].error, "missing required fields: question_text, image");
    }

    #[tokio::test]
    async fn out_of_range_answer_index_is_rejected() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let quiz = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();

        let mut bad = candidate(Some(quiz.id));
        bad.correct_answer_index = Some(2);

        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, vec![bad]).await.unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.errors[0].error, "correct_answer_index 2 out of range for 2 choices");
        assert_eq!(manager.mutate(|state| state.question_count()), 0);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let manager = MemManager::new();
        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, Vec::new()).await.unwrap();
        assert!(outcome.results.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn choices_round_trip_exactly() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let quiz = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();

        let choices = vec!["b".to_owned(), "a".to_owned(), "b".to_owned(), String::new()];
        let mut record = candidate(Some(quiz.id));
        record.choices = Some(choices.clone());

        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, vec![record]).await.unwrap();
        assert_eq!(outcome.results[0].choices, choices);

        let mut db = manager.db().await.unwrap();
        let stored = quiz_questions(&mut db, quiz.id).await.unwrap();
        assert_eq!(stored.questions[0].choices, choices);
    }

    #[tokio::test]
    async fn deleting_a_question_checks_existence() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let quiz = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();
        let tx = manager.tx().await.unwrap();
        let outcome = import_questions(tx, vec![candidate(Some(quiz.id))]).await.unwrap();
        let id = outcome.results[0].id;

        let mut db = manager.db().await.unwrap();
        assert!(matches!(delete_question(&mut db, id + 1).await.unwrap_err(), Error::QuestionNotFound(_)));
        delete_question(&mut db, id).await.unwrap();
        assert!(quiz_questions(&mut db, quiz.id).await.unwrap().questions.is_empty());
    }

    #[tokio::test]
    async fn listing_questions_requires_the_quiz() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        assert!(matches!(quiz_questions(&mut db, 1).await.unwrap_err(), Error::QuizNotFound(1)));
    }
}
