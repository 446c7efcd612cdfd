use actix_web::http::StatusCode;
use actix_web::web::{Data, Json, Path};
use actix_web::HttpResponse;
use serde::Serialize;

use crate::core;
use crate::core::models::question::{Question, QuestionCandidate};
use crate::core::models::quiz::QuizWithQuestions;
use crate::core::question::{ImportFailure, ImportOutcome};
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ImportReport {
    success: bool,
    results: Vec<Question>,
    total_added: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<ImportFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_errors: Option<usize>,
}

impl ImportReport {
    fn new(outcome: ImportOutcome, success: bool) -> Self {
        ImportReport {
            success,
            total_added: outcome.results.len(),
            results: outcome.results,
            total_errors: (!outcome.errors.is_empty()).then_some(outcome.errors.len()),
            errors: outcome.errors,
        }
    }
}

/// The batch reports failure only when nothing was inserted at all; partial
/// success is a 200 with the per-record errors embedded.
pub async fn import(Json(candidates): Json<Vec<QuestionCandidate>>, db: Data<PgSqlxManager>) -> Result<HttpResponse, Error> {
    let tx = db.begin().await?;
    let outcome = core::question::import_questions(tx, candidates).await?;
    let status = if outcome.results.is_empty() && !outcome.errors.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    Ok(HttpResponse::build(status).json(ImportReport::new(outcome, status == StatusCode::OK)))
}

pub async fn list_by_quiz(quiz_id: Path<(i32,)>, db: Data<PgSqlxManager>) -> Result<Json<QuizWithQuestions>, Error> {
    let quiz_id = quiz_id.into_inner().0;
    let mut conn = db.acquire().await?;
    let detail = core::question::quiz_questions(&mut conn, quiz_id).await?;
    Ok(Json(detail))
}

#[derive(Debug, Serialize)]
pub struct QuestionDeleted {
    success: bool,
    message: String,
}

pub async fn remove(question_id: Path<(i32,)>, db: Data<PgSqlxManager>) -> Result<Json<QuestionDeleted>, Error> {
    let question_id = question_id.into_inner().0;
    let mut conn = db.acquire().await?;
    core::question::delete_question(&mut conn, question_id).await?;
    Ok(Json(QuestionDeleted {
        success: true,
        message: format!("Question with ID {} was deleted successfully", question_id),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_import_report_omits_the_error_keys() {
        let report = ImportReport::new(
            ImportOutcome {
                results: Vec::new(),
                errors: Vec::new(),
            },
            true,
        );
        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "results": [], "total_added": 0}));
    }

    #[test]
    fn failed_records_keep_their_input_index() {
        let report = ImportReport::new(
            ImportOutcome {
                results: Vec::new(),
                errors: vec![ImportFailure {
                    index: 1,
                    error: "Quiz with ID 99 not found".to_owned(),
                }],
            },
            false,
        );
        let body = serde_json::to_value(&report).unwrap();
        assert_eq!(body["total_errors"], 1);
        assert_eq!(body["errors"][0]["index"], 1);
        assert_eq!(body["errors"][0]["error"], "Quiz with ID 99 not found");
    }
}
