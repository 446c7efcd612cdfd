use log::info;

use crate::core::db::{ResultCommon, Storer, UserCommon};
use crate::core::models::result::{ResultCreate, ResultInsertion, ResultRecord, UserStats};
use crate::error::Error;

/// Appends one quiz attempt for the user behind `email`. The user must
/// already exist; the score and answer shape are stored as submitted.
pub async fn record_result<D>(db: &mut D, email: &str, data: ResultCreate) -> Result<i32, Error>
where
    D: Storer,
{
    let user = UserCommon::get_by_email(db, email).await?.ok_or(Error::UserNotFound)?;
    let result_id = ResultCommon::insert(
        db,
        ResultInsertion {
            user_id: user.id,
            quiz_id: data.quiz_id,
            score: data.score,
            answers: data.answers,
        },
    )
    .await?;
    info!("result {} recorded for user {}", result_id, user.id);
    Ok(result_id)
}

/// Every attempt of the user, newest first, joined with quiz metadata.
pub async fn user_results<D>(db: &mut D, email: &str) -> Result<Vec<ResultRecord>, Error>
where
    D: Storer,
{
    let user = UserCommon::get_by_email(db, email).await?.ok_or(Error::UserNotFound)?;
    ResultCommon::by_user(db, user.id).await
}

/// Overall and per-category aggregates, computed fresh on each read.
pub async fn user_stats<D>(db: &mut D, email: &str) -> Result<UserStats, Error>
where
    D: Storer,
{
    let user = UserCommon::get_by_email(db, email).await?.ok_or(Error::UserNotFound)?;
    let overall_stats = ResultCommon::overall_stats(db, user.id).await?;
    let category_stats = ResultCommon::category_stats(db, user.id).await?;
    Ok(UserStats {
        overall_stats,
        category_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Manager;
    use crate::core::quiz::create_quiz;
    use crate::core::testing::{quiz_create, MemManager};
    use crate::core::user::ensure_user;
    use serde_json::json;

    fn attempt(quiz_id: i32, score: f64, answers: serde_json::Value) -> ResultCreate {
        ResultCreate { quiz_id, score, answers }
    }

    #[tokio::test]
    async fn unknown_email_is_not_found() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let err = record_result(&mut db, "nobody@example.com", attempt(1, 50.0, json!({}))).await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound));
        assert!(matches!(user_results(&mut db, "nobody@example.com").await.unwrap_err(), Error::UserNotFound));
        assert!(matches!(user_stats(&mut db, "nobody@example.com").await.unwrap_err(), Error::UserNotFound));
    }

    #[tokio::test]
    async fn results_come_back_newest_first_with_quiz_metadata() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let geo = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();
        let math = create_quiz(&mut db, quiz_create("Algebra", "Math")).await.unwrap();
        ensure_user(&mut db, "a@example.com").await.unwrap();

        let answers = json!({"q1": "Paris", "q2": 3});
        record_result(&mut db, "a@example.com", attempt(geo.id, 80.0, answers.clone())).await.unwrap();
        record_result(&mut db, "a@example.com", attempt(math.id, 100.0, json!({}))).await.unwrap();

        let results = user_results(&mut db, "a@example.com").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].quiz_name, "Algebra");
        assert_eq!(results[1].quiz_name, "Capitals");
        assert!(results[0].completed_at > results[1].completed_at);
        assert_eq!(results[1].answers, answers);
        assert_eq!(results[1].category, "Geography");
        assert_eq!(results[1].difficulty, "Medium");
    }

    #[tokio::test]
    async fn stats_aggregate_overall_and_per_category() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        let geo = create_quiz(&mut db, quiz_create("Capitals", "Geography")).await.unwrap();
        let math = create_quiz(&mut db, quiz_create("Algebra", "Math")).await.unwrap();
        ensure_user(&mut db, "a@example.com").await.unwrap();

        record_result(&mut db, "a@example.com", attempt(geo.id, 80.0, json!({}))).await.unwrap();
        record_result(&mut db, "a@example.com", attempt(geo.id, 60.0, json!({}))).await.unwrap();
        record_result(&mut db, "a@example.com", attempt(math.id, 100.0, json!({}))).await.unwrap();

        let stats = user_stats(&mut db, "a@example.com").await.unwrap();
        assert_eq!(stats.overall_stats.total_quizzes, 3);
        assert_eq!(stats.overall_stats.average_score, Some(80.0));
        assert_eq!(stats.overall_stats.highest_score, Some(100.0));
        assert_eq!(stats.overall_stats.lowest_score, Some(60.0));
        assert_eq!(stats.overall_stats.unique_quizzes, 2);

        assert_eq!(stats.category_stats.len(), 2);
        assert_eq!(stats.category_stats[0].category, "Geography");
        assert_eq!(stats.category_stats[0].quizzes_taken, 2);
        assert_eq!(stats.category_stats[0].average_score, Some(70.0));
        assert_eq!(stats.category_stats[1].category, "Math");
        assert_eq!(stats.category_stats[1].quizzes_taken, 1);
        assert_eq!(stats.category_stats[1].average_score, Some(100.0));
    }

    #[tokio::test]
    async fn stats_for_a_user_without_results_are_empty() {
        let manager = MemManager::new();
        let mut db = manager.db().await.unwrap();
        ensure_user(&mut db, "a@example.com").await.unwrap();

        let stats = user_stats(&mut db, "a@example.com").await.unwrap();
        assert_eq!(stats.overall_stats.total_quizzes, 0);
        assert_eq!(stats.overall_stats.average_score, None);
        assert_eq!(stats.overall_stats.unique_quizzes, 0);
        assert!(stats.category_stats.is_empty());
    }
}
