use actix_web::web::{Data, Json, Path};
use serde::Serialize;

use crate::core;
use crate::core::models::result::{CategoryStat, OverallStats, ResultCreate, ResultRecord};
use crate::core::models::user::UserCreate;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct UserCreated {
    success: bool,
    message: String,
    user_id: i32,
}

pub async fn create(Json(UserCreate { email }): Json<UserCreate>, db: Data<PgSqlxManager>) -> Result<Json<UserCreated>, Error> {
    let mut conn = db.acquire().await?;
    let outcome = core::user::ensure_user(&mut conn, &email).await?;
    let message = if outcome.created { "User created successfully" } else { "User already exists" };
    Ok(Json(UserCreated {
        success: outcome.created,
        message: message.to_owned(),
        user_id: outcome.user_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResultSaved {
    success: bool,
    message: String,
    result_id: i32,
}

pub async fn save_result(email: Path<(String,)>, Json(data): Json<ResultCreate>, db: Data<PgSqlxManager>) -> Result<Json<ResultSaved>, Error> {
    let email = email.into_inner().0;
    let mut conn = db.acquire().await?;
    let result_id = core::result::record_result(&mut conn, &email, data).await?;
    Ok(Json(ResultSaved {
        success: true,
        message: "Quiz result saved successfully".to_owned(),
        result_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct ResultList {
    email: String,
    results: Vec<ResultRecord>,
    total_results: usize,
}

pub async fn results(email: Path<(String,)>, db: Data<PgSqlxManager>) -> Result<Json<ResultList>, Error> {
    let email = email.into_inner().0;
    let mut conn = db.acquire().await?;
    let results = core::result::user_results(&mut conn, &email).await?;
    Ok(Json(ResultList {
        email,
        total_results: results.len(),
        results,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsReport {
    email: String,
    overall_stats: OverallStats,
    category_stats: Vec<CategoryStat>,
}

pub async fn stats(email: Path<(String,)>, db: Data<PgSqlxManager>) -> Result<Json<StatsReport>, Error> {
    let email = email.into_inner().0;
    let mut conn = db.acquire().await?;
    let stats = core::result::user_stats(&mut conn, &email).await?;
    Ok(Json(StatsReport {
        email,
        overall_stats: stats.overall_stats,
        category_stats: stats.category_stats,
    }))
}
