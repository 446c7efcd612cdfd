use actix_web::web::{Data, Json};

use crate::core;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;

pub async fn list(db: Data<PgSqlxManager>) -> Result<Json<Vec<String>>, Error> {
    let mut conn = db.acquire().await?;
    let categories = core::quiz::categories(&mut conn).await?;
    Ok(Json(categories))
}
