mod core;
mod database;
mod error;
mod handlers;

use actix_web::web::{delete, get, post, resource, scope, Data};
use actix_web::HttpServer;
use sqlx::postgres::PgPoolOptions;

use database::sqlx::PgSqlxManager;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    env_logger::init();
    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let bind_addr = dotenv::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_owned());
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(PgSqlxManager::new(pool.clone())))
            .service(
                scope("quizzes")
                    .route("", get().to(handlers::quiz::list))
                    .route("", post().to(handlers::quiz::create))
                    .route("with-questions", post().to(handlers::quiz::create_with_questions))
                    .route("category-samples", get().to(handlers::quiz::category_samples))
                    .service(
                        scope("{quiz_id}")
                            .route("", get().to(handlers::quiz::detail))
                            .route("", delete().to(handlers::quiz::remove))
                            .route("questions", get().to(handlers::question::list_by_quiz)),
                    ),
            )
            .service(
                scope("questions")
                    .route("", post().to(handlers::question::import))
                    .service(scope("{question_id}").route("", delete().to(handlers::question::remove))),
            )
            .service(
                scope("users")
                    .route("", post().to(handlers::user::create))
                    .service(
                        scope("{email}")
                            .route("results", post().to(handlers::user::save_result))
                            .route("results", get().to(handlers::user::results))
                            .route("stats", get().to(handlers::user::stats)),
                    ),
            )
            .service(resource("categories").route(get().to(handlers::category::list)))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
