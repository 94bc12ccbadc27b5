use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        Question,
    },
    server::{app::AppState, deserializers::deserialize_int_or_string, error::ApiError},
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizRequest {
    #[serde(default)]
    previous_questions: Vec<i64>,
    quiz_category: Option<QuizCategory>,
}

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_int_or_string")]
    id: i64,
}

#[derive(Serialize)]
struct QuizResponse {
    success: bool,
    /// `None` once every question of the category was played
    question: Option<Question>,
}

async fn next_question(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<Json<QuizResponse>> {
    let Json(request) = body?;
    // id 0 stands for "all categories"
    let category = request
        .quiz_category
        .map(|category| category.id)
        .filter(|id| *id != 0);

    let mut conn = pool.acquire().await?;
    if let Some(id) = category {
        if !categories::category_exists(&mut *conn, id).await? {
            return Err(ApiError::NotFound);
        }
    }
    let question =
        questions::get_random_question(&mut *conn, category, &request.previous_questions).await?;

    if question.is_some() {
        let label = category.map_or_else(|| "all".to_owned(), |id| id.to_string());
        QUIZ_QUESTIONS_SERVED.with_label_values(&[label.as_str()]).inc();
    }
    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
