use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories,
            questions::{self, page_offset, QUESTIONS_PER_PAGE},
        },
        NewQuestion, Question, QuestionFilter,
    },
    server::{
        app::AppState,
        deserializers::{deserialize_lenient_i64, is_truthy},
        error::ApiError,
    },
    telemetry::QUESTION_EVENTS,
};

use super::{categories::category_map, path_id, ApiResponse, Success};

#[derive(Deserialize)]
struct QuestionsQuery {
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    page: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_i64")]
    current_category: Option<i64>,
    search: Option<String>,
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(rename = "searchTerm", alias = "search")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: i64,
    categories: BTreeMap<i64, String>,
    current_category: Option<i64>,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: Option<i64>,
}

/// Every field has to be present and truthy, so a difficulty of 0 is rejected
/// the same way a missing one is.
fn validate_new_question(body: &Map<String, Value>) -> Option<NewQuestion> {
    let field = |name: &str| body.get(name).filter(|value| is_truthy(value));
    Some(NewQuestion {
        question: field("question")?.as_str()?.to_owned(),
        answer: field("answer")?.as_str()?.to_owned(),
        difficulty: field("difficulty")?.as_i64()?,
        category: field("category")?.as_i64()?,
    })
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(query): Query<QuestionsQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let mut conn = pool.acquire().await?;

    let total_questions = questions::count_questions(&mut *conn, &QuestionFilter::default()).await?;
    let offset = page_offset(query.page.unwrap_or(1))
        .filter(|offset| *offset < total_questions)
        .ok_or(ApiError::NotFound)?;

    // 0 is echoed back but does not filter
    let category = query.current_category.filter(|id| *id != 0);
    if let Some(id) = category {
        if !categories::category_exists(&mut *conn, id).await? {
            return Err(ApiError::NotFound);
        }
    }

    let filter = QuestionFilter {
        category,
        search: query.search.filter(|term| !term.is_empty()),
    };
    let questions =
        questions::get_questions(&mut *conn, &filter, QUESTIONS_PER_PAGE, offset).await?;
    let categories = categories::get_all_categories(&mut *conn).await?;

    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions,
        categories: category_map(categories),
        current_category: query.current_category,
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResponse<Json<SearchResults>> {
    let Json(body) = body?;
    let search = body
        .search_term
        .filter(|term| !term.is_empty())
        .ok_or(ApiError::Unprocessable)?;

    let filter = QuestionFilter {
        category: None,
        search: Some(search),
    };
    let questions = questions::get_questions(&pool, &filter, i64::MAX, 0).await?;
    Ok(Json(SearchResults {
        success: true,
        total_questions: questions.len(),
        questions,
        current_category: None,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> ApiResponse<(StatusCode, Json<Success>)> {
    let Json(body) = body?;
    let new_question = validate_new_question(&body).ok_or(ApiError::Unprocessable)?;

    let mut tx = pool.begin().await?;
    if !categories::category_exists(&mut *tx, new_question.category).await? {
        return Err(ApiError::Unprocessable);
    }
    let id = questions::create_question(&mut *tx, &new_question).await?;
    tx.commit().await?;

    QUESTION_EVENTS.with_label_values(&["created"]).inc();
    tracing::info!("Created question {id} in category {}", new_question.category);
    Ok((StatusCode::CREATED, Json(Success::new())))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Json<Success>> {
    let id = path_id(id)?;

    // dropping the transaction on any early return rolls it back
    let mut tx = pool.begin().await?;
    if !questions::delete_question(&mut *tx, id).await? {
        return Err(ApiError::NotFound);
    }
    tx.commit().await?;

    QUESTION_EVENTS.with_label_values(&["deleted"]).inc();
    tracing::info!("Deleted question {id}");
    Ok(Json(Success::new()))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}
