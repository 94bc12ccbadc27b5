use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

pub const QUESTIONS_PER_PAGE: i64 = 10;

const SELECT_QUESTIONS: &str = "SELECT id, question, answer, difficulty, category FROM questions";

#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
    pub category: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub difficulty: i64,
    pub category: i64,
}

/// Conditions shared by listing and counting. Unset fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub category: Option<i64>,
    /// Case-insensitive substring of the question text
    pub search: Option<String>,
}

impl QuestionFilter {
    fn push_conditions(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" WHERE 1 = 1");
        if let Some(category) = self.category {
            builder.push(" AND category = ").push_bind(category);
        }
        if let Some(search) = &self.search {
            // instr avoids LIKE treating % and _ in the term as wildcards
            builder
                .push(" AND instr(question_folded, ")
                .push_bind(fold_case(search))
                .push(") > 0");
        }
    }
}

/// Unicode lowercase used on both sides of a search, since SQLite's `lower()`
/// only folds ASCII. Stored in `questions.question_folded` on every write.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Offset of the first row of a 1-based page, `None` for pages below 1.
pub fn page_offset(page: i64) -> Option<i64> {
    if page < 1 {
        return None;
    }
    (page - 1).checked_mul(QUESTIONS_PER_PAGE)
}

pub async fn count_questions(
    executor: impl SqliteExecutor<'_>,
    filter: &QuestionFilter,
) -> sqlx::Result<i64> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM questions");
    filter.push_conditions(&mut builder);
    builder.build_query_scalar::<i64>().fetch_one(executor).await
}

pub async fn get_questions(
    executor: impl SqliteExecutor<'_>,
    filter: &QuestionFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Question>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    filter.push_conditions(&mut builder);
    builder
        .push(" ORDER BY id LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    builder.build_query_as::<Question>().fetch_all(executor).await
}

pub async fn get_all_questions(executor: impl SqliteExecutor<'_>) -> sqlx::Result<Vec<Question>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    builder.push(" ORDER BY id");
    builder.build_query_as::<Question>().fetch_all(executor).await
}

pub async fn get_questions_for_category(
    executor: impl SqliteExecutor<'_>,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    builder
        .push(" WHERE category = ")
        .push_bind(category)
        .push(" ORDER BY id");
    builder.build_query_as::<Question>().fetch_all(executor).await
}

pub async fn get_question(
    executor: impl SqliteExecutor<'_>,
    id: i64,
) -> sqlx::Result<Option<Question>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    builder.push(" WHERE id = ").push_bind(id);
    builder.build_query_as::<Question>().fetch_optional(executor).await
}

/// Picks a random question, optionally within a category, skipping `exclude`d ids.
pub async fn get_random_question(
    executor: impl SqliteExecutor<'_>,
    category: Option<i64>,
    exclude: &[i64],
) -> sqlx::Result<Option<Question>> {
    let mut builder = QueryBuilder::<Sqlite>::new(SELECT_QUESTIONS);
    QuestionFilter {
        category,
        search: None,
    }
    .push_conditions(&mut builder);
    if !exclude.is_empty() {
        // one JSON array parameter keeps long quizzes under SQLite's bind limit
        let exclude =
            serde_json::to_string(exclude).map_err(|error| sqlx::Error::Encode(error.into()))?;
        builder
            .push(" AND id NOT IN (SELECT value FROM json_each(")
            .push_bind(exclude)
            .push("))");
    }
    builder.push(" ORDER BY RANDOM() LIMIT 1");
    builder.build_query_as::<Question>().fetch_optional(executor).await
}

pub async fn create_question(
    executor: impl SqliteExecutor<'_>,
    question: &NewQuestion,
) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, difficulty, category, question_folded)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.difficulty)
    .bind(question.category)
    .bind(fold_case(&question.question))
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Returns whether a row with that id existed.
pub async fn delete_question(executor: impl SqliteExecutor<'_>, id: i64) -> sqlx::Result<bool> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();
    Ok(deleted > 0)
}

/// Inserts the given questions, overwriting rows whose ids already exist.
pub async fn import_questions(
    conn: &mut SqliteConnection,
    questions: Vec<Question>,
) -> sqlx::Result<()> {
    for question in questions {
        sqlx::query(
            r#"
            INSERT INTO questions (id, question, answer, difficulty, category, question_folded)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                question = excluded.question,
                answer = excluded.answer,
                difficulty = excluded.difficulty,
                category = excluded.category,
                question_folded = excluded.question_folded
            "#,
        )
        .bind(question.id)
        .bind(&question.question)
        .bind(&question.answer)
        .bind(question.difficulty)
        .bind(question.category)
        .bind(fold_case(&question.question))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}
