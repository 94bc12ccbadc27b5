use prometheus::register_int_counter_vec;
use prometheus::IntCounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

lazy_static! {
    pub static ref QUESTION_EVENTS: IntCounterVec = register_int_counter_vec!(
        "trivia_question_events_total",
        "Number of created and deleted questions",
        &["event"]
    )
    .unwrap();
    pub static ref QUIZ_QUESTIONS_SERVED: IntCounterVec = register_int_counter_vec!(
        "trivia_quiz_questions_served_total",
        "Number of questions handed out to quiz players",
        &["category"]
    )
    .unwrap();
}

/// Used when `LOG_LEVEL` is unset or does not parse.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,sqlx=warn";

/// Installs the global subscriber. `INCLUDE_SPAN_EVENTS=true` logs span enter/exit.
/// Calling it again is a no-op.
pub fn init_tracing() {
    let span_events = match std::env::var("INCLUDE_SPAN_EVENTS") {
        Ok(value) if value.eq_ignore_ascii_case("true") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::NONE,
    };
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_span_events(span_events))
        .try_init();
}
