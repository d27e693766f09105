//! GenAI semantic convention spans for LLM calls.
//!
//! Uses the OpenTelemetry GenAI attribute names (`gen_ai.operation.name`,
//! `gen_ai.request.model`, `gen_ai.provider.name`).

use tracing::Span;

/// Start a span for one chat completion.
pub fn start_chat_span(model: &str, provider: &str) -> Span {
    tracing::info_span!(
        "gen_ai.chat",
        "gen_ai.operation.name" = "chat",
        "gen_ai.request.model" = model,
        "gen_ai.provider.name" = provider,
        "gen_ai.request.turns" = tracing::field::Empty,
    )
}

/// Record how many prior turns went out with the request.
pub fn record_turns(span: &Span, turns: usize) {
    span.record("gen_ai.request.turns", turns as u64);
}
