// CV review: reviewer seam, fit score extraction, single and batch orchestration.
// All LLM calls go through llm_client; no direct provider calls here.

pub mod bulk;
pub mod handlers;
pub mod prompts;
pub mod reviewer;
pub mod score;
