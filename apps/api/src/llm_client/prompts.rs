// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Asks the model to end with a machine-readable score line.
/// The score extractor looks for exactly this label first.
pub const FIT_SCORE_INSTRUCTION: &str = "\
    End your answer with a single line of the form `Fit Score: N`, \
    where N is an integer from 0 to 100. \
    Do not put any other number on that line.";
