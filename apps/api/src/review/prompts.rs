// Prompt constants for the CV review service.
// Reuses the score-line fragment from llm_client::prompts.

/// System prompt for the reviewer persona.
pub const REVIEW_SYSTEM: &str = "You are an experienced HR professional and technical recruiter. \
    You review CVs for skills, experience, and formatting and give structured, actionable feedback. \
    Judge only what the CV actually says. Do NOT invent qualifications the candidate does not list.";

/// General review prompt. Replace `{cv_name}` and `{cv_text}` before sending.
pub const REVIEW_PROMPT_TEMPLATE: &str = "\
Review the following CV named {cv_name} for skills, experience, and formatting. \
Provide structured feedback with sections for Strengths, Weaknesses, and Suggestions.

CV Content:
{cv_text}";

/// Job-specific review prompt. Replace `{cv_name}`, `{job_description}` and `{cv_text}`.
pub const JOB_REVIEW_PROMPT_TEMPLATE: &str = "\
Review the following CV named {cv_name} against the job description below. \
Assess how well the candidate's skills and experience match the role's requirements. \
Provide structured feedback with sections for Matching Skills, Gaps, and Recommendation.

Job Description:
{job_description}

CV Content:
{cv_text}";
