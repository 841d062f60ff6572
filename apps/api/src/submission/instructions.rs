// Resume analysis prompt templates.

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert in Applicant Tracking Systems (ATS) and technical recruiting. \
You review resumes candidly: low scores are fine when the resume is weak. \
You MUST respond with valid JSON only. Do not use markdown fences or add explanations.";

/// Shape the model must return. Scores are integers from 0 to 100.
pub const AI_RESPONSE_FORMAT: &str = r#"{
  "overallScore": number,
  "ATS": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "string" }]
  },
  "toneAndStyle": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "string" }]
  },
  "content": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "string" }]
  },
  "structure": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "string" }]
  },
  "skills": {
    "score": number,
    "tips": [{ "type": "good" | "improve", "tip": "short title", "explanation": "string" }]
  }
}"#;

/// Builds the analysis instructions sent alongside the resume. User text is
/// inserted verbatim; braces in it are never expanded.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    format!(
        "Analyze the attached resume and rate how well it would perform for the role below.

JOB TITLE:
{job_title}

JOB DESCRIPTION:
{job_description}

RULES:
1. Judge the resume against this specific job; use the description to weigh skills and keywords.
2. Give 3-4 tips per category, mixing what already works (\"good\") with what to fix (\"improve\").
3. Be specific: quote or reference the resume section each tip refers to.
4. Return ONLY a JSON object in exactly this format:
{format}",
        job_title = job_title.trim(),
        job_description = job_description.trim(),
        format = AI_RESPONSE_FORMAT,
    )
}
