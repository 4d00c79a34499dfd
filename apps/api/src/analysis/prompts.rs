// Prompt constants for the analysis operations.
// Placeholders in `{braces}` are substituted by the gateway before sending.

pub const CV_ANALYSIS_SYSTEM: &str = "You are an expert technical recruiter. \
    Score how well a candidate's CV matches a job description.";

pub const CV_ANALYSIS_TEMPLATE: &str = r#"Analyze the CV against the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "overall_score": 0-100,
  "skills_match": {"matched": ["skill"], "missing": ["skill"]},
  "experience_years": 0,
  "strengths": ["short phrase"],
  "concerns": ["short phrase"],
  "recommendation": "one sentence",
  "summary": "two or three sentences"
}

JOB DESCRIPTION:
{job_description}

CV:
{cv_text}
"#;

pub const JD_ANALYSIS_SYSTEM: &str = "You are an expert job description analyst. \
    Extract the structured requirements of a role.";

pub const JD_ANALYSIS_TEMPLATE: &str = r#"Parse the job description below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "role title",
  "seniority": "intern|junior|mid|senior|lead|staff|principal",
  "required_skills": ["skill"],
  "preferred_skills": ["skill"],
  "min_experience_years": 0,
  "summary": "two or three sentences"
}

HARD REQUIREMENTS: phrases like "required", "must have", minimum years.
PREFERRED: phrases like "preferred", "bonus", "nice to have", "a plus".

JOB DESCRIPTION:
{job_description}
"#;

pub const RANKING_SYSTEM: &str = "You are an expert technical recruiter. \
    Rank candidates for a role by fit.";

pub const RANKING_TEMPLATE: &str = r#"Rank every candidate below against the job description.

Return a JSON object with this EXACT schema (no extra fields):
{
  "rankings": [
    {"candidate_id": "id as given", "name": "name as given", "score": 0-100, "reasoning": "one sentence"}
  ],
  "summary": "one or two sentences"
}

Include every candidate exactly once, ordered from best to worst fit.

JOB DESCRIPTION:
{job_description}

CANDIDATES:
{candidates}
"#;
