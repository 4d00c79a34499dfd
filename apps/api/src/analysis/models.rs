//! Analysis requests and results.
//!
//! Result types are identical whether they came from the provider or from
//! the local fallback generators; callers never branch on provenance.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::cache::keys;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    CvAnalysis,
    JdAnalysis,
    CandidateRanking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateInput {
    pub id: String,
    pub name: String,
    pub cv_text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Cv {
        cv_text: String,
        job_description: String,
    },
    Jd {
        job_description: String,
    },
    Ranking {
        job_description: String,
        candidates: Vec<CandidateInput>,
    },
}

impl AnalysisRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::Cv { .. } => AnalysisKind::CvAnalysis,
            AnalysisRequest::Jd { .. } => AnalysisKind::JdAnalysis,
            AnalysisRequest::Ranking { .. } => AnalysisKind::CandidateRanking,
        }
    }

    /// Content-addressed key in the operation's namespace.
    pub fn cache_key(&self) -> String {
        match self {
            AnalysisRequest::Cv {
                cv_text,
                job_description,
            } => keys::cv_analysis_key(cv_text, job_description),
            AnalysisRequest::Jd { job_description } => keys::jd_analysis_key(job_description),
            AnalysisRequest::Ranking {
                job_description,
                candidates,
            } => keys::candidate_ranking_key(&json!({
                "job_description": job_description,
                "candidates": candidates,
            })),
        }
    }

    /// Placeholder values substituted into the operation's prompt template.
    pub fn prompt_vars(&self) -> Vec<(&'static str, String)> {
        match self {
            AnalysisRequest::Cv {
                cv_text,
                job_description,
            } => vec![
                ("cv_text", cv_text.clone()),
                ("job_description", job_description.clone()),
            ],
            AnalysisRequest::Jd { job_description } => {
                vec![("job_description", job_description.clone())]
            }
            AnalysisRequest::Ranking {
                job_description,
                candidates,
            } => vec![
                ("job_description", job_description.clone()),
                ("candidates", render_candidates(candidates)),
            ],
        }
    }
}

fn render_candidates(candidates: &[CandidateInput]) -> String {
    candidates
        .iter()
        .map(|c| format!("### candidate_id={} name={}\n{}", c.id, c.name, c.cv_text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillsMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvAnalysis {
    #[serde(deserialize_with = "score")]
    pub overall_score: u32, // 0 – 100
    pub skills_match: SkillsMatch,
    pub experience_years: f32,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub recommendation: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JdAnalysis {
    pub title: String,
    pub seniority: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub min_experience_years: f32,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub candidate_id: String,
    pub name: String,
    #[serde(deserialize_with = "score")]
    pub score: u32, // 0 – 100
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRanking {
    /// Ordered by descending score.
    pub rankings: Vec<RankedCandidate>,
    pub summary: String,
}

impl CandidateRanking {
    pub fn sort(&mut self) {
        self.rankings
            .sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.candidate_id.cmp(&b.candidate_id)));
    }
}

/// The payload returned to HTTP callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Cv(CvAnalysis),
    Jd(JdAnalysis),
    Ranking(CandidateRanking),
}

impl AnalysisResult {
    /// Parses and shape-checks JSON text for the given operation.
    /// Missing required fields or wrong types are errors.
    pub fn parse(kind: AnalysisKind, text: &str) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            AnalysisKind::CvAnalysis => AnalysisResult::Cv(serde_json::from_str(text)?),
            AnalysisKind::JdAnalysis => AnalysisResult::Jd(serde_json::from_str(text)?),
            AnalysisKind::CandidateRanking => {
                let mut ranking: CandidateRanking = serde_json::from_str(text)?;
                ranking.sort();
                AnalysisResult::Ranking(ranking)
            }
        })
    }

    /// Same as [`parse`](Self::parse) for an already-decoded value.
    pub fn from_value(kind: AnalysisKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            AnalysisKind::CvAnalysis => AnalysisResult::Cv(serde_json::from_value(value)?),
            AnalysisKind::JdAnalysis => AnalysisResult::Jd(serde_json::from_value(value)?),
            AnalysisKind::CandidateRanking => {
                AnalysisResult::Ranking(serde_json::from_value(value)?)
            }
        })
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::Cv(_) => AnalysisKind::CvAnalysis,
            AnalysisResult::Jd(_) => AnalysisKind::JdAnalysis,
            AnalysisResult::Ranking(_) => AnalysisKind::CandidateRanking,
        }
    }
}

/// Accepts any JSON number and clamps it to a 0 – 100 integer score.
fn score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("score must be a finite number"));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u32)
}
