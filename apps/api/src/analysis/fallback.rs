//! Deterministic local analysis used when the provider is unavailable or
//! returns something unusable.
//!
//! Pure regex/keyword heuristics: no I/O, same input → same output. Results
//! have exactly the shape of provider results; their lower quality shows only
//! in content (summary prefix, coarser scores).

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::models::{
    AnalysisRequest, AnalysisResult, CandidateInput, CandidateRanking, CvAnalysis, JdAnalysis,
    RankedCandidate, SkillsMatch,
};

const DEGRADED_PREFIX: &str = "Heuristic analysis (AI analysis unavailable).";

const SKILL_VOCABULARY: &[&str] = &[
    "rust", "python", "java", "javascript", "typescript", "go", "golang", "c++", "c#", "ruby",
    "php", "kotlin", "swift", "scala", "sql", "postgresql", "mysql", "mongodb", "redis", "kafka",
    "rabbitmq", "elasticsearch", "docker", "kubernetes", "terraform", "ansible", "aws", "azure",
    "gcp", "linux", "git", "ci/cd", "graphql", "rest", "grpc", "microservices", "react",
    "angular", "vue", "node.js", "django", "flask", "spring", "html", "css", "figma",
    "machine learning", "deep learning", "pytorch", "tensorflow", "data analysis", "excel",
    "tableau", "power bi", "salesforce", "agile", "scrum", "project management", "leadership",
    "communication",
];

const PREFERRED_MARKERS: &[&str] = &["preferred", "nice to have", "bonus", "a plus", "desirable"];

/// (canonical skill name, word-bounded matcher)
static SKILL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    SKILL_VOCABULARY
        .iter()
        .map(|skill| {
            let pattern = format!(r"(?:^|[^a-z0-9+#]){}(?:$|[^a-z0-9+#])", regex::escape(skill));
            (*skill, Regex::new(&pattern).expect("Invalid skill regex"))
        })
        .collect()
});

static YEARS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?:\.\d+)?\s*\+?\s*(?:years?|yrs?)\b").expect("Invalid years regex")
});

/// Produces the degraded result for any request.
pub fn generate(request: &AnalysisRequest) -> AnalysisResult {
    match request {
        AnalysisRequest::Cv {
            cv_text,
            job_description,
        } => AnalysisResult::Cv(analyze_cv(cv_text, job_description)),
        AnalysisRequest::Jd { job_description } => AnalysisResult::Jd(analyze_jd(job_description)),
        AnalysisRequest::Ranking {
            job_description,
            candidates,
        } => AnalysisResult::Ranking(rank_candidates(job_description, candidates)),
    }
}

/// Skills from the vocabulary present in the text, in vocabulary order.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    SKILL_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(skill, _)| skill.to_string())
        .collect()
}

/// Largest "N years" figure mentioned, or 0.
pub fn extract_years(text: &str) -> f32 {
    let lower = text.to_lowercase();
    YEARS_REGEX
        .captures_iter(&lower)
        .filter_map(|c| c.get(1).and_then(|m| m.as_str().parse::<u32>().ok()))
        .max()
        .unwrap_or(0) as f32
}

pub fn analyze_cv(cv_text: &str, job_description: &str) -> CvAnalysis {
    let jd = analyze_jd(job_description);
    let jd_skills: Vec<String> = jd
        .required_skills
        .iter()
        .chain(jd.preferred_skills.iter())
        .cloned()
        .collect();
    let cv_skills = extract_skills(cv_text);
    let cv_years = extract_years(cv_text);

    let (matched, missing): (Vec<String>, Vec<String>) =
        jd_skills.iter().cloned().partition(|s| cv_skills.contains(s));

    let coverage = if jd_skills.is_empty() {
        if cv_skills.is_empty() {
            0.0
        } else {
            0.5
        }
    } else {
        matched.len() as f32 / jd_skills.len() as f32
    };
    let experience_fit = if jd.min_experience_years <= 0.0 {
        1.0
    } else {
        (cv_years / jd.min_experience_years).min(1.0)
    };
    let overall_score = ((0.7 * coverage + 0.3 * experience_fit) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u32;

    let mut strengths: Vec<String> = matched
        .iter()
        .take(5)
        .map(|s| format!("Experience with {s}"))
        .collect();
    if cv_years > 0.0 {
        strengths.push(format!("{cv_years} years of stated experience"));
    }

    let mut concerns: Vec<String> = missing
        .iter()
        .take(5)
        .map(|s| format!("No evidence of {s}"))
        .collect();
    if cv_years < jd.min_experience_years {
        concerns.push(format!(
            "Below the requested {} years of experience",
            jd.min_experience_years
        ));
    }

    CvAnalysis {
        overall_score,
        recommendation: build_recommendation(overall_score),
        summary: format!(
            "{DEGRADED_PREFIX} Matched {} of {} skills found in the job description.",
            matched.len(),
            jd_skills.len()
        ),
        skills_match: SkillsMatch { matched, missing },
        experience_years: cv_years,
        strengths,
        concerns,
    }
}

pub fn analyze_jd(job_description: &str) -> JdAnalysis {
    let mut required_skills: Vec<String> = Vec::new();
    let mut preferred_skills: Vec<String> = Vec::new();

    for line in job_description.lines() {
        let lower = line.to_lowercase();
        let preferred = PREFERRED_MARKERS.iter().any(|m| lower.contains(m));
        for skill in extract_skills(line) {
            let bucket = if preferred {
                &mut preferred_skills
            } else {
                &mut required_skills
            };
            if !bucket.contains(&skill) {
                bucket.push(skill);
            }
        }
    }
    preferred_skills.retain(|s| !required_skills.contains(s));

    let title = job_description
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.chars().take(120).collect::<String>())
        .unwrap_or_else(|| "Untitled role".to_string());

    JdAnalysis {
        seniority: detect_seniority(job_description).to_string(),
        min_experience_years: extract_years(job_description),
        summary: format!(
            "{DEGRADED_PREFIX} {} required and {} preferred skills detected.",
            required_skills.len(),
            preferred_skills.len()
        ),
        title,
        required_skills,
        preferred_skills,
    }
}

pub fn rank_candidates(job_description: &str, candidates: &[CandidateInput]) -> CandidateRanking {
    let rankings = candidates
        .iter()
        .map(|c| {
            let cv = analyze_cv(&c.cv_text, job_description);
            let total = cv.skills_match.matched.len() + cv.skills_match.missing.len();
            RankedCandidate {
                candidate_id: c.id.clone(),
                name: c.name.clone(),
                score: cv.overall_score,
                reasoning: format!(
                    "Matched {} of {} skills{}",
                    cv.skills_match.matched.len(),
                    total,
                    if cv.skills_match.matched.is_empty() {
                        String::new()
                    } else {
                        format!(": {}", cv.skills_match.matched.join(", "))
                    }
                ),
            }
        })
        .collect();

    let mut ranking = CandidateRanking {
        rankings,
        summary: format!("{DEGRADED_PREFIX} Ranked {} candidates by skill overlap.", candidates.len()),
    };
    ranking.sort();
    ranking
}

fn detect_seniority(text: &str) -> &'static str {
    let lower = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["principal"]) {
        "principal"
    } else if has(&["staff engineer", "staff software"]) {
        "staff"
    } else if has(&["lead ", "team lead", "tech lead"]) {
        "lead"
    } else if has(&["senior", "sr."]) {
        "senior"
    } else if has(&["internship", "intern "]) {
        "intern"
    } else if has(&["junior", "jr.", "entry level", "entry-level", "graduate"]) {
        "junior"
    } else {
        "mid"
    }
}

fn build_recommendation(score: u32) -> String {
    if score >= 75 {
        "Strong match. Recommend moving to interview.".to_string()
    } else if score >= 50 {
        "Potential match. Review the missing skills before deciding.".to_string()
    } else {
        "Weak match based on stated skills.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "Senior Rust Engineer\n\
        Required: 5+ years Rust, PostgreSQL, Docker and Kubernetes.\n\
        Nice to have: Kafka, Terraform.\n";

    const STRONG_CV: &str = "Backend engineer with 7 years of experience. \
        Built Rust services on PostgreSQL, shipped with Docker and Kubernetes, streamed with Kafka.";

    const WEAK_CV: &str = "Frontend developer, 2 years, React and CSS.";

    #[test]
    fn test_extract_skills_respects_word_boundaries() {
        let skills = extract_skills("Go, C++ and Node.js; trusted ruby-on-rails, gopher");
        assert!(skills.contains(&"go".to_string()));
        assert!(skills.contains(&"c++".to_string()));
        assert!(skills.contains(&"node.js".to_string()));
        assert!(skills.contains(&"ruby".to_string()));
        // "rust" inside "trusted" does not count.
        assert!(!skills.contains(&"rust".to_string()));
    }

    #[test]
    fn test_extract_years_takes_largest() {
        assert_eq!(extract_years("3 years at A, then 5+ yrs at B"), 5.0);
        assert_eq!(extract_years("no numbers"), 0.0);
    }

    #[test]
    fn test_extract_years_ignores_longer_numbers() {
        assert_eq!(extract_years("a company with 100 years of history"), 0.0);
        assert_eq!(extract_years("founded 2010; 7 years in backend"), 7.0);
    }

    #[test]
    fn test_analyze_jd_splits_required_and_preferred() {
        let jd = analyze_jd(JD);
        assert_eq!(jd.title, "Senior Rust Engineer");
        assert_eq!(jd.seniority, "senior");
        assert_eq!(jd.min_experience_years, 5.0);
        assert!(jd.required_skills.contains(&"rust".to_string()));
        assert!(jd.required_skills.contains(&"kubernetes".to_string()));
        assert_eq!(jd.preferred_skills, vec!["kafka", "terraform"]);
    }

    #[test]
    fn test_analyze_cv_scores_strong_above_weak() {
        let strong = analyze_cv(STRONG_CV, JD);
        let weak = analyze_cv(WEAK_CV, JD);
        assert!(strong.overall_score > weak.overall_score);
        assert!(strong.skills_match.missing.contains(&"terraform".to_string()));
        assert_eq!(strong.experience_years, 7.0);
        assert!(weak.concerns.iter().any(|c| c.contains("5 years")));
        assert!(strong.summary.starts_with(DEGRADED_PREFIX));
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(analyze_cv(STRONG_CV, JD), analyze_cv(STRONG_CV, JD));
    }

    #[test]
    fn test_rank_candidates_orders_by_score() {
        let candidates = vec![
            CandidateInput {
                id: "weak".into(),
                name: "W".into(),
                cv_text: WEAK_CV.into(),
            },
            CandidateInput {
                id: "strong".into(),
                name: "S".into(),
                cv_text: STRONG_CV.into(),
            },
        ];
        let ranking = rank_candidates(JD, &candidates);
        assert_eq!(ranking.rankings.len(), 2);
        assert_eq!(ranking.rankings[0].candidate_id, "strong");
        assert!(ranking.rankings[0].reasoning.contains("rust"));
    }

    #[test]
    fn test_empty_jd_has_placeholder_title() {
        let jd = analyze_jd("   \n  ");
        assert_eq!(jd.title, "Untitled role");
        assert_eq!(jd.seniority, "mid");
    }
}
