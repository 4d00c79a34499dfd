//! Per-operation policy table: prompts, TTL and result parser.

use crate::analysis::models::{AnalysisKind, AnalysisResult};
use crate::analysis::prompts::{
    CV_ANALYSIS_SYSTEM, CV_ANALYSIS_TEMPLATE, JD_ANALYSIS_SYSTEM, JD_ANALYSIS_TEMPLATE,
    RANKING_SYSTEM, RANKING_TEMPLATE,
};
use crate::cache::{Ttl, TtlPolicy};
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};

pub struct OperationPolicy {
    pub kind: AnalysisKind,
    pub system: &'static str,
    pub template: &'static str,
    /// Selects the TTL for a successful provider result.
    success_ttl: fn(&TtlPolicy) -> Ttl,
}

static CV_ANALYSIS: OperationPolicy = OperationPolicy {
    kind: AnalysisKind::CvAnalysis,
    system: CV_ANALYSIS_SYSTEM,
    template: CV_ANALYSIS_TEMPLATE,
    success_ttl: analysis_ttl,
};

static JD_ANALYSIS: OperationPolicy = OperationPolicy {
    kind: AnalysisKind::JdAnalysis,
    system: JD_ANALYSIS_SYSTEM,
    template: JD_ANALYSIS_TEMPLATE,
    success_ttl: analysis_ttl,
};

static CANDIDATE_RANKING: OperationPolicy = OperationPolicy {
    kind: AnalysisKind::CandidateRanking,
    system: RANKING_SYSTEM,
    template: RANKING_TEMPLATE,
    success_ttl: analysis_ttl,
};

fn analysis_ttl(ttl: &TtlPolicy) -> Ttl {
    ttl.analysis
}

impl OperationPolicy {
    pub fn for_kind(kind: AnalysisKind) -> &'static OperationPolicy {
        match kind {
            AnalysisKind::CvAnalysis => &CV_ANALYSIS,
            AnalysisKind::JdAnalysis => &JD_ANALYSIS,
            AnalysisKind::CandidateRanking => &CANDIDATE_RANKING,
        }
    }

    pub fn success_ttl(&self, ttl: &TtlPolicy) -> Ttl {
        (self.success_ttl)(ttl)
    }

    /// Degraded results always use the fallback TTL.
    pub fn fallback_ttl(&self, ttl: &TtlPolicy) -> Ttl {
        ttl.fallback
    }

    pub fn system_prompt(&self) -> String {
        format!("{} {} {}", self.system, GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM)
    }

    /// Substitutes `{name}` placeholders in a single pass, so values that
    /// themselves contain braces are never re-expanded.
    pub fn render(&self, vars: &[(&'static str, String)]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let replaced = after.find('}').and_then(|end| {
                let name = &after[..end];
                vars.iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| (v, end))
            });
            match replaced {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    pub fn parse(&self, text: &str) -> Result<AnalysisResult, serde_json::Error> {
        AnalysisResult::parse(self.kind, text)
    }
}
