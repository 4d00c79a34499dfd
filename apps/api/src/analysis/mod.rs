//! Memoizing analysis gateway.
//!
//! Wraps every expensive, non-deterministic provider call (CV scoring, JD
//! parsing, candidate ranking) with cache-aside memoization:
//!
//! ```text
//! LOOKUP ─┬─ HIT ───────────────────────────────────────────────► RETURN
//!         └─ MISS ─► EXTERNAL_CALL ─┬─ SUCCESS ─► STORE(long TTL) ─► RETURN
//!                                   └─ FAILURE ─► FALLBACK ─► STORE(short TTL) ─► RETURN
//! ```
//!
//! Exactly one provider attempt and at most one cache write per call.
//! Concurrent identical misses are not deduplicated: each performs its own
//! provider call and the last write wins.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::cache::{CacheStore, TtlPolicy};
use crate::llm_client::{AnalysisProvider, LlmError};

pub mod fallback;
pub mod handlers;
pub mod models;
pub mod policy;
pub mod prompts;

use models::{AnalysisKind, AnalysisRequest, AnalysisResult, CandidateInput};
use policy::OperationPolicy;

/// Where a result came from. Logged, never part of the response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    External,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provenance::Cache => "cache",
            Provenance::External => "external",
            Provenance::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub result: AnalysisResult,
    pub provenance: Provenance,
}

pub struct AnalysisGateway {
    cache: CacheStore,
    provider: Arc<dyn AnalysisProvider>,
    ttl: TtlPolicy,
}

impl AnalysisGateway {
    pub fn new(cache: CacheStore, provider: Arc<dyn AnalysisProvider>, ttl: TtlPolicy) -> Self {
        Self {
            cache,
            provider,
            ttl,
        }
    }

    pub async fn analyze_cv(&self, cv_text: &str, job_description: &str) -> Analysis {
        self.analyze(&AnalysisRequest::Cv {
            cv_text: cv_text.to_string(),
            job_description: job_description.to_string(),
        })
        .await
    }

    pub async fn analyze_jd(&self, job_description: &str) -> Analysis {
        self.analyze(&AnalysisRequest::Jd {
            job_description: job_description.to_string(),
        })
        .await
    }

    pub async fn rank_candidates(
        &self,
        job_description: &str,
        candidates: Vec<CandidateInput>,
    ) -> Analysis {
        self.analyze(&AnalysisRequest::Ranking {
            job_description: job_description.to_string(),
            candidates,
        })
        .await
    }

    /// Runs one request through the lookup → call → fallback → store cycle.
    /// Never fails: the worst case is a fallback result.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Analysis {
        let kind = request.kind();
        let policy = OperationPolicy::for_kind(kind);
        let key = request.cache_key();

        if let Some(result) = self.lookup(kind, &key).await {
            return self.finish(kind, &key, result, Provenance::Cache);
        }

        let (result, provenance, ttl) = match self.call_external(request, policy).await {
            Ok(result) => (result, Provenance::External, policy.success_ttl(&self.ttl)),
            Err(e) => {
                warn!(
                    operation = ?kind,
                    "External analysis failed, using local fallback: {e}"
                );
                (
                    fallback::generate(request),
                    Provenance::Fallback,
                    policy.fallback_ttl(&self.ttl),
                )
            }
        };

        if self.cache.is_enabled() && !self.cache.set_with_ttl(&key, &result, ttl).await {
            warn!(key = %key, "Analysis result not cached");
        }

        self.finish(kind, &key, result, provenance)
    }

    async fn lookup(&self, kind: AnalysisKind, key: &str) -> Option<AnalysisResult> {
        let cached: Value = self.cache.get(key).await?;
        match AnalysisResult::from_value(kind, cached) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(key, "Cached analysis has unexpected shape, ignoring: {e}");
                None
            }
        }
    }

    /// One provider attempt. Malformed or mis-shaped output is a failure.
    async fn call_external(
        &self,
        request: &AnalysisRequest,
        policy: &OperationPolicy,
    ) -> Result<AnalysisResult, LlmError> {
        let prompt = policy.render(&request.prompt_vars());
        let text = self
            .provider
            .complete(&policy.system_prompt(), &prompt)
            .await?;
        policy.parse(&text).map_err(LlmError::Parse)
    }

    fn finish(
        &self,
        kind: AnalysisKind,
        key: &str,
        result: AnalysisResult,
        provenance: Provenance,
    ) -> Analysis {
        info!(operation = ?kind, key, %provenance, "analysis served");
        Analysis { result, provenance }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::cache::testing::{FailingBackend, MemoryBackend};

    /// Provider that replays scripted replies and counts calls.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, u16>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, u16>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisProvider for ScriptedProvider {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Err(500));
            reply.map_err(|status| LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            })
        }
    }

    fn cv_reply(score: u32) -> String {
        json!({
            "overall_score": score,
            "skills_match": {"matched": ["rust"], "missing": []},
            "experience_years": 6,
            "strengths": ["Rust"],
            "concerns": [],
            "recommendation": "Interview",
            "summary": format!("score {score}")
        })
        .to_string()
    }

    fn gateway(
        backend: Arc<MemoryBackend>,
        provider: Arc<ScriptedProvider>,
    ) -> AnalysisGateway {
        let store = CacheStore::with_backend(backend, Duration::from_secs(1));
        AnalysisGateway::new(store, provider, TtlPolicy::default())
    }

    fn top_level_fields(result: &AnalysisResult) -> BTreeSet<String> {
        serde_json::to_value(result)
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let backend = Arc::new(MemoryBackend::new());
        let provider = ScriptedProvider::new(vec![Ok(cv_reply(71)), Ok(cv_reply(12))]);
        let gw = gateway(backend.clone(), provider.clone());

        let first = gw.analyze_cv("Rust dev, 6 years", "Rust role").await;
        let second = gw.analyze_cv("Rust dev, 6 years", "Rust role").await;

        assert_eq!(first.provenance, Provenance::External);
        assert_eq!(second.provenance, Provenance::Cache);
        assert_eq!(first.result, second.result);
        assert_eq!(provider.calls(), 1);
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_distinct_inputs_are_not_shared() {
        let backend = Arc::new(MemoryBackend::new());
        let provider = ScriptedProvider::new(vec![Ok(cv_reply(71)), Ok(cv_reply(12))]);
        let gw = gateway(backend, provider.clone());

        let a = gw.analyze_cv("Rust dev", "Rust role").await;
        let b = gw.analyze_cv("Rust dev ", "Rust role").await;

        assert_ne!(a.result, b.result);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_fallback_has_same_shape_as_external() {
        let ok = ScriptedProvider::new(vec![Ok(cv_reply(80))]);
        let external = gateway(Arc::new(MemoryBackend::new()), ok)
            .analyze_cv("Rust and Docker, 4 years", "Need Rust, Docker")
            .await;

        let failing = ScriptedProvider::new(vec![]);
        let degraded = gateway(Arc::new(MemoryBackend::new()), failing.clone())
            .analyze_cv("Rust and Docker, 4 years", "Need Rust, Docker")
            .await;

        assert_eq!(external.provenance, Provenance::External);
        assert_eq!(degraded.provenance, Provenance::Fallback);
        assert_eq!(failing.calls(), 1);
        assert_eq!(top_level_fields(&external.result), top_level_fields(&degraded.result));
    }

    #[tokio::test]
    async fn test_fallback_shape_parity_for_jd_and_ranking() {
        let jd_reply = json!({
            "title": "Rust Engineer",
            "seniority": "senior",
            "required_skills": ["rust"],
            "preferred_skills": [],
            "min_experience_years": 5,
            "summary": "ok"
        })
        .to_string();
        let rank_reply = json!({
            "rankings": [{"candidate_id": "1", "name": "A", "score": 90, "reasoning": "fit"}],
            "summary": "ok"
        })
        .to_string();
        let candidates = vec![CandidateInput {
            id: "1".into(),
            name: "A".into(),
            cv_text: "Rust".into(),
        }];

        let ok = gateway(
            Arc::new(MemoryBackend::new()),
            ScriptedProvider::new(vec![Ok(jd_reply), Ok(rank_reply)]),
        );
        let down = gateway(Arc::new(MemoryBackend::new()), ScriptedProvider::new(vec![]));

        let jd_ok = ok.analyze_jd("Rust Engineer").await;
        let jd_down = down.analyze_jd("Rust Engineer").await;
        assert_eq!(top_level_fields(&jd_ok.result), top_level_fields(&jd_down.result));

        let rank_ok = ok.rank_candidates("Rust Engineer", candidates.clone()).await;
        let rank_down = down.rank_candidates("Rust Engineer", candidates).await;
        assert_eq!(rank_ok.provenance, Provenance::External);
        assert_eq!(rank_down.provenance, Provenance::Fallback);
        assert_eq!(top_level_fields(&rank_ok.result), top_level_fields(&rank_down.result));
    }

    #[tokio::test]
    async fn test_malformed_json_routes_to_fallback() {
        let backend = Arc::new(MemoryBackend::new());
        let provider = ScriptedProvider::new(vec![Ok("Sure! Here is the analysis: {".into())]);
        let gw = gateway(backend.clone(), provider);

        let analysis = gw.analyze_jd("Senior Rust Engineer").await;
        assert_eq!(analysis.provenance, Provenance::Fallback);
        assert_eq!(backend.writes(), 1);
    }

    #[tokio::test]
    async fn test_missing_required_field_routes_to_fallback() {
        let backend = Arc::new(MemoryBackend::new());
        let provider =
            ScriptedProvider::new(vec![Ok(r#"{"overall_score": 90, "summary": "great"}"#.into())]);
        let gw = gateway(backend, provider);

        let analysis = gw.analyze_cv("cv", "jd").await;
        assert_eq!(analysis.provenance, Provenance::Fallback);
        let AnalysisResult::Cv(cv) = analysis.result else {
            panic!("expected CV analysis");
        };
        assert!(cv.summary.starts_with("Heuristic analysis"));
    }

    #[tokio::test]
    async fn test_fallback_uses_short_ttl_and_external_long_ttl() {
        let backend = Arc::new(MemoryBackend::new());
        let provider = ScriptedProvider::new(vec![Err(503), Ok(cv_reply(64))]);
        let gw = gateway(backend.clone(), provider);

        gw.analyze_cv("cv one", "jd").await;
        gw.analyze_cv("cv two", "jd").await;

        let ttl = TtlPolicy::default();
        let degraded_key = models::AnalysisRequest::Cv {
            cv_text: "cv one".into(),
            job_description: "jd".into(),
        }
        .cache_key();
        let external_key = models::AnalysisRequest::Cv {
            cv_text: "cv two".into(),
            job_description: "jd".into(),
        }
        .cache_key();
        assert_eq!(backend.ttl_of(&degraded_key), Some(ttl.fallback.as_secs()));
        assert_eq!(backend.ttl_of(&external_key), Some(ttl.analysis.as_secs()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_retried_after_fallback_expires() {
        let backend = Arc::new(MemoryBackend::new());
        let provider = ScriptedProvider::new(vec![Err(503), Ok(cv_reply(64))]);
        let gw = gateway(backend, provider.clone());

        assert_eq!(gw.analyze_cv("cv", "jd").await.provenance, Provenance::Fallback);
        assert_eq!(gw.analyze_cv("cv", "jd").await.provenance, Provenance::Cache);

        tokio::time::advance(TtlPolicy::default().fallback.as_duration() + Duration::from_secs(1))
            .await;
        assert_eq!(gw.analyze_cv("cv", "jd").await.provenance, Provenance::External);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_cached_shape_is_recomputed() {
        let backend = Arc::new(MemoryBackend::new());
        let request = AnalysisRequest::Jd {
            job_description: "Rust Engineer".into(),
        };
        backend.insert_raw(&request.cache_key(), r#"{"unexpected": true}"#);
        let provider = ScriptedProvider::new(vec![]);
        let gw = gateway(backend, provider.clone());

        let analysis = gw.analyze(&request).await;
        assert_eq!(analysis.provenance, Provenance::Fallback);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_store_down_still_returns_result() {
        let store = CacheStore::with_backend(Arc::new(FailingBackend), Duration::from_secs(1));
        let provider = ScriptedProvider::new(vec![Ok(cv_reply(55)), Ok(cv_reply(56))]);
        let gw = AnalysisGateway::new(store, provider.clone(), TtlPolicy::default());

        let first = gw.analyze_cv("cv", "jd").await;
        let second = gw.analyze_cv("cv", "jd").await;
        assert_eq!(first.provenance, Provenance::External);
        assert_eq!(second.provenance, Provenance::External);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_result_field_set_matches_serialized_json() {
        let provider = ScriptedProvider::new(vec![Ok(cv_reply(70))]);
        let analysis = gateway(Arc::new(MemoryBackend::new()), provider)
            .analyze_cv("cv", "jd")
            .await;
        let fields = top_level_fields(&analysis.result);
        for field in [
            "overall_score",
            "skills_match",
            "experience_years",
            "strengths",
            "concerns",
            "recommendation",
            "summary",
        ] {
            assert!(fields.contains(field), "missing {field}");
        }
        assert_eq!(analysis.result.kind(), AnalysisKind::CvAnalysis);
    }
}
