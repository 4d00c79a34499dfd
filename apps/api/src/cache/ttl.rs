use std::num::NonZeroU64;
use std::time::Duration;

/// A validated, strictly positive time-to-live in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(NonZeroU64);

impl Ttl {
    /// Builds a TTL from a literal. Zero is a programming error.
    pub const fn secs(secs: u64) -> Self {
        match NonZeroU64::new(secs) {
            Some(v) => Ttl(v),
            None => panic!("TTL must be positive"),
        }
    }

    pub const fn minutes(minutes: u64) -> Self {
        Self::secs(minutes * 60)
    }

    pub const fn hours(hours: u64) -> Self {
        Self::secs(hours * 60 * 60)
    }

    pub const fn days(days: u64) -> Self {
        Self::hours(days * 24)
    }

    /// Fallible constructor for runtime values (configuration).
    pub fn try_from_secs(secs: u64) -> Option<Self> {
        NonZeroU64::new(secs).map(Ttl)
    }

    pub fn as_secs(self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

/// TTLs per cache category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    /// CV / JD / ranking results produced by the external provider.
    pub analysis: Ttl,
    /// Degraded results produced by the local fallback generators.
    /// Kept well below `analysis` so the provider is retried sooner.
    pub fallback: Ttl,
    /// Generic GET responses.
    pub api: Ttl,
    /// GET responses scoped to a single user.
    pub api_user: Ttl,
    /// Aggregate / analytics GET responses.
    pub api_aggregate: Ttl,
    pub session: Ttl,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            analysis: Ttl::hours(24),
            fallback: Ttl::hours(1),
            api: Ttl::hours(1),
            api_user: Ttl::minutes(30),
            api_aggregate: Ttl::hours(2),
            session: Ttl::days(7),
        }
    }
}
