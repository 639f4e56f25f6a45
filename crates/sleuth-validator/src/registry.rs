//! Strategy sequences per specialist agent.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::strategy::{
    AlternativeExplanationStrategy, BaselineComparisonStrategy, CorrelationStrategy,
    DependencyAnalysisStrategy, DisproofStrategy, MetricThresholdStrategy,
    ScopeContradictionStrategy, SimilarIncidentStrategy, TemporalContradictionStrategy,
};

/// Ordered strategy lists, keyed by the agent that proposed a hypothesis.
///
/// Cheap, decisive strategies go first: a temporal contradiction ends testing
/// before any metric is fetched.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    default: Vec<Arc<dyn DisproofStrategy>>,
    by_agent: BTreeMap<String, Vec<Arc<dyn DisproofStrategy>>>,
}

impl StrategyRegistry {
    /// Registry whose default sequence is `default`.
    pub fn new(default: Vec<Arc<dyn DisproofStrategy>>) -> Self {
        Self {
            default,
            by_agent: BTreeMap::new(),
        }
    }

    /// All built-in strategies, structural checks before signal checks.
    pub fn standard() -> Self {
        Self::new(vec![
            Arc::new(TemporalContradictionStrategy::new()),
            Arc::new(ScopeContradictionStrategy::new()),
            Arc::new(DependencyAnalysisStrategy),
            Arc::new(MetricThresholdStrategy),
            Arc::new(BaselineComparisonStrategy::new()),
            Arc::new(CorrelationStrategy::new()),
            Arc::new(SimilarIncidentStrategy::new()),
            Arc::new(AlternativeExplanationStrategy::new()),
        ])
    }

    /// Use `strategies` for hypotheses proposed by `agent`.
    pub fn register(mut self, agent: impl Into<String>, strategies: Vec<Arc<dyn DisproofStrategy>>) -> Self {
        self.by_agent.insert(agent.into(), strategies);
        self
    }

    /// Sequence for `agent`, falling back to the default.
    pub fn sequence_for(&self, agent: &str) -> &[Arc<dyn DisproofStrategy>] {
        self.by_agent
            .get(agent)
            .map(Vec::as_slice)
            .unwrap_or(&self.default)
    }

    /// Agents with a dedicated sequence.
    pub fn agents(&self) -> impl Iterator<Item = &str> {
        self.by_agent.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = |s: &[Arc<dyn DisproofStrategy>]| s.iter().map(|s| s.name().to_string()).collect::<Vec<_>>();
        f.debug_struct("StrategyRegistry")
            .field("default", &names(&self.default))
            .field(
                "by_agent",
                &self
                    .by_agent
                    .iter()
                    .map(|(agent, s)| (agent.clone(), names(s)))
                    .collect::<BTreeMap<_, _>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order_puts_temporal_first() {
        let registry = StrategyRegistry::standard();
        let names: Vec<_> = registry.sequence_for("anyone").iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), 8);
        assert_eq!(names[0], "temporal-contradiction");
        assert_eq!(names[7], "alternative-explanation-search");
    }

    #[test]
    fn agent_sequence_overrides_default() {
        let registry = StrategyRegistry::standard().register(
            "network-agent",
            vec![Arc::new(DependencyAnalysisStrategy) as Arc<dyn DisproofStrategy>],
        );
        assert_eq!(registry.sequence_for("network-agent").len(), 1);
        assert_eq!(registry.sequence_for("db-agent").len(), 8);
        assert_eq!(registry.agents().collect::<Vec<_>>(), vec!["network-agent"]);
    }
}
