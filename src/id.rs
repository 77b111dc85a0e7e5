//! Stable textual identifiers for strategy instances.

use std::fmt;
use std::str::FromStr;

/// Identifies a registered strategy instance: a name plus an optional
/// configuration discriminator, e.g. two `concurrencyLimited` strategies
/// configured for different resource pools.
///
/// Canonical string form is `"name"` or `"name:config"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrategyId {
    name: String,
    config: Option<String>,
}

impl StrategyId {
    /// Canonical name for the built-in [`SingleExecution`](crate::strategy::single_execution) strategy.
    pub const SINGLE_EXECUTION: &'static str = "singleExecution";
    /// Canonical name for the built-in [`PriorityBased`](crate::strategy::priority_based) strategy.
    pub const PRIORITY_BASED: &'static str = "priorityBased";
    /// Canonical name for the built-in [`GroupCoordination`](crate::strategy::group_coordination) strategy.
    pub const GROUP_COORDINATION: &'static str = "groupCoordination";
    /// Canonical name for the built-in [`ConcurrencyLimited`](crate::strategy::concurrency_limited) strategy.
    pub const CONCURRENCY_LIMITED: &'static str = "concurrencyLimited";
    /// Canonical name for the built-in [`DynamicCondition`](crate::strategy::dynamic_condition) strategy.
    pub const DYNAMIC_CONDITION: &'static str = "dynamicCondition";

    /// Creates a new id with no config discriminator.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), config: None }
    }

    /// Creates a new id with a config discriminator.
    pub fn with_config(name: impl Into<String>, config: impl Into<String>) -> Self {
        Self { name: name.into(), config: Some(config.into()) }
    }

    /// The id for composite strategy of arity `n` (2..=5), e.g. `Lockman.CompositeStrategy2`.
    pub fn composite(arity: usize) -> Self {
        Self::new(format!("Lockman.CompositeStrategy{arity}"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.config {
            Some(config) => write!(f, "{}:{}", self.name, config),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Error returned when a string is not a valid canonical `StrategyId`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid strategy id: {0:?}")]
pub struct ParseStrategyIdError(pub String);

impl FromStr for StrategyId {
    type Err = ParseStrategyIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseStrategyIdError(s.to_string()));
        }
        match s.split_once(':') {
            Some((name, config)) if !name.is_empty() && !config.is_empty() => {
                Ok(Self::with_config(name, config))
            }
            Some(_) => Err(ParseStrategyIdError(s.to_string())),
            None => Ok(Self::new(s)),
        }
    }
}
