use std::str::FromStr;

use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::error::{BasaltResult, OptimizerError};
use crate::rules::RuleType;

/// Per session planner settings.
///
/// Missing fields take their default value, so an empty document is a valid configuration:
///
/// ```yaml
/// new_planner_agg_stage: 2
/// disabled_rules:
///   - JoinCommutativity
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionVariables {
    /// 0 chooses automatically, 1 keeps aggregations in one stage, 2 and 3 force two and three
    /// stage plans.
    pub new_planner_agg_stage: u8,
    pub enable_push_down_join_on_clause: bool,
    /// Names of rules the registry leaves out, e.g. `SplitAggregate`.
    pub disabled_rules: Vec<String>,
    /// Upper bound of rewrite passes of the heuristic driver.
    pub max_rewrite_iterations: usize,
}

impl Default for SessionVariables {
    fn default() -> Self {
        Self {
            new_planner_agg_stage: 0,
            enable_push_down_join_on_clause: true,
            disabled_rules: vec![],
            max_rewrite_iterations: 64,
        }
    }
}

impl SessionVariables {
    pub fn from_json(json: &str) -> BasaltResult<Self> {
        let session: SessionVariables = serde_json::from_str(json)?;
        session.validate()?;
        Ok(session)
    }

    pub fn from_yaml(yaml: &str) -> BasaltResult<Self> {
        let session: SessionVariables = serde_yaml::from_str(yaml)?;
        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> BasaltResult<()> {
        if self.new_planner_agg_stage > 3 {
            return Err(OptimizerError::InvalidConfig(format!(
                "new_planner_agg_stage must be between 0 and 3, got {}",
                self.new_planner_agg_stage
            ))
            .into());
        }
        self.disabled_rule_types()?;
        Ok(())
    }

    /// Aggregations must not be split into several stages.
    pub fn is_one_stage_agg(&self) -> bool {
        self.new_planner_agg_stage == 1
    }

    pub fn disabled_rule_types(&self) -> BasaltResult<EnumSet<RuleType>> {
        self.disabled_rules
            .iter()
            .map(|name| {
                RuleType::from_str(name).map_err(|err: strum::ParseError| {
                    anyhow::Error::from(OptimizerError::InvalidConfig(format!(
                        "unknown rule {:?}: {}",
                        name, err
                    )))
                })
            })
            .collect()
    }
}
