//! Validation for `[agent]` limits.

use crate::schema::ChatDbConfig;

use super::helpers::in_range;

pub(crate) fn validate_agent(errors: &mut Vec<String>, config: &ChatDbConfig) {
    let agent = &config.agent;
    in_range(errors, "agent.tool_call_budget", agent.tool_call_budget, 0..=50);
    in_range(errors, "agent.max_rows", agent.max_rows, 1..=1000);
    in_range(errors, "agent.query_timeout_secs", agent.query_timeout_secs, 1..=600);
    in_range(errors, "agent.sample_rows", agent.sample_rows, 0..=10);
}
