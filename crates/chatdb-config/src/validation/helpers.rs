//! Checks shared by the section validators. Each one appends a message to
//! `errors` instead of returning early, so one pass reports every problem.

use std::fmt::Display;
use std::ops::RangeInclusive;

/// Flag `value` when it falls outside `allowed`.
pub(crate) fn in_range<T>(errors: &mut Vec<String>, name: &str, value: T, allowed: RangeInclusive<T>)
where
    T: PartialOrd + Display,
{
    if !allowed.contains(&value) {
        errors.push(format!(
            "{name} = {value} is out of range [{}, {}]",
            allowed.start(),
            allowed.end()
        ));
    }
}

/// Flag an optional setting that is missing or blank.
pub(crate) fn require(errors: &mut Vec<String>, name: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.push(format!("{name} is required"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        let mut errors = Vec::new();
        in_range(&mut errors, "agent.max_rows", 1u32, 1..=1000);
        in_range(&mut errors, "agent.max_rows", 1000u32, 1..=1000);
        assert!(errors.is_empty());
    }

    #[test]
    fn out_of_range_message_names_setting_and_bounds() {
        let mut errors = Vec::new();
        in_range(&mut errors, "openai.temperature", 2.5, 0.0..=2.0);
        assert_eq!(errors, ["openai.temperature = 2.5 is out of range [0, 2]"]);
    }

    #[test]
    fn blank_required_value_is_flagged() {
        let mut errors = Vec::new();
        require(&mut errors, "connections[0].path", Some("  "));
        require(&mut errors, "connections[0].host", None);
        require(&mut errors, "connections[0].user", Some("app"));
        assert_eq!(errors.len(), 2);
    }
}
