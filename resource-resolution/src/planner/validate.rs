use crate::meta::ResourceAssignment;
use crate::util::{ResolutionError, Result};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Names occurring more than once, listed once each in first-seen order.
fn duplicates<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut repeated = Vec::new();
    for key in keys {
        let count = seen.entry(key).or_insert(0);
        *count += 1;
        if *count == 2 {
            repeated.push(key);
        }
    }
    repeated
}

/// Collects every structural problem of the batch into a single report.
pub fn batch_problems(assignments: &[ResourceAssignment]) -> Vec<String> {
    let mut problems = Vec::new();

    for (position, ra) in assignments.iter().enumerate() {
        if ra.name.trim().is_empty() {
            problems.push(format!("Assignment at position {position} has no name"));
        }
    }

    let names = duplicates(assignments.iter().map(|ra| ra.name.as_str()));
    if !names.is_empty() {
        problems.push(format!(
            "Duplicate Assignment Template Keys ({}) is present",
            names.join(", ")
        ));
    }

    let dictionary_names = duplicates(assignments.iter().map(ResourceAssignment::dictionary_name));
    if !dictionary_names.is_empty() {
        problems.push(format!(
            "Duplicate Assignment Dictionary Keys ({}) is present",
            dictionary_names.join(", ")
        ));
    }

    let known: HashSet<&str> = assignments.iter().map(|ra| ra.name.as_str()).collect();
    let missing: BTreeSet<&str> = assignments
        .iter()
        .flat_map(|ra| ra.dependencies.iter())
        .map(String::as_str)
        .filter(|dependency| !known.contains(dependency))
        .collect();
    if !missing.is_empty() {
        problems.push(format!(
            "No assignments for dependency keys ({})",
            missing.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    problems
}

pub fn validate_batch(assignments: &[ResourceAssignment]) -> Result<()> {
    let problems = batch_problems(assignments);
    if problems.is_empty() {
        debug!(assignments = assignments.len(), "assignment batch is valid");
        return Ok(());
    }
    Err(ResolutionError::Validation(problems.join("\n")))
}
