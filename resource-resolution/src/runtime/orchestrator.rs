use super::context::{resolved_params, ResolutionContext};
use super::processor::{dispatch, Resolved, SourceEnv};
use super::registry::SourceRegistry;
use crate::clients::Collaborators;
use crate::config::EngineConfig;
use crate::ir::DependencyGraph;
use crate::meta::constants::SECRET_MASK;
use crate::meta::{AssignmentStatus, ResourceAssignment, ResourceDictionary, SourceKind};
use crate::planner::{map_sources, sequence, validate_batch, Sequence};
use crate::util::{ResolutionError, Result, SourceError};
use futures::future::join_all;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything decided before the first source is called.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionPlan {
    pub sequence: Sequence,
    pub kinds: Vec<SourceKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionOutcome {
    /// Assignments in their input order with status, message and value set.
    pub assignments: Vec<ResourceAssignment>,
    /// Names of the assignments actually dispatched, in dispatch order.
    /// Blocked assignments are left out; in parallel mode a batch is
    /// listed in input order.
    pub order: Vec<String>,
    pub context: IndexMap<String, Value>,
    pub resolved_params: IndexMap<String, Value>,
}

impl ResolutionOutcome {
    pub fn unresolved(&self) -> impl Iterator<Item = &ResourceAssignment> {
        self.assignments.iter().filter(|ra| !ra.is_resolved())
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved().next().is_none()
    }
}

/// Drives one resolution: validate, map sources, sequence, then dispatch
/// each assignment and collect results into a fresh context.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: EngineConfig,
    registry: SourceRegistry,
    collaborators: Collaborators,
}

impl Resolver {
    pub fn new(config: EngineConfig) -> Self {
        let registry = SourceRegistry::from_config(&config.resolution);
        Self { config, registry, collaborators: Collaborators::new() }
    }

    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registered_sources(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Validates and maps the batch in place and orders it. Nothing is
    /// dispatched; any error here is fatal for the whole batch.
    pub fn plan(
        &self,
        assignments: &mut [ResourceAssignment],
        dictionary: &ResourceDictionary,
    ) -> Result<ResolutionPlan> {
        validate_batch(assignments)?;
        let problems = dictionary.problems();
        if !problems.is_empty() {
            return Err(ResolutionError::Configuration(problems.join("; ")));
        }
        map_sources(assignments, dictionary);

        let kinds = assignments
            .iter()
            .map(|ra| self.registry.kind_for(ra))
            .collect::<Result<Vec<_>>>()?;
        for (ra, kind) in assignments.iter().zip(&kinds) {
            self.check_definition(ra, *kind, dictionary)?;
        }

        let graph = DependencyGraph::build(assignments)?;
        let sequence = sequence(&graph)?;
        Ok(ResolutionPlan { sequence, kinds })
    }

    /// Remote sources cannot run without their source entry.
    fn check_definition(
        &self,
        ra: &ResourceAssignment,
        kind: SourceKind,
        dictionary: &ResourceDictionary,
    ) -> Result<()> {
        if !kind.is_remote() {
            return Ok(());
        }
        let source = ra.source().unwrap_or_default();
        match dictionary.get(ra.dictionary_name()) {
            Some(definition) if definition.source(source).is_some() => Ok(()),
            _ => Err(ResolutionError::MissingDefinition {
                assignment: ra.name.clone(),
                dictionary_name: ra.dictionary_name().to_string(),
                source_name: source.to_string(),
            }),
        }
    }

    pub async fn resolve(
        &self,
        mut assignments: Vec<ResourceAssignment>,
        dictionary: &ResourceDictionary,
        payload: &Value,
    ) -> Result<ResolutionOutcome> {
        let started = Instant::now();
        let plan = self.plan(&mut assignments, dictionary)?;
        let index: HashMap<String, usize> = assignments
            .iter()
            .enumerate()
            .map(|(i, ra)| (ra.name.clone(), i))
            .collect();
        let mut context = ResolutionContext::from_payload(payload);
        let mut order = Vec::with_capacity(assignments.len());
        info!(
            assignments = assignments.len(),
            batches = plan.sequence.batches.len(),
            parallel = self.config.resolution.parallel_batches,
            "starting resource resolution"
        );

        if self.config.resolution.parallel_batches {
            for batch in &plan.sequence.batches {
                let ready: Vec<usize> = batch
                    .iter()
                    .copied()
                    .filter(|&i| !block_if_unresolved(&mut assignments, &index, i))
                    .collect();
                order.extend(ready.iter().map(|&i| assignments[i].name.clone()));
                let attempts = ready
                    .iter()
                    .map(|&i| self.attempt(&assignments[i], plan.kinds[i], dictionary, &context));
                let results = join_all(attempts).await;
                for (i, result) in ready.into_iter().zip(results) {
                    self.apply(&mut assignments[i], result, &mut context);
                }
            }
        } else {
            for &i in &plan.sequence.order {
                if block_if_unresolved(&mut assignments, &index, i) {
                    continue;
                }
                order.push(assignments[i].name.clone());
                let result = self
                    .attempt(&assignments[i], plan.kinds[i], dictionary, &context)
                    .await;
                self.apply(&mut assignments[i], result, &mut context);
            }
        }

        let resolved_params = resolved_params(&assignments);
        let unresolved = assignments.iter().filter(|ra| !ra.is_resolved()).count();
        info!(
            resolved = assignments.len() - unresolved,
            unresolved,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "resource resolution finished"
        );

        Ok(ResolutionOutcome {
            assignments,
            order,
            context: context.into_inner(),
            resolved_params,
        })
    }

    async fn attempt(
        &self,
        ra: &ResourceAssignment,
        kind: SourceKind,
        dictionary: &ResourceDictionary,
        context: &ResolutionContext,
    ) -> std::result::Result<Resolved, SourceError> {
        let definition = dictionary.get(ra.dictionary_name());
        let env = SourceEnv {
            context,
            definition,
            source: definition.and_then(|d| d.source(ra.source().unwrap_or_default())),
            collaborators: &self.collaborators,
            config: &self.config,
        };
        let source = ra.source().unwrap_or_default();
        debug!(assignment = %ra.name, source, %kind, "dispatching");
        dispatch(kind, ra, env).await
    }

    fn apply(
        &self,
        ra: &mut ResourceAssignment,
        result: std::result::Result<Resolved, SourceError>,
        context: &mut ResolutionContext,
    ) {
        let resolved = match result {
            Ok(resolved) => resolved,
            Err(e) => {
                let source = ra.source().unwrap_or_default();
                warn!(assignment = %ra.name, source, error = %e, "resolution failed");
                ra.set_failed(e.to_string());
                return;
            }
        };

        ra.record_key_identifiers(&resolved.key_identifiers);
        let value = resolved.value;
        if value.is_null() && ra.is_required() && self.config.resolution.fail_on_required_missing {
            warn!(assignment = %ra.name, "required value resolved to null");
            ra.set_failed(format!("failed to populate mandatory resource mapping ({})", ra.name));
            return;
        }

        info!(assignment = %ra.name, value = %self.loggable(ra, &value), "resolved");
        if !value.is_null() {
            context.record(ra, &value);
        }
        ra.set_resolved((!value.is_null()).then_some(value));
    }

    fn loggable(&self, ra: &ResourceAssignment, value: &Value) -> String {
        let secret = ra
            .source()
            .map_or(false, |s| self.config.resolution.secret_sources.iter().any(|x| x == s));
        if secret {
            SECRET_MASK.to_string()
        } else {
            value.to_string()
        }
    }
}

/// Marks `i` blocked when any dependency did not resolve.
fn block_if_unresolved(
    assignments: &mut [ResourceAssignment],
    index: &HashMap<String, usize>,
    i: usize,
) -> bool {
    let unresolved: Vec<String> = assignments[i]
        .dependencies
        .iter()
        .filter(|d| {
            index
                .get(d.as_str())
                .map_or(true, |&j| assignments[j].status != AssignmentStatus::Success)
        })
        .cloned()
        .collect();
    if unresolved.is_empty() {
        return false;
    }
    let ra = &mut assignments[i];
    warn!(
        assignment = %ra.name,
        dependencies = ?unresolved,
        "not attempted, dependency unresolved"
    );
    ra.set_blocked(format!("dependency unresolved: {}", unresolved.join(", ")));
    true
}
