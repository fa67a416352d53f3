use super::{AgentBinding, ConfigurationChangeJob};
use crate::environment::Environment;
use crate::error::JobError;
use crate::holder::ConfigurationHolder;
use crate::types::ChangedTypes;

/// Job run when a different environment is mapped to an agent
///
/// `None` means the new mapping has no environment for the agent.
///
/// # Sequence
///
/// 1. snapshot the currently instrumented types
/// 2. remove all instrumentation points
/// 3. install the new environment in the holder
/// 4. if the holder was already initialized, re-apply its appliers
/// 5. return snapshot ∪ newly instrumented types
///
/// The result deliberately over-approximates the changed set: every type
/// instrumented before the swap is included, so the agent push never misses
/// a type that did change.
#[derive(Debug)]
pub struct EnvironmentMappingUpdateJob {
    binding: AgentBinding,
    environment: Option<Environment>,
}

impl EnvironmentMappingUpdateJob {
    /// Create job mapping `environment` to the bound agent
    #[must_use]
    pub fn new(binding: AgentBinding, environment: Option<Environment>) -> Self {
        Self {
            binding,
            environment,
        }
    }

    /// Environment the job will install
    #[inline]
    #[must_use]
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }
}

impl ConfigurationChangeJob for EnvironmentMappingUpdateJob {
    const NAME: &'static str = "environment-mapping-update";

    fn binding(&self) -> &AgentBinding {
        &self.binding
    }

    fn execute(self) -> Result<ChangedTypes, JobError> {
        let agent_id = self.binding.agent_id();
        let holder = self.binding.holder();
        let index = self.binding.class_index();

        // Reject malformed input before the index is touched
        let prepared = ConfigurationHolder::prepare(self.environment, agent_id)?;
        let initialized = holder.is_initialized();

        let mut changed = index.find_instrumented_types();
        tracing::debug!(agent = %agent_id, previously_instrumented = changed.len(), "snapshot taken");

        index.remove_instrumentation_points().map_err(JobError::Clear)?;

        holder.commit(prepared);

        // An uninitialized holder has no analysed class universe yet
        if !initialized {
            tracing::debug!(agent = %agent_id, "first mapping, skipping re-instrumentation");
            return Ok(changed);
        }

        let snapshot = holder
            .snapshot()
            .ok_or(JobError::MissingConfiguration(agent_id))?;
        match index.add_instrumentation_points(&snapshot.agent_configuration, &snapshot.appliers) {
            Ok(instrumented) => {
                tracing::debug!(agent = %agent_id, instrumented = instrumented.len(), "re-instrumented");
                changed.extend(instrumented);
                Ok(changed)
            }
            Err(err) => {
                tracing::error!(agent = %agent_id, error = %err, "re-instrumentation failed, clearing class index");
                if let Err(clear_err) = index.remove_instrumentation_points() {
                    tracing::error!(agent = %agent_id, error = %clear_err, "clearing after failed re-instrumentation failed");
                }
                Err(JobError::Reinstrumentation(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_index::{ClassIndex, InMemoryClassIndex};
    use crate::environment::SensorAssignment;
    use crate::holder::ConfigurationHolder;
    use crate::types::{AgentId, ClassDescriptor, ClassType, SensorKind};
    use std::sync::Arc;

    fn setup() -> (AgentBinding, Arc<InMemoryClassIndex>) {
        let index = Arc::new(InMemoryClassIndex::with_classes([
            ClassDescriptor::new(ClassType::bootstrap("com.shop.Cart"), ["add"]),
            ClassDescriptor::new(ClassType::bootstrap("com.shop.Order"), ["submit"]),
            ClassDescriptor::new(ClassType::bootstrap("org.lib.Util"), ["help"]),
        ]));
        let binding = AgentBinding::new(
            AgentId(1),
            Arc::new(ConfigurationHolder::new()),
            Arc::clone(&index) as Arc<dyn ClassIndex>,
        );
        (binding, index)
    }

    fn env(id: &str, pattern: &str) -> Environment {
        Environment::new(id, id).with_assignment(SensorAssignment::new(pattern, SensorKind::Timer))
    }

    fn run(binding: &AgentBinding, environment: Option<Environment>) -> ChangedTypes {
        EnvironmentMappingUpdateJob::new(binding.clone(), environment)
            .execute()
            .unwrap()
    }

    #[test]
    fn first_mapping_returns_empty_and_initializes() {
        let (binding, index) = setup();

        let changed = run(&binding, Some(env("a", "com.*")));

        assert!(changed.is_empty());
        assert!(binding.holder().is_initialized());
        assert!(index.find_instrumented_types().is_empty());
    }

    #[test]
    fn remap_returns_union_of_before_and_after() {
        let (binding, index) = setup();
        run(&binding, Some(env("a", "com.shop.Cart")));
        run(&binding, Some(env("a", "com.shop.Cart")));

        let changed = run(&binding, Some(env("b", "com.shop.Order")));

        assert_eq!(changed.len(), 2);
        assert!(changed.contains(&ClassType::bootstrap("com.shop.Cart")));
        assert!(changed.contains(&ClassType::bootstrap("com.shop.Order")));
        assert_eq!(
            index.find_instrumented_types(),
            [ClassType::bootstrap("com.shop.Order")]
                .into_iter()
                .collect::<ChangedTypes>()
        );
    }

    #[test]
    fn absent_environment_returns_snapshot_and_clears() {
        let (binding, index) = setup();
        run(&binding, Some(env("a", "*")));
        run(&binding, Some(env("a", "*")));
        let before = index.find_instrumented_types();
        assert_eq!(before.len(), 3);

        let changed = run(&binding, None);

        assert_eq!(changed, before);
        assert!(index.find_instrumented_types().is_empty());
    }

    #[test]
    fn malformed_environment_leaves_index_untouched() {
        let (binding, index) = setup();
        run(&binding, Some(env("a", "*")));
        run(&binding, Some(env("a", "*")));

        let result =
            EnvironmentMappingUpdateJob::new(binding.clone(), Some(Environment::new("x", ""))).execute();

        assert!(matches!(result, Err(JobError::Configuration(_))));
        assert_eq!(index.find_instrumented_types().len(), 3);
        assert_eq!(binding.holder().environment().unwrap().id, "a");
    }
}
