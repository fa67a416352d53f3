use super::ClassIndex;
use crate::agent_config::AgentConfiguration;
use crate::applier::SharedApplier;
use crate::error::ClassIndexError;
use crate::types::{ChangedTypes, ClassDescriptor, ClassType, InstrumentationPoint};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

/// Class index held in memory
///
/// Writes take the lock once for the whole operation, so readers see either
/// the state before or after an add/remove.
#[derive(Debug, Default)]
pub struct InMemoryClassIndex {
    classes: RwLock<HashMap<ClassType, IndexedClass>>,
}

#[derive(Debug)]
struct IndexedClass {
    descriptor: ClassDescriptor,
    points: BTreeSet<InstrumentationPoint>,
}

impl InMemoryClassIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create index holding `classes`
    #[must_use]
    pub fn with_classes(classes: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        let index = Self::new();
        for class in classes {
            index.register_class(class);
        }
        index
    }

    /// Record a class reported by the agent
    ///
    /// Re-registering a known type replaces its method list and drops its
    /// instrumentation points.
    pub fn register_class(&self, descriptor: ClassDescriptor) {
        self.classes.write().insert(
            descriptor.class_type.clone(),
            IndexedClass {
                descriptor,
                points: BTreeSet::new(),
            },
        );
    }

    /// Instrumentation points currently on `class_type`
    #[must_use]
    pub fn instrumentation_points(&self, class_type: &ClassType) -> Vec<InstrumentationPoint> {
        self.classes
            .read()
            .get(class_type)
            .map(|c| c.points.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of known types
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if no type is known
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClassIndex for InMemoryClassIndex {
    fn find_instrumented_types(&self) -> ChangedTypes {
        self.classes
            .read()
            .values()
            .filter(|c| !c.points.is_empty())
            .map(|c| c.descriptor.class_type.clone())
            .collect()
    }

    fn remove_instrumentation_points(&self) -> Result<(), ClassIndexError> {
        for class in self.classes.write().values_mut() {
            class.points.clear();
        }
        Ok(())
    }

    fn add_instrumentation_points(
        &self,
        config: &AgentConfiguration,
        appliers: &[SharedApplier],
    ) -> Result<ChangedTypes, ClassIndexError> {
        let mut classes = self.classes.write();
        let mut instrumented = ChangedTypes::new();

        for class in classes.values_mut() {
            let points: Vec<_> = appliers
                .iter()
                .flat_map(|a| a.instrumentation_points(config, &class.descriptor))
                .collect();
            if points.is_empty() {
                continue;
            }
            class.points.extend(points);
            instrumented.insert(class.descriptor.class_type.clone());
        }

        tracing::trace!(
            agent = %config.agent_id(),
            instrumented = instrumented.len(),
            "instrumentation points added"
        );
        Ok(instrumented)
    }
}
