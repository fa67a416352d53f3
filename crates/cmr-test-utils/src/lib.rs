//! Testing utilities for CMR workspace
//!
//! Shared test helpers, fixtures, and fault-injecting class indices.

#![allow(missing_docs)]

use cmr_business::{ApplicationDefinition, BusinessTransactionDefinition};
use cmr_instrumentation::{
    AgentConfiguration, ChangedTypes, ClassDescriptor, ClassIndex, ClassIndexError, ClassType,
    Environment, InMemoryClassIndex, LoaderId, SensorAssignment, SensorKind, SharedApplier,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

pub fn class(fqn: &str) -> ClassType {
    ClassType::new(fqn, LoaderId(1))
}

/// Small shop application: services, repositories and a utility class
pub fn shop_classes() -> Vec<ClassDescriptor> {
    vec![
        ClassDescriptor::new(class("com.shop.CartService"), ["add", "remove", "total"]),
        ClassDescriptor::new(class("com.shop.OrderService"), ["submit", "cancel"]),
        ClassDescriptor::new(class("com.shop.db.OrderRepository"), ["save", "findById"]),
        ClassDescriptor::new(class("com.shop.generated.CartProxy"), ["add"]),
        ClassDescriptor::new(class("org.util.Strings"), ["trim"]),
    ]
}

pub fn shop_index() -> Arc<InMemoryClassIndex> {
    Arc::new(InMemoryClassIndex::with_classes(shop_classes()))
}

/// Times every service method, never touches generated classes
pub fn services_environment() -> Environment {
    Environment::new("services", "Services")
        .with_assignment(SensorAssignment::new("com.shop.*Service", SensorKind::Timer))
        .with_exclude("com.shop.generated.*")
}

/// SQL sensor on repositories only
pub fn database_environment() -> Environment {
    Environment::new("database", "Database")
        .with_assignment(SensorAssignment::new("com.shop.db.*", SensorKind::Sql))
}

/// Overlaps with [`services_environment`] on `CartService`
pub fn cart_environment() -> Environment {
    Environment::new("cart", "Cart")
        .with_assignment(
            SensorAssignment::new("com.shop.CartService", SensorKind::InvocationSequence)
                .with_method("add"),
        )
}

pub fn shop_application() -> ApplicationDefinition {
    ApplicationDefinition::new(11, "shop")
        .with_business_transaction(BusinessTransactionDefinition::new(1, "checkout"))
        .with_business_transaction(BusinessTransactionDefinition::new(2, "search"))
}

/// Class index that delegates to an [`InMemoryClassIndex`] and can be told
/// to fail its next writes
#[derive(Debug, Default)]
pub struct FaultyClassIndex {
    inner: InMemoryClassIndex,
    fail_add: AtomicBool,
    fail_remove: AtomicBool,
    /// Types the failing add had already instrumented before it failed
    partial: Mutex<Vec<ClassType>>,
}

impl FaultyClassIndex {
    pub fn with_classes(classes: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        Self {
            inner: InMemoryClassIndex::with_classes(classes),
            ..Self::default()
        }
    }

    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn partially_instrumented(&self) -> Vec<ClassType> {
        self.partial.lock().clone()
    }
}

impl ClassIndex for FaultyClassIndex {
    fn find_instrumented_types(&self) -> ChangedTypes {
        self.inner.find_instrumented_types()
    }

    fn remove_instrumentation_points(&self) -> Result<(), ClassIndexError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ClassIndexError::Unavailable("remove disabled".to_string()));
        }
        self.inner.remove_instrumentation_points()
    }

    fn add_instrumentation_points(
        &self,
        config: &AgentConfiguration,
        appliers: &[SharedApplier],
    ) -> Result<ChangedTypes, ClassIndexError> {
        // Apply for real first so a failure leaves points behind for the job to clean up
        let added = self.inner.add_instrumentation_points(config, appliers)?;
        if self.fail_add.load(Ordering::SeqCst) {
            let mut partial: Vec<_> = added.into_iter().collect();
            partial.sort();
            let class = partial
                .first()
                .map_or_else(|| "<none>".to_string(), ToString::to_string);
            *self.partial.lock() = partial;
            return Err(ClassIndexError::InstrumentationFailed {
                class,
                reason: "injected failure".to_string(),
            });
        }
        Ok(added)
    }
}

/// Class index that counts how many callers are inside it at once
#[derive(Debug, Default)]
pub struct ConcurrencyProbe {
    inner: InMemoryClassIndex,
    inside: AtomicUsize,
    max_inside: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn with_classes(classes: impl IntoIterator<Item = ClassDescriptor>) -> Self {
        Self {
            inner: InMemoryClassIndex::with_classes(classes),
            ..Self::default()
        }
    }

    /// Highest number of overlapping calls observed
    pub fn max_overlap(&self) -> usize {
        self.max_inside.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ProbeGuard<'_> {
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
        std::thread::yield_now();
        ProbeGuard(&self.inside)
    }
}

struct ProbeGuard<'a>(&'a AtomicUsize);

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ClassIndex for ConcurrencyProbe {
    fn find_instrumented_types(&self) -> ChangedTypes {
        let _guard = self.enter();
        self.inner.find_instrumented_types()
    }

    fn remove_instrumentation_points(&self) -> Result<(), ClassIndexError> {
        let _guard = self.enter();
        self.inner.remove_instrumentation_points()
    }

    fn add_instrumentation_points(
        &self,
        config: &AgentConfiguration,
        appliers: &[SharedApplier],
    ) -> Result<ChangedTypes, ClassIndexError> {
        let _guard = self.enter();
        self.inner.add_instrumentation_points(config, appliers)
    }
}
