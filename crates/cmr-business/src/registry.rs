//! Business context registry
//!
//! Provides [`BusinessContextRegistry`], the process-wide store of identified
//! applications and business transactions. The registry is append-only:
//! the first value stored under a derived id wins and is never replaced.
//!
//! Registration looks up the derived id first and only builds a candidate on
//! a miss. The candidate is published through [`DashMap::entry`], which acts
//! as an atomic insert-if-absent; a caller that loses the race drops its
//! candidate and returns the winner.

use crate::data::{ApplicationData, BusinessTransactionData};
use crate::definition::{ApplicationDefinition, BusinessTransactionDefinition};
use crate::id::{derive_instance_id, InstanceId};
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Key of a business transaction: `(application id, business transaction id)`
pub type BusinessTransactionKey = (InstanceId, InstanceId);

/// Concurrent registry of applications and business transactions
///
/// Owned by the composition root and shared as `Arc<BusinessContextRegistry>`.
/// Reads never block on an in-flight registration of a different shard and
/// never observe a partially built record.
#[derive(Debug)]
pub struct BusinessContextRegistry {
    applications: DashMap<InstanceId, Arc<ApplicationData>>,
    business_transactions: DashMap<BusinessTransactionKey, Arc<BusinessTransactionData>>,
}

impl BusinessContextRegistry {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        tracing::info!("business context registry active");
        Self {
            applications: DashMap::new(),
            business_transactions: DashMap::new(),
        }
    }

    /// Snapshot of all registered applications, unordered
    #[must_use]
    pub fn applications(&self) -> Vec<Arc<ApplicationData>> {
        self.applications
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshot of all registered business transactions, unordered
    #[must_use]
    pub fn business_transactions(&self) -> Vec<Arc<BusinessTransactionData>> {
        self.business_transactions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Business transactions owned by `application_id`
    ///
    /// Scans the whole transaction map at call time.
    #[must_use]
    pub fn business_transactions_for(
        &self,
        application_id: InstanceId,
    ) -> Vec<Arc<BusinessTransactionData>> {
        self.business_transactions
            .iter()
            .filter(|entry| entry.value().application().id() == application_id)
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Register the application identified by `definition`
    ///
    /// Idempotent: every call with the same `(name, definition id)` returns
    /// the same stored instance, including under concurrent registration.
    pub fn register_application(&self, definition: &ApplicationDefinition) -> Arc<ApplicationData> {
        let id = derive_instance_id(&definition.application_name, definition.id);
        if let Some(existing) = self.application_for_id(id) {
            return existing;
        }

        let candidate = Arc::new(ApplicationData::new(
            id,
            definition.id,
            definition.application_name.as_str(),
        ));
        let (winner, inserted) = publish(&self.applications, id, candidate);

        if inserted {
            tracing::debug!(
                application_id = id,
                definition_id = definition.id,
                name = %winner.name(),
                "application registered"
            );
        }
        winner
    }

    /// Register the business transaction `name` of `application`
    ///
    /// Keyed by `(application.id(), derive(name, definition.id))`.
    pub fn register_business_transaction(
        &self,
        application: &Arc<ApplicationData>,
        definition: &BusinessTransactionDefinition,
        name: &str,
    ) -> Arc<BusinessTransactionData> {
        let id = derive_instance_id(name, definition.id);
        if let Some(existing) = self.business_transaction_for_id(application.id(), id) {
            return existing;
        }

        let candidate = Arc::new(BusinessTransactionData::new(
            id,
            definition.id,
            Arc::clone(application),
            name,
        ));
        let key = (application.id(), id);
        let (winner, inserted) = publish(&self.business_transactions, key, candidate);

        if inserted {
            tracing::debug!(
                application_id = application.id(),
                business_transaction_id = id,
                definition_id = definition.id,
                name,
                "business transaction registered"
            );
        }
        winner
    }

    /// Application stored under `id`
    #[must_use]
    pub fn application_for_id(&self, id: InstanceId) -> Option<Arc<ApplicationData>> {
        self.applications.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Business transaction stored under `(app_id, business_transaction_id)`
    #[must_use]
    pub fn business_transaction_for_id(
        &self,
        app_id: InstanceId,
        business_transaction_id: InstanceId,
    ) -> Option<Arc<BusinessTransactionData>> {
        self.business_transactions
            .get(&(app_id, business_transaction_id))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Register an application definition together with every business
    /// transaction it declares, using the definition names
    pub fn register_definition(&self, definition: &ApplicationDefinition) -> Arc<ApplicationData> {
        let application = self.register_application(definition);
        for tx in &definition.business_transactions {
            self.register_business_transaction(&application, tx, &tx.business_transaction_name);
        }
        application
    }

    /// Number of registered applications
    #[inline]
    #[must_use]
    pub fn application_count(&self) -> usize {
        self.applications.len()
    }

    /// Number of registered business transactions
    #[inline]
    #[must_use]
    pub fn business_transaction_count(&self) -> usize {
        self.business_transactions.len()
    }
}

impl Default for BusinessContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Store `candidate` under `key` unless a value is already there
///
/// Returns the stored value and whether it is `candidate`.
fn publish<K, V>(map: &DashMap<K, Arc<V>>, key: K, candidate: Arc<V>) -> (Arc<V>, bool)
where
    K: Eq + Hash,
{
    let winner = Arc::clone(
        map.entry(key)
            .or_insert_with(|| Arc::clone(&candidate))
            .value(),
    );
    let inserted = Arc::ptr_eq(&winner, &candidate);
    (winner, inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    fn shop() -> ApplicationDefinition {
        ApplicationDefinition::new(5, "shop")
    }

    #[test]
    fn publish_reports_only_the_winning_insert() {
        const THREADS: usize = 8;

        let map: Arc<DashMap<i32, Arc<usize>>> = Arc::new(DashMap::new());
        let barrier = Arc::new(Barrier::new(THREADS));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let map = Arc::clone(&map);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    publish(&map, 7, Arc::new(i))
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|(_, inserted)| *inserted).count(), 1);
        let (stored, _) = &results[0];
        assert!(results.iter().all(|(value, _)| Arc::ptr_eq(value, stored)));
    }

    #[test]
    fn publish_keeps_existing_value() {
        let map = DashMap::new();
        let (first, inserted) = publish(&map, 1, Arc::new("first"));
        assert!(inserted);

        let (second, inserted) = publish(&map, 1, Arc::new("second"));
        assert!(!inserted);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn registry_new_empty() {
        let registry = BusinessContextRegistry::new();
        assert!(registry.applications().is_empty());
        assert!(registry.business_transactions().is_empty());
    }

    #[test]
    fn register_application_derives_id() {
        let registry = BusinessContextRegistry::new();
        let app = registry.register_application(&shop());

        assert_eq!(app.id(), derive_instance_id("shop", 5));
        assert_eq!(app.definition_id(), 5);
        assert_eq!(app.name(), "shop");
    }

    #[test]
    fn register_application_is_idempotent() {
        let registry = BusinessContextRegistry::new();
        let first = registry.register_application(&shop());
        let second = registry.register_application(&shop());

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.application_count(), 1);
    }

    #[test]
    fn default_application_keeps_first_name() {
        let registry = BusinessContextRegistry::new();
        let first = registry.register_application(&ApplicationDefinition::new(0, "first"));
        let second = registry.register_application(&ApplicationDefinition::new(0, "second"));

        assert_eq!(first.id(), 0);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.name(), "first");
    }

    #[test]
    fn register_business_transaction_uses_given_name() {
        let registry = BusinessContextRegistry::new();
        let app = registry.register_application(&shop());
        let definition = BusinessTransactionDefinition::new(2, "/checkout/*");

        let tx = registry.register_business_transaction(&app, &definition, "/checkout/cart");

        assert_eq!(tx.id(), derive_instance_id("/checkout/cart", 2));
        assert_eq!(tx.definition_id(), 2);
        assert_eq!(tx.name(), "/checkout/cart");
        assert!(Arc::ptr_eq(tx.application(), &app));
    }

    #[test]
    fn same_transaction_id_is_distinct_per_application() {
        let registry = BusinessContextRegistry::new();
        let a = registry.register_application(&ApplicationDefinition::new(1, "a"));
        let b = registry.register_application(&ApplicationDefinition::new(2, "b"));
        let definition = BusinessTransactionDefinition::unknown();

        let tx_a = registry.register_business_transaction(&a, &definition, "x");
        let tx_b = registry.register_business_transaction(&b, &definition, "x");

        assert_eq!(tx_a.id(), tx_b.id());
        assert!(!Arc::ptr_eq(&tx_a, &tx_b));
        assert_eq!(registry.business_transaction_count(), 2);
    }

    #[test]
    fn lookup_by_id() {
        let registry = BusinessContextRegistry::new();
        let app = registry.register_application(&shop());
        let tx = registry.register_business_transaction(
            &app,
            &BusinessTransactionDefinition::new(1, "checkout"),
            "checkout",
        );

        assert!(registry.application_for_id(app.id()).is_some());
        assert!(registry.application_for_id(app.id().wrapping_add(1)).is_none());
        assert!(registry.business_transaction_for_id(app.id(), tx.id()).is_some());
        assert!(registry.business_transaction_for_id(0, tx.id()).is_none());
    }

    #[test]
    fn business_transactions_for_filters_by_application() {
        let registry = BusinessContextRegistry::new();
        let a = registry.register_application(&ApplicationDefinition::new(1, "a"));
        let b = registry.register_application(&ApplicationDefinition::new(2, "b"));
        let definition = BusinessTransactionDefinition::new(1, "tx");

        registry.register_business_transaction(&a, &definition, "one");
        registry.register_business_transaction(&a, &definition, "two");
        registry.register_business_transaction(&b, &definition, "three");

        let for_a = registry.business_transactions_for(a.id());
        assert_eq!(for_a.len(), 2);
        assert!(for_a.iter().all(|tx| tx.application().id() == a.id()));
        assert_eq!(registry.business_transactions_for(b.id()).len(), 1);
        assert!(registry.business_transactions_for(12345).is_empty());
    }

    #[test]
    fn register_definition_registers_declared_transactions() {
        let registry = BusinessContextRegistry::new();
        let definition = shop()
            .with_business_transaction(BusinessTransactionDefinition::new(1, "checkout"))
            .with_business_transaction(BusinessTransactionDefinition::new(2, "search"));

        let app = registry.register_definition(&definition);

        assert_eq!(registry.business_transactions_for(app.id()).len(), 2);
    }
}
