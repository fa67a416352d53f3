//! Environment mapping through the scheduler against realistic class indices

use cmr_instrumentation::prelude::*;
use cmr_instrumentation::{InstrumentationPoint, JobError, SchedulerError};
use cmr_test_utils::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

const AGENT: AgentId = AgentId(100);

fn connected(index: Arc<dyn ClassIndex>) -> AgentJobScheduler {
    let scheduler = AgentJobScheduler::new();
    scheduler.connect(AGENT, index).unwrap();
    scheduler
}

fn set(types: &[&str]) -> ChangedTypes {
    types.iter().map(|fqn| class(fqn)).collect()
}

#[test]
fn first_update_returns_empty_and_marks_initialized() {
    let index = shop_index();
    let scheduler = connected(index.clone());

    let changed = scheduler
        .map_environment(AGENT, Some(services_environment()))
        .unwrap();

    assert!(changed.is_empty());
    assert!(scheduler.binding(AGENT).unwrap().holder().is_initialized());
    assert!(index.find_instrumented_types().is_empty());
}

#[test]
fn remap_instruments_matching_types_and_honors_excludes() {
    let index = shop_index();
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();

    let changed = scheduler
        .map_environment(AGENT, Some(services_environment()))
        .unwrap();

    assert_eq!(changed, set(&["com.shop.CartService", "com.shop.OrderService"]));
    assert_eq!(index.find_instrumented_types(), changed);
    assert_eq!(
        index.instrumentation_points(&class("com.shop.OrderService")),
        vec![
            InstrumentationPoint::new("cancel", SensorKind::Timer),
            InstrumentationPoint::new("submit", SensorKind::Timer),
        ]
    );
}

#[test]
fn swap_between_overlapping_profiles_reports_shared_type_once() {
    let index = shop_index();
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();

    let changed = scheduler
        .map_environment(AGENT, Some(cart_environment()))
        .unwrap();

    // CartService is instrumented under both profiles
    assert_eq!(changed.len(), 2);
    assert_eq!(changed, set(&["com.shop.CartService", "com.shop.OrderService"]));
    assert_eq!(index.find_instrumented_types(), set(&["com.shop.CartService"]));
    assert_eq!(
        index.instrumentation_points(&class("com.shop.CartService")),
        vec![InstrumentationPoint::new("add", SensorKind::InvocationSequence)]
    );
}

#[test]
fn swap_to_disjoint_profile_returns_union() {
    let index = shop_index();
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();

    let changed = scheduler
        .map_environment(AGENT, Some(database_environment()))
        .unwrap();

    assert_eq!(
        changed,
        set(&[
            "com.shop.CartService",
            "com.shop.OrderService",
            "com.shop.db.OrderRepository",
        ])
    );
    assert_eq!(index.find_instrumented_types(), set(&["com.shop.db.OrderRepository"]));
}

#[test]
fn swap_to_absent_profile_returns_snapshot_and_empties_index() {
    let index = shop_index();
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    let before = index.find_instrumented_types();

    let changed = scheduler.map_environment(AGENT, None).unwrap();

    assert_eq!(changed, before);
    assert!(index.find_instrumented_types().is_empty());
    let binding = scheduler.binding(AGENT).unwrap();
    assert!(binding.holder().environment().is_none());
    assert!(binding.holder().is_initialized());
}

fn profiles() -> Vec<Environment> {
    vec![
        services_environment(),
        database_environment(),
        cart_environment(),
        Environment::new("empty", "Empty"),
    ]
}

proptest! {
    #[test]
    fn prop_remap_returns_union_of_before_and_after(first in 0..4usize, second in 0..5usize) {
        let index = shop_index();
        let scheduler = connected(index.clone());
        let profiles = profiles();
        scheduler.map_environment(AGENT, Some(profiles[first].clone())).unwrap();
        scheduler.map_environment(AGENT, Some(profiles[first].clone())).unwrap();
        let before = index.find_instrumented_types();

        // Index 4 maps no environment at all
        let changed = scheduler
            .map_environment(AGENT, profiles.get(second).cloned())
            .unwrap();
        let after = index.find_instrumented_types();

        prop_assert_eq!(changed, before.union(&after).cloned().collect::<ChangedTypes>());
        if second == 4 {
            prop_assert!(after.is_empty());
        }
    }
}

#[test]
fn failed_reinstrumentation_leaves_index_cleared() {
    let index = Arc::new(FaultyClassIndex::with_classes(shop_classes()));
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    index.fail_add(true);

    let err = scheduler
        .map_environment(AGENT, Some(database_environment()))
        .unwrap_err();

    assert!(matches!(
        err,
        SchedulerError::Job {
            source: JobError::Reinstrumentation(_),
            ..
        }
    ));
    assert!(!index.partially_instrumented().is_empty());
    assert!(index.find_instrumented_types().is_empty());
    // The holder still moved to the new environment
    let binding = scheduler.binding(AGENT).unwrap();
    assert_eq!(binding.holder().environment().unwrap().id, "database");
}

#[test]
fn failed_clear_aborts_before_rebind() {
    let index = Arc::new(FaultyClassIndex::with_classes(shop_classes()));
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(services_environment())).unwrap();
    index.fail_remove(true);

    let err = scheduler
        .map_environment(AGENT, Some(database_environment()))
        .unwrap_err();

    assert!(matches!(
        err,
        SchedulerError::Job {
            source: JobError::Clear(_),
            ..
        }
    ));
    let binding = scheduler.binding(AGENT).unwrap();
    assert_eq!(binding.holder().environment().unwrap().id, "services");
}

#[test]
fn jobs_on_one_agent_never_overlap() {
    const THREADS: usize = 8;

    let probe = Arc::new(ConcurrencyProbe::with_classes(shop_classes()));
    let scheduler = Arc::new(connected(probe.clone()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let scheduler = Arc::clone(&scheduler);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for round in 0..20 {
                    let env = if (i + round) % 2 == 0 {
                        Some(services_environment())
                    } else {
                        Some(database_environment())
                    };
                    scheduler.map_environment(AGENT, env).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(probe.max_overlap(), 1);
}

#[test]
fn agents_are_independent() {
    let scheduler = Arc::new(AgentJobScheduler::new());
    let indices: Vec<_> = (0..4u64)
        .map(|id| {
            let index = shop_index();
            scheduler.connect(AgentId(id), index.clone()).unwrap();
            index
        })
        .collect();

    let handles: Vec<_> = (0..4u64)
        .map(|id| {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                let env = if id % 2 == 0 {
                    services_environment()
                } else {
                    database_environment()
                };
                scheduler.map_environment(AgentId(id), Some(env.clone())).unwrap();
                scheduler.map_environment(AgentId(id), Some(env)).unwrap()
            })
        })
        .collect();
    let results: Vec<ChangedTypes> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (id, (changed, index)) in results.iter().zip(&indices).enumerate() {
        assert_eq!(&index.find_instrumented_types(), changed);
        let expected: HashSet<_> = if id % 2 == 0 {
            set(&["com.shop.CartService", "com.shop.OrderService"])
        } else {
            set(&["com.shop.db.OrderRepository"])
        };
        assert_eq!(changed, &expected);
    }
}

#[derive(Debug)]
struct RecordOnlyJob {
    binding: AgentBinding,
}

impl ConfigurationChangeJob for RecordOnlyJob {
    const NAME: &'static str = "record-only";

    fn binding(&self) -> &AgentBinding {
        &self.binding
    }

    fn execute(self) -> Result<ChangedTypes, JobError> {
        Ok(self.binding.class_index().find_instrumented_types())
    }
}

#[test]
fn scheduler_runs_custom_jobs_on_the_agent_binding() {
    let index = shop_index();
    let scheduler = connected(index.clone());
    scheduler.map_environment(AGENT, Some(database_environment())).unwrap();
    scheduler.map_environment(AGENT, Some(database_environment())).unwrap();

    let changed = scheduler
        .run(AGENT, |binding| RecordOnlyJob { binding })
        .unwrap();

    assert_eq!(changed, set(&["com.shop.db.OrderRepository"]));
}
