//! Contract Test: Source and Species Selection
//!
//! Verifies how filter selections narrow the draw for each slot.
//!
//! Constraints verified:
//! - A fixed species only draws sources declaring it, with that species
//! - A fixed source only draws that source, with one of its declared species
//! - Species-agnostic sources are drawn with no species
//! - Filters that match nothing, unknown sources, and bad counts are
//!   rejected before anything is fetched

mod common;

use common::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use urag_core::error::Error;
use urag_core::{FetchRequest, ImageResolver, Species};

fn resolver() -> ImageResolver {
    let catalog = catalog_of(vec![
        shared(&Arc::new(ScriptedSource::new("dogs", &["Dog"]))),
        shared(&Arc::new(ScriptedSource::new("cats", &["Cat"]))),
        shared(&Arc::new(ScriptedSource::new("mixed", &["Dog", "Cat", "Bird"]))),
        shared(&Arc::new(ScriptedSource::new("zoo", &[]))),
    ]);
    ImageResolver::new(catalog, &test_config()).unwrap().0
}

#[test]
fn fixed_species_draws_only_declaring_sources() {
    let resolver = resolver();
    let mut rng = StdRng::seed_from_u64(7);

    let plans = resolver
        .plan_batch(&FetchRequest::new(12).with_species("Dog"), &mut rng)
        .unwrap();

    assert_eq!(plans.len(), 12);
    for plan in &plans {
        assert!(
            ["dogs", "mixed"].contains(&plan.source.id()),
            "{} does not declare Dog",
            plan.source.id()
        );
        assert_eq!(plan.species, Some(Species::new("Dog")));
    }
}

#[test]
fn fixed_source_draws_its_declared_species() {
    let resolver = resolver();
    let mut rng = StdRng::seed_from_u64(11);

    let plans = resolver
        .plan_batch(&FetchRequest::new(12).with_source("mixed"), &mut rng)
        .unwrap();

    let declared = [Species::new("Dog"), Species::new("Cat"), Species::new("Bird")];
    for plan in &plans {
        assert_eq!(plan.source.id(), "mixed");
        assert!(declared.contains(plan.species.as_ref().unwrap()));
    }
}

#[test]
fn species_agnostic_source_is_drawn_without_species() {
    let resolver = resolver();
    let mut rng = StdRng::seed_from_u64(3);

    let plans = resolver
        .plan_batch(&FetchRequest::new(4).with_source("zoo"), &mut rng)
        .unwrap();

    assert!(plans.iter().all(|p| p.species.is_none()));
}

#[test]
fn slots_are_numbered_in_order() {
    let resolver = resolver();
    let mut rng = StdRng::seed_from_u64(5);

    let plans = resolver.plan_batch(&FetchRequest::new(5), &mut rng).unwrap();

    let slots: Vec<usize> = plans.iter().map(|p| p.slot).collect();
    assert_eq!(slots, vec![0, 1, 2, 3, 4]);
}

#[test]
fn impossible_selections_are_rejected() {
    let resolver = resolver();
    let mut rng = StdRng::seed_from_u64(1);

    let cases = [
        FetchRequest::new(1).with_species("Axolotl"),
        FetchRequest::new(1).with_source("dogs").with_species("Cat"),
        FetchRequest::new(1).with_source("nope"),
        FetchRequest::new(0),
        FetchRequest::new(13),
    ];

    for request in &cases {
        assert!(
            matches!(
                resolver.plan_batch(request, &mut rng),
                Err(Error::InvalidArgument(_))
            ),
            "{:?} should be rejected",
            request
        );
    }
}

#[tokio::test]
async fn seeded_batches_are_reproducible() {
    let first = resolver();
    let second = resolver();

    let a = first
        .fetch_batch_with_rng(&FetchRequest::new(6), &mut StdRng::seed_from_u64(42))
        .await
        .unwrap();
    let b = second
        .fetch_batch_with_rng(&FetchRequest::new(6), &mut StdRng::seed_from_u64(42))
        .await
        .unwrap();

    let sources = |o: &urag_core::BatchOutcome| {
        o.slots
            .iter()
            .map(|s| (s.source_id.clone(), s.species.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(sources(&a), sources(&b));
}
