//! Cleanup planner (C3): turns "unexpected reserved resources" into an
//! ordered list of destroy/unreserve recommendations. Pure function, no
//! I/O, same shape as a storage cluster's planner module: compute a
//! decision from a snapshot, return it, let the caller apply it.

use crate::model::{OfferRecommendation, OfferResources};

/// For each resource in each group: if it carries a persistent-volume
/// marker, emit a `Destroy` recommendation; always emit an `Unreserve`
/// recommendation. All `Destroy` recommendations precede all `Unreserve`
/// recommendations in the output, respecting the resource lifecycle
/// `Reserve -> Create -> Destroy -> Unreserve`.
pub fn plan_cleanup(groups: &[OfferResources]) -> Vec<OfferRecommendation> {
    let mut destroys = Vec::new();
    let mut unreserves = Vec::new();

    for group in groups {
        for resource in &group.unexpected {
            if resource.is_persistent_volume() {
                destroys.push(OfferRecommendation::Destroy {
                    offer_id: group.offer.id.clone(),
                    resource: resource.clone(),
                });
            }
            unreserves.push(OfferRecommendation::Unreserve {
                offer_id: group.offer.id.clone(),
                resource: resource.clone(),
            });
        }
    }

    destroys.extend(unreserves);
    destroys
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::model::{Offer, Resource};
    use proptest::prelude::*;

    fn arb_resource() -> impl Strategy<Value = Resource> {
        prop_oneof![
            (any::<u16>()).prop_map(|n| Resource::reserved(format!("res-{n}"))),
            (any::<u16>(), any::<u16>())
                .prop_map(|(v, r)| Resource::reserved_volume(format!("vol-{v}"), format!("res-{r}"))),
        ]
    }

    fn arb_group() -> impl Strategy<Value = OfferResources> {
        (any::<u32>(), prop::collection::vec(arb_resource(), 0..8)).prop_map(|(id, unexpected)| {
            OfferResources {
                offer: Offer::new(format!("o{id}"), "agent-1", vec![]),
                unexpected,
            }
        })
    }

    proptest! {
        /// For any mix of persistent and non-persistent
        /// reservations, every Destroy appears before every Unreserve.
        #[test]
        fn destroy_always_precedes_unreserve(groups in prop::collection::vec(arb_group(), 0..6)) {
            let recs = plan_cleanup(&groups);
            let last_destroy = recs.iter().rposition(|r| matches!(r, OfferRecommendation::Destroy { .. }));
            let first_unreserve = recs.iter().position(|r| matches!(r, OfferRecommendation::Unreserve { .. }));
            if let (Some(last_destroy), Some(first_unreserve)) = (last_destroy, first_unreserve) {
                prop_assert!(last_destroy < first_unreserve);
            }
        }

        /// Every persistent resource produces exactly one Destroy and one
        /// Unreserve; every non-persistent resource produces exactly one
        /// Unreserve and no Destroy.
        #[test]
        fn recommendation_counts_match_input(groups in prop::collection::vec(arb_group(), 0..6)) {
            let total_resources: usize = groups.iter().map(|g| g.unexpected.len()).sum();
            let persistent: usize = groups
                .iter()
                .flat_map(|g| g.unexpected.iter())
                .filter(|r| r.is_persistent_volume())
                .count();
            let recs = plan_cleanup(&groups);
            let destroys = recs.iter().filter(|r| matches!(r, OfferRecommendation::Destroy { .. })).count();
            let unreserves = recs.iter().filter(|r| matches!(r, OfferRecommendation::Unreserve { .. })).count();
            prop_assert_eq!(destroys, persistent);
            prop_assert_eq!(unreserves, total_resources);
        }
    }
}
