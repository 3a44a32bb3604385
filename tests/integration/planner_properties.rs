//! Property-based tests for batch plan arithmetic

use corpusgen::generation::BatchPlan;
use proptest::prelude::*;

proptest! {
    #[test]
    fn plan_covers_total_exactly(total in 1usize..5_000, size in 1usize..500) {
        let plan = BatchPlan::new(total, size).unwrap();
        let batches = plan.batches();

        prop_assert_eq!(batches.len(), total.div_ceil(size));
        prop_assert_eq!(plan.total_batches, batches.len());
        prop_assert_eq!(batches.iter().map(|b| b.target_count).sum::<usize>(), total);
    }

    #[test]
    fn only_the_last_batch_may_be_short(total in 1usize..5_000, size in 1usize..500) {
        let batches = BatchPlan::new(total, size).unwrap().batches();
        let (last, full) = batches.split_last().unwrap();

        prop_assert!(full.iter().all(|b| b.target_count == size));
        prop_assert!(last.target_count >= 1 && last.target_count <= size);
        for (position, batch) in batches.iter().enumerate() {
            prop_assert_eq!(batch.index, position);
        }
    }

    #[test]
    fn batch_target_never_exceeds_remaining(
        total in 1usize..1_000,
        size in 1usize..100,
        requested in 0usize..2_000,
    ) {
        let plan = BatchPlan::new(total, size).unwrap();
        match plan.batch_target(requested) {
            Some(target) => {
                prop_assert!(requested < total);
                prop_assert_eq!(target, size.min(total - requested));
            }
            None => prop_assert!(requested >= total),
        }
    }
}

#[test]
fn zero_inputs_are_rejected() {
    assert!(BatchPlan::new(0, 1).is_err());
    assert!(BatchPlan::new(1, 0).is_err());
}
