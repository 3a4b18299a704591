//! Property-based tests for run plan construction
//!
//! Plans are pure data, so these cover pairing and validation without
//! spawning any thread.

use proptest::prelude::*;
use schedprobe::error::HarnessError;
use schedprobe::plan::RunPlan;
use schedprobe::policy::SchedPolicy;

fn policy_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("FIFO".to_string()),
        Just("NORMAL".to_string()),
        Just("OTHER".to_string()),
        "[A-Z]{1,6}",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_thread_count_is_min_of_lists_and_request(
        policies in prop::collection::vec(policy_token(), 1..12),
        priorities in prop::collection::vec(-5i32..120, 1..12),
        threads in 1i64..16,
    ) {
        let policy_list = policies.join(",");
        let priority_list = priorities
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let plan = RunPlan::from_lists(threads, 0.01, &policy_list, &priority_list).unwrap();

        let expected = policies.len().min(priorities.len()).min(threads as usize);
        prop_assert_eq!(plan.requests().len(), expected);
        prop_assert_eq!(plan.threads_requested(), threads as usize);
        prop_assert_eq!(plan.truncated(), threads as usize - expected);

        for (i, request) in plan.requests().iter().enumerate() {
            prop_assert_eq!(request.policy, SchedPolicy::from_token(&policies[i]));
            prop_assert_eq!(request.priority, priorities[i]);
        }
    }

    #[test]
    fn prop_non_positive_thread_count_rejected(threads in -100i64..1) {
        let err = RunPlan::from_lists(threads, 0.01, "FIFO", "10").unwrap_err();
        prop_assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn prop_negative_wait_rejected(wait in -1.0e6f64..-1.0e-9) {
        prop_assert!(RunPlan::from_lists(1, wait, "FIFO", "10").is_err());
    }

    #[test]
    fn prop_plan_parsing_never_panics(policies in ".{0,40}", priorities in ".{0,40}", threads in -4i64..8) {
        if let Ok(plan) = RunPlan::from_lists(threads, 0.0, &policies, &priorities) {
            prop_assert!(!plan.requests().is_empty());
            prop_assert!(plan.requests().len() <= plan.threads_requested());
        }
    }

    #[test]
    fn prop_only_exact_fifo_is_realtime(token in "[A-Za-z]{0,8}") {
        let policy = SchedPolicy::from_token(&token);
        prop_assert_eq!(policy.is_realtime(), token == "FIFO");
        if !policy.is_realtime() {
            prop_assert_eq!(policy.effective_priority(99), 0);
        }
    }
}
