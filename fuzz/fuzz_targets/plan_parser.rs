#![no_main]

use libfuzzer_sys::fuzz_target;
use schedprobe::plan::RunPlan;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // First line holds the policies, the rest the priorities
        let (policies, priorities) = input.split_once('\n').unwrap_or((input, ""));
        let threads = data.len() as i64 % 64;
        // Must never panic, only accept or reject
        if let Ok(plan) = RunPlan::from_lists(threads, 0.0, policies, priorities) {
            assert!(!plan.requests().is_empty());
            assert!(plan.requests().len() <= plan.threads_requested());
        }
    }
});
