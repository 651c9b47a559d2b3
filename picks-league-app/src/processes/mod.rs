pub mod recompute_runner;
