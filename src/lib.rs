// Library exports for inbox-planner
// This allows the modules to be imported in tests and external code

pub mod config;
pub mod llm;
pub mod planning;
