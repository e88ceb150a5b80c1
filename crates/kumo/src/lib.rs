//! Core library for `kumo`.
//! Parses Gherkin documents in any supported dialect, compiles them into a
//! deterministic plan tree, resolves property placeholders and runs the plan
//! against a registry of typed step definitions.
//!
//! Most callers only need [`Engine`]:
//!
//! ```
//! use kumo::config::EngineConfig;
//! use kumo::{Engine, NodeResult, Registry};
//!
//! let mut builder = Registry::builder();
//! builder.step("the light is {state:word}", |_| Ok(None));
//! let engine = Engine::new(EngineConfig::default(), builder).expect("valid registry");
//! let plan = engine
//!     .compile_sources([("light.feature", "Feature: L\n  Scenario: S\n    Given the light is on\n")])
//!     .expect("plan compiles");
//! let table = engine.run(&plan).expect("run completes");
//! assert_eq!(table.result(plan.id), Some(NodeResult::Passed));
//! ```

pub mod config;
pub mod context;
mod engine;
pub mod events;
pub mod execution;
pub mod gherkin;
pub mod localization;
mod panic;
pub mod plan;
pub mod properties;
pub mod registry;
pub mod reporting;
pub mod types;

pub use context::{ScenarioContext, StepRecord};
pub use engine::{Engine, RunError};
pub use execution::{NodeResult, SeverityOrder};
pub use inventory::{iter, submit};
pub use localization::{
    LocalizationError, Localizations, ScopedLocalization, current_languages,
    select_localizations,
};
pub use panic::panic_message;
pub use plan::{NodeId, NodeKind, PlanNode};
pub use registry::{
    AmbiguityPolicy, Registry, RegistryBuilder, RegistryError, StepError, StepInvocation,
    StepMatch,
};
pub use types::{DataType, Value};
