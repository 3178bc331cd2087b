pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use domain::order::{FulfillmentStage, LineItem, OrderRecord};
pub use domain::playbook::{Playbook, PolicyType};
pub use domain::policy::{default_policies, default_policy, PolicyConfig, PolicyRule, PolicyUpdate};
pub use domain::session::{RestoredSession, SessionState, SyncExport};
pub use domain::simulation::{
    Citation, CitationSource, SimulationLog, SimulationResult, SimulationStatus, TraceStep,
};
pub use engine::{DecisionInput, DeterministicPlaybookEngine, PlaybookEngine, FALLBACK_CONFIDENCE};
pub use errors::{ApplicationError, DomainError, InterfaceError};
