//! Application orchestration module

pub mod initialization;
pub mod execution;
pub mod repository;

pub use repository::{resolve_repositories, resolve_repository};
pub use initialization::{
    load_configuration,
    configure_logging,
    create_colour_manager,
    create_source,
    open_store,
};
pub use execution::{aggregate_repositories, run_command, RepositoryOutcome};
