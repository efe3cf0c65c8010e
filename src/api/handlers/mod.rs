//! API request handlers
//!
//! Provides handler functions for all API endpoints organized by resource.

pub mod executions;
pub mod health;
pub mod scripts;
pub mod system;
pub mod workflows;

pub use executions::{cancel_execution, create_execution, get_execution, list_executions};
pub use health::{health, health_detailed};
pub use scripts::{create_script, delete_script, get_script, list_scripts};
pub use system::{system_info, system_metrics};
pub use workflows::{create_workflow, delete_workflow, get_workflow, list_workflows, update_workflow};
