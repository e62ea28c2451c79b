//! SeaORM entities mapping the `monitors` and `check_results` tables.

pub mod check_result;
pub mod monitor;

// Prelude module for easy importing of entities and their related types.
pub mod prelude {
    pub use super::monitor::ActiveModel as MonitorActiveModel;
    pub use super::monitor::Column as MonitorColumn;
    pub use super::monitor::Entity as Monitor;
    pub use super::monitor::Model as MonitorModel;

    pub use super::check_result::ActiveModel as CheckResultActiveModel;
    pub use super::check_result::Column as CheckResultColumn;
    pub use super::check_result::Entity as CheckResult;
    pub use super::check_result::Model as CheckResultModel;
}
