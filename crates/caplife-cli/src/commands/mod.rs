//! Command implementations.

pub mod cleanup;
pub mod migrate;
pub mod run;
pub mod status;

pub use self::cleanup::execute_cleanup;
pub use self::migrate::execute_migrate;
pub use self::run::execute_run;
pub use self::status::execute_status;
