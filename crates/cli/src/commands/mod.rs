//! Command implementations.

mod info;
mod pending;
mod run;
mod validate;

pub use info::run_info;
pub use pending::run_pending;
pub use run::run_tracking;
pub use validate::run_validate;
