pub mod command_builder;
pub mod executor;
pub mod request;

pub use command_builder::{RemuxPlan, build_plan};
pub use executor::execute;
pub use request::{Realignment, RemuxRequest};
