mod list;
mod plan;
mod run;

pub use list::cmd_list;
pub use plan::cmd_plan;
pub use run::{RunOptions, cmd_run};
