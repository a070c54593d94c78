mod args;
mod index;
mod search;
mod serve;

pub use args::{Args, Command};
pub use index::{run_index, run_index_status};
pub use search::run_search;
pub use serve::run_search_server;
