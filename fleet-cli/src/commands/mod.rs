mod convert;
mod create;
mod deploy;
mod history;
mod projects;
mod root;

// Project listing commands
pub use projects::{run_list, run_show, run_status};

// Lifecycle commands
pub use create::{run_create, run_save};
pub use deploy::{run_cleanup, run_delete, run_deploy};

// Conversion commands
pub use convert::{compose_to_run, run_to_compose};

// History commands
pub use history::run_history;

// Root path commands
pub use root::{set_root, show_root};
