pub mod classpath;
pub mod command;
pub mod natives;
pub mod task;

pub use classpath::{build_classpath, escape_spaces};
pub use command::{CommandLine, LaunchParams};
pub use natives::{natives_dir, unpack_natives};
pub use task::{start, write_scripts, LaunchScripts, Started, STATUS_WATCHDOG};
