//! Available subcommands.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// List configured services with their group, port, and health
    List,

    /// Start services and tail their output until Ctrl-C
    Up {
        /// Service names from the services file
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },

    /// Start every service of a group and tail their output until Ctrl-C
    Group {
        /// Group tag from the services file
        group: String,
    },

    /// Probe an HTTP health endpoint on localhost
    Probe {
        /// Port to probe
        port: u16,
        /// Request path
        #[arg(long, default_value = "/")]
        path: String,
    },

    /// Terminate whatever is listening on a TCP port
    KillPort {
        /// Port to free
        port: u16,
    },
}
