mod handler;

pub use handler::handle;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List projects, newest first
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Create a project
    Create {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },
}
