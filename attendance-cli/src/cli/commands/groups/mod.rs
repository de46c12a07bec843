mod handler;

pub use handler::handle;

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List a project's saved attendance groups
    List {
        /// Project id or name
        project: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print one group as a table
    Show {
        project: String,
        /// Group id or title
        group: String,
    },

    /// Upload a spreadsheet and save the chosen columns as a new group
    Create {
        project: String,

        /// Spreadsheet to upload
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        title: String,

        /// Column to keep; repeat for several. The first one is the key column.
        #[arg(long = "column", short = 'c', required = true)]
        columns: Vec<String>,
    },

    /// Change one cell of a saved group
    SetCell {
        project: String,
        group: String,

        /// 1-based row number as shown by `groups show`
        #[arg(long)]
        row: usize,

        #[arg(long)]
        column: String,

        #[arg(long)]
        value: String,
    },

    /// Give a saved group a new title
    Rename {
        project: String,
        group: String,

        #[arg(long)]
        title: String,
    },

    /// Permanently delete a saved group
    Delete {
        project: String,
        group: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}
