pub mod groups;
pub mod projects;

pub use groups::GroupCommands;
pub use projects::ProjectCommands;
