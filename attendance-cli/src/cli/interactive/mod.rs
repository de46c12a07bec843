//! Menu-driven mode: a project directory and a per-project workspace
//!
//! Failed actions are reported and the menu is shown again; only prompt I/O
//! errors end the loop.

mod detail;
mod directory;

pub use detail::open;
pub use directory::browse;

use anyhow::{Result, bail};
use is_terminal::IsTerminal;

use super::output;
use crate::session::SessionError;

fn ensure_terminal() -> Result<()> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        bail!(
            "Interactive mode needs a terminal; use the `projects` and `groups` subcommands instead"
        );
    }
    Ok(())
}

/// Report session failures and keep going; anything else is fatal
fn recover(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<SessionError>() {
            Some(session_err) => {
                output::alert(session_err);
                Ok(())
            }
            None => Err(err),
        },
    }
}
