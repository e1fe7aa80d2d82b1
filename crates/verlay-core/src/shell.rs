//! Shell detection, used for PATH diagnostics only.

pub use query_shell::Shell as QueryShell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
    Nushell,
    Elvish,
    Ion,
    Xonsh,
    Unknown,
}

fn from_query_shell(qs: QueryShell) -> Shell {
    match qs {
        QueryShell::Bash => Shell::Bash,
        QueryShell::Zsh => Shell::Zsh,
        QueryShell::Fish => Shell::Fish,
        QueryShell::Powershell => Shell::Powershell,
        QueryShell::Nushell => Shell::Nushell,
        QueryShell::Elvish => Shell::Elvish,
        QueryShell::Ion => Shell::Ion,
        QueryShell::Xonsh => Shell::Xonsh,
        _ => Shell::Unknown,
    }
}

/// Detect the calling shell; `None` when detection fails.
pub fn detect() -> Option<Shell> {
    query_shell::get_shell().ok().map(from_query_shell)
}

impl Shell {
    pub fn name(&self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Zsh => "zsh",
            Shell::Fish => "fish",
            Shell::Powershell => "powershell",
            Shell::Nushell => "nushell",
            Shell::Elvish => "elvish",
            Shell::Ion => "ion",
            Shell::Xonsh => "xonsh",
            Shell::Unknown => "unknown",
        }
    }
}
