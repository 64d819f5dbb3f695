//! Workflow operation kinds
//!
//! Only used as a hint by template expansion: directory transfers reduce a
//! file pattern to its directory part.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Shell,
    Python,
    Mkdir,
    Touch,
    Copy,
    Move,
    Remove,
    Rmtree,
    Copytree,
    Movetree,
    Build,
    Test,
    Run,
}

impl OperationType {
    pub const ALL: [OperationType; 13] = [
        OperationType::Shell,
        OperationType::Python,
        OperationType::Mkdir,
        OperationType::Touch,
        OperationType::Copy,
        OperationType::Move,
        OperationType::Remove,
        OperationType::Rmtree,
        OperationType::Copytree,
        OperationType::Movetree,
        OperationType::Build,
        OperationType::Test,
        OperationType::Run,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Shell => "shell",
            OperationType::Python => "python",
            OperationType::Mkdir => "mkdir",
            OperationType::Touch => "touch",
            OperationType::Copy => "copy",
            OperationType::Move => "move",
            OperationType::Remove => "remove",
            OperationType::Rmtree => "rmtree",
            OperationType::Copytree => "copytree",
            OperationType::Movetree => "movetree",
            OperationType::Build => "build",
            OperationType::Test => "test",
            OperationType::Run => "run",
        }
    }

    /// Whether the operation moves or copies a whole directory
    pub fn is_directory_transfer(self) -> bool {
        matches!(self, OperationType::Copytree | OperationType::Movetree)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        OperationType::ALL
            .into_iter()
            .find(|op| op.as_str() == lowered)
            .ok_or_else(|| {
                let known: Vec<_> = OperationType::ALL.iter().map(|op| op.as_str()).collect();
                Error::parse(format!("Unknown operation type '{}'", s))
                    .with_help(format!("Expected one of: {}", known.join(", ")))
            })
    }
}
