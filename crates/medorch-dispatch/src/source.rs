//! The fixed set of retail sources a lookup key is resolved against.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Apollo,
    Netmed,
}

impl SourceId {
    /// Every source, in the order records list them.
    pub const ALL: [SourceId; 2] = [SourceId::Apollo, SourceId::Netmed];

    /// Mode tag passed to the worker, which is also the payload field name
    /// the worker echoes back.
    #[must_use]
    pub const fn mode(self) -> &'static str {
        match self {
            SourceId::Apollo => "apollo",
            SourceId::Netmed => "netmed",
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mode())
    }
}

impl FromStr for SourceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apollo" => Ok(SourceId::Apollo),
            "netmed" => Ok(SourceId::Netmed),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}
