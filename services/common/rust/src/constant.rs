use std::hash::Hash;
use std::str::FromStr;

use crate::error::BookableKindParseError;

pub mod env_vars {
    pub const SYS_BASEPATH: &str = "SYS_BASE_PATH";
    pub const SERVICE_BASEPATH: &str = "SERVICE_BASE_PATH";
    // relative path starting from app / service home folder
    pub const CFG_FILEPATH: &str = "CONFIG_FILE_PATH";
    pub const EXPECTED_LABELS: [&str; 3] = [
        SYS_BASEPATH,
        SERVICE_BASEPATH,
        CFG_FILEPATH,
    ];
}

// the verticals this marketplace sells, all of them are structurally
// identical once they reach the settlement service
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum BookableKind {
    Destination,
    Hotel,
    HireCar,
    Unknown(u8),
}

impl From<u8> for BookableKind {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Destination,
            2 => Self::Hotel,
            3 => Self::HireCar,
            _others => Self::Unknown(value),
        }
    }
}
impl From<BookableKind> for u8 {
    fn from(value: BookableKind) -> u8 {
        match value {
            BookableKind::Unknown(v) => v,
            BookableKind::Destination => 1,
            BookableKind::Hotel => 2,
            BookableKind::HireCar => 3,
        }
    }
}
impl BookableKind {
    // the labels below are also the dispatch keys carried in payment
    // processor metadata, keep them in sync with the vertical services
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::Hotel => "hotel",
            Self::HireCar => "hire-car",
            Self::Unknown(_v) => "unknown",
        }
    }
}
impl FromStr for BookableKind {
    type Err = BookableKindParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "destination" => Ok(Self::Destination),
            "hotel" => Ok(Self::Hotel),
            "hire-car" => Ok(Self::HireCar),
            _others => Err(BookableKindParseError(s.to_string())),
        }
    }
}

pub mod logging {
    use serde::Deserialize;

    #[allow(clippy::upper_case_acronyms)]
    #[derive(Deserialize)]
    pub enum Level {
        TRACE,
        DEBUG,
        INFO,
        WARNING,
        ERROR,
        FATAL,
    }

    #[allow(clippy::upper_case_acronyms)]
    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Destination {
        CONSOLE,
        LOCALFS,
    } // TODO, Fluentd
}
