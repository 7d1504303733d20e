use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMode {
    Road,
    Sea,
    Air,
}

impl TransportMode {
    pub const ALL: [TransportMode; 3] = [TransportMode::Road, TransportMode::Sea, TransportMode::Air];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Road => "ROAD",
            TransportMode::Sea => "SEA",
            TransportMode::Air => "AIR",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ROAD" => Ok(TransportMode::Road),
            "SEA" => Ok(TransportMode::Sea),
            "AIR" => Ok(TransportMode::Air),
            other => Err(format!("unknown transport mode: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!("sea".parse::<TransportMode>().unwrap(), TransportMode::Sea);
        assert_eq!("AIR".parse::<TransportMode>().unwrap(), TransportMode::Air);
        assert!("rail".parse::<TransportMode>().is_err());
        assert_eq!(serde_json::to_string(&TransportMode::Road).unwrap(), "\"ROAD\"");
    }
}
