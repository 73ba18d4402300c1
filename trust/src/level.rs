use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TrustError;

/// Discrete risk tier. Ordered by risk: `High < Medium < Low < Critical`,
/// so `max` picks the more restrictive level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    High,
    Medium,
    Low,
    Critical,
}

impl TrustLevel {
    pub const ALL: [TrustLevel; 4] = [Self::High, Self::Medium, Self::Low, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Critical => "critical",
        }
    }

    /// LOW and CRITICAL.
    pub fn is_reduced(&self) -> bool {
        matches!(self, Self::Low | Self::Critical)
    }

    /// Band lookup on a score in hundredths.
    pub(crate) fn from_score_units(units: i32) -> Self {
        match units {
            80.. => Self::High,
            50..=79 => Self::Medium,
            30..=49 => Self::Low,
            _ => Self::Critical,
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrustLevel {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "critical" => Ok(Self::Critical),
            _ => Err(TrustError::UnknownLevel(s.to_string())),
        }
    }
}

/// Risk attached to where the call comes from. Only `High` affects the
/// score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRisk {
    Low,
    Medium,
    High,
}

impl LocationRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for LocationRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationRisk {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(TrustError::UnknownLocationRisk(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_by_risk() {
        assert!(TrustLevel::High < TrustLevel::Medium);
        assert!(TrustLevel::Medium < TrustLevel::Low);
        assert!(TrustLevel::Low < TrustLevel::Critical);
        assert_eq!(TrustLevel::High.max(TrustLevel::Low), TrustLevel::Low);
    }

    #[test]
    fn bands_have_inclusive_lower_bounds() {
        assert_eq!(TrustLevel::from_score_units(100), TrustLevel::High);
        assert_eq!(TrustLevel::from_score_units(80), TrustLevel::High);
        assert_eq!(TrustLevel::from_score_units(79), TrustLevel::Medium);
        assert_eq!(TrustLevel::from_score_units(50), TrustLevel::Medium);
        assert_eq!(TrustLevel::from_score_units(49), TrustLevel::Low);
        assert_eq!(TrustLevel::from_score_units(30), TrustLevel::Low);
        assert_eq!(TrustLevel::from_score_units(29), TrustLevel::Critical);
        assert_eq!(TrustLevel::from_score_units(0), TrustLevel::Critical);
        assert_eq!(TrustLevel::from_score_units(-20), TrustLevel::Critical);
    }

    #[test]
    fn parse_and_serde() {
        for level in TrustLevel::ALL {
            assert_eq!(level.as_str().parse::<TrustLevel>().unwrap(), level);
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{level}\""));
        }
        assert_eq!("CRITICAL".parse::<TrustLevel>().unwrap(), TrustLevel::Critical);
        assert!("extreme".parse::<TrustLevel>().is_err());
        assert_eq!("High".parse::<LocationRisk>().unwrap(), LocationRisk::High);
        assert!("nowhere".parse::<LocationRisk>().is_err());
    }
}
