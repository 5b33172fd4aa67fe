//! Signal types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters shared by every actionable signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalParams {
    /// Pair label, e.g. `PHILLIPS_A-PHILLIPS_B`
    pub pair_id: String,
    /// Volume per leg; zero for closes, which size from observed positions
    pub target_volume: u64,
}

/// Payload of an actionable signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDetail {
    /// Human-readable trigger description
    pub reason: String,
    pub params: SignalParams,
    /// Mid-price spread that triggered the signal
    pub spread: Decimal,
    /// Band edge the spread crossed
    pub threshold: Decimal,
}

/// Output of one signal evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// Long A, short B
    OpenLongPair(SignalDetail),
    /// Short A, long B
    OpenShortPair(SignalDetail),
    /// Flatten both legs
    ClosePosition(SignalDetail),
    /// Nothing to do this tick
    None,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::OpenLongPair(_) => SignalKind::OpenLongPair,
            Signal::OpenShortPair(_) => SignalKind::OpenShortPair,
            Signal::ClosePosition(_) => SignalKind::ClosePosition,
            Signal::None => SignalKind::None,
        }
    }

    pub fn detail(&self) -> Option<&SignalDetail> {
        match self {
            Signal::OpenLongPair(d) | Signal::OpenShortPair(d) | Signal::ClosePosition(d) => Some(d),
            Signal::None => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Signal::OpenLongPair(_) | Signal::OpenShortPair(_))
    }
}

/// Signal discriminant, used for logging and metric labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    OpenLongPair,
    OpenShortPair,
    ClosePosition,
    None,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::OpenLongPair => "open_long_pair",
            SignalKind::OpenShortPair => "open_short_pair",
            SignalKind::ClosePosition => "close_position",
            SignalKind::None => "none",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry and exit bands around the effective mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub effective_mean: Decimal,
    pub upper_entry: Decimal,
    pub lower_entry: Decimal,
    pub upper_exit: Decimal,
    pub lower_exit: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn detail() -> SignalDetail {
        SignalDetail {
            reason: "test".to_string(),
            params: SignalParams {
                pair_id: "A-B".to_string(),
                target_volume: 10,
            },
            spread: dec!(1.06),
            threshold: dec!(1.04),
        }
    }

    #[test]
    fn test_signal_kind() {
        assert_eq!(Signal::OpenLongPair(detail()).kind(), SignalKind::OpenLongPair);
        assert_eq!(Signal::OpenShortPair(detail()).kind(), SignalKind::OpenShortPair);
        assert_eq!(Signal::ClosePosition(detail()).kind(), SignalKind::ClosePosition);
        assert_eq!(Signal::None.kind(), SignalKind::None);
    }

    #[test]
    fn test_signal_detail_accessor() {
        assert_eq!(Signal::OpenShortPair(detail()).detail().unwrap().threshold, dec!(1.04));
        assert!(Signal::None.detail().is_none());
    }

    #[test]
    fn test_is_open() {
        assert!(Signal::OpenLongPair(detail()).is_open());
        assert!(Signal::OpenShortPair(detail()).is_open());
        assert!(!Signal::ClosePosition(detail()).is_open());
        assert!(!Signal::None.is_open());
    }

    #[test]
    fn test_signal_kind_serializes_snake_case() {
        let json = serde_json::to_string(&SignalKind::OpenShortPair).unwrap();
        assert_eq!(json, "\"open_short_pair\"");
        assert_eq!(SignalKind::ClosePosition.to_string(), "close_position");
    }
}
