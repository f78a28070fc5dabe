use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Trading action derived from the latest bar's breakout flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// Classify a pair of breakout flags. A bar flagged both ways is a BUY.
    pub fn classify(buy: bool, sell: bool) -> Self {
        if buy {
            if sell {
                tracing::warn!("bar carries both buy and sell flags; resolving as BUY");
            }
            Self::Buy
        } else if sell {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    /// Position implied by the signal: +1 long, -1 short, 0 flat.
    pub const fn position(self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
            Self::Hold => 0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_takes_precedence() {
        assert_eq!(Signal::classify(true, true), Signal::Buy);
        assert_eq!(Signal::classify(true, false), Signal::Buy);
        assert_eq!(Signal::classify(false, true), Signal::Sell);
        assert_eq!(Signal::classify(false, false), Signal::Hold);
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Hold).expect("json"), "\"HOLD\"");
    }
}
