use serde::{Deserialize, Serialize};

//economics of the traded instrument
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractSpec {
    //contract symbol (eg cl, crudem)
    pub symbol: String,

    //currency value of one full point move per lot
    pub point_value: f64,

    //round-trip transaction cost in parts per billion of turnover
    pub cost_per_notional_ppb: f64,
}

impl ContractSpec {
    pub fn new(symbol: String, point_value: f64, cost_per_notional_ppb: f64) -> Self {
        ContractSpec {
            symbol,
            point_value,
            cost_per_notional_ppb,
        }
    }

    //calculates pnl from a price move
    //price_diff is exit minus entry for longs, entry minus exit for shorts
    pub fn pnl_from_price_move(&self, price_diff: f64, lots: u32) -> f64 {
        price_diff * lots as f64 * self.point_value
    }

    //calculates the brokerage charged on a turnover amount
    pub fn brokerage(&self, turnover: f64) -> f64 {
        turnover / 1_000_000_000.0 * self.cost_per_notional_ppb
    }

    //helper to create a crude oil mini contract
    pub fn crude() -> Self {
        ContractSpec::new(
            "CRUDEM".to_string(),
            100.0, //point_value (100 barrels per lot)
            838.0, //cost_per_notional_ppb
        )
    }
}

impl Default for ContractSpec {
    fn default() -> Self {
        Self::crude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_from_price_move() {
        let contract = ContractSpec::crude();
        assert_eq!(contract.pnl_from_price_move(9.0, 1), 900.0);
        assert_eq!(contract.pnl_from_price_move(-3.0, 2), -600.0);
    }

    #[test]
    fn test_brokerage() {
        let contract = ContractSpec::crude();
        assert_eq!(contract.brokerage(1_000_000_000.0), 838.0);
        assert_eq!(contract.brokerage(0.0), 0.0);
    }
}
