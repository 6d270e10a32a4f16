use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Non-finite price: open={open}, close={close}")]
    NonFinitePrice { open: f64, close: f64 },
    #[error("Non-positive price: open={open}, close={close}")]
    NonPositivePrice { open: f64, close: f64 },
}

//represents a single price observation with optional indicator columns
//raw loaded bars carry None indicators; PriceSeries::with_indicators
//produces an annotated snapshot with rsi and fast/slow ema values filled in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub close: f64,
    pub rsi: Option<f64>,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(timestamp: DateTime<Utc>, open: f64, close: f64) -> Result<Self, BarError> {
        //validate finite prices
        if !open.is_finite() || !close.is_finite() {
            return Err(BarError::NonFinitePrice { open, close });
        }

        //validate positive prices
        if open <= 0.0 || close <= 0.0 {
            return Err(BarError::NonPositivePrice { open, close });
        }

        Ok(Bar {
            timestamp,
            open,
            close,
            rsi: None,
            ma_fast: None,
            ma_slow: None,
        })
    }

    //creates a Bar without validation
    pub fn new_unchecked(timestamp: DateTime<Utc>, open: f64, close: f64) -> Self {
        Bar {
            timestamp,
            open,
            close,
            rsi: None,
            ma_fast: None,
            ma_slow: None,
        }
    }

    //returns the rsi and fast/slow ema values if all are present
    //warm-up bars are missing at least one column and generate no signal
    pub fn indicator_values(&self) -> Option<(f64, f64, f64)> {
        match (self.rsi, self.ma_fast, self.ma_slow) {
            (Some(rsi), Some(fast), Some(slow)) => Some((rsi, fast, slow)),
            _ => None,
        }
    }

    //returns the open-to-close move
    pub fn body(&self) -> f64 {
        self.close - self.open
    }
}
