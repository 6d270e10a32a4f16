//relative strength index and exponential moving average over a close column
//both return one slot per input value, None during the warm-up window

//calculates an exponential moving average seeded with the sma of the first
//period values
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];

    if period == 0 || values.len() < period {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    //seed with sma of the first period values
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..values.len() {
        let next = (values[i] - prev) * multiplier + prev;
        result[i] = Some(next);
        prev = next;
    }

    result
}

//calculates the relative strength index with wilder smoothing
//needs period + 1 values before the first defined slot
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];

    if period == 0 || values.len() < period + 1 {
        return result;
    }

    //seed: average gain and loss over the first period changes
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    result[period] = Some(rsi_value(avg_gain, avg_loss));

    //wilder smoothing for subsequent values
    for i in (period + 1)..values.len() {
        let change = values[i] - values[i - 1];
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;

        result[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_warmup_and_seed() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = ema(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(2.0));
        assert!(result[3].unwrap() > 2.0);
    }

    #[test]
    fn test_ema_short_input() {
        let values = vec![1.0, 2.0];
        assert!(ema(&values, 3).iter().all(|slot| slot.is_none()));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let values = vec![100.0, 101.0, 102.0, 103.0, 104.0, 105.0];
        let result = rsi(&values, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[2], None);
        assert_eq!(result[3], Some(100.0));
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn test_rsi_all_losses_is_0() {
        let values = vec![105.0, 104.0, 103.0, 102.0, 101.0];
        let result = rsi(&values, 3);

        assert_eq!(result[3], Some(0.0));
    }

    #[test]
    fn test_rsi_flat_is_50() {
        let values = vec![100.0; 6];
        let result = rsi(&values, 3);

        assert_eq!(result[3], Some(50.0));
    }

    #[test]
    fn test_rsi_mixed_stays_in_bounds() {
        let values = vec![100.0, 102.0, 99.0, 103.0, 98.0, 104.0, 97.0];
        for slot in rsi(&values, 3).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&slot));
        }
    }
}
