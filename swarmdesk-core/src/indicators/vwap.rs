//! Volume-weighted average of the typical price (h + l + c) / 3 across the
//! whole series. Zero total volume falls back to the last close; an empty
//! series yields NaN.

use crate::domain::Candle;

pub fn vwap(candles: &[Candle]) -> f64 {
    let Some(last) = candles.last() else {
        return f64::NAN;
    };
    let (weighted, volume) = candles.iter().fold((0.0, 0.0), |(w, v), c| {
        (w + c.typical_price() * c.volume, v + c.volume)
    });
    if volume == 0.0 {
        return last.close;
    }
    weighted / volume
}
