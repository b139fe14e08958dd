//! Roll estimation for a single wall.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub const METERS_PER_FOOT: Decimal = Decimal::from_parts(3048, 0, 0, false, 4);
pub const TRIM_BUFFER_M: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
pub const DEFAULT_ROLL_WIDTH_M: Decimal = Decimal::from_parts(53, 0, 0, false, 2);
pub const DEFAULT_ROLL_LENGTH_M: Decimal = Decimal::from_parts(1005, 0, 0, false, 2);
const AREA_WASTE_FACTOR: Decimal = Decimal::from_parts(120, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollEstimate {
    pub rolls_needed: u32,
    pub strips_needed: u32,
    pub strips_per_roll: u32,
    pub wall_width_m: Decimal,
    pub wall_height_m: Decimal,
    pub final_strip_height_m: Decimal,
}

/// Whole count from a non-negative quotient; a zero divisor counts as zero.
fn count(numerator: Decimal, denominator: Decimal, round: fn(&Decimal) -> Decimal) -> u32 {
    numerator
        .checked_div(denominator)
        .map(|q| round(&q).max(Decimal::ZERO))
        .and_then(|q| q.to_u32())
        .unwrap_or(0)
}

/// Rolls needed to paper a wall given in feet. Each strip is the wall height
/// plus one pattern repeat plus a trim buffer; when not even one strip fits in
/// a roll the estimate falls back to wall area with 20% waste.
pub fn calculate_rolls_needed(
    wall_width_ft: Decimal,
    wall_height_ft: Decimal,
    pattern_repeat_m: Decimal,
    roll_width_m: Decimal,
    roll_length_m: Decimal,
) -> RollEstimate {
    let wall_width_m = wall_width_ft * METERS_PER_FOOT;
    let wall_height_m = wall_height_ft * METERS_PER_FOOT;

    let repeat = pattern_repeat_m.max(Decimal::ZERO);
    let final_strip_height_m = wall_height_m + repeat + TRIM_BUFFER_M;

    let strips_per_roll = count(roll_length_m, final_strip_height_m, Decimal::floor);
    let strips_needed = count(wall_width_m, roll_width_m, Decimal::ceil);

    let rolls_needed = if strips_per_roll > 0 {
        strips_needed.div_ceil(strips_per_roll)
    } else {
        let wall_area = wall_width_m * wall_height_m;
        let roll_area = roll_width_m * roll_length_m;
        count(wall_area * AREA_WASTE_FACTOR, roll_area, Decimal::ceil)
    };

    RollEstimate { rolls_needed, strips_needed, strips_per_roll, wall_width_m, wall_height_m, final_strip_height_m }
}

/// [`calculate_rolls_needed`] with the standard 0.53 m x 10.05 m roll.
pub fn standard_rolls_needed(wall_width_ft: Decimal, wall_height_ft: Decimal, pattern_repeat_m: Decimal) -> RollEstimate {
    calculate_rolls_needed(wall_width_ft, wall_height_ft, pattern_repeat_m, DEFAULT_ROLL_WIDTH_M, DEFAULT_ROLL_LENGTH_M)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ft(n: i64) -> Decimal { Decimal::from(n) }

    #[test]
    fn test_standard_wall() {
        // 10ft x 8ft: 3.048m wide -> 6 strips; 2.5384m strips -> 3 per roll
        let est = standard_rolls_needed(ft(10), ft(8), Decimal::ZERO);
        assert_eq!(est.wall_width_m, Decimal::new(3048, 3));
        assert_eq!(est.final_strip_height_m, Decimal::new(25384, 4));
        assert_eq!(est.strips_needed, 6);
        assert_eq!(est.strips_per_roll, 3);
        assert_eq!(est.rolls_needed, 2);
    }

    #[test]
    fn test_pattern_repeat_reduces_strips_per_roll() {
        let plain = standard_rolls_needed(ft(10), ft(8), Decimal::ZERO);
        let repeat = standard_rolls_needed(ft(10), ft(8), Decimal::new(64, 2));
        assert_eq!(repeat.strips_per_roll, 3);
        assert!(repeat.final_strip_height_m > plain.final_strip_height_m);

        let big_repeat = standard_rolls_needed(ft(10), ft(8), Decimal::ONE);
        assert_eq!(big_repeat.strips_per_roll, 2);
        assert_eq!(big_repeat.rolls_needed, 3);
    }

    #[test]
    fn test_wall_taller_than_roll_uses_area() {
        let est = standard_rolls_needed(ft(10), ft(40), Decimal::ZERO);
        assert_eq!(est.strips_per_roll, 0);
        // 3.048 * 12.192 * 1.2 / 5.3265 = 8.37
        assert_eq!(est.rolls_needed, 9);
    }

    #[test]
    fn test_zero_width_roll_does_not_panic() {
        let est = calculate_rolls_needed(ft(10), ft(8), Decimal::ZERO, Decimal::ZERO, DEFAULT_ROLL_LENGTH_M);
        assert_eq!(est.strips_needed, 0);
        assert_eq!(est.rolls_needed, 0);
    }
}
