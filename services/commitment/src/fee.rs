//! Dust and fee policy shared by the PSBT builder and sweep engine
//!.

/// Outputs below this many sats are omitted; their value joins the
/// fee.
pub const DUST_THRESHOLD: u64 = 546;

/// `fee = fee_rate * (10 + input_vbytes + output_count * 34) + 3 * fee_rate`.
pub fn estimate_fee(fee_rate: u64, input_vbytes: u64, output_count: u64) -> u64 {
    fee_rate * (10 + input_vbytes + output_count * 34) + 3 * fee_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_scales_with_rate_and_shape() {
        assert_eq!(estimate_fee(1, 69, 2), 1 * (10 + 69 + 68) + 3);
        assert_eq!(estimate_fee(2, 69, 2), 2 * (10 + 69 + 68) + 6);
    }
}
