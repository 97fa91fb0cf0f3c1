//! Coefficient scan orders. The 4x4 and 8x8 tables are the codec's
//! default up-triangle scans; larger and rectangular sizes use a
//! generated anti-diagonal order (the entropy coder proper lives outside
//! this core, so scan order is an in-memory contract only).

use crate::geom::TxSize;

pub const DEFAULT_SCAN_4X4: [u16; 16] = [
     0,  4,  1,  2,
     5,  8, 12,  9,
     6,  3,  7, 10,
    13, 14, 11, 15,
];

pub const DEFAULT_SCAN_8X8: [u16; 64] = [
     0,  8,  1,  2,  9, 16, 24, 17,
    10,  3,  4, 11, 18, 25, 32, 40,
    33, 26, 19, 12,  5,  6, 13, 20,
    27, 34, 41, 48, 56, 49, 42, 35,
    28, 21, 14,  7, 15, 22, 29, 36,
    43, 50, 57, 58, 51, 44, 37, 30,
    23, 31, 38, 45, 52, 59, 60, 53,
    46, 39, 47, 54, 61, 62, 55, 63,
];

/// Anti-diagonal scan for a w x h rectangle, DC first.
fn diagonal_scan(w: usize, h: usize) -> Vec<u16> {
    let mut order = Vec::with_capacity(w * h);
    for d in 0..(w + h - 1) {
        for y in 0..h {
            if d >= y && d - y < w {
                let x = d - y;
                order.push((y * w + x) as u16);
            }
        }
    }
    order
}

/// Scan order for a transform size, as raster positions listed in scan
/// order.
pub fn scan_order(tx: TxSize) -> Vec<u16> {
    match tx {
        TxSize::Tx4x4 => DEFAULT_SCAN_4X4.to_vec(),
        TxSize::Tx8x8 => DEFAULT_SCAN_8X8.to_vec(),
        other => diagonal_scan(other.width(), other.height()),
    }
}

/// Scatter `src` (listed in scan order) back into raster positions.
pub fn iscan_into(src: &[i32], dst: &mut [i32], scan: &[u16]) {
    for (i, &pos) in scan.iter().enumerate() {
        dst[pos as usize] = src[i];
    }
}

/// Gather raster-order coefficients into scan order.
pub fn scan_into(src: &[i32], dst: &mut [i32], scan: &[u16]) {
    for (i, &pos) in scan.iter().enumerate() {
        dst[i] = src[pos as usize];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_permutation(order: &[u16], n: usize) {
        let mut seen = vec![false; n];
        for &pos in order {
            assert!((pos as usize) < n);
            assert!(!seen[pos as usize]);
            seen[pos as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn scan_4x4_dc_is_first() {
        assert_eq!(DEFAULT_SCAN_4X4[0], 0);
    }

    #[test]
    fn scan_8x8_dc_is_first() {
        assert_eq!(DEFAULT_SCAN_8X8[0], 0);
    }

    #[test]
    fn scan_4x4_covers_all_positions() {
        assert_permutation(&DEFAULT_SCAN_4X4, 16);
    }

    #[test]
    fn scan_8x8_covers_all_positions() {
        assert_permutation(&DEFAULT_SCAN_8X8, 64);
    }

    #[test]
    fn generated_scans_are_permutations() {
        for tx in [
            TxSize::Tx8x4,
            TxSize::Tx4x8,
            TxSize::Tx16x16,
            TxSize::Tx16x8,
            TxSize::Tx32x32,
            TxSize::Tx64x64,
        ] {
            let order = scan_order(tx);
            assert_eq!(order[0], 0, "{tx:?} DC first");
            assert_permutation(&order, tx.area());
        }
    }

    #[test]
    fn scan_then_iscan_is_identity() {
        let scan = scan_order(TxSize::Tx8x8);
        let src: Vec<i32> = (0..64).map(|v| v * 3 - 32).collect();
        let mut packed = vec![0i32; 64];
        scan_into(&src, &mut packed, &scan);
        let mut unpacked = vec![0i32; 64];
        iscan_into(&packed, &mut unpacked, &scan);
        assert_eq!(src, unpacked);
    }
}
