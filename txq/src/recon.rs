//! Reconstruction: inverse-transform dequantized coefficients and add
//! them onto the prediction buffer in place. With a zero eob the
//! prediction already is the reconstruction and the buffer is left
//! untouched.

use crate::block::PlaneBuf;
use crate::geom::MI_SIZE_LOG2;
use crate::txfm::{TxfmKernel, TxfmParam};

pub fn reconstruct(
    kernels: &dyn TxfmKernel,
    dqcoeff: &[i32],
    eob: u16,
    param: &TxfmParam,
    dst: &mut PlaneBuf,
    blk_col: usize,
    blk_row: usize,
) {
    if eob == 0 {
        return;
    }
    let mut param = *param;
    param.eob = eob;
    let x0 = blk_col << MI_SIZE_LOG2;
    let y0 = blk_row << MI_SIZE_LOG2;
    kernels.inverse_add(dqcoeff, dst, x0, y0, &param);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BitDepth, TxSize, TxType};
    use crate::txfm::ReferenceKernels;

    fn param(tx_size: TxSize) -> TxfmParam {
        TxfmParam {
            tx_type: TxType::DctDct,
            tx_size,
            lossless: false,
            bit_depth: BitDepth::Eight,
            eob: 0,
        }
    }

    #[test]
    fn zero_eob_leaves_destination_untouched() {
        let mut dst = PlaneBuf::new(8, 8);
        for (i, v) in dst.data.iter_mut().enumerate() {
            *v = (i % 251) as u16;
        }
        let before = dst.data.clone();
        let dqcoeff = vec![999i32; 64];
        reconstruct(
            &ReferenceKernels,
            &dqcoeff,
            0,
            &param(TxSize::Tx8x8),
            &mut dst,
            0,
            0,
        );
        assert_eq!(dst.data, before);
    }

    #[test]
    fn nonzero_eob_adds_residual_at_block_position() {
        let mut dst = PlaneBuf::new(16, 16);
        dst.fill(100);
        let residual = vec![20i32; 16];
        let mut coeff = vec![0i32; 16];
        let p = param(TxSize::Tx4x4);
        ReferenceKernels.forward(&residual, 4, &mut coeff, &p);
        // Blocks at unit (2, 2) map to samples starting at (8, 8).
        reconstruct(&ReferenceKernels, &coeff, 16, &p, &mut dst, 2, 2);
        assert!(dst.get(8, 8) > 110);
        assert_eq!(dst.get(0, 0), 100);
        assert_eq!(dst.get(7, 8), 100);
    }
}
