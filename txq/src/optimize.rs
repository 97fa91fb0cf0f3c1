//! Rate-distortion coefficient optimization contract. The trellis search
//! itself is an external collaborator behind `CoeffOptimizer`; this
//! module owns the gating logic deciding when a block is eligible at
//! all, and the skip-cost estimate returned when it is not.

use crate::block::{block_offset, BlockContext};
use crate::ctx::{txb_entropy_context, TxbCtx};
use crate::geom::{TxSize, TxType};
use crate::quant::QuantStep;
use crate::scan::scan_order;

/// Rewrites a block's quantized coefficients into a rate-distortion
/// preferable sparser set. Returns the (possibly reduced) eob and a rate
/// estimate for the rewritten block.
pub trait CoeffOptimizer {
    #[allow(clippy::too_many_arguments)]
    fn optimize_txb(
        &self,
        coeff: &[i32],
        qcoeff: &mut [i32],
        dqcoeff: &mut [i32],
        eob: u16,
        tx_size: TxSize,
        tx_type: TxType,
        txb_ctx: &TxbCtx,
        step: QuantStep,
        fast_mode: bool,
        sharpness: u8,
    ) -> (u16, u32);
}

/// Pass-through optimizer: keeps the coefficients and estimates their
/// rate. Stands in when no trellis collaborator is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopOptimizer;

impl CoeffOptimizer for NoopOptimizer {
    fn optimize_txb(
        &self,
        _coeff: &[i32],
        qcoeff: &mut [i32],
        _dqcoeff: &mut [i32],
        eob: u16,
        tx_size: TxSize,
        _tx_type: TxType,
        txb_ctx: &TxbCtx,
        _step: QuantStep,
        _fast_mode: bool,
        _sharpness: u8,
    ) -> (u16, u32) {
        let scan = scan_order(tx_size);
        (eob, estimate_txb_rate(qcoeff, &scan, eob, txb_ctx))
    }
}

/// A very rough bit-cost heuristic for a coded transform block. The real
/// cost comes from the entropy coder's probability state; this only has
/// to rank alternatives sensibly.
pub fn estimate_txb_rate(qcoeff: &[i32], scan: &[u16], eob: u16, txb_ctx: &TxbCtx) -> u32 {
    let mut bits = 4 + txb_ctx.txb_skip_ctx as u32;
    for &pos in &scan[..eob as usize] {
        let level = qcoeff[pos as usize].unsigned_abs();
        bits += match level {
            0 => 1,
            1 => 3,
            2 => 5,
            _ => 7 + (32 - level.leading_zeros()),
        };
    }
    bits
}

/// Cost of signaling the block as all-zero.
pub fn cost_skip_txb(txb_ctx: &TxbCtx, _tx_size: TxSize) -> u32 {
    2 + txb_ctx.txb_skip_ctx as u32
}

/// Optimization gate: degenerate blocks (eob = 0), segments with
/// optimization disabled, and lossless segments (no coefficient may be
/// altered) skip the search and cost the block as-is. Everything else is
/// handed to the collaborator; its result replaces the block's eob and
/// entropy summary.
#[allow(clippy::too_many_arguments)]
pub fn optimize_b(
    ctx: &mut BlockContext,
    optimizer: &dyn CoeffOptimizer,
    plane: usize,
    block: usize,
    tx_size: TxSize,
    tx_type: TxType,
    txb_ctx: &TxbCtx,
    fast_mode: bool,
) -> (u16, u32) {
    let eob = ctx.planes[plane].eobs[block];
    if eob == 0 || !ctx.optimize_enabled() || ctx.lossless() {
        return (eob, cost_skip_txb(txb_ctx, tx_size));
    }

    let step = crate::quant::qstep(ctx.qindex, ctx.bit_depth);
    let sharpness = ctx.sharpness;
    let off = block_offset(block);
    let area = tx_size.area();
    let p = &mut ctx.planes[plane];
    let (new_eob, rate) = optimizer.optimize_txb(
        &p.coeff[off..off + area],
        &mut p.qcoeff[off..off + area],
        &mut p.dqcoeff[off..off + area],
        eob,
        tx_size,
        tx_type,
        txb_ctx,
        step,
        fast_mode,
        sharpness,
    );
    assert!(new_eob <= eob, "optimizer grew the coefficient run");

    let scan = scan_order(tx_size);
    p.eobs[block] = new_eob;
    p.txb_entropy_ctx[block] =
        txb_entropy_context(&p.qcoeff[off..off + area], &scan, new_eob);
    (new_eob, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BitDepth, BlockSize};
    use crate::quant::FlatQm;
    use crate::subtract::subtract_plane;
    use crate::txfm::ReferenceKernels;
    use crate::quant::XformQuant;
    use crate::xform::xform_quant;

    /// Test collaborator: zeroes every coefficient above a scan cutoff.
    struct TailDropper {
        keep: u16,
    }

    impl CoeffOptimizer for TailDropper {
        fn optimize_txb(
            &self,
            _coeff: &[i32],
            qcoeff: &mut [i32],
            dqcoeff: &mut [i32],
            eob: u16,
            tx_size: TxSize,
            _tx_type: TxType,
            txb_ctx: &TxbCtx,
            _step: QuantStep,
            _fast_mode: bool,
            _sharpness: u8,
        ) -> (u16, u32) {
            let scan = scan_order(tx_size);
            let new_eob = eob.min(self.keep);
            for &pos in &scan[new_eob as usize..eob as usize] {
                qcoeff[pos as usize] = 0;
                dqcoeff[pos as usize] = 0;
            }
            (new_eob, estimate_txb_rate(qcoeff, &scan, new_eob, txb_ctx))
        }
    }

    fn busy_context() -> BlockContext {
        let mut ctx =
            BlockContext::new(BlockSize::B8x8, BitDepth::Eight, 1, 0, 0).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                ctx.planes[0].src.set(x, y, (40 + 23 * x + 17 * y) as u16);
            }
        }
        ctx.planes[0].dst.fill(60);
        subtract_plane(&mut ctx, BlockSize::B8x8, 0);
        xform_quant(
            &mut ctx,
            &ReferenceKernels,
            &FlatQm,
            0,
            0,
            0,
            0,
            BlockSize::B8x8,
            TxSize::Tx8x8,
            TxType::DctDct,
            XformQuant::Fp,
        );
        ctx
    }

    #[test]
    fn optimizer_can_reduce_eob() {
        let mut ctx = busy_context();
        let eob_before = ctx.planes[0].eobs[0];
        assert!(eob_before > 2);
        let txb_ctx = TxbCtx {
            txb_skip_ctx: 0,
            dc_sign_ctx: 0,
        };
        let dropper = TailDropper { keep: 2 };
        let (eob, _rate) = optimize_b(
            &mut ctx,
            &dropper,
            0,
            0,
            TxSize::Tx8x8,
            TxType::DctDct,
            &txb_ctx,
            false,
        );
        assert_eq!(eob, 2);
        assert_eq!(ctx.planes[0].eobs[0], 2);
        // The summary was recomputed from the rewritten coefficients.
        assert_ne!(ctx.planes[0].txb_entropy_ctx[0], 0);
    }

    #[test]
    fn lossless_segment_bypasses_optimizer() {
        let mut ctx = busy_context();
        ctx.seg.lossless[0] = true;
        let eob_before = ctx.planes[0].eobs[0];
        let txb_ctx = TxbCtx {
            txb_skip_ctx: 1,
            dc_sign_ctx: 0,
        };
        let dropper = TailDropper { keep: 1 };
        let (eob, rate) = optimize_b(
            &mut ctx,
            &dropper,
            0,
            0,
            TxSize::Tx8x8,
            TxType::DctDct,
            &txb_ctx,
            false,
        );
        assert_eq!(eob, eob_before);
        assert_eq!(rate, cost_skip_txb(&txb_ctx, TxSize::Tx8x8));
    }

    #[test]
    fn disabled_segment_bypasses_optimizer() {
        let mut ctx = busy_context();
        ctx.seg.optimize[0] = false;
        let eob_before = ctx.planes[0].eobs[0];
        let txb_ctx = TxbCtx {
            txb_skip_ctx: 0,
            dc_sign_ctx: 0,
        };
        let (eob, _) = optimize_b(
            &mut ctx,
            &TailDropper { keep: 1 },
            0,
            0,
            TxSize::Tx8x8,
            TxType::DctDct,
            &txb_ctx,
            true,
        );
        assert_eq!(eob, eob_before);
    }

    #[test]
    fn zero_eob_costs_as_skip() {
        let mut ctx =
            BlockContext::new(BlockSize::B8x8, BitDepth::Eight, 1, 0, 0).unwrap();
        let txb_ctx = TxbCtx {
            txb_skip_ctx: 3,
            dc_sign_ctx: 0,
        };
        let (eob, rate) = optimize_b(
            &mut ctx,
            &NoopOptimizer,
            0,
            0,
            TxSize::Tx8x8,
            TxType::DctDct,
            &txb_ctx,
            false,
        );
        assert_eq!(eob, 0);
        assert_eq!(rate, cost_skip_txb(&txb_ctx, TxSize::Tx8x8));
    }
}
