//! Quantization strategies and the strategy/bit-depth facade. Three live
//! strategies: `Fp` (fast first pass, run before a trellis pass), `B`
//! (standalone, with an optional adaptive-rounding variant), and `Dc`
//! (DC coefficient only). `SkipQuant` bypasses quantization entirely and
//! has no facade entry; selecting it through the facade is a fatal
//! invariant violation.

use crate::geom::{BitDepth, MAX_TX_SQUARE, TxSize};

/// Quantization-matrix weights are 5-bit fixed point; 32 is unity.
pub const QM_BITS: u32 = 5;
pub const QM_UNITY: u8 = 1 << QM_BITS;

static FLAT_QM: [u8; MAX_TX_SQUARE] = [QM_UNITY; MAX_TX_SQUARE];

/// Flat (unweighted) matrix slice for a transform size. Used for 1D and
/// identity transform types, and by the default provider for everything.
pub fn flat_matrix(tx: TxSize) -> &'static [u8] {
    &FLAT_QM[..tx.area()]
}

/// Quantization-matrix pairs keyed by segment and (adjusted) transform
/// size. Matrix construction is an external collaborator; the default
/// provider is unweighted.
pub trait QmProvider {
    fn qmatrix(&self, segment: u8, tx: TxSize) -> &[u8];
    fn iqmatrix(&self, segment: u8, tx: TxSize) -> &[u8];
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatQm;

impl QmProvider for FlatQm {
    fn qmatrix(&self, _segment: u8, tx: TxSize) -> &[u8] {
        flat_matrix(tx)
    }

    fn iqmatrix(&self, _segment: u8, tx: TxSize) -> &[u8] {
        flat_matrix(tx)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XformQuant {
    /// Fast first-pass quantizer, used when a rate-distortion
    /// optimization pass follows.
    Fp,
    /// Standalone quantizer used when no optimization pass follows.
    B,
    /// Quantize the DC coefficient only.
    Dc,
    /// Bypass quantization; the engine forces eob = 0 state elsewhere.
    SkipQuant,
}

/// DC/AC quantizer step pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantStep {
    pub dc: i32,
    pub ac: i32,
}

impl QuantStep {
    /// Unit steps: quantization becomes the identity. Used by lossless
    /// segments.
    pub fn lossless() -> Self {
        Self { dc: 1, ac: 1 }
    }
}

/// Compact monotone step curve standing in for the codec's q-index
/// lookup (quantizer construction is an external collaborator). Steps
/// scale with bit depth so deeper samples quantize comparably.
pub fn qstep(qindex: u8, bit_depth: BitDepth) -> QuantStep {
    let q = qindex as i32;
    let ac = 4 + (q * q) / 36;
    let dc = (ac * 7 / 8).max(4);
    let shift = bit_depth.bits() - 8;
    QuantStep {
        dc: dc << shift,
        ac: ac << shift,
    }
}

/// Immutable per-call quantization parameters.
#[derive(Debug, Clone, Copy)]
pub struct QuantParam<'a> {
    pub log_scale: i32,
    pub tx_size: TxSize,
    pub qmatrix: &'a [u8],
    pub iqmatrix: &'a [u8],
    pub use_quant_b_adapt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rounding {
    /// Quarter-step rounding: biases toward zero, cheap to refine later.
    FirstPass,
    /// Half-step (nearest) rounding.
    Nearest,
    /// Adaptive: nearest for DC, slightly tighter for AC.
    Adaptive,
}

fn quantize_with(
    coeff: &[i32],
    n_coeffs: usize,
    step: QuantStep,
    qparam: &QuantParam<'_>,
    scan: &[u16],
    qcoeff: &mut [i32],
    dqcoeff: &mut [i32],
    rounding: Rounding,
    dc_only: bool,
) -> u16 {
    qcoeff[..n_coeffs].fill(0);
    dqcoeff[..n_coeffs].fill(0);

    let mut eob: u16 = 0;
    let limit = if dc_only { 1 } else { n_coeffs };
    for (i, &sc) in scan[..limit].iter().enumerate() {
        let pos = sc as usize;
        let base = if pos == 0 { step.dc } else { step.ac };
        let wq = ((base as i64 * qparam.qmatrix[pos] as i64) >> QM_BITS) << qparam.log_scale;
        let iwq = ((base as i64 * qparam.iqmatrix[pos] as i64) >> QM_BITS) << qparam.log_scale;
        debug_assert!(wq > 0 && iwq > 0);

        let round = match rounding {
            Rounding::FirstPass => wq >> 2,
            Rounding::Nearest => wq >> 1,
            Rounding::Adaptive => {
                if pos == 0 {
                    wq >> 1
                } else {
                    (wq * 3) >> 3
                }
            }
        };

        let abs_c = coeff[pos].unsigned_abs() as i64;
        let q = (abs_c + round) / wq;
        if q != 0 {
            let q = q.min(i32::MAX as i64);
            let signed = if coeff[pos] < 0 { -q } else { q };
            qcoeff[pos] = signed as i32;
            dqcoeff[pos] = (signed * iwq).clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            eob = (i + 1) as u16;
        }
    }
    eob
}

/// Zeroes a block's quantized state outright: predetermined skip.
pub fn quantize_skip(n_coeffs: usize, qcoeff: &mut [i32], dqcoeff: &mut [i32]) -> u16 {
    qcoeff[..n_coeffs].fill(0);
    dqcoeff[..n_coeffs].fill(0);
    0
}

/// One quantization call through the facade.
pub type QuantFn = fn(
    &[i32],
    usize,
    QuantStep,
    &QuantParam<'_>,
    &[u16],
    &mut [i32],
    &mut [i32],
) -> u16;

fn quantize_fp(
    coeff: &[i32],
    n: usize,
    step: QuantStep,
    qparam: &QuantParam<'_>,
    scan: &[u16],
    qcoeff: &mut [i32],
    dqcoeff: &mut [i32],
) -> u16 {
    quantize_with(
        coeff,
        n,
        step,
        qparam,
        scan,
        qcoeff,
        dqcoeff,
        Rounding::FirstPass,
        false,
    )
}

fn quantize_b(
    coeff: &[i32],
    n: usize,
    step: QuantStep,
    qparam: &QuantParam<'_>,
    scan: &[u16],
    qcoeff: &mut [i32],
    dqcoeff: &mut [i32],
) -> u16 {
    let rounding = if qparam.use_quant_b_adapt {
        Rounding::Adaptive
    } else {
        Rounding::Nearest
    };
    quantize_with(
        coeff, n, step, qparam, scan, qcoeff, dqcoeff, rounding, false,
    )
}

fn quantize_dc(
    coeff: &[i32],
    n: usize,
    step: QuantStep,
    qparam: &QuantParam<'_>,
    scan: &[u16],
    qcoeff: &mut [i32],
    dqcoeff: &mut [i32],
) -> u16 {
    quantize_with(
        coeff,
        n,
        step,
        qparam,
        scan,
        qcoeff,
        dqcoeff,
        Rounding::Nearest,
        true,
    )
}

/// Strategy/bit-depth dispatch table. The intermediate arithmetic is
/// 64-bit for every depth, so both columns of a row share one function;
/// the `SkipQuant` row has no entry and selecting it is fatal at the
/// call site.
pub fn quant_facade(strategy: XformQuant, _bit_depth: BitDepth) -> Option<QuantFn> {
    match strategy {
        XformQuant::Fp => Some(quantize_fp),
        XformQuant::B => Some(quantize_b),
        XformQuant::Dc => Some(quantize_dc),
        XformQuant::SkipQuant => None,
    }
}
