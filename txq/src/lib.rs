#![forbid(unsafe_code)]

//! Residual coding core for a block-based video encoder: per coding
//! block, computes the pixel residual, transforms and quantizes it into
//! sparse coefficients, optionally refines them under a rate-distortion
//! objective, reconstructs the decoded approximation in place, and keeps
//! the neighboring-block entropy contexts that downstream entropy coding
//! conditions on. Prediction, transform kernels, quantization matrices,
//! the trellis search, and the bitstream writer are collaborators behind
//! trait seams.

pub mod block;
pub mod ctx;
pub mod encode;
pub mod error;
pub mod geom;
pub mod mode;
pub mod optimize;
pub mod quant;
pub mod recon;
pub mod scan;
pub mod subtract;
pub mod txfm;
pub mod walk;
pub mod xform;

pub use block::{block_offset, BlockContext, PlaneBuf, SegmentConfig};
pub use encode::{
    encode_block_intra, encode_inter_txfm_block, encode_intra_block_plane, encode_sby_pass1,
    CflStore, EncodeHooks, IntraPredictor, MismatchRecorder, NeighborSeed, Neighbors, SkipLog,
};
pub use error::ContextError;
pub use geom::{BitDepth, BlockSize, TxPartition, TxSize, TxType};
pub use mode::{ModeInfo, RunType};
pub use optimize::{optimize_b, CoeffOptimizer, NoopOptimizer};
pub use quant::{qstep, FlatQm, QmProvider, QuantParam, QuantStep, XformQuant};
pub use recon::reconstruct;
pub use subtract::{subtract_block, subtract_plane, subtract_txb};
pub use txfm::{ReferenceKernels, TxfmKernel, TxfmParam};
pub use walk::{foreach_txb, foreach_txb_in_plane, TxLeaf};
pub use xform::xform_quant;

pub const DEFAULT_QINDEX: u8 = 128;
