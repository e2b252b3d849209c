//! Kernel assembly
//!
//! A 3×3 core pattern is mirrored into four orientations and laid out as a
//! 3×3 mosaic of blocks, then rasterized onto an N×N grid:
//!
//! ```text
//! [HV, V,  HV]
//! [H,  O,  H ]
//! [HV, V,  HV]
//! ```
//!
//! Each block spans `ceil(N/3)` cells; inside a block the core is tiled
//! modulo 3. Positions past the last row/column of the grid are dropped.

use gatelattice_core::{
    rotate_pattern, validate_size, CorePattern, KernelSlice, KernelVolume, Result, BASE_PATTERN,
};

/// Rasterize the mirrored mosaic of `core` onto a `size`×`size` slice.
pub fn assemble_kernel(core: &CorePattern, size: usize) -> KernelSlice {
    let original = *core;
    let horizontal = core.map(|mut row| {
        row.reverse();
        row
    });
    let mut vertical = original;
    vertical.reverse();
    let mut both = horizontal;
    both.reverse();

    let parts = [
        [both, vertical, both],
        [horizontal, original, horizontal],
        [both, vertical, both],
    ];
    let block = size.div_ceil(3);

    KernelSlice::from_fn(size, |ky, kx| {
        let part = &parts[ky / block][kx / block];
        part[(ky % block) % 3][(kx % block) % 3]
    })
}

/// Base pattern with every weight advanced `z` palette positions.
pub fn depth_pattern(z: usize) -> CorePattern {
    rotate_pattern(&BASE_PATTERN, z)
}

/// One assembled slice per depth, each from its depth-shifted core.
pub fn build_kernel_volume(size: usize) -> Result<KernelVolume> {
    validate_size(size)?;
    let slices = (0..size)
        .map(|z| assemble_kernel(&depth_pattern(z), size))
        .collect();
    KernelVolume::new(slices)
}
