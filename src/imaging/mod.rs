//! Image processing — pure Rust, zero external dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3 resampling via the `image` crate |
//! | **Fixed rendition** | `resize_to_fill` (center crop) + `unsharpen` |
//!
//! Renditions keep the source format: JPEG sources produce JPEG variants,
//! PNG sources produce PNG variants (manifest icons are always PNG).
//!
//! The module is split into:
//! - **Calculations**: pure functions for rendition math (unit testable)
//! - **Parameters**: data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: high-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use rust_backend::RustBackend;
// Re-exported for tests (process.rs tests use the mock with dimensions)
#[cfg(test)]
pub use backend::Dimensions;
pub use calculations::{fixed_densities, fluid_widths, scaled_height};
pub use operations::{
    FixedConfig, FluidConfig, FluidPlan, FluidVariant, create_fixed_image, get_dimensions,
    plan_fluid_image,
};
pub use params::{FixedParams, Quality, ResizeParams, Sharpening};
