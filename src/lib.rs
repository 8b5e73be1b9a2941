// this_file: src/lib.rs

//! flipbook: renders a Lottie animation into a sequence of RGBA frames,
//! encoded as PNG or WebP, with a text-autofit and layer-override
//! preprocessor.
//!
//! ## Architecture
//!
//! - **locator**: C1, finds named layer / text-data / style / animator
//!   substructures inside the animation document.
//! - **overrides**: C2, parses the override document into typed records.
//! - **sizer**: C3, binary-searches a font size that fits a target width.
//! - **measure** / **fontmanager**: C4, measures rendered text width under
//!   three modes (fast / accurate / pixel-perfect).
//! - **mutator** / **assets**: C5, writes the new size/text/animator
//!   positions and image-override asset paths back into the document.
//! - **animation**: C6, the `Animation` trait and per-worker context
//!   construction.
//! - **dispatcher**: C7, frame-count/time computation and round-robin
//!   partitioning.
//! - **worker**: C8, the per-frame render/convert/encode/deliver loop.
//! - **writer**: C9, the ordered stream-mode frame buffer and writer.
//! - **pipeline**: wires C1–C5 together into the override-application pass.
//! - **crash**: process-wide signal handler.
//! - **error**, **logging**, **security**: ambient stack.

pub mod animation;
pub mod assets;
pub mod crash;
pub mod dispatcher;
pub mod encode;
pub mod error;
pub mod fontmanager;
pub mod locator;
pub mod logging;
pub mod measure;
pub mod model;
pub mod mutator;
pub mod overrides;
pub mod pipeline;
pub mod security;
pub mod sizer;
pub mod worker;
pub mod writer;

pub use error::{Error, Result};
