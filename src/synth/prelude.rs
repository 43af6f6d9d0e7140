// Prelude module for target-dependent re-exports

// fmt
pub use core::fmt;

// collections
#[cfg(target_arch = "wasm32")]
pub use hashbrown::HashMap;
#[cfg(not(target_arch = "wasm32"))]
pub use std::collections::HashMap;

// constants
pub use core::f32::consts::{FRAC_1_SQRT_2, PI, TAU};
