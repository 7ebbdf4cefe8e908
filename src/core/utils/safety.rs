//! Zero-Cost Safety Macros
//!
//! Kernels index the flat particle buffers (`2N`, `2N`, `5N` floats) and the
//! half-resolution grids in tight loops. Slot and cell indices are derived from
//! bounds-checked coordinates before they reach these macros.
//!
//! In Debug mode: Normal bounds-checked access (panics with useful errors)
//! In Release mode: Unsafe unchecked access (zero overhead)
//!
//! Usage:
//! ```rust
//! use lavaflow_engine::fast;
//!
//! let slot = 1;
//!
//! // attributes: [type, heat, radius, viscosity, life] per slot
//! let attrs = vec![0.0f32, 0.0, 3.2, 1.0, 1.0, 1.0, 0.5, 3.5, 6.0, 1.0];
//! let heat = *fast!(attrs, [slot * 5 + 1]);
//! assert_eq!(heat, 0.5);
//!
//! let mut life = vec![1.0f32; 4];
//! fast!(life, [slot] = 0.0);
//! assert_eq!(life[slot], 0.0);
//! ```

/// Bounds checks in debug builds, `get_unchecked` in release builds.
#[macro_export]
macro_rules! fast {
    // Read pattern: fast!(slice, [index])
    ($slice:expr, [$index:expr]) => {{
        #[cfg(debug_assertions)]
        {
            &$slice[$index]
        }
        #[cfg(not(debug_assertions))]
        {
            unsafe { $slice.get_unchecked($index) }
        }
    }};

    // Write pattern: fast!(slice, [index] = value)
    ($slice:expr, [$index:expr] = $val:expr) => {{
        #[cfg(debug_assertions)]
        {
            $slice[$index] = $val;
        }
        #[cfg(not(debug_assertions))]
        {
            unsafe {
                *$slice.get_unchecked_mut($index) = $val;
            }
        }
    }};
}
