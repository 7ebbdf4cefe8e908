//! Position integrator.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// `position += velocity * dt` over every slot, dead ones included.
pub fn integrate(position: &mut [f32], velocity: &[f32], dt: f32) {
    debug_assert_eq!(position.len(), velocity.len());

    #[cfg(feature = "parallel")]
    {
        position
            .par_iter_mut()
            .zip(velocity.par_iter())
            .for_each(|(p, v)| *p += v * dt);
    }

    #[cfg(not(feature = "parallel"))]
    {
        for (p, v) in position.iter_mut().zip(velocity.iter()) {
            *p += v * dt;
        }
    }
}
