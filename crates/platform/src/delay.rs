//! Calibrated busy-wait delays.
//!
//! Bring-up runs before any timer is configured and while the core clock is
//! still moving, so the only delay available is "execute N iterations". The
//! iteration counts are calibrated for the Mulle's FEE clock and are not
//! derived from a frequency; moving them to another clock means measuring
//! again.

/// Injectable spin capability.
///
/// Implementations must have no observable effect other than elapsed time.
pub trait SpinDelay {
    /// Burn `iterations` loop iterations.
    fn spin(&mut self, iterations: u32);
}

impl<T: SpinDelay + ?Sized> SpinDelay for &mut T {
    fn spin(&mut self, iterations: u32) {
        (**self).spin(iterations);
    }
}

/// One `nop` per iteration on hardware; a spin-loop hint elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyLoop;

impl SpinDelay for BusyLoop {
    #[inline(never)]
    fn spin(&mut self, iterations: u32) {
        for _ in 0..iterations {
            #[cfg(feature = "hardware")]
            cortex_m::asm::nop();
            #[cfg(not(feature = "hardware"))]
            core::hint::spin_loop();
        }
    }
}

/// Zero-time delay for host tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpin;

impl SpinDelay for NoSpin {
    fn spin(&mut self, _iterations: u32) {}
}
