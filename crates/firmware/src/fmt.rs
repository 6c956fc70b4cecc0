//! Logging shim.
//!
//! Hardware builds log through `defmt` (RTT transport); host builds and tests
//! log through `tracing`. Call sites use the crate-local `info!`, `debug!`,
//! `trace!`, `warn!` and `error!` macros and stick to the format subset both
//! backends accept: `{}`, `{:?}` and `{:#x}`.
//!
//! Arguments logged with `{}` or `{:?}` must implement both `defmt::Format`
//! and `Display`/`Debug`; every platform type does under the `defmt` feature.

#![allow(unused_macros)]

macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)+);
        #[cfg(all(not(feature = "defmt"), not(target_os = "none")))]
        ::tracing::trace!($($arg)+);
    }};
}

macro_rules! debug {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)+);
        #[cfg(all(not(feature = "defmt"), not(target_os = "none")))]
        ::tracing::debug!($($arg)+);
    }};
}

macro_rules! info {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)+);
        #[cfg(all(not(feature = "defmt"), not(target_os = "none")))]
        ::tracing::info!($($arg)+);
    }};
}

macro_rules! warn {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)+);
        #[cfg(all(not(feature = "defmt"), not(target_os = "none")))]
        ::tracing::warn!($($arg)+);
    }};
}

macro_rules! error {
    ($($arg:tt)+) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)+);
        #[cfg(all(not(feature = "defmt"), not(target_os = "none")))]
        ::tracing::error!($($arg)+);
    }};
}
