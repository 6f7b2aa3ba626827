//! Internal event macros. They forward to `tracing` when the `tracing`
//! feature is enabled and expand to nothing otherwise.

macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

macro_rules! debug {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

pub(crate) use debug;
pub(crate) use trace;
