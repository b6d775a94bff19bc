//! Internal progress logging, forwarded to the `log` facade when the `log` feature is enabled.

macro_rules! info {
    ($($tokens:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::log::info!(target: "rtos_test", $($tokens)*)
        }
    }
}

macro_rules! error {
    ($($tokens:tt)*) => {
        #[cfg(feature = "log")]
        {
            ::log::error!(target: "rtos_test", $($tokens)*)
        }
    }
}

pub(crate) use {error, info};
