//! Diagnostics that are forwarded to the `log` crate when the `logging`
//! feature is enabled and compiled away otherwise.

macro_rules! forward {
    ($level:ident, $fmt:literal $(, $($arg:expr),* $(,)?)?) => {
        #[cfg(feature = "logging")]
        ::log::$level!($fmt $(, $($arg),*)?);
        #[cfg(not(feature = "logging"))]
        { $($(let _ = &$arg;)*)? }
    };
}

macro_rules! ldebug {
    ($($tt:tt)*) => {
        crate::log::forward!(debug, $($tt)*)
    };
}

macro_rules! ltrace {
    ($($tt:tt)*) => {
        crate::log::forward!(trace, $($tt)*)
    };
}

macro_rules! lwarn {
    ($($tt:tt)*) => {
        crate::log::forward!(warn, $($tt)*)
    };
}

pub(crate) use {forward, ldebug, ltrace, lwarn};
