//! Logging macro implementations
//!
//! All service crates log through the macros exported here. Which logger backs them is decided by the
//! `defmt` or `log` feature of this crate; with neither enabled the macros only borrow their arguments.

#[cfg(all(feature = "log", feature = "defmt", not(doc)))]
compile_error!("features `log` and `defmt` are mutually exclusive");

#[cfg(all(not(doc), feature = "defmt"))]
#[doc(hidden)]
pub use defmt as backend;

#[cfg(all(not(doc), feature = "log"))]
#[doc(hidden)]
pub use log as backend;

#[cfg(all(not(doc), any(feature = "defmt", feature = "log")))]
#[doc(hidden)]
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! __emit {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {
        {
            $crate::fmt::backend::$level!($s $(, $x)*);
        }
    };
}

// Also used for `cargo doc`
#[cfg(any(doc, not(any(feature = "defmt", feature = "log"))))]
#[doc(hidden)]
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! __emit {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {
        {
            let _ = ($( & $x ),*);
        }
    };
}

/// Logs a trace message using the underlying logger
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        $crate::__emit!(trace, $s $(, $x)*)
    };
}

/// Logs a debug message using the underlying logger
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        $crate::__emit!(debug, $s $(, $x)*)
    };
}

/// Logs an info message using the underlying logger
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        $crate::__emit!(info, $s $(, $x)*)
    };
}

/// Logs a warning using the underlying logger
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        $crate::__emit!(warn, $s $(, $x)*)
    };
}

/// Logs an error using the underlying logger
#[macro_export]
#[collapse_debuginfo(yes)]
macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        $crate::__emit!(error, $s $(, $x)*)
    };
}
