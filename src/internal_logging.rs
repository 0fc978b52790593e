#![allow(unused_macros)]
//! Internal diagnostic logging.
//!
//! These macros (`spanq_debug!`, `spanq_warn!`, `spanq_error!`) report the
//! crate's own operational events: dropped spans, failing hooks, malformed
//! propagation headers. They are not a general application logging facility.
//!
//! With the `internal-logs` feature (default) they emit `tracing` events
//! targeted at this crate. When running tests they print to stdout so
//! `--nocapture` shows the flow of operations. Otherwise they compile to
//! nothing.

/// Log a debug-level internal event.
///
/// # Fields:
/// - `name`: the operation or action being logged.
/// - Additional optional key-value pairs are attached as attributes.
#[macro_export]
macro_rules! spanq_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            println!("spanq_debug: name={}", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(test)]
        {
            print!("spanq_debug: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            println!();
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}

/// Log a warning-level internal event.
///
/// # Fields:
/// - `name`: the operation or action being logged.
/// - Additional optional key-value pairs are attached as attributes.
#[macro_export]
macro_rules! spanq_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            println!("spanq_warn: name={}", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(test)]
        {
            print!("spanq_warn: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            println!();
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}

/// Log an error-level internal event.
///
/// # Fields:
/// - `name`: the operation or action being logged.
/// - Additional optional key-value pairs are attached as attributes.
#[macro_export]
macro_rules! spanq_error {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            println!("spanq_error: name={}", $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(test)]
        {
            print!("spanq_error: name={}", $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            println!();
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}
