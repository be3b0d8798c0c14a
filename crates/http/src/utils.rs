//! Helper macros shared by the decoders.

/// Returns early with an error if a condition is not met.
///
/// Works like `assert!`, but returns `Err($error)` instead of panicking.
///
/// ```ignore
/// ensure!(parts.len() <= max_parts, DecodeError::too_many_parts(parts.len(), max_parts));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
