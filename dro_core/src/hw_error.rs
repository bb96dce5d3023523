//! Maps `Box<dyn Error>` from collaborator traits to typed `DroError`.
//!
//! The traits in `dro_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module narrows those to our enum, with an
//! optional feature-gated path for `dro_hardware::HwError` downcasting.

use crate::error::DroError;

/// Which collaborator produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Counter,
    Store,
    Transport,
}

/// Map a trait-boundary error to a typed `DroError`.
///
/// Known hardware error types are downcast first, then string heuristics.
/// Only counter errors become `DroError::Timeout`.
pub fn map_hw_error(source: Source, e: &(dyn std::error::Error + 'static)) -> DroError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<dro_hardware::error::HwError>() {
            return match hw {
                dro_hardware::error::HwError::Timeout if source == Source::Counter => {
                    DroError::Timeout
                }
                other => wrap(source, other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if source == Source::Counter && s.to_lowercase().contains("timeout") {
        DroError::Timeout
    } else {
        wrap(source, s)
    }
}

fn wrap(source: Source, msg: String) -> DroError {
    match source {
        Source::Counter => DroError::Counter(msg),
        Source::Store => DroError::Store(msg),
        Source::Transport => DroError::Transport(msg),
    }
}
