//! Error handling for the hero particle subsystem

use thiserror::Error;

/// Errors raised while wiring the hero to a page or loading its config.
///
/// None of these reach the visitor: callers degrade to a static headline.
#[derive(Debug, Error)]
pub enum HeroError {
    /// `window` is not available (worker or non-browser host)
    #[error("no window")]
    NoWindow,

    /// `window.document` is not available
    #[error("no document")]
    NoDocument,

    /// A required element was not found in the page
    #[error("missing element: {0}")]
    MissingElement(String),

    /// A drawing context could not be obtained
    #[error("{0} context unavailable")]
    ContextUnavailable(String),

    /// A JavaScript call threw
    #[error("js error: {0}")]
    Js(String),

    /// The config JSON did not parse
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// The config parsed but holds values the engine cannot use
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Reading a config file or spawning a helper process failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A helper process ran but reported failure
    #[error("{0} failed")]
    Tool(String),

    /// Mask data does not match its declared dimensions
    #[error("mask size mismatch: {width}x{height} needs {expected} bytes, got {actual}")]
    MaskSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, HeroError>;

#[cfg(target_arch = "wasm32")]
mod js {
    use super::HeroError;
    use wasm_bindgen::JsValue;

    impl From<JsValue> for HeroError {
        fn from(value: JsValue) -> Self {
            HeroError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
        }
    }

    impl From<HeroError> for JsValue {
        fn from(err: HeroError) -> Self {
            JsValue::from_str(&err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = HeroError::MissingElement("#hero-particles".to_string());
        assert_eq!(format!("{}", error), "missing element: #hero-particles");

        let error = HeroError::MaskSize {
            width: 2,
            height: 2,
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            format!("{}", error),
            "mask size mismatch: 2x2 needs 4 bytes, got 3"
        );

        let error = HeroError::Tool("wasm-pack".to_string());
        assert_eq!(format!("{}", error), "wasm-pack failed");
    }
}
