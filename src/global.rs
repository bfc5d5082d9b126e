//! An explicitly initialized process-wide logger.
//!
//! Libraries that cannot have a [`Logger`] passed to them can reach the one
//! installed here. It is set once, typically at the top of `main`, and only
//! read afterwards.

use once_cell::sync::OnceCell;

use crate::{Error, Logger, Result};

static GLOBAL: OnceCell<Logger> = OnceCell::new();

/// Install `logger` as the process-wide default.
///
/// # Errors
///
/// Fails if a default was already installed; the first one stays in place.
pub fn init(logger: Logger) -> Result<&'static Logger> {
    let mut installed = false;
    let current = GLOBAL.get_or_init(|| {
        installed = true;
        logger
    });
    if installed {
        Ok(current)
    } else {
        Err(Error::Init("global logger already initialized".to_string()))
    }
}

/// The process-wide default, if one was installed.
pub fn get() -> Option<&'static Logger> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Level;

    #[test]
    fn test_init_once() {
        let first = Logger::builder(Level::Warn).build().unwrap();
        let second = Logger::builder(Level::Debug).build().unwrap();

        // Other tests in this binary never touch the global, so the first
        // init here is the only one.
        assert_eq!(init(first).unwrap().level(), Level::Warn);
        assert!(matches!(init(second), Err(Error::Init(_))));
        assert_eq!(get().unwrap().level(), Level::Warn);
    }
}
