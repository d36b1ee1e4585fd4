//! The append-only warnings channel.
//!
//! Recoverable problems during mapping and encoding accumulate here and are
//! reported after the run by an external layer; only fatal errors stop
//! processing. Every push also emits a `tracing` event so the ambient log
//! sees problems as they happen.

/// One accumulated warning, optionally tied to a citekey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub key: Option<String>,
    pub message: String,
}

/// Append-only list of `(key, message)` warnings.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Option<&str>, message: impl Into<String>) {
        let message = message.into();
        match key {
            Some(key) => tracing::warn!(key, "{}", message),
            None => tracing::warn!("{}", message),
        }
        self.items.push(Warning {
            key: key.map(str::to_string),
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.items
    }

    /// Drain accumulated warnings for end-of-run reporting.
    pub fn drain(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_and_drain() {
        let mut warnings = Warnings::new();
        warnings.push(Some("key1"), "first");
        warnings.push(None, "second");

        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings.as_slice()[0].key.as_deref(), Some("key1"));

        let drained = warnings.drain();
        assert_eq!(drained.len(), 2);
        assert!(warnings.is_empty());
    }
}
