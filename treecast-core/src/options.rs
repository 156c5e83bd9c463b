//! Conversion options.

/// Policy flags threaded through every encode and decode call.
///
/// The same value is forwarded unchanged into nested record routines so a
/// whole object graph is converted under one consistent policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ConvertOptions {
    /// Pass byte sequences through as raw bytes instead of base64 text.
    pub use_bytes: bool,
    /// Pass enumeration members through instead of their underlying values.
    pub use_enum: bool,
}

impl ConvertOptions {
    /// Creates options with both flags cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            use_bytes: false,
            use_enum: false,
        }
    }

    /// Sets the raw bytes policy.
    #[must_use]
    pub const fn with_bytes(mut self, use_bytes: bool) -> Self {
        self.use_bytes = use_bytes;
        self
    }

    /// Sets the enumeration member policy.
    #[must_use]
    pub const fn with_enum(mut self, use_enum: bool) -> Self {
        self.use_enum = use_enum;
        self
    }

    /// Returns all four flag combinations.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [
            Self::new(),
            Self::new().with_bytes(true),
            Self::new().with_enum(true),
            Self::new().with_bytes(true).with_enum(true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clears_flags() {
        let options = ConvertOptions::default();
        assert!(!options.use_bytes);
        assert!(!options.use_enum);
        assert_eq!(options, ConvertOptions::new());
    }

    #[test]
    fn test_builder_setters() {
        let options = ConvertOptions::new().with_bytes(true);
        assert!(options.use_bytes);
        assert!(!options.use_enum);
        assert!(options.with_enum(true).use_enum);
    }

    #[test]
    fn test_all_combinations_distinct() {
        let all = ConvertOptions::all();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
