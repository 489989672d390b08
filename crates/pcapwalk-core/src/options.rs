/// Decoding policy shared by a session and every cursor it spawns.
///
/// The defaults are permissive: zero snap lengths and records whose captured
/// length exceeds the original length are passed through untouched, since
/// historical writers produce both.
///
/// # Examples
/// ```
/// use pcapwalk_core::DecodeOptions;
///
/// let options = DecodeOptions::default().strict(true);
/// assert!(options.is_strict());
/// assert!(options.accepts_nanosecond_magic());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    strict: bool,
    nanosecond_magic: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict: false,
            nanosecond_magic: true,
        }
    }
}

impl DecodeOptions {
    /// Reject zero snap lengths and records whose captured length exceeds
    /// the original length or the snap length.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Accept the nanosecond-resolution magic variants in addition to the
    /// microsecond ones.
    pub fn nanosecond_magic(mut self, accept: bool) -> Self {
        self.nanosecond_magic = accept;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn accepts_nanosecond_magic(&self) -> bool {
        self.nanosecond_magic
    }
}
