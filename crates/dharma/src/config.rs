//! Interpreter-wide tunables, taken as explicit constructor arguments
//! rather than environment variables or a config-file crate (SPEC_FULL
//! §2.1) — this interpreter has no file-system or network surface to read
//! config from besides the script it's given.

#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Gates both `SemiColonWarning` and `ImplicitConversionWarning`
    /// (SPEC_FULL §4.3: "except when suppressed by a global flag").
    pub warnings_enabled: bool,
    /// Calls and function/method definitions reject more than this many
    /// arguments/parameters (SPEC_FULL §4.3).
    pub max_arity: usize,
    /// Default `sqrt` precision when a call site does not specify one.
    pub default_sqrt_precision: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            warnings_enabled: true,
            max_arity: 255,
            default_sqrt_precision: 6,
        }
    }
}
