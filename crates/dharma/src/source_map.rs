//! An owned line cache for diagnostic rendering (SPEC_FULL §9: the source's
//! global singleton redesigned as a value threaded explicitly by the
//! driver, never a process-wide static).

pub struct SourceMap {
    lines: Vec<String>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        SourceMap {
            lines: source.lines().map(str::to_owned).collect(),
        }
    }

    /// Fetches the 1-based source line, if present.
    pub fn line(&self, line: u32) -> Option<&str> {
        let idx = line.checked_sub(1)? as usize;
        self.lines.get(idx).map(String::as_str)
    }
}
