//! Report generation port trait.

use crate::domain::bar::Bar;
use crate::domain::error::VppaError;
use crate::domain::vppa::VppaResult;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Everything a report needs about one analysed symbol.
pub struct ReportContext<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub volume_ma_length: usize,
    pub bars: &'a [Bar],
    pub result: &'a VppaResult,
}

/// Port for rendering and writing analysis reports.
pub trait ReportPort {
    /// Render one report per context. A single context renders as one
    /// document; several render as a collection.
    fn render(&self, contexts: &[ReportContext<'_>]) -> Result<String, VppaError>;

    /// Default implementation: render, then write to `output_path` (creating
    /// parent directories) or to stdout when no path is given.
    fn write(
        &self,
        contexts: &[ReportContext<'_>],
        output_path: Option<&Path>,
    ) -> Result<(), VppaError> {
        let rendered = self.render(contexts)?;
        match output_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, rendered)?;
            }
            None => {
                let stdout = std::io::stdout();
                let mut lock = stdout.lock();
                writeln!(lock, "{rendered}")?;
            }
        }
        Ok(())
    }
}
