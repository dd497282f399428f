//! Symbol sources for the scan loop

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Produces the ordered list of symbols to scan; read once per iteration
#[async_trait]
pub trait SymbolSource: Send + Sync {
    async fn load_symbols(&self) -> io::Result<Vec<String>>;
}

/// Plain-text ticker list, one symbol per line
#[derive(Debug, Clone)]
pub struct TickerFile {
    path: PathBuf,
}

impl TickerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SymbolSource for TickerFile {
    async fn load_symbols(&self) -> io::Result<Vec<String>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_tickers(&contents))
    }
}

/// Trimmed, non-empty lines in file order; `#` starts a comment line
pub fn parse_tickers(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
