//! Address list files.
//!
//! One address per line in the first comma-separated column. The first
//! line is a header and is always skipped; blank lines are ignored.
//!
//! ```text
//! address
//! 0x70997970c51812dc3a010c7d01b50e0d17dc79c8
//! 0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc,optional,other,columns
//! ```

use std::path::Path;

use anyhow::{Context, Result};

use pass_core::Address;

/// Parse an address list. Errors name the offending line (1-based).
pub fn parse(text: &str) -> Result<Vec<Address>> {
    let mut out = Vec::new();
    for (index, line) in text.lines().enumerate().skip(1) {
        let field = line.split(',').next().unwrap_or("").trim();
        if field.is_empty() {
            continue;
        }
        let address = field
            .parse::<Address>()
            .with_context(|| format!("line {}: invalid address {field:?}", index + 1))?;
        out.push(address);
    }
    Ok(out)
}

pub fn read(path: &Path) -> Result<Vec<Address>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read address list {}", path.display()))?;
    parse(&text).with_context(|| format!("in {}", path.display()))
}
