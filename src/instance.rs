//! Instance file format: first line `H W`, then `H` rows of `W`
//! whitespace-separated tokens, each `0`-`3` or `.` for an unclued cell.
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Parses the textual instance format into a clue grid suitable for
/// [`crate::grid::GridModel::build`].
pub fn from_text(text: &str) -> Result<Vec<Vec<Option<u8>>>, ConfigError> {
    let mut lines = text.lines();

    let header = lines.next().unwrap_or("");
    let mut dims = header.split_whitespace();
    let height: usize = dims
        .next()
        .and_then(|t| t.parse().ok())
        .filter(|&h: &usize| h > 0)
        .ok_or_else(|| ConfigError::BadDimensions { line: header.to_string() })?;
    let width: usize = dims
        .next()
        .and_then(|t| t.parse().ok())
        .filter(|&w: &usize| w > 0)
        .ok_or_else(|| ConfigError::BadDimensions { line: header.to_string() })?;
    if dims.next().is_some() {
        return Err(ConfigError::BadDimensions { line: header.to_string() });
    }

    let mut grid = Vec::with_capacity(height);
    let mut row_count = 0;
    for (row, line) in lines.by_ref().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if row_count == height {
            break;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != width {
            return Err(ConfigError::RowWidthMismatch {
                row,
                found: tokens.len(),
                expected: width,
            });
        }
        let mut parsed_row = Vec::with_capacity(width);
        for (col, token) in tokens.iter().enumerate() {
            let clue = match *token {
                "." => None,
                digits => {
                    let value: u8 = digits
                        .parse()
                        .ok()
                        .filter(|&v| v <= 3)
                        .ok_or_else(|| ConfigError::InvalidClue {
                            row,
                            col,
                            token: digits.to_string(),
                        })?;
                    Some(value)
                }
            };
            parsed_row.push(clue);
        }
        grid.push(parsed_row);
        row_count += 1;
    }

    if row_count != height {
        return Err(ConfigError::RowCountMismatch {
            declared: height,
            found: row_count,
        });
    }

    Ok(grid)
}

/// Reads and parses an instance file from disk.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Option<u8>>>, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_text(&content)
}
