//! Plain-text numeric input.
//!
//! Values are separated by any mix of whitespace and commas, so one value per
//! line, space-separated rows and single-line CSV all parse the same way.

use std::path::Path;
use std::str::FromStr;

use crate::engine::error::{ReduceError, ReduceResult};
use crate::engine::types::Element;

/// Parses every token of `text` as a `T`.
///
/// ## Errors
/// [`ReduceError::Parse`] naming the zero-based index of the first token that
/// does not parse.
pub fn parse_values<T>(text: &str) -> ReduceResult<Vec<T>>
where
    T: Element + FromStr,
{
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .enumerate()
        .map(|(index, token)| {
            token.parse::<T>().map_err(|_| ReduceError::Parse {
                index,
                token: token.to_owned(),
            })
        })
        .collect()
}

/// Reads and parses the file at `path`.
pub fn read_values<T>(path: &Path) -> ReduceResult<Vec<T>>
where
    T: Element + FromStr,
{
    let text = std::fs::read_to_string(path).map_err(|e| ReduceError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let values = parse_values(&text)?;
    tracing::debug!(path = %path.display(), count = values.len(), "read dataset");
    Ok(values)
}
