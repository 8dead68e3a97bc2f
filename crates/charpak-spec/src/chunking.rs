//! The chunk-count line printed by the modeling-tool hook.
//!
//! The hook prints `CHUNKING:n1,n2,...` on stdout, one count per canonical
//! slot in canonical order. The same comma list is later handed to the engine
//! hook as a single argument.

use std::fmt;

use crate::error::ParseError;

/// Marker the chunk-count line starts with.
pub const CHUNKING_MARKER: &str = "CHUNKING:";

/// Per-slot chunk counts in canonical slot order, each at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCounts(Vec<usize>);

impl ChunkCounts {
    pub fn new(counts: Vec<usize>) -> Result<Self, ParseError> {
        if let Some(bad) = counts.iter().find(|&&c| c == 0) {
            return Err(ParseError::InvalidChunkCount(bad.to_string()));
        }
        Ok(Self(counts))
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of chunks across all slots.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Comma-joined counts, e.g. `1,3,1`.
    pub fn to_csv(&self) -> String {
        self.0
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The full marker line, e.g. `CHUNKING:1,3,1`.
    pub fn marker_line(&self) -> String {
        format!("{}{}", CHUNKING_MARKER, self.to_csv())
    }

    /// Parses a comma-joined count list.
    pub fn parse_csv(csv: &str) -> Result<Self, ParseError> {
        let counts = csv
            .trim()
            .split(',')
            .map(|field| {
                let field = field.trim();
                field
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidChunkCount(field.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(counts)
    }

    /// Finds the last marker line in a tool's stdout and parses it.
    pub fn from_tool_output(stdout: &str) -> Result<Self, ParseError> {
        let line = stdout
            .lines()
            .rev()
            .find_map(|line| line.trim().strip_prefix(CHUNKING_MARKER))
            .ok_or(ParseError::MarkerNotFound {
                marker: CHUNKING_MARKER,
            })?;
        Self::parse_csv(line)
    }

    /// Checks there is exactly one count per canonical slot.
    pub fn expect_len(self, expected: usize) -> Result<Self, ParseError> {
        if self.0.len() != expected {
            return Err(ParseError::ChunkCountLength {
                expected,
                found: self.0.len(),
            });
        }
        Ok(self)
    }
}

impl fmt::Display for ChunkCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_csv())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_line() {
        let counts = ChunkCounts::new(vec![1, 3, 1]).unwrap();
        assert_eq!(counts.marker_line(), "CHUNKING:1,3,1");
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_from_tool_output_finds_last_marker() {
        let stdout = "Starting Python Export Hook\nCalculating Chunks\nCHUNKING:9\nFinal\nCHUNKING:1,2\nBlender quit\n";
        let counts = ChunkCounts::from_tool_output(stdout).unwrap();
        assert_eq!(counts.as_slice(), &[1, 2]);
    }

    #[test]
    fn test_from_tool_output_without_marker() {
        assert_eq!(
            ChunkCounts::from_tool_output("nothing here\n"),
            Err(ParseError::MarkerNotFound {
                marker: CHUNKING_MARKER
            })
        );
    }

    #[test]
    fn test_parse_rejects_zero_and_garbage() {
        assert_eq!(
            ChunkCounts::parse_csv("1,0"),
            Err(ParseError::InvalidChunkCount("0".to_string()))
        );
        assert_eq!(
            ChunkCounts::parse_csv("1,x"),
            Err(ParseError::InvalidChunkCount("x".to_string()))
        );
        assert_eq!(
            ChunkCounts::parse_csv(""),
            Err(ParseError::InvalidChunkCount(String::new()))
        );
    }

    #[test]
    fn test_expect_len() {
        let counts = ChunkCounts::parse_csv("1,1").unwrap();
        assert_eq!(
            counts.expect_len(3),
            Err(ParseError::ChunkCountLength {
                expected: 3,
                found: 2
            })
        );
    }
}
