//! Outline index expansion.
//!
//! After import the engine has one material slot per chunk, in slot order
//! then chunk order. The outline type of every chunk is its slot's type, so
//! the per-slot list is repeated per chunk count. A wrong order here gives
//! silently wrong outlines in game.

use crate::error::OutlineError;

/// Repeats `outline_types[i]` `chunk_counts[i]` times, preserving slot order.
///
/// ```
/// use charpak_spec::outline::expand;
///
/// assert_eq!(expand(&[1, 0, -1], &[2, 1, 3]).unwrap(), vec![1, 1, 0, -1, -1, -1]);
/// ```
pub fn expand(outline_types: &[i32], chunk_counts: &[usize]) -> Result<Vec<i32>, OutlineError> {
    if outline_types.len() != chunk_counts.len() {
        return Err(OutlineError::LengthMismatch {
            outline_types: outline_types.len(),
            chunk_counts: chunk_counts.len(),
        });
    }

    let total = chunk_counts.iter().sum();
    let mut flat = Vec::with_capacity(total);
    for (&outline, &count) in outline_types.iter().zip(chunk_counts) {
        flat.extend(std::iter::repeat(outline).take(count));
    }
    Ok(flat)
}

/// Comma-joins an expanded sequence.
pub fn format_sequence(flat: &[i32]) -> String {
    flat.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_preserves_order() {
        let flat = expand(&[3, 7], &[1, 2]).unwrap();
        assert_eq!(flat, vec![3, 7, 7]);
        assert_eq!(format_sequence(&flat), "3,7,7");
    }

    #[test]
    fn test_expand_length_is_total_chunks() {
        let counts = [4, 1, 2, 1];
        let flat = expand(&[0, 1, 2, 3], &counts).unwrap();
        assert_eq!(flat.len(), counts.iter().sum::<usize>());
    }

    #[test]
    fn test_expand_length_mismatch() {
        assert_eq!(
            expand(&[1, 2], &[1]),
            Err(OutlineError::LengthMismatch {
                outline_types: 2,
                chunk_counts: 1
            })
        );
    }
}
