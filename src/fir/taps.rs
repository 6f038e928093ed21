use crate::arith::Element;

/// One row per polyphase branch; entry `j` of a row multiplies the `j`-th
/// oldest sample in the stage's reach. Rows are zero padded to whole
/// groups of `columns` taps, one group per vector op.
#[derive(Debug, Clone, PartialEq)]
pub struct TapTable<C> {
    rows: usize,
    /// Live entries per row
    count: usize,
    columns: usize,
    /// Padded row length (ops x columns)
    stride: usize,
    taps: Vec<C>,
    /// Half-band centre tap, present only on the stage that applies it
    centre: Option<C>,
}

impl<C: Element> TapTable<C> {
    /// Asymmetric interpolator: `count` data taps starting at reversed
    /// data-tap `first`, one row per phase
    ///
    /// Entry `[p][j]` is `h[(P - 1 - (first + j)) * factor + p]`.
    pub fn asymmetric(taps: &[C], factor: usize, first: usize, count: usize, columns: usize) -> Self {
        let phase_taps = taps.len() / factor;
        let stride = count.div_ceil(columns) * columns;
        let mut table = vec![C::default(); factor * stride];
        for (phase, row) in table.chunks_exact_mut(stride).enumerate() {
            for (j, slot) in row.iter_mut().take(count).enumerate() {
                *slot = taps[(phase_taps - 1 - (first + j)) * factor + phase];
            }
        }
        Self {
            rows: factor,
            count,
            columns,
            stride,
            taps: table,
            centre: None,
        }
    }

    /// Half-band interpolator over its unique coefficient form
    ///
    /// The single row holds side taps `unique[first..first + count]`, each
    /// applied to a pre-added sample pair. The centre tap (the last unique
    /// coefficient) is kept only when `with_centre` is set.
    pub fn half_band(
        unique: &[C],
        first: usize,
        count: usize,
        columns: usize,
        with_centre: bool,
    ) -> Self {
        let stride = count.div_ceil(columns) * columns;
        let mut table = vec![C::default(); stride];
        table[..count].copy_from_slice(&unique[first..first + count]);
        Self {
            rows: 1,
            count,
            columns,
            stride,
            taps: table,
            centre: if with_centre {
                unique.last().copied()
            } else {
                None
            },
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Padded row length; scratch operand rows are sized to match
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Live entries of `row`, without padding
    pub fn row(&self, row: usize) -> &[C] {
        let start = row * self.stride;
        &self.taps[start..start + self.count]
    }

    /// Column groups of `row`, one per vector op, padding included
    pub fn ops(&self, row: usize) -> std::slice::ChunksExact<'_, C> {
        let start = row * self.stride;
        self.taps[start..start + self.stride].chunks_exact(self.columns)
    }

    pub fn centre(&self) -> Option<C> {
        self.centre
    }
}

/// Expand unique half-band coefficients to the full `fir_len` tap vector
///
/// Even positions of the first half take the side taps in order, odd
/// positions are zero, the centre tap sits at `(fir_len - 1) / 2` and the
/// second half mirrors the first.
pub fn expand_half_band<C: Element>(unique: &[C], fir_len: usize) -> Vec<C> {
    let mut taps = vec![C::default(); fir_len];
    let centre = (fir_len - 1) / 2;
    let mut side = unique[..unique.len().saturating_sub(1)].iter();
    for i in (0..centre).step_by(2) {
        if let Some(&c) = side.next() {
            taps[i] = c;
            taps[fir_len - 1 - i] = c;
        }
    }
    if let Some(&c) = unique.last() {
        taps[centre] = c;
    }
    taps
}

/// Reverse of [`expand_half_band`]: keep the even side taps of the first
/// half followed by the centre tap
pub fn half_band_unique<C: Copy>(taps: &[C]) -> Vec<C> {
    let centre = (taps.len() - 1) / 2;
    let mut unique: Vec<C> = taps[..centre].iter().step_by(2).copied().collect();
    unique.push(taps[centre]);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fir::partition::partition;

    #[test]
    fn test_single_stage_table_reverses_each_phase() {
        let taps: Vec<i16> = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let table = TapTable::asymmetric(&taps, 2, 0, 4, 2);
        assert_eq!(table.rows(), 2);
        assert_eq!(table.row(0), &[7, 5, 3, 1]);
        assert_eq!(table.row(1), &[8, 6, 4, 2]);
    }

    #[test]
    fn test_padding_to_columns() {
        let taps: Vec<i16> = (1..=9).collect();
        let table = TapTable::asymmetric(&taps, 3, 0, 3, 2);
        assert_eq!(table.stride(), 4);
        assert_eq!(table.row(0), &[7, 4, 1]);
        let ops: Vec<&[i16]> = table.ops(2).collect();
        assert_eq!(ops, vec![&[9i16, 6][..], &[3, 0][..]]);
    }

    #[test]
    fn test_later_stage_starts_at_first_tap() {
        let taps: Vec<i16> = (1..=9).collect();
        let table = TapTable::asymmetric(&taps, 3, 1, 2, 1);
        assert_eq!(table.row(0), &[4, 1]);
        assert_eq!(table.row(2), &[6, 3]);
    }

    #[test]
    fn test_stage_tables_reconstruct_reversed_taps() {
        let factor = 3;
        let taps: Vec<i32> = (0..36).map(|i| i * 7 - 50).collect();
        let reversed: Vec<i32> = taps.iter().rev().copied().collect();

        for stages in 1..=6 {
            let ranges = partition(taps.len(), stages, factor).unwrap();
            for range in ranges {
                let table =
                    TapTable::asymmetric(&taps, factor, range.offset / factor, range.len / factor, 1);
                for phase in 0..factor {
                    for (j, &tap) in table.row(phase).iter().enumerate() {
                        let i = range.offset + j * factor + (factor - 1 - phase);
                        assert_eq!(tap, reversed[i]);
                    }
                }
            }
        }
    }

    #[test]
    fn test_half_band_expansion() {
        let unique: Vec<i16> = vec![1, 2, 3, 10];
        let full = expand_half_band(&unique, 11);
        assert_eq!(full, vec![1, 0, 2, 0, 3, 10, 3, 0, 2, 0, 1]);
        assert_eq!(half_band_unique(&full), unique);

        let unique: Vec<i16> = vec![5, 9];
        assert_eq!(expand_half_band(&unique, 3), vec![5, 9, 5]);
    }

    #[test]
    fn test_half_band_table_centre() {
        let unique: Vec<i16> = vec![1, 2, 3, 10];
        let last = TapTable::half_band(&unique, 2, 1, 2, true);
        assert_eq!(last.row(0), &[3]);
        assert_eq!(last.ops(0).collect::<Vec<_>>(), vec![&[3i16, 0][..]]);
        assert_eq!(last.centre(), Some(10));

        let first = TapTable::half_band(&unique, 0, 2, 2, false);
        assert_eq!(first.row(0), &[1, 2]);
        assert_eq!(first.centre(), None);
    }
}
