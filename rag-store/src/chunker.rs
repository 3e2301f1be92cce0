//! Fixed-size overlapping text chunks, counted in Unicode scalar values.

use crate::errors::RagError;

/// Splits text into windows of `size` characters, each starting
/// `size - overlap` characters after the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkSplitter {
    size: usize,
    overlap: usize,
}

impl ChunkSplitter {
    /// # Errors
    /// [`RagError::Config`] unless `0 <= overlap < size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, RagError> {
        if size == 0 {
            return Err(RagError::Config("chunk size must be > 0".into()));
        }
        if overlap >= size {
            return Err(RagError::Config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Empty input gives no chunks. The last chunk holds the remainder and
    /// the loop stops as soon as a chunk reaches the end of the text.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let len = bounds.len() - 1;
        let step = self.size - self.overlap;

        let mut chunks = Vec::with_capacity(len.div_ceil(step));
        let mut start = 0;
        loop {
            let end = (start + self.size).min(len);
            chunks.push(text[bounds[start]..bounds[end]].to_string());
            if end >= len {
                break;
            }
            start += step;
        }
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Drops the overlapping prefix of every chunk after the first.
    fn stitch(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(c);
            } else {
                out.extend(c.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn thousand_chars_make_three_chunks() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = ChunkSplitter::new(500, 50).unwrap().split(&text);

        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lens, vec![500, 500, 100]);
        assert_eq!(stitch(&chunks, 50), text);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(ChunkSplitter::new(10, 2).unwrap().split("").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(ChunkSplitter::new(10, 2).unwrap().split("abc"), vec!["abc"]);
        assert_eq!(ChunkSplitter::new(3, 1).unwrap().split("abc"), vec!["abc"]);
    }

    #[test]
    fn multibyte_text_is_split_on_char_boundaries() {
        let text = "東京都の天気は晴れです";
        let chunks = ChunkSplitter::new(4, 1).unwrap().split(text);
        assert_eq!(chunks[0], "東京都の");
        assert_eq!(chunks[1], "の天気は");
        assert_eq!(stitch(&chunks, 1), text);
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(ChunkSplitter::new(5, 5).is_err());
        assert!(ChunkSplitter::new(0, 0).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_are_bounded_overlapping_and_reconstruct_the_text(
            text in "\\PC{0,300}",
            size in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let splitter = ChunkSplitter::new(size, overlap).unwrap();
            let chunks = splitter.split(&text);
            let len = text.chars().count();

            if len == 0 {
                prop_assert!(chunks.is_empty());
            } else {
                let expected = if len <= size {
                    1
                } else {
                    (len - overlap).div_ceil(size - overlap)
                };
                prop_assert_eq!(chunks.len(), expected);
                prop_assert!(chunks.iter().all(|c| c.chars().count() <= size));
                for pair in chunks.windows(2) {
                    let tail: String = pair[0].chars().skip(size - overlap).collect();
                    let head: String = pair[1].chars().take(overlap).collect();
                    prop_assert_eq!(tail, head);
                }
                prop_assert_eq!(stitch(&chunks, overlap), text);
            }
        }
    }
}
