//! Chunking must not change the lines a buffer produces

use palletizer_communication::LineBuffer;
use proptest::prelude::*;

proptest! {
    #[test]
    fn chunked_input_yields_same_lines(lines in prop::collection::vec("[A-Z_;\\[\\] ]{1,20}", 1..6), split in 1usize..16) {
        let text: String = lines.iter().map(|l| format!("{l}\n")).collect();

        let mut whole = LineBuffer::new();
        let expected = whole.push(text.as_bytes());

        let mut chunked = LineBuffer::new();
        let mut actual = Vec::new();
        for chunk in text.as_bytes().chunks(split) {
            actual.extend(chunked.push(chunk));
        }
        prop_assert_eq!(actual, expected);
    }
}
