use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Unicode word characters: letters, marks, digits, connector punctuation.
    static ref RE: Regex = Regex::new(r"\w{2,}").expect("valid regex");
}

/// Split text into word tokens of at least two characters, in input order.
/// Case is left untouched; lowercasing belongs to normalization.
pub fn tokenize(text: &str) -> Vec<String> {
    RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Like [`tokenize`], with the byte offset of each token in `text`.
pub fn tokenize_with_positions(text: &str) -> Vec<(String, usize)> {
    RE.find_iter(text).map(|m| (m.as_str().to_string(), m.start())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Фотография слона, в Африке!");
        assert_eq!(t, vec!["Фотография", "слона", "Африке"]);
    }

    #[test]
    fn offsets_are_bytes() {
        let t = tokenize_with_positions("ab вг");
        assert_eq!(t, vec![("ab".to_string(), 0), ("вг".to_string(), 3)]);
    }
}
