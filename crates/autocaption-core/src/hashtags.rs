//! Hashtag extraction from caption text.

/// Words must be longer than this many characters to become a hashtag.
const MIN_WORD_CHARS: usize = 4;

/// Derives hashtags from a caption by plain word filtering.
///
/// Lower-cases the caption, splits on whitespace and keeps tokens longer than
/// four characters as written (so `dogs.` counts as five). Surviving tokens
/// have `.` and `,` stripped from both ends and are prefixed with `#`; a token
/// made only of punctuation yields nothing. Order follows the caption and
/// duplicates are kept.
#[derive(Debug, Clone, Copy)]
pub struct HashtagExtractor {
    max_tags: usize,
}

impl Default for HashtagExtractor {
    fn default() -> Self {
        Self { max_tags: 6 }
    }
}

impl HashtagExtractor {
    pub fn new(max_tags: usize) -> Self {
        Self { max_tags }
    }

    pub fn extract(&self, caption: &str) -> Vec<String> {
        caption
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.chars().count() > MIN_WORD_CHARS)
            .map(|word| word.trim_matches(|c| c == '.' || c == ','))
            .filter(|word| !word.is_empty())
            .take(self.max_tags)
            .map(|word| format!("#{word}"))
            .collect()
    }
}

/// Compose the post body: the caption, a blank line, then the hashtags.
pub fn compose_post(caption: &str, hashtags: &[String]) -> String {
    format!("{caption}\n\n{}", hashtags.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_long_words_in_order() {
        let tags = HashtagExtractor::default().extract("A fluffy orange kitten sleeping on a sofa.");
        assert_eq!(tags, ["#fluffy", "#orange", "#kitten", "#sleeping", "#sofa"]);
    }

    #[test]
    fn test_caps_at_six() {
        let caption = "alpha bravo charlie delta extra foxtrot golfing hotel";
        let tags = HashtagExtractor::default().extract(caption);
        assert_eq!(tags.len(), 6);
        assert_eq!(tags[0], "#alpha");
        assert_eq!(tags[5], "#foxtrot");
    }

    #[test]
    fn test_short_words_yield_nothing() {
        let tags = HashtagExtractor::default().extract("a cat on a mat. it is so fat");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_empty_caption() {
        assert!(HashtagExtractor::default().extract("").is_empty());
        assert!(HashtagExtractor::default().extract("   \n\t").is_empty());
    }

    #[test]
    fn test_length_counts_trailing_punctuation() {
        // "dogs." is five characters as written, so it becomes "#dogs"
        let tags = HashtagExtractor::default().extract("Two dogs. playing");
        assert_eq!(tags, ["#dogs", "#playing"]);

        let tags = HashtagExtractor::default().extract("Dogs. Puppies, running.");
        assert_eq!(tags, ["#dogs", "#puppies", "#running"]);
    }

    #[test]
    fn test_punctuation_only_token_skipped() {
        let tags = HashtagExtractor::default().extract("wait..... sunset");
        assert_eq!(tags, ["#wait", "#sunset"]);

        let tags = HashtagExtractor::default().extract("..... sunset");
        assert_eq!(tags, ["#sunset"]);
    }

    #[test]
    fn test_lowercases_and_keeps_duplicates() {
        let tags = HashtagExtractor::default().extract("Beach BEACH beach");
        assert_eq!(tags, ["#beach", "#beach", "#beach"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // four characters, eight bytes
        let tags = HashtagExtractor::default().extract("éééé ééééé");
        assert_eq!(tags, ["#ééééé"]);
    }

    #[test]
    fn test_is_deterministic() {
        let extractor = HashtagExtractor::default();
        let caption = "there is a large brown horse standing in a grassy field";
        assert_eq!(extractor.extract(caption), extractor.extract(caption));
    }

    #[test]
    fn test_every_tag_is_prefixed_and_long() {
        let caption = "Sunset over the mountains, with golden clouds and quiet water.";
        for tag in HashtagExtractor::default().extract(caption) {
            assert!(tag.starts_with('#'));
            assert!(tag.len() > 1);
            assert!(!tag.ends_with(['.', ',']));
            assert_eq!(tag, tag.to_lowercase());
        }
    }

    #[test]
    fn test_custom_limit() {
        let tags = HashtagExtractor::new(2).extract("alpha bravo charlie");
        assert_eq!(tags, ["#alpha", "#bravo"]);
    }

    #[test]
    fn test_compose_post() {
        let body = compose_post("a dog", &["#hello".to_string(), "#world".to_string()]);
        assert_eq!(body, "a dog\n\n#hello #world");
    }
}
