//! Command intents recognized from transcripts

/// Phrases asking what the camera sees
const DESCRIBE_PHRASES: [&str; 5] = [
    "what do you see",
    "what's in front of me",
    "what is in front of me",
    "describe",
    "look around",
];

/// Prefixes introducing a web search, longest first
const SEARCH_PREFIXES: [&str; 4] = ["search for ", "look up ", "search ", "google "];

/// Whole utterances that end the session
const STOP_PHRASES: [&str; 2] = ["stop listening", "goodbye"];

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Describe the scene in front of the camera
    Describe,
    /// Search the web for the query
    Search(String),
    /// End the session
    Stop,
    /// Repeat the transcript back
    Echo(String),
}

impl Intent {
    /// Match a transcript against the known commands
    ///
    /// Matching is case-insensitive and ignores punctuation. A stop phrase
    /// only counts when it is the entire utterance. Anything that is not a
    /// recognized command is echoed.
    #[must_use]
    pub fn parse(transcript: &str) -> Self {
        let text = normalize(transcript);

        for prefix in SEARCH_PREFIXES {
            let query = word_starts(&text, prefix)
                .find_map(|pos| text[pos..].strip_prefix(prefix))
                .map(str::trim)
                .filter(|q| !q.is_empty());
            if let Some(query) = query {
                return Self::Search(query.to_string());
            }
        }

        if DESCRIBE_PHRASES.iter().any(|p| text.contains(p)) || text == "look" {
            return Self::Describe;
        }

        if STOP_PHRASES.contains(&text.as_str()) {
            return Self::Stop;
        }

        Self::Echo(transcript.trim().to_string())
    }
}

/// Byte offsets where `phrase` starts at a word boundary
fn word_starts<'a>(text: &'a str, phrase: &'a str) -> impl Iterator<Item = usize> + 'a {
    text.match_indices(phrase.trim_end())
        .map(|(pos, _)| pos)
        .filter(|&pos| pos == 0 || text[..pos].ends_with(' '))
}

/// Lowercase, drop punctuation except apostrophes, collapse whitespace
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            '’' => '\'',
            c if c.is_alphanumeric() || c == '\'' => c,
            _ => ' ',
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_variants() {
        for t in [
            "What do you see?",
            "Hey, what's in front of me",
            "Describe the room.",
            "look",
            "Look around please",
        ] {
            assert_eq!(Intent::parse(t), Intent::Describe, "{t}");
        }
    }

    #[test]
    fn search_variants() {
        assert_eq!(
            Intent::parse("Search for the weather in Paris."),
            Intent::Search("the weather in paris".into())
        );
        assert_eq!(
            Intent::parse("search rust language"),
            Intent::Search("rust language".into())
        );
        assert_eq!(
            Intent::parse("Could you look up bus times"),
            Intent::Search("bus times".into())
        );
        assert_eq!(
            Intent::parse("Google what is a capybara"),
            Intent::Search("what is a capybara".into())
        );
    }

    #[test]
    fn search_must_start_a_word() {
        assert_eq!(
            Intent::parse("research papers"),
            Intent::Echo("research papers".into())
        );
    }

    #[test]
    fn bare_search_word_is_echoed() {
        assert_eq!(Intent::parse("search"), Intent::Echo("search".into()));
    }

    #[test]
    fn stop_variants() {
        assert_eq!(Intent::parse("Stop listening."), Intent::Stop);
        assert_eq!(Intent::parse("Goodbye!"), Intent::Stop);
    }

    #[test]
    fn stop_phrase_inside_a_command_is_not_stop() {
        assert_eq!(
            Intent::parse("Search for goodbye yellow brick road"),
            Intent::Search("goodbye yellow brick road".into())
        );
        assert_eq!(
            Intent::parse("Don't stop listening"),
            Intent::Echo("Don't stop listening".into())
        );
        assert_eq!(
            Intent::parse("OK goodbye"),
            Intent::Echo("OK goodbye".into())
        );
    }

    #[test]
    fn fallback_echoes_original_text() {
        assert_eq!(
            Intent::parse("  Hello there, Sightline! "),
            Intent::Echo("Hello there, Sightline!".into())
        );
    }
}
