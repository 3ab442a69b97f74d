use crate::post::tokenize;

/// A configured keyword, compiled once.
///
/// Words and multi-word phrases match whole token runs, so `report` does not
/// fire on `reportedly`. Anything carrying punctuation (`!`, `confirmed??`)
/// matches as a plain substring of the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phrase {
    Tokens(Vec<String>),
    Substring(String),
}

impl Phrase {
    pub(crate) fn parse(raw: &str) -> Self {
        let kw = raw.trim().to_lowercase();
        let wordy = kw
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '\'');
        if wordy {
            let toks: Vec<String> = tokenize(&kw).map(str::to_string).collect();
            if !toks.is_empty() {
                return Phrase::Tokens(toks);
            }
        }
        Phrase::Substring(kw)
    }

    pub(crate) fn matches(&self, text: &str, tokens: &[&str]) -> bool {
        match self {
            Phrase::Tokens(seq) => {
                seq.len() <= tokens.len()
                    && tokens
                        .windows(seq.len())
                        .any(|w| w.iter().zip(seq).all(|(a, b)| *a == b))
            }
            Phrase::Substring(s) => !s.is_empty() && text.contains(s.as_str()),
        }
    }
}
