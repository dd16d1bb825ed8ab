/// Maps free text to a polarity in [-1, 1]. Empty text scores 0.
pub trait SentimentScorer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

const NEGATORS: [&str; 7] = ["not", "no", "never", "nothing", "nobody", "hardly", "without"];

const INTENSIFIERS: [(&str, f64); 8] = [
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("super", 1.3),
    ("quite", 1.1),
    ("pretty", 1.1),
];

// Word valences in [-1, 1], roughly on the scale of common polarity lexicons.
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("better", 0.5),
    ("blessed", 0.6),
    ("brilliant", 0.9),
    ("calm", 0.3),
    ("cheerful", 0.6),
    ("comfortable", 0.4),
    ("confident", 0.5),
    ("content", 0.3),
    ("delighted", 0.8),
    ("enjoy", 0.4),
    ("enjoyed", 0.4),
    ("excellent", 1.0),
    ("excited", 0.4),
    ("fantastic", 0.4),
    ("fine", 0.4),
    ("fun", 0.3),
    ("glad", 0.5),
    ("good", 0.7),
    ("grateful", 0.6),
    ("great", 0.8),
    ("happy", 0.8),
    ("hopeful", 0.5),
    ("joy", 0.8),
    ("kind", 0.6),
    ("love", 0.5),
    ("loved", 0.7),
    ("lovely", 0.5),
    ("lucky", 0.5),
    ("nice", 0.6),
    ("peaceful", 0.5),
    ("perfect", 1.0),
    ("pleasant", 0.7),
    ("productive", 0.5),
    ("proud", 0.8),
    ("relaxed", 0.4),
    ("rested", 0.3),
    ("strong", 0.4),
    ("successful", 0.75),
    ("thankful", 0.6),
    ("wonderful", 1.0),
    ("afraid", -0.6),
    ("alone", -0.3),
    ("angry", -0.5),
    ("annoyed", -0.4),
    ("anxious", -0.5),
    ("ashamed", -0.6),
    ("awful", -1.0),
    ("bad", -0.7),
    ("bored", -0.5),
    ("broken", -0.4),
    ("depressed", -0.8),
    ("difficult", -0.5),
    ("disappointed", -0.75),
    ("disappointing", -0.6),
    ("exhausted", -0.5),
    ("frustrated", -0.7),
    ("guilty", -0.5),
    ("hard", -0.3),
    ("hate", -0.8),
    ("hopeless", -0.8),
    ("horrible", -1.0),
    ("hurt", -0.5),
    ("lonely", -0.6),
    ("lost", -0.3),
    ("miserable", -1.0),
    ("nervous", -0.4),
    ("overwhelmed", -0.6),
    ("pain", -0.5),
    ("painful", -0.7),
    ("panic", -0.6),
    ("poor", -0.4),
    ("sad", -0.5),
    ("scared", -0.6),
    ("sick", -0.7),
    ("stress", -0.5),
    ("stressed", -0.6),
    ("stressful", -0.6),
    ("terrible", -1.0),
    ("tired", -0.4),
    ("ugly", -0.7),
    ("unhappy", -0.6),
    ("upset", -0.6),
    ("worried", -0.5),
    ("worse", -0.6),
    ("worst", -1.0),
];

/// Lexicon scorer: averages the valence of every known word. A negator in
/// the two preceding tokens flips and halves a word; an intensifier directly
/// before it scales it up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexiconScorer;

impl LexiconScorer {
    fn valence(word: &str) -> Option<f64> {
        LEXICON
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, v)| *v)
    }

    fn is_negator(word: &str) -> bool {
        NEGATORS.contains(&word)
            || word.ends_with("n't")
            || matches!(word, "dont" | "cant" | "wont" | "isnt" | "wasnt" | "didnt")
    }

    fn intensity(word: &str) -> f64 {
        INTENSIFIERS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, f)| *f)
            .unwrap_or(1.0)
    }
}

impl SentimentScorer for LexiconScorer {
    fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase().replace('\u{2019}', "'"))
            .collect();

        let mut total = 0.0;
        let mut scored = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            let Some(mut value) = Self::valence(token) else {
                continue;
            };
            if i > 0 {
                value *= Self::intensity(&tokens[i - 1]);
            }
            let negated = tokens[i.saturating_sub(2)..i]
                .iter()
                .any(|t| Self::is_negator(t));
            if negated {
                value *= -0.5;
            }
            total += value;
            scored += 1;
        }

        if scored == 0 {
            return 0.0;
        }
        (total / scored as f64).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_unknown_text_is_neutral() {
        assert_eq!(LexiconScorer.polarity(""), 0.0);
        assert_eq!(LexiconScorer.polarity("   "), 0.0);
        assert_eq!(LexiconScorer.polarity("the cat sat on the mat"), 0.0);
    }

    #[test]
    fn positive_and_negative_words_have_matching_sign() {
        assert!(LexiconScorer.polarity("What a great day") > 0.0);
        assert!(LexiconScorer.polarity("I feel sad and lonely") < 0.0);
    }

    #[test]
    fn negation_flips_polarity() {
        assert!(LexiconScorer.polarity("I am not happy") < 0.0);
        assert!(LexiconScorer.polarity("I don't feel bad") > 0.0);
    }

    #[test]
    fn intensifiers_strengthen_but_stay_in_range() {
        let plain = LexiconScorer.polarity("good");
        let strong = LexiconScorer.polarity("very good");
        assert!(strong > plain);
        let extreme = LexiconScorer.polarity("extremely perfect, extremely awesome");
        assert!(extreme <= 1.0);
    }
}
