//! Tokenizer backends.
//!
//! A backend turns text into a token count. It must be deterministic and
//! must report failures as errors instead of panicking. The built-in
//! backend uses tiktoken-rs with the cl100k_base encoding (GPT-4 family).

use tiktoken_rs::CoreBPE;

use crate::error::{TokenError, TokenResult};

/// Pluggable text to token-count function.
pub trait Tokenizer: Send + Sync {
    /// Short backend name for logs and reports.
    fn name(&self) -> &str;

    /// Count tokens in `text`. Empty text counts as zero.
    fn count_tokens(&self, text: &str) -> TokenResult<usize>;
}

/// cl100k_base tokenizer, loaded once.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> TokenResult<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| {
            TokenError::Configuration(format!("failed to load cl100k_base tokenizer: {}", e))
        })?;
        Ok(Self { bpe })
    }
}

impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cl100kTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn name(&self) -> &str {
        "cl100k_base"
    }

    fn count_tokens(&self, text: &str) -> TokenResult<usize> {
        if text.is_empty() {
            return Ok(0);
        }
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cl100k_counts() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        assert_eq!(tokenizer.count_tokens("").unwrap(), 0);
        assert_eq!(tokenizer.count_tokens("hello world").unwrap(), 2);

        let long = "The quick brown fox jumps over the lazy dog. ".repeat(200);
        let count = tokenizer.count_tokens(&long).unwrap();
        assert!(count > 1000 && count < long.len());
    }

    #[test]
    fn test_cl100k_is_deterministic_on_unicode() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "héllo wörld 你好 🚀";
        let first = tokenizer.count_tokens(text).unwrap();
        assert!(first > 0);
        assert_eq!(first, tokenizer.count_tokens(text).unwrap());
    }
}
