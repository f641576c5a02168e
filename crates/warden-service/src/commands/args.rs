//! Argument tokenizer for message commands
//!
//! Arguments are separated by whitespace; double quotes group words.

/// Parsed command parameters
#[derive(Debug, Clone, Default)]
pub struct Args {
    raw: String,
    tokens: Vec<Token>,
    cursor: usize,
}

#[derive(Debug, Clone)]
struct Token {
    value: String,
    /// Byte offset of the token in `raw`
    start: usize,
}

impl Args {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            tokens: tokenize(raw),
            cursor: 0,
        }
    }

    /// Take the next argument
    pub fn next(&mut self) -> Option<String> {
        let token = self.tokens.get(self.cursor)?;
        self.cursor += 1;
        Some(token.value.clone())
    }

    /// Look at the next argument without taking it
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.cursor).map(|t| t.value.as_str())
    }

    /// Take everything left as written, `None` if nothing is left
    pub fn rest(&mut self) -> Option<String> {
        let token = self.tokens.get(self.cursor)?;
        let rest = self.raw[token.start..].trim().to_string();
        self.cursor = self.tokens.len();
        Some(rest)
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unparsed parameter string
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = raw.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut value = String::new();
        if c == '"' {
            chars.next();
            for (_, c) in chars.by_ref() {
                if c == '"' {
                    break;
                }
                value.push(c);
            }
        } else {
            while let Some(&(_, c)) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
        }
        tokens.push(Token { value, start });
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_whitespace() {
        let mut args = Args::new("  one two\tthree ");
        assert_eq!(args.remaining(), 3);
        assert_eq!(args.next().as_deref(), Some("one"));
        assert_eq!(args.peek(), Some("two"));
        assert_eq!(args.next().as_deref(), Some("two"));
        assert_eq!(args.next().as_deref(), Some("three"));
        assert!(args.next().is_none());
        assert!(args.is_empty());
    }

    #[test]
    fn test_quotes_group_words() {
        let mut args = Args::new(r#"set "hello world" x"#);
        assert_eq!(args.next().as_deref(), Some("set"));
        assert_eq!(args.next().as_deref(), Some("hello world"));
        assert_eq!(args.next().as_deref(), Some("x"));
    }

    #[test]
    fn test_rest_keeps_original_spacing() {
        let mut args = Args::new("@user 1d  spamming   in general");
        args.next();
        args.next();
        assert_eq!(args.rest().as_deref(), Some("spamming   in general"));
        assert!(args.rest().is_none());
    }

    #[test]
    fn test_empty() {
        let mut args = Args::new("   ");
        assert!(args.is_empty());
        assert!(args.rest().is_none());
        assert_eq!(args.raw(), "   ");
    }
}
