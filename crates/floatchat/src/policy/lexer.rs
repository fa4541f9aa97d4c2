use super::PolicyViolation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Unquoted identifier or keyword, original spelling.
    Word(String),
    QuotedIdent(String),
    StringLit,
    Number,
    Param,
    /// Statement terminator at the given char offset.
    Semicolon(usize),
    Punct(char),
}

impl Token {
    pub(crate) fn word_lower(&self) -> Option<String> {
        match self {
            Self::Word(word) => Some(word.to_ascii_lowercase()),
            _ => None,
        }
    }

    pub(crate) fn is_word(&self, expected: &str) -> bool {
        matches!(self, Self::Word(word) if word.eq_ignore_ascii_case(expected))
    }

    pub(crate) fn is_punct(&self, expected: char) -> bool {
        matches!(self, Self::Punct(ch) if *ch == expected)
    }

    /// Identifier text for plain or quoted identifiers.
    pub(crate) fn identifier(&self) -> Option<&str> {
        match self {
            Self::Word(word) | Self::QuotedIdent(word) => Some(word),
            _ => None,
        }
    }
}

pub(crate) fn tokenize(sql: &str) -> Result<Vec<Token>, PolicyViolation> {
    let chars = sql.chars().collect::<Vec<_>>();
    let mut tokens = Vec::new();
    let mut index = 0_usize;

    while index < chars.len() {
        let ch = chars[index];
        let next = chars.get(index + 1).copied();

        if ch.is_whitespace() {
            index += 1;
            continue;
        }

        if ch == '-' && next == Some('-') {
            while index < chars.len() && chars[index] != '\n' {
                index += 1;
            }
            continue;
        }

        if ch == '/' && next == Some('*') {
            let Some(end) = find_block_comment_end(&chars, index + 2) else {
                return Err(malformed("unterminated block comment"));
            };
            index = end;
            continue;
        }

        match ch {
            '\'' => {
                index = consume_quoted(&chars, index, '\'')
                    .ok_or_else(|| malformed("unterminated string literal"))?
                    .0;
                tokens.push(Token::StringLit);
            }
            '"' | '`' => {
                let (end, text) = consume_quoted(&chars, index, ch)
                    .ok_or_else(|| malformed("unterminated quoted identifier"))?;
                index = end;
                tokens.push(Token::QuotedIdent(text));
            }
            '[' => {
                let Some(offset) = chars[index + 1..].iter().position(|c| *c == ']') else {
                    return Err(malformed("unterminated bracketed identifier"));
                };
                let text = chars[index + 1..index + 1 + offset].iter().collect();
                index += offset + 2;
                tokens.push(Token::QuotedIdent(text));
            }
            ';' => {
                tokens.push(Token::Semicolon(index));
                index += 1;
            }
            '?' => {
                index += 1;
                while index < chars.len() && chars[index].is_ascii_digit() {
                    index += 1;
                }
                tokens.push(Token::Param);
            }
            ':' | '@' | '$' if next.is_some_and(|c| c.is_alphanumeric() || c == '_') => {
                index += 1;
                while index < chars.len() && is_identifier_char(chars[index]) {
                    index += 1;
                }
                tokens.push(Token::Param);
            }
            _ if ch.is_ascii_digit() || (ch == '.' && next.is_some_and(|c| c.is_ascii_digit())) => {
                index = consume_number(&chars, index);
                tokens.push(Token::Number);
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let start = index;
                while index < chars.len() && is_identifier_char(chars[index]) {
                    index += 1;
                }
                tokens.push(Token::Word(chars[start..index].iter().collect()));
            }
            _ => {
                index += 1;
                tokens.push(Token::Punct(ch));
            }
        }
    }

    Ok(tokens)
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn find_block_comment_end(chars: &[char], from: usize) -> Option<usize> {
    let mut index = from;
    while index + 1 < chars.len() {
        if chars[index] == '*' && chars[index + 1] == '/' {
            return Some(index + 2);
        }
        index += 1;
    }
    None
}

/// Returns the index after the closing quote and the unescaped body.
fn consume_quoted(chars: &[char], start: usize, quote: char) -> Option<(usize, String)> {
    let mut index = start + 1;
    let mut body = String::new();
    while index < chars.len() {
        if chars[index] == quote {
            if chars.get(index + 1) == Some(&quote) {
                body.push(quote);
                index += 2;
                continue;
            }
            return Some((index + 1, body));
        }
        body.push(chars[index]);
        index += 1;
    }
    None
}

fn consume_number(chars: &[char], start: usize) -> usize {
    let mut index = start;
    while index < chars.len() {
        let ch = chars[index];
        let exponent_sign = (ch == '+' || ch == '-')
            && index > start
            && matches!(chars[index - 1], 'e' | 'E');
        if ch.is_ascii_alphanumeric() || ch == '.' || exponent_sign {
            index += 1;
        } else {
            break;
        }
    }
    index
}

fn malformed(detail: &str) -> PolicyViolation {
    PolicyViolation::Malformed {
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Token, tokenize};

    #[test]
    fn literals_and_comments_hide_their_contents() {
        let tokens = tokenize(
            "SELECT 'DROP TABLE x; --' AS note -- trailing DELETE\n/* UPDATE */ FROM argo_floats",
        )
        .expect("statement should tokenize");
        assert_eq!(
            tokens,
            vec![
                Token::Word("SELECT".to_string()),
                Token::StringLit,
                Token::Word("AS".to_string()),
                Token::Word("note".to_string()),
                Token::Word("FROM".to_string()),
                Token::Word("argo_floats".to_string()),
            ]
        );
    }

    #[test]
    fn quoted_identifiers_unescape_doubled_quotes() {
        let tokens = tokenize(r#"SELECT "tem""p", [salinity], `pressure` FROM t"#)
            .expect("statement should tokenize");
        assert_eq!(tokens[1], Token::QuotedIdent("tem\"p".to_string()));
        assert_eq!(tokens[3], Token::QuotedIdent("salinity".to_string()));
        assert_eq!(tokens[5], Token::QuotedIdent("pressure".to_string()));
    }

    #[test]
    fn numbers_with_exponents_are_single_tokens() {
        let tokens = tokenize("SELECT 1.5e-3, .25, 100").expect("numbers should tokenize");
        assert_eq!(
            tokens
                .iter()
                .filter(|token| matches!(token, Token::Number))
                .count(),
            3
        );
    }

    #[test]
    fn unterminated_literals_are_malformed() {
        assert!(tokenize("SELECT 'open").is_err());
        assert!(tokenize("SELECT 1 /* open").is_err());
        assert!(tokenize("SELECT \"open").is_err());
    }

    #[test]
    fn placeholders_become_params() {
        let tokens = tokenize("SELECT * FROM t WHERE a = ?1 AND b = :name").expect("tokenize");
        assert_eq!(
            tokens
                .iter()
                .filter(|token| matches!(token, Token::Param))
                .count(),
            2
        );
    }
}
