use waittask_types::{ErrorKind, WaitTaskError};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    String(String),
    Dot,
    Comma,
    LParen,
    RParen,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Eof,
}

/// Tokenize a `condition` expression source string.
///
/// This is a hand-rolled scanner, not a general grammar — it recognizes
/// exactly the tokens the parser's grammar uses (spec §4.1), so a source
/// string using anything else (e.g. a user-defined function call) fails
/// here rather than being silently accepted.
pub fn lex(source: &str) -> Result<Vec<Token>, WaitTaskError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => {
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '=' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::EqEq);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::NotEq);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '<' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Le);
                i += 2;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '>' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ge);
                i += 2;
            }
            '>' => {
                tokens.push(Token::Gt);
                i += 1;
            }
            '&' if chars.get(i + 1) == Some(&'&') => {
                tokens.push(Token::AndAnd);
                i += 2;
            }
            '|' if chars.get(i + 1) == Some(&'|') => {
                tokens.push(Token::OrOr);
                i += 2;
            }
            '\'' | '"' => {
                let quote = c;
                let mut s = String::new();
                i += 1;
                let mut closed = false;
                while i < chars.len() {
                    let c2 = chars[i];
                    if c2 == quote {
                        closed = true;
                        i += 1;
                        break;
                    }
                    if c2 == '\\' && i + 1 < chars.len() {
                        s.push(chars[i + 1]);
                        i += 2;
                        continue;
                    }
                    s.push(c2);
                    i += 1;
                }
                if !closed {
                    return Err(WaitTaskError::new(
                        ErrorKind::InvalidConfig,
                        "unterminated string literal in condition",
                    ));
                }
                tokens.push(Token::String(s));
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                let n: f64 = raw.parse().map_err(|_| {
                    WaitTaskError::new(
                        ErrorKind::InvalidConfig,
                        format!("invalid number literal '{raw}' in condition"),
                    )
                })?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                tokens.push(Token::Ident(raw));
            }
            other => {
                return Err(WaitTaskError::new(
                    ErrorKind::InvalidConfig,
                    format!("unexpected character '{other}' in condition"),
                ));
            }
        }
    }

    tokens.push(Token::Eof);
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_field_path_and_string_equality() {
        let tokens = lex("signal.payload.status == 'approved'").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("signal".into()),
                Token::Dot,
                Token::Ident("payload".into()),
                Token::Dot,
                Token::Ident("status".into()),
                Token::EqEq,
                Token::String("approved".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn lexes_boolean_composition() {
        let tokens = lex("a && !b || c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("a".into()),
                Token::AndAnd,
                Token::Bang,
                Token::Ident("b".into()),
                Token::OrOr,
                Token::Ident("c".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(lex("signal.payload.status == 'approved").is_err());
    }
}
