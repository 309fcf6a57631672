//! Option string tokenization
//!
//! Unquoted text is split on whitespace. A double quote toggles quoting and is
//! dropped, so `--arg="a b"` becomes the single token `--arg=a b`. An empty
//! quoted group yields an empty token and an unterminated quote runs to the end
//! of the input. Tokenization never fails.

/// Split an option string into command line tokens
pub fn tokenize(options: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    // Distinguishes `""` from no token at all
    let mut pending = false;

    for ch in options.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            c => {
                current.push(c);
                pending = true;
            }
        }
    }

    if pending {
        tokens.push(current);
    }
    tokens
}

/// Join tokens back into an option string that tokenizes to the same tokens
pub fn join_tokens(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| {
            if token.is_empty() || token.chars().any(char::is_whitespace) {
                format!("\"{}\"", token)
            } else {
                token.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
