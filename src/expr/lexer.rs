//! Regex tokenizer for the debugger expression language.
//!
//! Rules are tried in declared order and matched as a prefix at the current
//! position; the order itself resolves ambiguity (`==` is tried before the
//! single-character arithmetic/comparison rules would otherwise shadow it,
//! hex is tried before decimal). Two rules have lexer side effects: `REG` is
//! resolved immediately against the register file and becomes a `DEC` token
//! holding its decimal value; `HEX` becomes a `DEC` token holding the decimal
//! form of its unsigned value.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::CommandError;
use crate::expr::token::{Token, TokenKind};

/// Supplies register values to the lexer for `$reg` resolution.
pub trait RegisterLookup {
    /// Resolve a register name (without the leading `$`) to its current
    /// 32-bit value. Returns `None` for an unknown name.
    fn lookup(&self, name: &str) -> Option<u32>;
}

enum RuleKind {
    Whitespace,
    Fixed(TokenKind),
    Hex,
    Dec,
    Reg,
}

struct Rule {
    re: Regex,
    kind: RuleKind,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    let spec: &[(&str, RuleKind)] = &[
        (r"^\s+", RuleKind::Whitespace),
        (r"^\+", RuleKind::Fixed(TokenKind::Plus)),
        (r"^-", RuleKind::Fixed(TokenKind::Minus)),
        (r"^\*", RuleKind::Fixed(TokenKind::Mul)),
        (r"^/", RuleKind::Fixed(TokenKind::Div)),
        (r"^==", RuleKind::Fixed(TokenKind::Eq)),
        (r"^!=", RuleKind::Fixed(TokenKind::Ne)),
        (r"^>=", RuleKind::Fixed(TokenKind::Ge)),
        (r"^<=", RuleKind::Fixed(TokenKind::Le)),
        (r"^<", RuleKind::Fixed(TokenKind::Lt)),
        (r"^>", RuleKind::Fixed(TokenKind::Gt)),
        (r"^!", RuleKind::Fixed(TokenKind::Not)),
        (r"^\(", RuleKind::Fixed(TokenKind::Lp)),
        (r"^\)", RuleKind::Fixed(TokenKind::Rp)),
        (r"^0[xX][0-9a-fA-F]+", RuleKind::Hex),
        (r"^[0-9]+u?", RuleKind::Dec),
        (r"^\$[a-z]{0,2}[0-9]{0,2}", RuleKind::Reg),
        (r"^&&", RuleKind::Fixed(TokenKind::And)),
        (r"^\|\|", RuleKind::Fixed(TokenKind::Or)),
    ];
    spec.iter()
        .map(|(pat, kind)| Rule {
            re: Regex::new(pat).expect("static lexer pattern is valid"),
            kind: match kind {
                RuleKind::Whitespace => RuleKind::Whitespace,
                RuleKind::Fixed(k) => RuleKind::Fixed(*k),
                RuleKind::Hex => RuleKind::Hex,
                RuleKind::Dec => RuleKind::Dec,
                RuleKind::Reg => RuleKind::Reg,
            },
        })
        .collect()
});

/// Tokenize `input`, resolving `REG`/`HEX` side effects against `regs`.
pub fn tokenize(input: &str, regs: &dyn RegisterLookup) -> Result<Vec<Token>, CommandError> {
    let mut tokens = Vec::new();
    let mut pos = 0usize;
    'outer: while pos < input.len() {
        let rest = &input[pos..];
        for rule in RULES.iter() {
            if let Some(m) = rule.re.find(rest) {
                if m.start() != 0 {
                    continue;
                }
                let text = m.as_str();
                match &rule.kind {
                    RuleKind::Whitespace => {}
                    RuleKind::Fixed(kind) => tokens.push(Token::new(*kind, text)),
                    RuleKind::Hex => {
                        let value = u32::from_str_radix(&text[2..], 16)
                            .map_err(|_| CommandError::LexError { position: pos })?;
                        tokens.push(Token::new(TokenKind::Dec, value.to_string()));
                    }
                    RuleKind::Dec => {
                        let digits = text.trim_end_matches('u');
                        tokens.push(Token::new(TokenKind::Dec, digits.to_string()));
                    }
                    RuleKind::Reg => {
                        let name = &text[1..];
                        let value = regs
                            .lookup(name)
                            .ok_or(CommandError::LexError { position: pos })?;
                        tokens.push(Token::new(TokenKind::Dec, value.to_string()));
                    }
                }
                pos += text.len();
                continue 'outer;
            }
        }
        return Err(CommandError::LexError { position: pos });
    }
    disambiguate_unary(&mut tokens);
    Ok(tokens)
}

/// Reclassify `*`/`-` as unary `DEREF`/`REV` when they cannot be binary
/// operators: at position 0, or not preceded by a value-producing token.
/// `HEX`/`REG` have already become `DEC` by the time this runs, so the
/// "cannot precede a unary operator" set is simply `{DEC, RP}`.
fn disambiguate_unary(tokens: &mut [Token]) {
    for i in 0..tokens.len() {
        let becomes_unary = match tokens[i].kind {
            TokenKind::Mul | TokenKind::Minus => {
                i == 0
                    || !matches!(tokens[i - 1].kind, TokenKind::Dec | TokenKind::Rp)
            }
            _ => false,
        };
        if becomes_unary {
            tokens[i].kind = match tokens[i].kind {
                TokenKind::Mul => TokenKind::Deref,
                TokenKind::Minus => TokenKind::Rev,
                other => other,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoRegs;
    impl RegisterLookup for NoRegs {
        fn lookup(&self, _name: &str) -> Option<u32> {
            None
        }
    }

    struct FixedRegs(u32);
    impl RegisterLookup for FixedRegs {
        fn lookup(&self, _name: &str) -> Option<u32> {
            Some(self.0)
        }
    }

    #[test]
    fn tokenizes_arithmetic() {
        let toks = tokenize("1 + 2 * 3", &NoRegs).unwrap();
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dec,
                TokenKind::Plus,
                TokenKind::Dec,
                TokenKind::Mul,
                TokenKind::Dec
            ]
        );
    }

    #[test]
    fn hex_becomes_decimal_token() {
        let toks = tokenize("0x10", &NoRegs).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Dec);
        assert_eq!(toks[0].text, "16");
    }

    #[test]
    fn register_resolves_via_lookup() {
        let toks = tokenize("$a0", &FixedRegs(7)).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Dec);
        assert_eq!(toks[0].text, "7");
    }

    #[test]
    fn leading_minus_becomes_rev() {
        let toks = tokenize("-5 + 10", &NoRegs).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Rev);
    }

    #[test]
    fn leading_star_becomes_deref() {
        let toks = tokenize("*0x1000", &NoRegs).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Deref);
    }

    #[test]
    fn star_after_value_is_binary_multiply() {
        let toks = tokenize("2 * 3", &NoRegs).unwrap();
        assert_eq!(toks[1].kind, TokenKind::Mul);
    }

    #[test]
    fn unrecognized_input_is_lex_error() {
        let err = tokenize("1 @ 2", &NoRegs).unwrap_err();
        assert_eq!(err, CommandError::LexError { position: 2 });
    }
}
