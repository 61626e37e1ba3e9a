//! Parser for the rule predicate expression language.
//!
//! The grammar is a small infix boolean language over the named vital-sign
//! fields:
//!
//! ```text
//! expr       := or_expr
//! or_expr    := and_expr ( "OR" and_expr )*
//! and_expr   := unary ( "AND" unary )*
//! unary      := "NOT" unary | primary
//! primary    := "(" expr ")" | "ALWAYS" | comparison
//! comparison := field op value
//! op         := "<" | "<=" | ">" | ">=" | "=="
//! value      := number | category token (e.g. UNRESPONSIVE, CHEST_PAIN)
//! ```
//!
//! Field names are the lowercase identifiers of [`Field`]; category tokens
//! are uppercase. Comparisons are type-checked while parsing: numeric fields
//! take numbers with any operator, categorical fields (`consciousness`,
//! `symptom`) take their tokens and only `==`. The canonical text emitted by
//! `Predicate`'s `Display` re-parses to an identical tree, so definitions
//! are round-trip safe.

use crate::complaint::SymptomCategory;
use crate::rules::predicate::{CompareOp, Field, Predicate, Value};
use crate::vitals::ConsciousnessLevel;
use crate::{TriageError, TriageResult};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Op(CompareOp),
    Number(f64),
    // Keywords, field names and category tokens all lex as words.
    Word(String),
}

fn invalid(expression: &str, message: impl AsRef<str>) -> TriageError {
    TriageError::InvalidRuleDefinition(format!(
        "predicate {:?}: {}",
        expression,
        message.as_ref()
    ))
}

fn tokenize(expression: &str) -> TriageResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let bytes = expression.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '<' | '>' => {
                let wide = bytes.get(i + 1) == Some(&b'=');
                tokens.push(Token::Op(match (c, wide) {
                    ('<', true) => CompareOp::Le,
                    ('<', false) => CompareOp::Lt,
                    ('>', true) => CompareOp::Ge,
                    (_, false) => CompareOp::Gt,
                    _ => unreachable!(),
                }));
                i += if wide { 2 } else { 1 };
            }
            '=' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token::Op(CompareOp::Eq));
                    i += 2;
                } else {
                    return Err(invalid(expression, "single '=' (use '==')"));
                }
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                let literal = &expression[start..i];
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(expression, format!("bad number {:?}", literal)))?;
                tokens.push(Token::Number(number));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push(Token::Word(expression[start..i].to_string()));
            }
            other => {
                return Err(invalid(
                    expression,
                    format!("unexpected character {:?}", other),
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    fn or_expr(&mut self) -> TriageResult<Predicate> {
        let mut children = vec![self.and_expr()?];
        while self.peek_word("OR") {
            self.next();
            children.push(self.and_expr()?);
        }
        Ok(if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Predicate::Or(children)
        })
    }

    fn and_expr(&mut self) -> TriageResult<Predicate> {
        let mut children = vec![self.unary()?];
        while self.peek_word("AND") {
            self.next();
            children.push(self.unary()?);
        }
        Ok(if children.len() == 1 {
            children.pop().unwrap()
        } else {
            Predicate::And(children)
        })
    }

    fn unary(&mut self) -> TriageResult<Predicate> {
        if self.peek_word("NOT") {
            self.next();
            return Ok(Predicate::Not(Box::new(self.unary()?)));
        }
        self.primary()
    }

    fn primary(&mut self) -> TriageResult<Predicate> {
        match self.next() {
            Some(Token::LParen) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(invalid(self.expression, "missing closing ')'")),
                }
            }
            Some(Token::Word(word)) if word == "ALWAYS" => Ok(Predicate::Always),
            Some(Token::Word(word)) => self.comparison(&word),
            Some(token) => Err(invalid(
                self.expression,
                format!("expected field, ALWAYS or '(' but found {:?}", token),
            )),
            None => Err(invalid(self.expression, "unexpected end of expression")),
        }
    }

    fn comparison(&mut self, field_name: &str) -> TriageResult<Predicate> {
        let field = Field::from_name(field_name).ok_or_else(|| {
            invalid(self.expression, format!("unknown field {:?}", field_name))
        })?;

        let op = match self.next() {
            Some(Token::Op(op)) => op,
            _ => {
                return Err(invalid(
                    self.expression,
                    format!("expected comparison operator after {:?}", field_name),
                ));
            }
        };

        let value = match self.next() {
            Some(Token::Number(n)) if !field.is_categorical() => Value::Number(n),
            Some(Token::Number(_)) => {
                return Err(invalid(
                    self.expression,
                    format!("field {:?} takes a category token, not a number", field_name),
                ));
            }
            Some(Token::Word(token)) => self.categorical_value(field, &token)?,
            _ => {
                return Err(invalid(
                    self.expression,
                    format!("expected value after {:?} {}", field_name, op.symbol()),
                ));
            }
        };

        if field.is_categorical() && op != CompareOp::Eq {
            return Err(invalid(
                self.expression,
                format!("field {:?} only supports '=='", field_name),
            ));
        }

        Ok(Predicate::Compare { field, op, value })
    }

    fn categorical_value(&self, field: Field, token: &str) -> TriageResult<Value> {
        match field {
            Field::Consciousness => ConsciousnessLevel::from_token(token)
                .map(Value::Consciousness)
                .ok_or_else(|| {
                    invalid(
                        self.expression,
                        format!("unknown consciousness level {:?}", token),
                    )
                }),
            Field::Symptom => SymptomCategory::from_token(token)
                .map(Value::Symptom)
                .ok_or_else(|| {
                    invalid(
                        self.expression,
                        format!("unknown symptom category {:?}", token),
                    )
                }),
            _ => Err(invalid(
                self.expression,
                format!(
                    "field {:?} takes a number, not token {:?}",
                    field.name(),
                    token
                ),
            )),
        }
    }
}

/// Parses a predicate expression into its tree form.
///
/// # Errors
///
/// Returns [`TriageError::InvalidRuleDefinition`] quoting the expression if
/// it is syntactically malformed, references an unknown field or category
/// token, or compares a field against a value of the wrong type.
pub fn parse_predicate(expression: &str) -> TriageResult<Predicate> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(invalid(expression, "empty expression"));
    }

    let mut parser = Parser {
        expression,
        tokens,
        pos: 0,
    };
    let predicate = parser.or_expr()?;

    if let Some(trailing) = parser.peek() {
        return Err(invalid(
            expression,
            format!("trailing input starting at {:?}", trailing),
        ));
    }

    Ok(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trips(expression: &str) {
        let parsed = parse_predicate(expression).expect("should parse");
        let canonical = parsed.to_string();
        let reparsed = parse_predicate(&canonical).expect("canonical text should re-parse");
        assert_eq!(parsed, reparsed, "round trip changed {:?}", expression);
    }

    #[test]
    fn test_parses_simple_comparison() {
        let predicate = parse_predicate("spo2 < 90").unwrap();
        assert_eq!(
            predicate,
            Predicate::Compare {
                field: Field::Spo2,
                op: CompareOp::Lt,
                value: Value::Number(90.0),
            }
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let predicate = parse_predicate("spo2 < 90 OR systolic_bp < 90 AND heart_rate > 120").unwrap();
        match predicate {
            Predicate::Or(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[1], Predicate::And(_)));
            }
            other => panic!("expected OR at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let predicate =
            parse_predicate("(spo2 < 90 OR systolic_bp < 90) AND heart_rate > 120").unwrap();
        match predicate {
            Predicate::And(children) => {
                assert!(matches!(children[0], Predicate::Or(_)));
            }
            other => panic!("expected AND at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_not_and_always() {
        let predicate = parse_predicate("NOT consciousness == ALERT").unwrap();
        assert!(matches!(predicate, Predicate::Not(_)));
        assert_eq!(parse_predicate("ALWAYS").unwrap(), Predicate::Always);
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = parse_predicate("pulse < 50").expect_err("should reject");
        assert!(
            matches!(err, TriageError::InvalidRuleDefinition(msg) if msg.contains("unknown field"))
        );
    }

    #[test]
    fn test_rejects_mistyped_comparisons() {
        assert!(parse_predicate("consciousness < UNRESPONSIVE").is_err());
        assert!(parse_predicate("consciousness == 3").is_err());
        assert!(parse_predicate("spo2 == UNRESPONSIVE").is_err());
        assert!(parse_predicate("symptom == NOT_A_SYMPTOM").is_err());
    }

    #[test]
    fn test_rejects_malformed_expressions() {
        for bad in ["", "spo2 <", "spo2 90", "(spo2 < 90", "spo2 < 90 extra", "spo2 = 90"] {
            assert!(parse_predicate(bad).is_err(), "should reject {:?}", bad);
        }
    }

    #[test]
    fn test_canonical_text_round_trips() {
        round_trips("spo2 < 90");
        round_trips("consciousness == UNRESPONSIVE");
        round_trips("systolic_bp < 90 AND heart_rate > 120");
        round_trips("(spo2 < 90 OR systolic_bp < 90) AND NOT consciousness == ALERT");
        round_trips("temperature >= 39.5 OR symptom == FEVER");
        round_trips("ALWAYS");
    }
}
