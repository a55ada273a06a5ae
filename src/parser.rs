use crate::error::SyntaxError;
use crate::token::{Op, Token, TokenKind};

/// Convert an infix token sequence to postfix, with the shunting-yard
/// algorithm.
///
/// Two juxtaposed operands (`2x`, `x sin(x)`, `3(x+1)`) are multiplied: a
/// `*` is introduced between them, at the position of the second operand. A
/// leading `-` is read as `0 - ...`.
///
/// # Examples
///
/// ```
/// # use calculaterm::{to_postfix, tokenize, Registry};
/// let registry = Registry::new();
/// let tokens = tokenize("sin(x) + 2*x", &registry).unwrap();
/// let postfix: Vec<_> = to_postfix(&tokens)
///     .unwrap()
///     .into_iter()
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(postfix, vec!["x", "sin", "2", "x", "*", "+"]);
/// ```
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, SyntaxError> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();
    let mut previous: Option<TokenKind> = None;

    'tokens: for token in tokens {
        if ends_operand(previous) && starts_operand(token.kind) {
            let implicit = Token::new(TokenKind::Operator(Op::Mul), "*", token.position);
            push_operator(implicit, Op::Mul, &mut operators, &mut output);
        }
        previous = Some(token.kind);

        match token.kind {
            TokenKind::Number | TokenKind::Variable | TokenKind::Constant => {
                output.push(token.clone())
            }
            TokenKind::Function | TokenKind::LParen => operators.push(token.clone()),
            TokenKind::Operator(op) => {
                if op == Op::Minus && output.is_empty() && operators.is_empty() {
                    output.push(Token::new(TokenKind::Number, "0", token.position));
                }
                push_operator(token.clone(), op, &mut operators, &mut output);
            }
            TokenKind::RParen => {
                while let Some(top) = operators.pop() {
                    match top.kind {
                        TokenKind::LParen => {
                            let next_is_fn = operators
                                .last()
                                .map_or(false, |t| t.kind == TokenKind::Function);
                            if next_is_fn {
                                output.extend(operators.pop());
                            }
                            continue 'tokens;
                        }
                        _ => output.push(top),
                    }
                }
                return Err(SyntaxError::new(
                    "unmatched closing parenthesis",
                    token.position,
                ));
            }
        }
    }

    while let Some(top) = operators.pop() {
        if top.kind == TokenKind::LParen {
            return Err(SyntaxError::new("unclosed parenthesis", top.position));
        }
        output.push(top);
    }

    log::trace!(
        "postfix: {}",
        output.iter().map(|t| t.text.as_str()).collect::<Vec<_>>().join(" ")
    );
    Ok(output)
}

fn push_operator(token: Token, o1: Op, operators: &mut Vec<Token>, output: &mut Vec<Token>) {
    while let Some(top) = operators.last() {
        let pop_me = match top.kind {
            TokenKind::Operator(o2) => {
                o1.is_left_associative() && o1.precedence() <= o2.precedence()
            }
            _ => false,
        };
        if !pop_me {
            break;
        }
        output.extend(operators.pop());
    }
    operators.push(token);
}

fn ends_operand(kind: Option<TokenKind>) -> bool {
    matches!(
        kind,
        Some(TokenKind::Number) | Some(TokenKind::Variable) | Some(TokenKind::Constant)
    )
}

fn starts_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Number
            | TokenKind::Variable
            | TokenKind::Constant
            | TokenKind::Function
            | TokenKind::LParen
    )
}
