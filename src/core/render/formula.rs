//! Formula and condition evaluation
//!
//! Calculated-field formulas and interpretation-rule conditions are
//! template-authored and tenants may customize templates, so evaluation runs
//! under a hard allow-listed grammar rather than a general-purpose
//! interpreter: numbers, strings, field-code identifiers, patient context
//! tokens, arithmetic, comparisons, boolean and/or/not, parentheses, and a
//! fixed function set. Evaluation is pure: no I/O, no timers, nothing beyond
//! the supplied result/calculated/patient maps.
//!
//! Named clinical formulas (`egfr`, `qtc`) are dedicated functions selected
//! by formula-name prefix before the generic evaluator is consulted; see
//! [`super::clinical`].

use super::clinical;
use crate::domain::errors::AssayError;
use crate::domain::patient::PatientContext;
use crate::domain::result::Result;
use serde_json::Value;
use std::collections::BTreeMap;

/// Value produced by expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum EvalValue {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

impl EvalValue {
    fn as_number(&self) -> Result<f64> {
        match self {
            EvalValue::Number(n) => Ok(*n),
            EvalValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| AssayError::FormulaEvaluation(format!("'{s}' is not a number"))),
            EvalValue::Bool(_) => Err(AssayError::FormulaEvaluation(
                "expected a number, found a boolean".to_string(),
            )),
            EvalValue::Null => Err(AssayError::FormulaEvaluation(
                "expected a number, found null".to_string(),
            )),
        }
    }

    fn as_bool(&self) -> Result<bool> {
        match self {
            EvalValue::Bool(b) => Ok(*b),
            other => Err(AssayError::FormulaEvaluation(format!(
                "expected a boolean, found {other:?}"
            ))),
        }
    }
}

/// Evaluation environment: raw results, previously calculated values, and
/// patient context
///
/// Identifier resolution order: `patient.*` context tokens, then calculated
/// values (so later formulas may reference earlier calculated codes), then
/// raw results. Unknown identifiers are an error, which the renderer
/// recovers from by nulling the calculated field or skipping the rule.
pub struct EvalContext<'a> {
    pub results: &'a BTreeMap<String, Value>,
    pub calculated: &'a BTreeMap<String, Value>,
    pub patient: &'a PatientContext,
}

impl<'a> EvalContext<'a> {
    pub fn new(
        results: &'a BTreeMap<String, Value>,
        calculated: &'a BTreeMap<String, Value>,
        patient: &'a PatientContext,
    ) -> Self {
        Self {
            results,
            calculated,
            patient,
        }
    }

    fn lookup(&self, ident: &str) -> Result<EvalValue> {
        match ident {
            "patient.age" => Ok(self
                .patient
                .age_years
                .map(EvalValue::Number)
                .unwrap_or(EvalValue::Null)),
            "patient.gender" => Ok(self
                .patient
                .gender
                .map(|g| EvalValue::Text(g.to_string()))
                .unwrap_or(EvalValue::Null)),
            "patient.pregnant" => Ok(EvalValue::Bool(self.patient.pregnant)),
            _ => {
                let raw = self
                    .calculated
                    .get(ident)
                    .or_else(|| self.results.get(ident));
                match raw {
                    Some(value) => Ok(json_to_eval(value)),
                    None => Err(AssayError::FormulaEvaluation(format!(
                        "unknown token '{ident}'"
                    ))),
                }
            }
        }
    }

    /// Numeric lookup used by the named clinical formulas
    pub fn number(&self, ident: &str) -> Result<f64> {
        self.lookup(ident)?.as_number()
    }
}

fn json_to_eval(value: &Value) -> EvalValue {
    match value {
        Value::Number(n) => n.as_f64().map(EvalValue::Number).unwrap_or(EvalValue::Null),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => EvalValue::Number(n),
            Err(_) => EvalValue::Text(s.clone()),
        },
        Value::Bool(b) => EvalValue::Bool(*b),
        _ => EvalValue::Null,
    }
}

/// Evaluates a calculated-field formula to a number
///
/// Dispatches on formula-name prefix first: `egfr(...)` and `qtc(...)` run
/// the dedicated clinical implementations; everything else goes through the
/// generic expression grammar.
///
/// # Errors
///
/// Returns `FormulaEvaluation` for unknown tokens, malformed expressions,
/// division failures, or non-numeric outcomes. Callers treat this as a null
/// calculated value, never a render abort.
pub fn evaluate_calculated(formula: &str, ctx: &EvalContext<'_>) -> Result<f64> {
    let trimmed = formula.trim();

    if let Some(args) = named_formula_args(trimmed, "egfr") {
        return clinical::egfr_from_context(&args, ctx);
    }
    if let Some(args) = named_formula_args(trimmed, "qtc") {
        return clinical::qtc_from_context(&args, ctx);
    }

    evaluate_expression(trimmed, ctx)?.as_number()
}

/// Evaluates an interpretation-rule condition to a boolean
pub fn evaluate_condition(condition: &str, ctx: &EvalContext<'_>) -> Result<bool> {
    evaluate_expression(condition, ctx)?.as_bool()
}

/// Evaluates an expression under the allow-listed grammar
pub fn evaluate_expression(expression: &str, ctx: &EvalContext<'_>) -> Result<EvalValue> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser::new(tokens, ctx);
    let value = parser.parse_or()?;
    parser.expect_end()?;
    Ok(value)
}

/// Splits `name(arg1, arg2)` into its argument identifiers when the formula
/// starts with the given name; top-level commas only
fn named_formula_args(formula: &str, name: &str) -> Option<Vec<String>> {
    let rest = formula.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(
        inner
            .split(',')
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Text(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
    True,
    False,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
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
            '%' => {
                tokens.push(Token::Percent);
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
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '<' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Le);
                    i += 2;
                } else {
                    tokens.push(Token::Lt);
                    i += 1;
                }
            }
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ge);
                    i += 2;
                } else {
                    tokens.push(Token::Gt);
                    i += 1;
                }
            }
            '=' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Eq);
                    i += 2;
                } else {
                    return Err(AssayError::FormulaEvaluation(
                        "single '=' is not an operator; use '=='".to_string(),
                    ));
                }
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    tokens.push(Token::Ne);
                    i += 2;
                } else {
                    return Err(AssayError::FormulaEvaluation(
                        "unexpected '!'; use 'not'".to_string(),
                    ));
                }
            }
            '\'' | '"' => {
                let quote = c;
                let start = i + 1;
                let mut j = start;
                while j < chars.len() && chars[j] != quote {
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(AssayError::FormulaEvaluation(
                        "unterminated string literal".to_string(),
                    ));
                }
                tokens.push(Token::Text(chars[start..j].iter().collect()));
                i = j + 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let number = text.parse::<f64>().map_err(|_| {
                    AssayError::FormulaEvaluation(format!("malformed number '{text}'"))
                })?;
                tokens.push(Token::Number(number));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '.')
                {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                tokens.push(match word.as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    "true" => Token::True,
                    "false" => Token::False,
                    _ => Token::Ident(word),
                });
            }
            other => {
                return Err(AssayError::FormulaEvaluation(format!(
                    "unexpected character '{other}'"
                )))
            }
        }
    }

    Ok(tokens)
}

/// Math functions available to template formulas
const ALLOWED_FUNCTIONS: &[&str] = &["abs", "min", "max", "round", "floor", "ceil", "sqrt", "pow"];

struct Parser<'a, 'b> {
    tokens: Vec<Token>,
    position: usize,
    ctx: &'a EvalContext<'b>,
}

impl<'a, 'b> Parser<'a, 'b> {
    fn new(tokens: Vec<Token>, ctx: &'a EvalContext<'b>) -> Self {
        Self {
            tokens,
            position: 0,
            ctx,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(AssayError::FormulaEvaluation(format!(
                "expected {expected:?}, found {:?}",
                self.peek()
            )))
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.position == self.tokens.len() {
            Ok(())
        } else {
            Err(AssayError::FormulaEvaluation(format!(
                "unexpected trailing token {:?}",
                self.peek()
            )))
        }
    }

    fn parse_or(&mut self) -> Result<EvalValue> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            left = EvalValue::Bool(left.as_bool()? || right.as_bool()?);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<EvalValue> {
        let mut left = self.parse_not()?;
        while self.eat(&Token::And) {
            let right = self.parse_not()?;
            left = EvalValue::Bool(left.as_bool()? && right.as_bool()?);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<EvalValue> {
        if self.eat(&Token::Not) {
            let value = self.parse_not()?;
            return Ok(EvalValue::Bool(!value.as_bool()?));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<EvalValue> {
        let left = self.parse_additive()?;
        let op = match self.peek() {
            Some(Token::Lt) => Token::Lt,
            Some(Token::Le) => Token::Le,
            Some(Token::Gt) => Token::Gt,
            Some(Token::Ge) => Token::Ge,
            Some(Token::Eq) => Token::Eq,
            Some(Token::Ne) => Token::Ne,
            _ => return Ok(left),
        };
        self.position += 1;
        let right = self.parse_additive()?;
        compare(&op, &left, &right)
    }

    fn parse_additive(&mut self) -> Result<EvalValue> {
        let mut left = self.parse_term()?;
        loop {
            if self.eat(&Token::Plus) {
                let right = self.parse_term()?;
                left = EvalValue::Number(left.as_number()? + right.as_number()?);
            } else if self.eat(&Token::Minus) {
                let right = self.parse_term()?;
                left = EvalValue::Number(left.as_number()? - right.as_number()?);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_term(&mut self) -> Result<EvalValue> {
        let mut left = self.parse_unary()?;
        loop {
            if self.eat(&Token::Star) {
                let right = self.parse_unary()?;
                left = EvalValue::Number(left.as_number()? * right.as_number()?);
            } else if self.eat(&Token::Slash) {
                let right = self.parse_unary()?.as_number()?;
                if right == 0.0 {
                    return Err(AssayError::FormulaEvaluation("division by zero".to_string()));
                }
                left = EvalValue::Number(left.as_number()? / right);
            } else if self.eat(&Token::Percent) {
                let right = self.parse_unary()?.as_number()?;
                if right == 0.0 {
                    return Err(AssayError::FormulaEvaluation("modulo by zero".to_string()));
                }
                left = EvalValue::Number(left.as_number()? % right);
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_unary(&mut self) -> Result<EvalValue> {
        if self.eat(&Token::Minus) {
            let value = self.parse_unary()?;
            return Ok(EvalValue::Number(-value.as_number()?));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<EvalValue> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(EvalValue::Number(n)),
            Some(Token::Text(s)) => Ok(EvalValue::Text(s)),
            Some(Token::True) => Ok(EvalValue::Bool(true)),
            Some(Token::False) => Ok(EvalValue::Bool(false)),
            Some(Token::LParen) => {
                let value = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.position += 1;
                    self.parse_call(&name)
                } else {
                    self.ctx.lookup(&name)
                }
            }
            other => Err(AssayError::FormulaEvaluation(format!(
                "unexpected token {other:?}"
            ))),
        }
    }

    fn parse_call(&mut self, name: &str) -> Result<EvalValue> {
        if !ALLOWED_FUNCTIONS.contains(&name) {
            return Err(AssayError::FormulaEvaluation(format!(
                "function '{name}' is not allowed"
            )));
        }

        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_or()?.as_number()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(&Token::RParen)?;

        apply_function(name, &args)
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<EvalValue> {
    let arity_error = |expected: usize| {
        AssayError::FormulaEvaluation(format!(
            "function '{name}' expects {expected} argument(s), got {}",
            args.len()
        ))
    };

    let value = match name {
        "abs" => args.first().copied().ok_or_else(|| arity_error(1))?.abs(),
        "round" => args.first().copied().ok_or_else(|| arity_error(1))?.round(),
        "floor" => args.first().copied().ok_or_else(|| arity_error(1))?.floor(),
        "ceil" => args.first().copied().ok_or_else(|| arity_error(1))?.ceil(),
        "sqrt" => {
            let x = args.first().copied().ok_or_else(|| arity_error(1))?;
            if x < 0.0 {
                return Err(AssayError::FormulaEvaluation(
                    "sqrt of a negative number".to_string(),
                ));
            }
            x.sqrt()
        }
        "min" => {
            if args.len() != 2 {
                return Err(arity_error(2));
            }
            args[0].min(args[1])
        }
        "max" => {
            if args.len() != 2 {
                return Err(arity_error(2));
            }
            args[0].max(args[1])
        }
        "pow" => {
            if args.len() != 2 {
                return Err(arity_error(2));
            }
            args[0].powf(args[1])
        }
        _ => unreachable!("function allow-list checked by caller"),
    };

    Ok(EvalValue::Number(value))
}

fn compare(op: &Token, left: &EvalValue, right: &EvalValue) -> Result<EvalValue> {
    if let (EvalValue::Bool(a), EvalValue::Bool(b)) = (left, right) {
        return match op {
            Token::Eq => Ok(EvalValue::Bool(a == b)),
            Token::Ne => Ok(EvalValue::Bool(a != b)),
            _ => Err(AssayError::FormulaEvaluation(
                "boolean values only support == and !=".to_string(),
            )),
        };
    }

    // Text equality is case-insensitive so `patient.gender == 'Female'`
    // behaves the way template authors expect.
    if let (EvalValue::Text(a), EvalValue::Text(b)) = (left, right) {
        let equal = a.eq_ignore_ascii_case(b);
        return match op {
            Token::Eq => Ok(EvalValue::Bool(equal)),
            Token::Ne => Ok(EvalValue::Bool(!equal)),
            _ => Err(AssayError::FormulaEvaluation(
                "text values only support == and !=".to_string(),
            )),
        };
    }

    let a = left.as_number()?;
    let b = right.as_number()?;
    let result = match op {
        Token::Lt => a < b,
        Token::Le => a <= b,
        Token::Gt => a > b,
        Token::Ge => a >= b,
        Token::Eq => a == b,
        Token::Ne => a != b,
        _ => unreachable!("comparison operator checked by caller"),
    };
    Ok(EvalValue::Bool(result))
}
