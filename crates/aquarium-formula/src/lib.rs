//! Formula language for configuration sheets.
//!
//! A formula is a single-line algebraic expression over numbers and cell
//! references (`Width`, `Config.Width`). It is parsed once into an [`Expr`]
//! tree and evaluated any number of times through a [`Resolve`]
//! implementation that supplies referenced values.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

mod eval;
mod function;
mod lexer;
mod parser;

pub use eval::{EvalError, Resolve};
pub use function::Function;

#[derive(Debug, Clone, PartialEq)]
pub struct FormulaError {
    message: String,
    column: Option<usize>,
}

impl FormulaError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            column: None,
        }
    }

    fn at(message: impl Into<String>, column: usize) -> Self {
        Self {
            message: message.into(),
            column: Some(column),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{} at column {}", self.message, column),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for FormulaError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Mm,
    Cm,
    M,
    Deg,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            "m" => Some(Unit::M),
            "deg" => Some(Unit::Deg),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::M => "m",
            Unit::Deg => "deg",
        }
    }

    /// Scale to the base units used by every sheet: millimetres and degrees.
    fn scale(self) -> f64 {
        match self {
            Unit::None | Unit::Mm | Unit::Deg => 1.0,
            Unit::Cm => 10.0,
            Unit::M => 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub unit: Unit,
}

impl NumberLiteral {
    pub fn base_value(&self) -> f64 {
        self.value * self.unit.scale()
    }
}

/// A cell reference, optionally qualified with the owning sheet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    pub sheet: Option<String>,
    pub name: String,
}

impl Reference {
    pub fn new(sheet: Option<&str>, name: &str) -> Self {
        Self {
            sheet: sheet.map(str::to_string),
            name: name.to_string(),
        }
    }

    /// Sheet this reference points into, given the sheet it is read from.
    pub fn sheet_or<'a>(&'a self, owner: &'a str) -> &'a str {
        self.sheet.as_deref().unwrap_or(owner)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sheet {
            Some(sheet) => write!(f, "{sheet}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(NumberLiteral),
    Reference(Reference),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinaryOp,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Every reference in the tree, including both branches of conditionals.
    pub fn references(&self) -> BTreeSet<&Reference> {
        let mut out = BTreeSet::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut BTreeSet<&'a Reference>) {
        match self {
            Expr::Number(_) => {}
            Expr::Reference(reference) => {
                out.insert(reference);
            }
            Expr::Unary { expr, .. } => expr.collect_references(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_references(out);
                rhs.collect_references(out);
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_references(out);
                then_branch.collect_references(out);
                else_branch.collect_references(out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_references(out);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(number) => write_number(f, number),
            Expr::Reference(reference) => write!(f, "{reference}"),
            Expr::Unary { op, expr } => match op {
                UnaryOp::Neg => write!(f, "(-{expr})"),
            },
            Expr::Binary { lhs, op, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({condition} ? {then_branch} : {else_branch})"),
            Expr::Call { function, args } => {
                write!(f, "{}(", function.name())?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, number: &NumberLiteral) -> fmt::Result {
    if number.value.fract() == 0.0 && number.value.abs() < 1e15 {
        write!(f, "{}", number.value as i64)?;
    } else {
        write!(f, "{}", number.value)?;
    }
    f.write_str(number.unit.suffix())
}

/// A parsed formula together with the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parses `source`, accepting an optional leading `=`.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let body = source.trim();
        let body = body.strip_prefix('=').unwrap_or(body);
        let tokens = lexer::Lexer::new(body).tokenize()?;
        let expr = parser::Parser::new(tokens).parse_formula()?;
        Ok(Self {
            source: body.trim().to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn references(&self) -> BTreeSet<&Reference> {
        self.expr.references()
    }

    pub fn evaluate<R: Resolve>(&self, resolver: &mut R) -> Result<f64, R::Error> {
        let value = self.expr.evaluate(resolver)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite.into())
        }
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Formula::parse(source)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Closest candidate within edit distance 3, used for "did you mean" hints.
pub fn suggest_name<'a, I>(name: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&str, usize)> = None;

    for candidate in candidates {
        let distance = levenshtein(name, candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    match best {
        Some((candidate, distance)) if distance <= 3 => Some(candidate),
        _ => None,
    }
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0usize; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = deletion.min(insertion).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Whether `name` is usable as a cell alias.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if lexer::is_ident_start(first) => chars.all(lexer::is_ident_continue),
        _ => false,
    }
}
