//! Defines the AST for SQL expressions.

use model::core::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A column or table identifier, e.g., `users` or `users.id`.
    Identifier(Ident),

    /// A literal value, bound as a parameter.
    Value(Value),

    /// A parameter slot with no value attached; used for prepared statements.
    Placeholder,

    /// Raw SQL emitted verbatim, e.g. `1` or `0` in a `LIMIT`.
    Literal(String),

    /// A binary operation, e.g., `column = 'value'` or `a AND b`.
    BinaryOp(Box<BinaryOp>),

    /// A function call, e.g., `COUNT(*)`.
    FunctionCall(FunctionCall),

    /// An aliased expression, e.g. `COUNT(*) AS total_count`
    Alias { expr: Box<Expr>, alias: String },

    /// `CAST(expr AS data_type)`; `data_type` is emitted verbatim.
    Cast { expr: Box<Expr>, data_type: String },

    /// `EXCLUDED."column"` inside an `ON CONFLICT .. DO UPDATE`.
    Excluded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub qualifier: Option<String>, // e.g., the 'users' in 'users.id'
    pub name: String,              // e.g., the 'id' in 'users.id'
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Expr,
    pub op: BinaryOperator,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expr>,
    pub wildcard: bool, // represents the '*' in 'COUNT(*)'
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    And,
}

impl Expr {
    pub fn cast(self, data_type: &str) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type: data_type.to_string(),
        }
    }

    pub fn alias(self, alias: &str) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.to_string(),
        }
    }

    pub fn count_star() -> Expr {
        Expr::FunctionCall(FunctionCall {
            name: "COUNT".to_string(),
            args: Vec::new(),
            wildcard: true,
        })
    }

    pub fn eq(left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        }))
    }

    pub fn and(left: Expr, right: Expr) -> Expr {
        Expr::BinaryOp(Box::new(BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        }))
    }
}
