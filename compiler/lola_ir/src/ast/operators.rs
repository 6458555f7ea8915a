//! Binary and Unary Operators
//!
//! All operator types used in expressions.

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Comparison
    LessOrEqual,
    GreaterOrEqual,
    Equals,
    Differs,
    Less,
    More,

    // Arithmetic
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulus,

    // Logical (short-circuit)
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    ///
    /// Used in error messages and disassembly.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::Equals => "==",
            Self::Differs => "!=",
            Self::Less => "<",
            Self::More => ">",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulus => "%",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Whether this operator short-circuits.
    ///
    /// Short-circuit operators are lowered to jumps and never reach the
    /// VM's binary operator dispatch.
    #[inline]
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// Logical negation, requires a Boolean.
    Not,
    /// Arithmetic negation, requires a Number.
    Negate,
}

impl UnaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Negate => "-",
        }
    }
}
