//! Operator vocabulary for expression and jump nodes.

use serde::{Deserialize, Serialize};

/// Writemask selecting all four destination lanes.
pub const WRITEMASK_ALL: u8 = 0xf;

/// Renders a writemask as a `.xyzw` suffix.
pub fn writemask_str(mask: u8) -> String {
    const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];
    let mut out = String::from(".");
    for (i, c) in COMPONENTS.iter().enumerate() {
        if mask & (1 << i) != 0 {
            out.push(*c);
        }
    }
    out
}

/// Expression operators. Unary operators use operand 0, binary operators
/// operands 0 and 1, and `Lerp` all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprOp {
    // Unary.
    BitNot,
    LogicNot,
    Neg,
    Abs,
    Sign,
    Rcp,
    Rsq,
    Sqrt,
    Nrm,
    Exp2,
    Log2,
    Cast,
    Fract,
    Sin,
    Cos,
    SinReduced,
    CosReduced,
    Dsx,
    Dsy,
    Sat,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    // Binary.
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    LogicAnd,
    LogicOr,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Dot,
    Cross,
    Min,
    Max,
    Pow,
    // Ternary.
    Lerp,
    Comma,
}

impl ExprOp {
    /// Short spelling used by the IR dumper.
    pub fn symbol(self) -> &'static str {
        match self {
            ExprOp::BitNot => "~",
            ExprOp::LogicNot => "!",
            ExprOp::Neg => "-",
            ExprOp::Abs => "abs",
            ExprOp::Sign => "sign",
            ExprOp::Rcp => "rcp",
            ExprOp::Rsq => "rsq",
            ExprOp::Sqrt => "sqrt",
            ExprOp::Nrm => "nrm",
            ExprOp::Exp2 => "exp2",
            ExprOp::Log2 => "log2",
            ExprOp::Cast => "cast",
            ExprOp::Fract => "fract",
            ExprOp::Sin => "sin",
            ExprOp::Cos => "cos",
            ExprOp::SinReduced => "sin_reduced",
            ExprOp::CosReduced => "cos_reduced",
            ExprOp::Dsx => "dsx",
            ExprOp::Dsy => "dsy",
            ExprOp::Sat => "sat",
            ExprOp::PreInc => "pre++",
            ExprOp::PreDec => "pre--",
            ExprOp::PostInc => "post++",
            ExprOp::PostDec => "post--",
            ExprOp::Add => "+",
            ExprOp::Sub => "-",
            ExprOp::Mul => "*",
            ExprOp::Div => "/",
            ExprOp::Mod => "%",
            ExprOp::Less => "<",
            ExprOp::Greater => ">",
            ExprOp::LessEqual => "<=",
            ExprOp::GreaterEqual => ">=",
            ExprOp::Equal => "==",
            ExprOp::NotEqual => "!=",
            ExprOp::LogicAnd => "&&",
            ExprOp::LogicOr => "||",
            ExprOp::Shl => "<<",
            ExprOp::Shr => ">>",
            ExprOp::BitAnd => "&",
            ExprOp::BitOr => "|",
            ExprOp::BitXor => "^",
            ExprOp::Dot => "dot",
            ExprOp::Cross => "crs",
            ExprOp::Min => "min",
            ExprOp::Max => "max",
            ExprOp::Pow => "pow",
            ExprOp::Lerp => "lerp",
            ExprOp::Comma => ",",
        }
    }
}

/// Jump kinds. Loops are infinite and exit only through one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JumpKind {
    Break,
    Continue,
    Discard,
    Return,
}

impl JumpKind {
    pub fn name(self) -> &'static str {
        match self {
            JumpKind::Break => "break",
            JumpKind::Continue => "continue",
            JumpKind::Discard => "discard",
            JumpKind::Return => "return",
        }
    }
}
