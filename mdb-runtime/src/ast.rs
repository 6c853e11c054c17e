//! 抽象構文木

use crate::{Location, Value, ValueKind};
use std::rc::Rc;

/// 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

/// 単項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// `++` / `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementOp {
    Increment,
    Decrement,
}

/// 式
#[derive(Debug, Clone)]
pub enum Expr {
    Literal {
        value: Value,
        location: Location,
    },
    Variable {
        name: String,
        location: Location,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
        location: Location,
    },
    AssocArrayLiteral {
        entries: Vec<(String, Expr)>,
        location: Location,
    },
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        location: Location,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: Location,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        location: Location,
    },
    DottedGet {
        object: Box<Expr>,
        name: String,
        location: Location,
    },
    IndexedGet {
        object: Box<Expr>,
        index: Box<Expr>,
        location: Location,
    },
}

impl Expr {
    pub fn location(&self) -> &Location {
        match self {
            Expr::Literal { location, .. }
            | Expr::Variable { location, .. }
            | Expr::ArrayLiteral { location, .. }
            | Expr::AssocArrayLiteral { location, .. }
            | Expr::Binary { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Call { location, .. }
            | Expr::DottedGet { location, .. }
            | Expr::IndexedGet { location, .. } => location,
        }
    }
}

/// 文のブロック
#[derive(Debug, Clone)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub location: Location,
}

/// 関数の仮引数
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub kind: ValueKind,
}

/// 関数宣言（`function` / `sub`）
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    pub return_kind: ValueKind,
    pub body: Block,
    /// 宣言全体（`function` から `end function` まで）
    pub location: Location,
}

/// 文
#[derive(Debug, Clone)]
pub enum Statement {
    /// `x = expr`
    Assignment {
        name: String,
        value: Expr,
        location: Location,
    },
    /// `obj.name = expr`
    DottedSet {
        object: Expr,
        name: String,
        value: Expr,
        location: Location,
    },
    /// `obj[index] = expr`
    IndexedSet {
        object: Expr,
        index: Expr,
        value: Expr,
        location: Location,
    },
    /// `print a, b` / `? a`
    Print {
        items: Vec<PrintItem>,
        location: Location,
    },
    /// 式文（主に関数呼び出し）
    Expression { expr: Expr, location: Location },
    /// `x++` / `x--`
    Increment {
        target: Expr,
        op: IncrementOp,
        location: Location,
    },
    /// `for each item in target ... end for`
    ForEach {
        item: String,
        target: Expr,
        body: Block,
        location: Location,
    },
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
        location: Location,
    },
    While {
        condition: Expr,
        body: Block,
        location: Location,
    },
    Return {
        value: Option<Expr>,
        location: Location,
    },
    /// デバッガを起動する
    Stop { location: Location },
    Function(Rc<FunctionDecl>),
}

/// print 文の要素
#[derive(Debug, Clone)]
pub enum PrintItem {
    Expr(Expr),
    /// `,` 区切り
    Space,
    /// `;` 区切り
    Join,
}

impl Statement {
    pub fn location(&self) -> &Location {
        match self {
            Statement::Assignment { location, .. }
            | Statement::DottedSet { location, .. }
            | Statement::IndexedSet { location, .. }
            | Statement::Print { location, .. }
            | Statement::Expression { location, .. }
            | Statement::Increment { location, .. }
            | Statement::ForEach { location, .. }
            | Statement::If { location, .. }
            | Statement::While { location, .. }
            | Statement::Return { location, .. }
            | Statement::Stop { location } => location,
            Statement::Function(decl) => &decl.location,
        }
    }

    /// ログ出力用の文種別名
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Assignment { .. } => "assignment",
            Statement::DottedSet { .. } => "dotted-set",
            Statement::IndexedSet { .. } => "indexed-set",
            Statement::Print { .. } => "print",
            Statement::Expression { .. } => "expression",
            Statement::Increment { .. } => "increment",
            Statement::ForEach { .. } => "for-each",
            Statement::If { .. } => "if",
            Statement::While { .. } => "while",
            Statement::Return { .. } => "return",
            Statement::Stop { .. } => "stop",
            Statement::Function(_) => "function",
        }
    }
}
