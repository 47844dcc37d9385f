// AST (Abstract Syntax Tree) definitions for HostLang

use std::sync::Arc;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Binding keyword of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Let,
    Const,
    Var,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Comparison
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical (short-circuit)
    And,
    Or,
    Nullish,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    BitShl,
    BitShr,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::StrictEq => "===",
            BinOp::StrictNe => "!==",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::Nullish => "??",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::BitShl => "<<",
            BinOp::BitShr => ">>",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,     // -x
    Plus,    // +x
    Not,     // !x
    BitNot,  // ~x
    Typeof,  // typeof x
    PreInc,  // ++x
    PreDec,  // --x
    PostInc, // x++
    PostDec, // x--
}

/// Target of a declaration: a plain name or an array pattern `[a, b]`
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(String),
    Array(Vec<String>),
}

impl Pattern {
    /// Names bound by this pattern, in source order.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Pattern::Ident(name) => vec![name.as_str()],
            Pattern::Array(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// One `name = init` entry of a declaration
#[derive(Debug, Clone)]
pub struct Declarator {
    pub target: Pattern,
    pub init: Option<AstNode>,
}

/// A function body shared between its declaration and every closure made from it
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<AstNode>,
    /// Declared with `async`; the instrumenter only steps inside these.
    pub is_async: bool,
    pub is_arrow: bool,
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone)]
pub enum AstNode {
    // Statements
    FunctionDecl {
        func: Arc<FunctionDef>,
        location: SourceLocation,
    },
    VarDecl {
        kind: DeclKind,
        declarators: Vec<Declarator>,
        location: SourceLocation,
    },
    Return {
        expr: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Vec<AstNode>,
        else_branch: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    DoWhile {
        body: Vec<AstNode>,
        condition: Box<AstNode>,
        location: SourceLocation,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        increment: Option<Box<AstNode>>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    ForOf {
        kind: DeclKind,
        target: Pattern,
        iterable: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Throw {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    /// Inserted by the instrumenter: snapshot the candidates and hand a step
    /// for `line` to the sink.
    Capture {
        line: usize,
    },

    // Expressions
    NumberLiteral(f64, SourceLocation),
    BigIntLiteral(String, SourceLocation),
    StringLiteral(String, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    Null {
        location: SourceLocation,
    },
    Variable(String, SourceLocation),
    ArrayLiteral {
        elements: Vec<AstNode>,
        location: SourceLocation,
    },
    ObjectLiteral {
        properties: Vec<(String, AstNode)>,
        location: SourceLocation,
    },
    Spread {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
    BinaryOp {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    UnaryOp {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    TernaryOp {
        condition: Box<AstNode>,
        true_expr: Box<AstNode>,
        false_expr: Box<AstNode>,
        location: SourceLocation,
    },
    Assignment {
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
        location: SourceLocation,
    },
    CompoundAssignment {
        lhs: Box<AstNode>,
        op: BinOp,
        rhs: Box<AstNode>,
        location: SourceLocation,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    New {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    ArrayAccess {
        array: Box<AstNode>,
        index: Box<AstNode>,
        location: SourceLocation,
    },
    MemberAccess {
        object: Box<AstNode>,
        member: String,
        location: SourceLocation,
    },
    FunctionExpr {
        func: Arc<FunctionDef>,
        location: SourceLocation,
    },
    Await {
        expr: Box<AstNode>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            AstNode::FunctionDecl { location, .. }
            | AstNode::VarDecl { location, .. }
            | AstNode::Return { location, .. }
            | AstNode::If { location, .. }
            | AstNode::While { location, .. }
            | AstNode::DoWhile { location, .. }
            | AstNode::For { location, .. }
            | AstNode::ForOf { location, .. }
            | AstNode::Break { location }
            | AstNode::Continue { location }
            | AstNode::Throw { location, .. }
            | AstNode::Block { location, .. }
            | AstNode::ExpressionStatement { location, .. }
            | AstNode::Null { location }
            | AstNode::ArrayLiteral { location, .. }
            | AstNode::ObjectLiteral { location, .. }
            | AstNode::Spread { location, .. }
            | AstNode::BinaryOp { location, .. }
            | AstNode::UnaryOp { location, .. }
            | AstNode::TernaryOp { location, .. }
            | AstNode::Assignment { location, .. }
            | AstNode::CompoundAssignment { location, .. }
            | AstNode::Call { location, .. }
            | AstNode::New { location, .. }
            | AstNode::ArrayAccess { location, .. }
            | AstNode::MemberAccess { location, .. }
            | AstNode::FunctionExpr { location, .. }
            | AstNode::Await { location, .. } => *location,
            AstNode::NumberLiteral(_, loc)
            | AstNode::BigIntLiteral(_, loc)
            | AstNode::StringLiteral(_, loc)
            | AstNode::BoolLiteral(_, loc)
            | AstNode::Variable(_, loc) => *loc,
            AstNode::Capture { line } => SourceLocation::new(*line, 1),
        }
    }

    /// Declarations and expression statements; these are what get a capture
    /// step after them.
    pub fn is_simple_statement(&self) -> bool {
        matches!(
            self,
            AstNode::VarDecl { .. } | AstNode::ExpressionStatement { .. }
        )
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub nodes: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }
}
