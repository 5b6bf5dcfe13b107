// program     ::= declaration*
// declaration ::= directive
//               | 'export' ['default'] declaration
//               | 'import' import_clause
//               | 'template' '<' type_params '>' declaration
//               | ['async'] 'function' ID [type_params] '(' params ')' [':' type] block
//               | type ID '(' params ')' (block | ';')
//               | ('edict' | 'const' | 'let' | 'var') ID [':' type] ['=' expr] (',' ...)* ';'
//               | type ID ['=' expr] (',' ID ['=' expr])* ';'
//               | ('class' | 'struct') ID [type_params] [heritage] '{' member* '}' [';']
//               | 'interface' ID [type_params] ['extends' types] '{' signature* '}'
//               | 'enum' ['class'] ID '{' (ID ['=' expr]),* '}' [';']
//               | 'namespace' ID '{' declaration* '}'
//               | ('type' ID [type_params] '=' type | 'typedef' type ID) ';'
//
// Statements and expressions follow C/TypeScript conventions; the
// expression precedence ladder (loosest first) is:
//
// assignment, conditional, || ??, &&, |, ^, &, == != === !==,
// < <= > >= instanceof in, << >> >>>, + -, * / %, unary, postfix, primary

use crate::{
    token::{Directive, Span},
    util::intern::Name,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub declarations: Vec<Declaration>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: Name,
    pub span: Span,
}

impl From<Ident> for Name {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Name {
    fn from(value: &Ident) -> Self {
        value.name
    }
}

// Declarations

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Function(Function),
    Variable(Variable),
    Class(Class),
    Interface(Interface),
    /// Structs share the class representation; members default to public.
    Struct(Class),
    Enum(Enum),
    Namespace(Namespace),
    TypeAlias(TypeAlias),
    Import(Import),
    Export {
        declaration: Box<Declaration>,
        is_default: bool,
    },
    Directive {
        directive: Directive,
        argument: Box<str>,
    },
}

impl Declaration {
    /// The name this declaration introduces, if any.
    pub fn name(&self) -> Option<Ident> {
        match &self.kind {
            DeclarationKind::Function(f) => Some(f.name),
            DeclarationKind::Class(c) | DeclarationKind::Struct(c) => Some(c.name),
            DeclarationKind::Interface(i) => Some(i.name),
            DeclarationKind::Enum(e) => Some(e.name),
            DeclarationKind::Namespace(n) => Some(n.name),
            DeclarationKind::TypeAlias(t) => Some(t.name),
            DeclarationKind::Export { declaration, .. } => declaration.name(),
            DeclarationKind::Variable(_)
            | DeclarationKind::Import(_)
            | DeclarationKind::Directive { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeNode>,
    /// `None` for prototypes such as `int add(int a, int b);`.
    pub body: Option<Block>,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: Ident,
    pub constraint: Option<TypeNode>,
    pub default: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: Option<TypeNode>,
    pub default: Option<Expr>,
    pub optional: bool,
    pub rest: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `edict`, the WORLDC spelling of an immutable binding.
    Edict,
    Const,
    Let,
    Var,
    /// A C-style declaration introduced by its type (`int x = 1;`).
    Typed,
}

impl BindingKind {
    pub fn is_constant(self) -> bool {
        matches!(self, BindingKind::Edict | BindingKind::Const)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub binding: BindingKind,
    /// Non empty list of declarators.
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub ty: Option<TypeNode>,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<TypeNode>,
    pub implements: Vec<TypeNode>,
    pub members: Vec<ClassMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassMember {
    pub kind: MemberKind,
    pub access: Access,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
    Field {
        declarator: Declarator,
        readonly: bool,
    },
    Method(Function),
    Constructor {
        function: Function,
        /// C++ member initializer list, `Point(int x) : Base(x, 1), y() {}`.
        initializers: Vec<(Ident, Vec<Expr>)>,
    },
    Destructor(Function),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interface {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeNode>,
    pub members: Vec<InterfaceMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceMember {
    pub name: Ident,
    pub kind: InterfaceMemberKind,
    pub optional: bool,
    pub readonly: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceMemberKind {
    Property(TypeNode),
    Method {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        return_ty: Option<TypeNode>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub name: Ident,
    pub variants: Vec<EnumVariant>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: Ident,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: Ident,
    pub body: Vec<Declaration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: Ident,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeNode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub default: Option<Ident>,
    pub namespace: Option<Ident>,
    pub specifiers: Vec<ImportSpecifier>,
    pub source: Box<str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub name: Ident,
    pub alias: Option<Ident>,
}

impl ImportSpecifier {
    /// The name bound in the importing scope.
    pub fn local(&self) -> Ident {
        self.alias.unwrap_or(self.name)
    }
}

// Statements

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Block(Block),
    Expression(Expr),
    Variable(Variable),
    /// Local functions, classes and other nested declarations.
    Declaration(Box<Declaration>),
    If {
        condition: Expr,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expr,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expr,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expr>,
        update: Option<Expr>,
        body: Box<Statement>,
    },
    ForIn {
        binding: ForBinding,
        iterable: Expr,
        body: Box<Statement>,
    },
    /// Also covers the C++ range-based `for (auto x : xs)`.
    ForOf {
        binding: ForBinding,
        iterable: Expr,
        body: Box<Statement>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },
    Try {
        block: Block,
        handler: Option<CatchClause>,
        finalizer: Option<Block>,
    },
    Throw(Expr),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForBinding {
    pub binding: BindingKind,
    pub name: Ident,
    pub ty: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`.
    pub test: Option<Expr>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<(Ident, Option<TypeNode>)>,
    pub body: Block,
}

// Expressions

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn dummy(span: Span) -> Expr {
        Expr {
            kind: ExprKind::Dummy,
            span,
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparenthesized(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(Ident),
    This,
    Super,
    Literal(Literal),
    /// Raw template literal text, without backticks.
    Template(Box<str>),
    Array(Vec<Expr>),
    Object(Vec<Property>),
    Paren(Box<Expr>),
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOperator,
        prefix: bool,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assignment {
        op: AssignmentOperator,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        type_args: Vec<TypeNode>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Ident,
        access: MemberAccess,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    New {
        ty: TypeNode,
        args: Vec<Expr>,
    },
    /// `new T[n]`
    NewArray {
        element: TypeNode,
        length: Box<Expr>,
    },
    Delete {
        operand: Box<Expr>,
        array: bool,
    },
    Arrow(Box<ArrowFunction>),
    Lambda(Box<Lambda>),
    Cast {
        ty: TypeNode,
        expr: Box<Expr>,
        style: CastStyle,
    },
    Sizeof(SizeofOperand),
    Typeof(Box<Expr>),
    Await(Box<Expr>),
    Spread(Box<Expr>),
    /// Placeholder produced while recovering from a syntax error.
    Dummy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(u64),
    Float { value: f64, single: bool },
    String(Box<str>),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub shorthand: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    Ident(Ident),
    String(Box<str>),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Param>,
    pub return_ty: Option<TypeNode>,
    pub body: ArrowBody,
    pub is_async: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expr(Box<Expr>),
    Block(Block),
}

/// A C++ lambda, `[&](int x) -> int { return x; }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub captures: Vec<Capture>,
    pub params: Vec<Param>,
    pub return_ty: Option<TypeNode>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// `[=]`
    AllByValue,
    /// `[&]`
    AllByReference,
    This,
    ByValue(Ident),
    ByReference(Ident),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStyle {
    /// `expr as T`
    As,
    /// `(T) expr`
    Prefix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeofOperand {
    Type(TypeNode),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Plus,
    Not,
    BitNot,
    /// `*p`
    Deref,
    /// `&x`
    AddressOf,
}

impl UnaryOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Neg => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Deref => "*",
            UnaryOperator::AddressOf => "&",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

impl UpdateOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            UpdateOperator::Increment => "++",
            UpdateOperator::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    StrictEq,
    NotEq,
    StrictNotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    InstanceOf,
    In,
}

impl BinaryOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::UShr => ">>>",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Eq => "==",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::NotEq => "!=",
            BinaryOperator::StrictNotEq => "!==",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEq => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEq => ">=",
            BinaryOperator::InstanceOf => "instanceof",
            BinaryOperator::In => "in",
        }
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::StrictEq
                | BinaryOperator::NotEq
                | BinaryOperator::StrictNotEq
                | BinaryOperator::Less
                | BinaryOperator::LessEq
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEq
                | BinaryOperator::InstanceOf
                | BinaryOperator::In
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    /// `??`
    Nullish,
}

impl LogicalOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogicalOperator::And => "&&",
            LogicalOperator::Or => "||",
            LogicalOperator::Nullish => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

impl AssignmentOperator {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssignmentOperator::Assign => "=",
            AssignmentOperator::Add => "+=",
            AssignmentOperator::Sub => "-=",
            AssignmentOperator::Mul => "*=",
            AssignmentOperator::Div => "/=",
            AssignmentOperator::Rem => "%=",
            AssignmentOperator::Shl => "<<=",
            AssignmentOperator::Shr => ">>=",
            AssignmentOperator::BitAnd => "&=",
            AssignmentOperator::BitOr => "|=",
            AssignmentOperator::BitXor => "^=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAccess {
    /// `a.b`
    Dot,
    /// `a?.b`
    Optional,
    /// `a->b`
    Arrow,
    /// `a::b`
    Scope,
}

// Types

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(Primitive),
    Named {
        /// Qualified path, `std::vector` is `[std, vector]`.
        path: Vec<Ident>,
        args: Vec<TypeNode>,
    },
    Pointer(Box<TypeNode>),
    Reference(Box<TypeNode>),
    Array {
        element: Box<TypeNode>,
        size: Option<u64>,
    },
    Function {
        params: Vec<TypeNode>,
        ret: Box<TypeNode>,
    },
    Union(Vec<TypeNode>),
    Const(Box<TypeNode>),
}

impl TypeNode {
    /// Strips `const` qualifiers and references, which no target
    /// distinguishes.
    pub fn underlying(&self) -> &TypeNode {
        match &self.kind {
            TypeKind::Const(inner) | TypeKind::Reference(inner) => inner.underlying(),
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Void,
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    String,
    Auto,
    Any,
}

impl Primitive {
    /// The canonical WORLDC spelling, which also keys the generators' type
    /// mapping tables.
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Void => "void",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::UChar => "unsigned char",
            Primitive::Short => "short",
            Primitive::UShort => "unsigned short",
            Primitive::Int => "int",
            Primitive::UInt => "unsigned int",
            Primitive::Long => "long",
            Primitive::ULong => "unsigned long",
            Primitive::LongLong => "long long",
            Primitive::ULongLong => "unsigned long long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Auto => "auto",
            Primitive::Any => "any",
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    /// Counts nodes per family, used to compare tree shapes.
    #[derive(Debug, Default, PartialEq, Eq)]
    pub struct Shape {
        pub declarations: usize,
        pub statements: usize,
    }

    pub fn shape(program: &Program) -> Shape {
        let mut shape = Shape::default();
        for declaration in &program.declarations {
            count_declaration(&mut shape, declaration);
        }
        shape
    }

    fn count_declaration(shape: &mut Shape, declaration: &Declaration) {
        shape.declarations += 1;
        match &declaration.kind {
            DeclarationKind::Function(f) => {
                if let Some(body) = &f.body {
                    shape.statements += body.statements.len();
                }
            }
            DeclarationKind::Namespace(n) => {
                for inner in &n.body {
                    count_declaration(shape, inner);
                }
            }
            DeclarationKind::Export { declaration, .. } => count_declaration(shape, declaration),
            _ => {}
        }
    }
}
