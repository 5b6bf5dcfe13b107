use std::fmt;

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token { kind, span }
    }

    /// Returns the literal text of this token.
    pub fn text<'src>(&self, src: &'src str) -> &'src str {
        self.span.substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span)
    }
}

/// A point in the source text.
///
/// `line` and `column` are 1-based and count characters; `offset` is the
/// 0-based byte offset.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub const fn new(line: u32, column: u32, offset: usize) -> Position {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.line, self.column, self.offset)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open source range. `end` points one past the last character.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub const fn new(start: Position, end: Position) -> Span {
        Span { start, end }
    }

    /// An empty span located at the given position.
    pub const fn empty_at(at: Position) -> Span {
        Span { start: at, end: at }
    }

    pub fn lo(&self) -> usize {
        self.start.offset
    }

    pub fn hi(&self) -> usize {
        self.end.offset
    }

    pub fn len(&self) -> usize {
        self.hi() - self.lo()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Joins two spans, producing one that starts at `self` and ends at
    /// `other`.
    pub fn to(self, other: Span) -> Span {
        debug_assert!(self.lo() <= other.hi());
        Span {
            start: self.start,
            end: other.end,
        }
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo()..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { inner, span: self }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, {}..{})", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lo(), self.hi())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub inner: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            inner: f(self.inner),
            span: self.span,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Directive {
    Include,
    Define,
    IfDef,
    IfNDef,
    EndIf,
    Pragma,
}

impl Directive {
    pub const fn keyword(self) -> &'static str {
        match self {
            Directive::Include => "include",
            Directive::Define => "define",
            Directive::IfDef => "ifdef",
            Directive::IfNDef => "ifndef",
            Directive::EndIf => "endif",
            Directive::Pragma => "pragma",
        }
    }
}

pub static DIRECTIVES: phf::Map<&'static str, Directive> = phf::phf_map! {
    "include" => Directive::Include,
    "define" => Directive::Define,
    "ifdef" => Directive::IfDef,
    "ifndef" => Directive::IfNDef,
    "endif" => Directive::EndIf,
    "pragma" => Directive::Pragma,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Declaration keywords
    Edict,
    Const,
    Let,
    Var,
    Function,
    Class,
    Struct,
    Interface,
    Enum,
    Namespace,
    Type,
    Typedef,
    Template,
    Typename,
    Import,
    Export,
    From,
    As,
    Extends,
    Implements,
    Public,
    Private,
    Protected,
    Static,
    Virtual,
    Override,
    Readonly,
    Async,
    Await,
    Declare,

    // Statement keywords
    If,
    Else,
    While,
    Do,
    For,
    In,
    Of,
    Return,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    Try,
    Catch,
    Finally,
    Throw,

    // Expression keywords
    New,
    Delete,
    This,
    Super,
    Null,
    True,
    False,
    Typeof,
    Sizeof,
    Instanceof,

    // Primitive type keywords
    Int,
    Float,
    Double,
    Char,
    Bool,
    Void,
    Long,
    Short,
    Unsigned,
    Signed,
    String,
    Auto,
    Any,

    // Operators
    Plus,
    PlusPlus,
    PlusAssign,
    Minus,
    MinusMinus,
    MinusAssign,
    Star,
    StarAssign,
    Slash,
    SlashAssign,
    Percent,
    PercentAssign,
    Assign,
    EqEq,
    EqEqEq,
    Bang,
    NotEq,
    NotEqEq,
    Less,
    LessEq,
    Shl,
    ShlAssign,
    Greater,
    GreaterEq,
    Shr,
    ShrAssign,
    UShr,
    Amp,
    AmpAmp,
    AmpAssign,
    Pipe,
    PipePipe,
    PipeAssign,
    Caret,
    CaretAssign,
    Tilde,
    Question,
    QuestionQuestion,
    QuestionDot,
    /// `->`
    Arrow,
    /// `=>`
    FatArrow,

    // Punctuation
    Colon,
    ColonColon,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    At,

    // Literals
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    CharLiteral,
    TemplateLiteral,

    /// A whole preprocessor line, such as `#include <stdio.h>`.
    Directive(Directive),

    // Trivia
    Whitespace,
    Newline,
    LineComment,
    BlockComment,

    Eof,
}

impl TokenKind {
    /// Whether the parser should skip this token.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::Newline
                | TokenKind::LineComment
                | TokenKind::BlockComment
        )
    }

    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Char
                | TokenKind::Bool
                | TokenKind::Void
                | TokenKind::Long
                | TokenKind::Short
                | TokenKind::Unsigned
                | TokenKind::Signed
                | TokenKind::String
                | TokenKind::Auto
                | TokenKind::Any
        )
    }

    /// Whether this token is an assignment operator (`=`, `+=`, ...).
    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::PlusAssign
                | TokenKind::MinusAssign
                | TokenKind::StarAssign
                | TokenKind::SlashAssign
                | TokenKind::PercentAssign
                | TokenKind::ShlAssign
                | TokenKind::ShrAssign
                | TokenKind::AmpAssign
                | TokenKind::PipeAssign
                | TokenKind::CaretAssign
        )
    }

    /// Keywords which may still be used as property or member names
    /// (`x.type`, `{ from: 1 }`).
    pub fn is_contextual_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Type
                | TokenKind::From
                | TokenKind::Of
                | TokenKind::As
                | TokenKind::Declare
                | TokenKind::Readonly
                | TokenKind::Async
                | TokenKind::Default
                | TokenKind::Delete
                | TokenKind::String
                | TokenKind::Any
        )
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "edict" => TokenKind::Edict,
    "const" => TokenKind::Const,
    "let" => TokenKind::Let,
    "var" => TokenKind::Var,
    "function" => TokenKind::Function,
    "class" => TokenKind::Class,
    "struct" => TokenKind::Struct,
    "interface" => TokenKind::Interface,
    "enum" => TokenKind::Enum,
    "namespace" => TokenKind::Namespace,
    "type" => TokenKind::Type,
    "typedef" => TokenKind::Typedef,
    "template" => TokenKind::Template,
    "typename" => TokenKind::Typename,
    "import" => TokenKind::Import,
    "export" => TokenKind::Export,
    "from" => TokenKind::From,
    "as" => TokenKind::As,
    "extends" => TokenKind::Extends,
    "implements" => TokenKind::Implements,
    "public" => TokenKind::Public,
    "private" => TokenKind::Private,
    "protected" => TokenKind::Protected,
    "static" => TokenKind::Static,
    "virtual" => TokenKind::Virtual,
    "override" => TokenKind::Override,
    "readonly" => TokenKind::Readonly,
    "async" => TokenKind::Async,
    "await" => TokenKind::Await,
    "declare" => TokenKind::Declare,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "do" => TokenKind::Do,
    "for" => TokenKind::For,
    "in" => TokenKind::In,
    "of" => TokenKind::Of,
    "return" => TokenKind::Return,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "switch" => TokenKind::Switch,
    "case" => TokenKind::Case,
    "default" => TokenKind::Default,
    "try" => TokenKind::Try,
    "catch" => TokenKind::Catch,
    "finally" => TokenKind::Finally,
    "throw" => TokenKind::Throw,
    "new" => TokenKind::New,
    "delete" => TokenKind::Delete,
    "this" => TokenKind::This,
    "super" => TokenKind::Super,
    "null" => TokenKind::Null,
    "nullptr" => TokenKind::Null,
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "typeof" => TokenKind::Typeof,
    "sizeof" => TokenKind::Sizeof,
    "instanceof" => TokenKind::Instanceof,
    "int" => TokenKind::Int,
    "float" => TokenKind::Float,
    "double" => TokenKind::Double,
    "char" => TokenKind::Char,
    "bool" => TokenKind::Bool,
    "void" => TokenKind::Void,
    "long" => TokenKind::Long,
    "short" => TokenKind::Short,
    "unsigned" => TokenKind::Unsigned,
    "signed" => TokenKind::Signed,
    "string" => TokenKind::String,
    "auto" => TokenKind::Auto,
    "any" => TokenKind::Any,
};
