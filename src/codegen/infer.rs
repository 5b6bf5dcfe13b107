//! Literal-based type inference used for cast insertion.
//!
//! Only the shape of an expression is inspected: literals, possibly wrapped
//! in parentheses or a sign. Anything else is left alone.

use crate::{
    ast::{Expr, ExprKind, Literal, Primitive, TypeKind, TypeNode, UnaryOperator},
    util::intern::Interner,
};

/// Value category of a declared type, independent of the target spelling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueClass {
    Integer,
    /// 64-bit integers, `bigint` in TypeScript.
    Wide,
    Float,
    Bool,
    String,
    Other,
}

impl ValueClass {
    pub const fn is_numeric(self) -> bool {
        matches!(self, ValueClass::Integer | ValueClass::Wide | ValueClass::Float)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Float,
    Bool,
    String,
}

pub fn classify(ty: &TypeNode, interner: &Interner) -> ValueClass {
    match &ty.underlying().kind {
        TypeKind::Primitive(primitive) => classify_primitive(*primitive),
        TypeKind::Named { path, .. } => match path.as_slice() {
            [ident] => classify_name(interner.get(ident)),
            [ns, ident] if interner.get(ns) == "std" => classify_name(interner.get(ident)),
            _ => ValueClass::Other,
        },
        TypeKind::Pointer(inner) if is_char(inner) => ValueClass::String,
        TypeKind::Pointer(_) => ValueClass::Integer,
        _ => ValueClass::Other,
    }
}

/// `char *` and `const char *` are treated as strings.
pub fn is_char(ty: &TypeNode) -> bool {
    matches!(ty.underlying().kind, TypeKind::Primitive(Primitive::Char))
}

const fn classify_primitive(primitive: Primitive) -> ValueClass {
    match primitive {
        Primitive::Bool => ValueClass::Bool,
        Primitive::Char
        | Primitive::UChar
        | Primitive::Short
        | Primitive::UShort
        | Primitive::Int
        | Primitive::UInt
        | Primitive::Long
        | Primitive::ULong => ValueClass::Integer,
        Primitive::LongLong | Primitive::ULongLong => ValueClass::Wide,
        Primitive::Float | Primitive::Double => ValueClass::Float,
        Primitive::String => ValueClass::String,
        Primitive::Void | Primitive::Auto | Primitive::Any => ValueClass::Other,
    }
}

fn classify_name(name: &str) -> ValueClass {
    match name {
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" | "isize" | "usize" | "size_t" | "int8_t"
        | "int16_t" | "int32_t" | "uint8_t" | "uint16_t" | "uint32_t" => ValueClass::Integer,
        "i64" | "u64" | "bigint" | "int64_t" | "uint64_t" => ValueClass::Wide,
        "f32" | "f64" | "number" => ValueClass::Float,
        "boolean" => ValueClass::Bool,
        "string" => ValueClass::String,
        _ => ValueClass::Other,
    }
}

pub fn infer_literal(expr: &Expr) -> Option<LiteralKind> {
    match &expr.kind {
        ExprKind::Literal(literal) => match literal {
            Literal::Integer(_) | Literal::Char(_) => Some(LiteralKind::Integer),
            Literal::Float { .. } => Some(LiteralKind::Float),
            Literal::Bool(_) => Some(LiteralKind::Bool),
            Literal::String(_) => Some(LiteralKind::String),
            Literal::Null => None,
        },
        ExprKind::Template(_) => Some(LiteralKind::String),
        ExprKind::Paren(inner) => infer_literal(inner),
        ExprKind::Unary {
            op: UnaryOperator::Neg | UnaryOperator::Plus,
            operand,
        } => infer_literal(operand).filter(|kind| {
            matches!(kind, LiteralKind::Integer | LiteralKind::Float)
        }),
        ExprKind::Unary {
            op: UnaryOperator::Not,
            ..
        } => Some(LiteralKind::Bool),
        _ => None,
    }
}

/// Returns the integer literal's value when the expression is a plain,
/// possibly negated, integer literal.
pub fn integer_literal(expr: &Expr) -> Option<(bool, u64)> {
    match &expr.unparenthesized().kind {
        ExprKind::Literal(Literal::Integer(value)) => Some((false, *value)),
        ExprKind::Unary {
            op: UnaryOperator::Neg,
            operand,
        } => match &operand.unparenthesized().kind {
            ExprKind::Literal(Literal::Integer(value)) => Some((true, *value)),
            _ => None,
        },
        _ => None,
    }
}

/// Size in bytes on a 32-bit linear memory, when known statically.
pub fn size_of(ty: &TypeNode, interner: &Interner) -> Option<u32> {
    match &ty.underlying().kind {
        TypeKind::Primitive(primitive) => match primitive {
            Primitive::Bool | Primitive::Char | Primitive::UChar => Some(1),
            Primitive::Short | Primitive::UShort => Some(2),
            Primitive::Int
            | Primitive::UInt
            | Primitive::Long
            | Primitive::ULong
            | Primitive::Float => Some(4),
            Primitive::LongLong | Primitive::ULongLong | Primitive::Double => Some(8),
            Primitive::String | Primitive::Void | Primitive::Auto | Primitive::Any => None,
        },
        TypeKind::Named { path, .. } => match path.as_slice() {
            [ident] => match interner.get(ident) {
                "i8" | "u8" | "bool" => Some(1),
                "i16" | "u16" => Some(2),
                "i32" | "u32" | "f32" | "isize" | "usize" | "size_t" => Some(4),
                "i64" | "u64" | "f64" => Some(8),
                _ => None,
            },
            _ => None,
        },
        TypeKind::Pointer(_) => Some(4),
        TypeKind::Array {
            element,
            size: Some(size),
        } => size_of(element, interner)
            .and_then(|element| u32::try_from(*size).ok()?.checked_mul(element)),
        _ => None,
    }
}

/// Names of calls that hand out raw memory.
pub fn is_allocation(expr: &Expr, interner: &Interner) -> bool {
    match &expr.unparenthesized().kind {
        ExprKind::Call { callee, .. } => matches!(
            &callee.kind,
            ExprKind::Identifier(ident)
                if matches!(interner.get(ident), "malloc" | "calloc" | "realloc")
        ),
        ExprKind::Cast { expr, .. } => is_allocation(expr, interner),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        lexer::{tokenize, LexerOptions},
        parser,
    };

    fn expr(src: &str) -> Expr {
        let mut i = Interner::default();
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        parser::parse_expr(src, &tokens, &mut i).unwrap()
    }

    #[test]
    fn literals() {
        assert_eq!(infer_literal(&expr("1")), Some(LiteralKind::Integer));
        assert_eq!(infer_literal(&expr("-(1.5)")), Some(LiteralKind::Float));
        assert_eq!(infer_literal(&expr("'a'")), Some(LiteralKind::Integer));
        assert_eq!(infer_literal(&expr("!x")), Some(LiteralKind::Bool));
        assert_eq!(infer_literal(&expr("\"s\"")), Some(LiteralKind::String));
        assert_eq!(infer_literal(&expr("-true")), None);
        assert_eq!(infer_literal(&expr("a + 1")), None);
        assert_eq!(infer_literal(&expr("null")), None);
    }

    #[test]
    fn integer_literals() {
        assert_eq!(integer_literal(&expr("(42)")), Some((false, 42)));
        assert_eq!(integer_literal(&expr("-7")), Some((true, 7)));
        assert_eq!(integer_literal(&expr("7.0")), None);
    }
}
