use crate::{analyzer, lexer, parser, token::Spanned, util::fmt::Show};

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, _: &super::Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use parser::Error::*;
        match error {
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            InvalidTemplateTarget => {
                write!(f, "template must be followed by a function, class or alias")
            }
            UnexpectedTokenInExpr { token } => {
                write!(f, "unexpected token {token:?} in expression")
            }
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of {expected:?}, but got {actual:?}")
            }
            UnexpectedOperator { actual } => write!(f, "unexpected operator {actual:?}"),
            ExpectedDeclaration { actual } => {
                write!(f, "expected a declaration, but got {actual:?}")
            }
            ExpectedType { actual } => write!(f, "expected a type, but got {actual:?}"),
            IntegerOverflow => write!(f, "parse int error, out of bounds"),
            MalformedFloat => write!(f, "malformed float literal"),
            Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Show for Spanned<lexer::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, _: &super::Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }
        write!(f, "{error}")
    }
}

impl Show for Spanned<analyzer::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &super::Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;
        let i = ctx.ident_interner;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use analyzer::Error::*;
        match error {
            UndefinedName(name) => write!(f, "undefined identifier `{}`", i.get(name)),
            DuplicateDeclaration {
                name,
                other_definition_span,
            } => write!(
                f,
                "duplicate declaration of `{}`, previously declared at {other_definition_span}",
                i.get(name),
            ),
            ThisOutsideClass => write!(f, "`this` used outside of a class"),
            SuperOutsideClass => write!(f, "`super` used outside of a class"),
            BreakOutsideLoop => write!(f, "`break` outside of a loop or switch"),
            ContinueOutsideLoop => write!(f, "`continue` outside of a loop"),
            AssignmentToConstant(name) => {
                write!(f, "cannot assign to constant `{}`", i.get(name))
            }
        }
    }
}

impl Show for Spanned<analyzer::Warning> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &super::Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: warning } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        match warning {
            analyzer::Warning::UnknownType(name) => {
                write!(f, "unknown type `{}`", ctx.ident_interner.get(name))
            }
            analyzer::Warning::UnreachableCode => write!(f, "unreachable statement"),
        }
    }
}
