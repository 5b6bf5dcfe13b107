//! Rendering of stage errors and trees against the identifier interner.

use std::fmt;

use crate::util::intern::Interner;

pub mod error;
pub mod tree;

pub struct Context<'ident> {
    pub ident_interner: &'ident Interner,
}

impl<'ident> Context<'ident> {
    pub fn new(ident_interner: &'ident Interner) -> Context<'ident> {
        Context { ident_interner }
    }
}

/// Like [`fmt::Display`], but resolves interned names through a [`Context`].
///
/// The alternate form (`{:#}`) prefixes the source span.
pub trait Show {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result;

    fn display(&self, ctx: &Context<'_>) -> impl fmt::Display
    where
        Self: Sized,
    {
        Shown(self, ctx)
    }

    /// The diagnostic message, without location.
    fn message(&self, interner: &Interner) -> String
    where
        Self: Sized,
    {
        self.display(&Context::new(interner)).to_string()
    }

    /// The message prefixed by its span, as the tests compare them.
    fn located_message(&self, interner: &Interner) -> String
    where
        Self: Sized,
    {
        format!("{:#}", self.display(&Context::new(interner)))
    }
}

struct Shown<'a, 'ctx, 'ident, T>(&'a T, &'ctx Context<'ident>);

impl<T: Show> fmt::Display for Shown<'_, '_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.show(f, self.1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        lexer,
        token::{Position, Span, Spanned},
    };

    #[test]
    fn messages_with_and_without_location() {
        let interner = Interner::with_capacity(0);
        let error = Spanned {
            inner: lexer::Error::UnterminatedString,
            span: Span::new(Position::new(1, 1, 0), Position::new(1, 4, 3)),
        };
        assert_eq!(error.message(&interner), "unterminated string literal");
        assert_eq!(
            error.located_message(&interner),
            "0..3: unterminated string literal"
        );
    }
}
