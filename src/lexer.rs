use std::{
    num::{ParseFloatError, ParseIntError},
    str::Chars,
};

use crate::token::{Position, Span, Spanned, Token, TokenKind, DIRECTIVES, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 8_192;

/// Controls which trivia tokens reach the output and how picky the scanner
/// is.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct LexerOptions {
    pub emit_whitespace: bool,
    pub emit_comments: bool,
    pub emit_newlines: bool,
    /// Rejects numeric literals that run straight into identifier characters,
    /// such as `12abc`.
    pub strict: bool,
}

impl LexerOptions {
    /// Options which keep every token, so that concatenating token texts
    /// reproduces the source exactly.
    pub const LOSSLESS: LexerOptions = LexerOptions {
        emit_whitespace: true,
        emit_comments: true,
        emit_newlines: true,
        strict: false,
    };
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated character literal")]
    UnterminatedChar,
    #[error("unterminated template literal")]
    UnterminatedTemplate,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("unknown preprocessor directive #{0}")]
    UnknownDirective(Box<str>),
    #[error("malformed numeric literal")]
    MalformedNumber,
}

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// The first lexical error stops the scan; the buffer then holds the tokens
/// produced so far, which callers must not use.
pub fn lex(src: &str, options: &LexerOptions, tokens: &mut Vec<Token>) -> Result<(), Spanned<Error>> {
    Lexer::new(src, options, tokens).lex()
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn tokenize(src: &str, options: &LexerOptions) -> Result<Vec<Token>, Spanned<Error>> {
    let mut tokens = Vec::with_capacity(src.len() / 4 + 1);
    lex(src, options, &mut tokens)?;
    Ok(tokens)
}

/// The WORLDC lexer
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Chars<'src>,
    options: LexerOptions,
    position: Position,
    current_start: Position,
    tokens: &'tok mut Vec<Token>,
}

type Result<T, E = Error> = std::result::Result<T, E>;

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    fn lex(mut self) -> Result<(), Spanned<Error>> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let next = match self.scan_token_kind() {
                Ok(kind) => kind,
                Err(error) => return Err(self.span().wrap(error)),
            };
            if self.should_emit(next) {
                self.produce(next);
            }
            if next == TokenKind::Eof {
                return Ok(());
            }
        }
    }

    fn should_emit(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Whitespace => self.options.emit_whitespace,
            TokenKind::Newline => self.options.emit_newlines,
            TokenKind::LineComment | TokenKind::BlockComment => self.options.emit_comments,
            _ => true,
        }
    }

    /// Tries to scan the current character.
    fn scan_token_kind(&mut self) -> Result<TokenKind> {
        use TokenKind::*;
        let kind = match self.mark_advance() {
            '\0' if self.at_end() => Eof,
            '\n' => Newline,
            '+' => match self.peek() {
                '+' => self.advance_with(PlusPlus),
                '=' => self.advance_with(PlusAssign),
                _ => Plus,
            },
            '-' => match self.peek() {
                '-' => self.advance_with(MinusMinus),
                '=' => self.advance_with(MinusAssign),
                '>' => self.advance_with(Arrow),
                _ => Minus,
            },
            '*' => match self.peek() {
                '=' => self.advance_with(StarAssign),
                _ => Star,
            },
            '/' => match self.peek() {
                '/' => self.line_comment(),
                '*' => self.block_comment()?,
                '=' => self.advance_with(SlashAssign),
                _ => Slash,
            },
            '%' => match self.peek() {
                '=' => self.advance_with(PercentAssign),
                _ => Percent,
            },
            '=' => match (self.peek(), self.peek_next()) {
                ('=', '=') => self.advance_n_with(2, EqEqEq),
                ('=', _) => self.advance_with(EqEq),
                ('>', _) => self.advance_with(FatArrow),
                _ => Assign,
            },
            '!' => match (self.peek(), self.peek_next()) {
                ('=', '=') => self.advance_n_with(2, NotEqEq),
                ('=', _) => self.advance_with(NotEq),
                _ => Bang,
            },
            '<' => match (self.peek(), self.peek_next()) {
                ('<', '=') => self.advance_n_with(2, ShlAssign),
                ('<', _) => self.advance_with(Shl),
                ('=', _) => self.advance_with(LessEq),
                _ => Less,
            },
            '>' => match (self.peek(), self.peek_next()) {
                ('>', '>') => self.advance_n_with(2, UShr),
                ('>', '=') => self.advance_n_with(2, ShrAssign),
                ('>', _) => self.advance_with(Shr),
                ('=', _) => self.advance_with(GreaterEq),
                _ => Greater,
            },
            '&' => match self.peek() {
                '&' => self.advance_with(AmpAmp),
                '=' => self.advance_with(AmpAssign),
                _ => Amp,
            },
            '|' => match self.peek() {
                '|' => self.advance_with(PipePipe),
                '=' => self.advance_with(PipeAssign),
                _ => Pipe,
            },
            '^' => match self.peek() {
                '=' => self.advance_with(CaretAssign),
                _ => Caret,
            },
            '?' => match self.peek() {
                '?' => self.advance_with(QuestionQuestion),
                // `a?.5:1` is a conditional, not an optional chain.
                '.' if !self.peek_next().is_ascii_digit() => self.advance_with(QuestionDot),
                _ => Question,
            },
            ':' => match self.peek() {
                ':' => self.advance_with(ColonColon),
                _ => Colon,
            },
            '.' => match (self.peek(), self.peek_next()) {
                ('.', '.') => self.advance_n_with(2, Ellipsis),
                (c, _) if c.is_ascii_digit() => self.number('.')?,
                _ => Dot,
            },
            '~' => Tilde,
            ',' => Comma,
            ';' => Semicolon,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            '@' => At,
            '#' => self.directive()?,
            '"' => self.string()?,
            '\'' => self.char_or_string()?,
            '`' => self.template()?,
            c if is_ident_start(c) => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(c)?,
            c if c.is_whitespace() => self.whitespace(),
            c => return Err(Error::UnexpectedChar(c)),
        };
        Ok(kind)
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while is_ident_continue(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// Scans a numeric literal whose first character has already been
    /// consumed. A leading `.` means the literal started as `.5`.
    fn number(&mut self, first: char) -> Result<TokenKind> {
        if first == '0' && matches!(self.peek(), 'x' | 'X') {
            self.advance();
            return self.radix_digits(|c| c.is_ascii_hexdigit());
        }
        if first == '0' && matches!(self.peek(), 'b' | 'B') {
            self.advance();
            return self.radix_digits(|c| matches!(c, '0' | '1'));
        }

        let mut kind = TokenKind::IntegerLiteral;
        if first == '.' {
            kind = TokenKind::FloatLiteral;
        }
        self.decimal_digits();

        if kind == TokenKind::IntegerLiteral
            && self.peek() == '.'
            && self.peek_next().is_ascii_digit()
        {
            self.advance();
            self.decimal_digits();
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.peek(), 'e' | 'E') {
            let exponent_follows = match self.peek_next() {
                c if c.is_ascii_digit() => true,
                '+' | '-' => self.peek_nth(2).is_ascii_digit(),
                _ => false,
            };
            if exponent_follows {
                self.advance();
                if matches!(self.peek(), '+' | '-') {
                    self.advance();
                }
                self.decimal_digits();
                kind = TokenKind::FloatLiteral;
            }
        }

        if matches!(self.peek(), 'f' | 'F') {
            self.advance();
            kind = TokenKind::FloatLiteral;
        } else if kind == TokenKind::IntegerLiteral {
            // C integer suffixes: `10u`, `10L`, `10ull`.
            while matches!(self.peek(), 'u' | 'U' | 'l' | 'L') {
                self.advance();
            }
        }

        self.finish_number(kind)
    }

    fn radix_digits(&mut self, is_digit: impl Fn(char) -> bool) -> Result<TokenKind> {
        if !is_digit(self.peek()) {
            return Err(Error::MalformedNumber);
        }
        while is_digit(self.peek()) || self.peek() == '_' {
            self.advance();
        }
        self.finish_number(TokenKind::IntegerLiteral)
    }

    fn decimal_digits(&mut self) {
        while self.peek().is_ascii_digit() || self.peek() == '_' {
            self.advance();
        }
    }

    fn finish_number(&mut self, kind: TokenKind) -> Result<TokenKind> {
        if self.options.strict && is_ident_continue(self.peek()) {
            return Err(Error::MalformedNumber);
        }
        Ok(kind)
    }

    /// Scans a double-quoted string. Escapes are validated here but only
    /// performed when the parser extracts the literal.
    fn string(&mut self) -> Result<TokenKind> {
        self.quoted('"', Error::UnterminatedString)?;
        Ok(TokenKind::StringLiteral)
    }

    /// Single quotes delimit C character literals and TypeScript strings. A
    /// literal holding exactly one (possibly escaped) character is a char.
    fn char_or_string(&mut self) -> Result<TokenKind> {
        let content_chars = self.quoted('\'', Error::UnterminatedChar)?;
        if content_chars == 1 {
            Ok(TokenKind::CharLiteral)
        } else {
            Ok(TokenKind::StringLiteral)
        }
    }

    /// Consumes the body and closing quote of a single-line quoted literal,
    /// returning the number of logical characters inside it.
    fn quoted(&mut self, quote: char, unterminated: Error) -> Result<usize> {
        let mut is_escaping = false;
        let mut count = 0;
        loop {
            let current = self.advance();
            match (is_escaping, current) {
                (_, '\0') if self.at_end() => return Err(unterminated),
                (_, '\n') => return Err(unterminated),
                (false, c) if c == quote => return Ok(count),
                (false, '\\') => is_escaping = true,
                (_, _) => {
                    is_escaping = false;
                    count += 1;
                }
            }
        }
    }

    fn template(&mut self) -> Result<TokenKind> {
        let mut is_escaping = false;
        loop {
            match (is_escaping, self.advance()) {
                (_, '\0') if self.at_end() => return Err(Error::UnterminatedTemplate),
                (false, '`') => return Ok(TokenKind::TemplateLiteral),
                (false, '\\') => is_escaping = true,
                (_, _) => is_escaping = false,
            }
        }
    }

    fn whitespace(&mut self) -> TokenKind {
        while self.peek() != '\n' && self.peek().is_whitespace() {
            self.advance();
        }
        TokenKind::Whitespace
    }

    fn line_comment(&mut self) -> TokenKind {
        while !matches!(self.peek(), '\n') && !self.at_end() {
            self.advance();
        }
        TokenKind::LineComment
    }

    fn block_comment(&mut self) -> Result<TokenKind> {
        assert_eq!(self.advance(), '*');
        loop {
            match self.advance() {
                '*' if self.peek() == '/' => {
                    self.advance();
                    return Ok(TokenKind::BlockComment);
                }
                '\0' if self.at_end() => return Err(Error::UnterminatedComment),
                _ => continue,
            }
        }
    }

    /// Scans a whole preprocessor line. The directive keyword must directly
    /// follow the `#`.
    fn directive(&mut self) -> Result<TokenKind> {
        let name_start = self.position.offset;
        while is_ident_continue(self.peek()) {
            self.advance();
        }
        let name = &self.src[name_start..self.position.offset];
        let Some(&directive) = DIRECTIVES.get(name) else {
            return Err(Error::UnknownDirective(name.into()));
        };
        while self.peek() != '\n' && !self.at_end() {
            self.advance();
        }
        Ok(TokenKind::Directive(directive))
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(
        src: &'src str,
        options: &LexerOptions,
        tokens: &'tok mut Vec<Token>,
    ) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars(),
            options: *options,
            position: Position::START,
            current_start: Position::START,
            tokens,
        }
    }

    fn at_end(&self) -> bool {
        self.position.offset >= self.src.len()
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_start = self.position;
        self.advance()
    }

    /// Returns the next character and advances the iterator, keeping line and
    /// column in sync.
    fn advance(&mut self) -> char {
        let Some(c) = self.iter.next() else {
            return '\0';
        };
        self.position.offset += c.len_utf8();
        if c == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        c
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    fn advance_n_with<T>(&mut self, n: usize, value: T) -> T {
        for _ in 0..n {
            self.advance();
        }
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&self) -> char {
        self.peek_nth(0)
    }

    fn peek_next(&self) -> char {
        self.peek_nth(1)
    }

    fn peek_nth(&self, n: usize) -> char {
        self.iter.clone().nth(n).unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new(self.current_start, self.position)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Literal extraction from already-lexed tokens.
pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> std::result::Result<u64, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::IntegerLiteral);
        let text = token.text(src).trim_end_matches(['u', 'U', 'l', 'L']);
        let cleaned: String = text.chars().filter(|c| *c != '_').collect();
        if let Some(hex) = cleaned.strip_prefix("0x").or(cleaned.strip_prefix("0X")) {
            u64::from_str_radix(hex, 16)
        } else if let Some(bin) = cleaned.strip_prefix("0b").or(cleaned.strip_prefix("0B")) {
            u64::from_str_radix(bin, 2)
        } else {
            cleaned.parse()
        }
    }

    /// Returns the value and whether the literal carried an `f` suffix.
    pub fn float(token: Token, src: &str) -> std::result::Result<(f64, bool), ParseFloatError> {
        debug_assert_eq!(token.kind, TokenKind::FloatLiteral);
        let text = token.text(src);
        let single = text.ends_with(['f', 'F']);
        let cleaned: String = text
            .trim_end_matches(['f', 'F'])
            .chars()
            .filter(|c| *c != '_')
            .collect();
        Ok((cleaned.parse()?, single))
    }

    pub fn ident(token: Token, src: &str) -> &str {
        token.text(src)
    }

    pub fn string(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::StringLiteral);
        let text = token.text(src);
        perform_escape(&text[1..text.len() - 1]).into_boxed_str()
    }

    pub fn char(token: Token, src: &str) -> char {
        debug_assert_eq!(token.kind, TokenKind::CharLiteral);
        let text = token.text(src);
        perform_escape(&text[1..text.len() - 1])
            .chars()
            .next()
            .unwrap_or('\0')
    }

    /// Template literals are kept raw, without the surrounding backticks.
    pub fn template(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::TemplateLiteral);
        let text = token.text(src);
        text[1..text.len() - 1].into()
    }

    /// The text after the directive keyword, trimmed.
    pub fn directive_argument(token: Token, src: &str) -> &str {
        let TokenKind::Directive(directive) = token.kind else {
            unreachable!("not a directive token");
        };
        let text = token.text(src);
        text[1 + directive.keyword().len()..].trim()
    }
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, 'r') => '\r',
            (true, '0') => '\0',
            (true, 'b') => '\x08',
            (true, 'f') => '\x0c',
            (true, 'v') => '\x0b',
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (_, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src, &LexerOptions::default())
            .expect("lexing should succeed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_edict_declaration() {
        use TokenKind::*;
        assert_eq!(
            kinds("edict int x = 5;"),
            [Edict, Int, Identifier, Assign, IntegerLiteral, Semicolon, Eof]
        );
    }

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/%" => [
                (Plus, 0..1),
                (Minus, 1..2),
                (Star, 2..3),
                (Slash, 3..4),
                (Percent, 4..5),
                (Eof, 5..5),
            ],
            "a>=b>>c>>>d>>=e" => [
                (Identifier, 0..1),
                (GreaterEq, 1..3),
                (Identifier, 3..4),
                (Shr, 4..6),
                (Identifier, 6..7),
                (UShr, 7..10),
                (Identifier, 10..11),
                (ShrAssign, 11..14),
                (Identifier, 14..15),
                (Eof, 15..15),
            ],
            "=== == => = !== != !" => [
                (EqEqEq, 0..3),
                (EqEq, 4..6),
                (FatArrow, 7..9),
                (Assign, 10..11),
                (NotEqEq, 12..15),
                (NotEq, 16..18),
                (Bang, 19..20),
                (Eof, 20..20),
            ],
            "a?.b ?? c ? d : e::f->g" => [
                (Identifier, 0..1),
                (QuestionDot, 1..3),
                (Identifier, 3..4),
                (QuestionQuestion, 5..7),
                (Identifier, 8..9),
                (Question, 10..11),
                (Identifier, 12..13),
                (Colon, 14..15),
                (Identifier, 16..17),
                (ColonColon, 17..19),
                (Identifier, 19..20),
                (Arrow, 20..22),
                (Identifier, 22..23),
                (Eof, 23..23),
            ],
            "...xs .5 x.y" => [
                (Ellipsis, 0..3),
                (Identifier, 3..5),
                (FloatLiteral, 6..8),
                (Identifier, 9..10),
                (Dot, 10..11),
                (Identifier, 11..12),
                (Eof, 12..12),
            ],
            "0x1F 0b101 1.5 2e10 3.0e-2 4f 10u 7" => [
                (IntegerLiteral, 0..4),
                (IntegerLiteral, 5..10),
                (FloatLiteral, 11..14),
                (FloatLiteral, 15..19),
                (FloatLiteral, 20..26),
                (FloatLiteral, 27..29),
                (IntegerLiteral, 30..33),
                (IntegerLiteral, 34..35),
                (Eof, 35..35),
            ],
            r#""hi" "a\"b" 'c' 'str' '\n' `t ${x}`"# => [
                (StringLiteral, 0..4),
                (StringLiteral, 5..11),
                (CharLiteral, 12..15),
                (StringLiteral, 16..21),
                (CharLiteral, 22..26),
                (TemplateLiteral, 27..35),
                (Eof, 35..35),
            ],
            "x++ --y z += 1" => [
                (Identifier, 0..1),
                (PlusPlus, 1..3),
                (MinusMinus, 4..6),
                (Identifier, 6..7),
                (Identifier, 8..9),
                (PlusAssign, 10..12),
                (IntegerLiteral, 13..14),
                (Eof, 14..14),
            ],
        });

        for (input, tokens) in cases {
            let lexed: Vec<_> = tokenize(input, &LexerOptions::default())
                .unwrap()
                .into_iter()
                .map(|t| (t.kind, t.span.lo()..t.span.hi()))
                .collect();
            assert_eq!(lexed, tokens.as_slice(), "input: {input:?}");
        }
    }

    #[test]
    fn keeps_trivia_when_asked() {
        use TokenKind::*;
        let src = "a // hi\n/* b */ c";
        let tokens = tokenize(src, &LexerOptions::LOSSLESS).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                Identifier,
                Whitespace,
                LineComment,
                Newline,
                BlockComment,
                Whitespace,
                Identifier,
                Eof
            ]
        );
        let rebuilt: std::string::String = tokens.iter().map(|t| t.text(src)).collect();
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn round_trips_delimiters_and_identifiers() {
        let src = "foo(bar,baz);{qux[0]}";
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text(src)).collect();
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn positions_are_monotonic() {
        let src = "int main() {\n  float x = 1.5f;\n  return 0;\n}\n";
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        for pair in tokens.windows(2) {
            let (a, b) = (pair[0].span, pair[1].span);
            assert!(a.end.offset <= b.start.offset);
            assert!((a.end.line, a.end.column) <= (b.start.line, b.start.column));
        }
        let float = tokens
            .iter()
            .find(|t| t.kind == TokenKind::FloatLiteral)
            .unwrap();
        assert_eq!(float.span.start, Position::new(2, 13, 25));
        assert_eq!(float.span.end, Position::new(2, 17, 29));
    }

    #[test]
    fn lexes_directives_as_whole_lines() {
        use crate::token::Directive;
        let src = "#include <stdio.h>\n#define MAX 10\nint x;";
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Directive(Directive::Include));
        assert_eq!(extract::directive_argument(tokens[0], src), "<stdio.h>");
        assert_eq!(tokens[1].kind, TokenKind::Directive(Directive::Define));
        assert_eq!(extract::directive_argument(tokens[1], src), "MAX 10");
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }

    #[test]
    fn reports_fatal_errors() {
        let cases: &[(&str, Error, std::ops::Range<usize>)] = &[
            ("int x = \"oops;", Error::UnterminatedString, 8..14),
            ("'ab", Error::UnterminatedChar, 0..3),
            ("/* never closed", Error::UnterminatedComment, 0..15),
            ("`open", Error::UnterminatedTemplate, 0..5),
            ("#warning hi", Error::UnknownDirective("warning".into()), 0..8),
            ("a § b", Error::UnexpectedChar('§'), 2..4),
            ("0x", Error::MalformedNumber, 0..2),
        ];
        for (input, error, range) in cases {
            let actual = tokenize(input, &LexerOptions::default()).unwrap_err();
            assert_eq!(&actual.inner, error, "input: {input:?}");
            assert_eq!(actual.span.lo()..actual.span.hi(), range.clone());
        }
    }

    #[test]
    fn strict_mode_rejects_glued_numbers() {
        assert!(tokenize("12abc", &LexerOptions::default()).is_ok());
        let strict = LexerOptions {
            strict: true,
            ..LexerOptions::default()
        };
        let error = tokenize("12abc", &strict).unwrap_err();
        assert_eq!(error.inner, Error::MalformedNumber);
    }

    #[test]
    fn extracts_literals() {
        let src = r#"0xff 1_000 2.5f "a\tb" '\n' `x`"#;
        let tokens = tokenize(src, &LexerOptions::default()).unwrap();
        assert_eq!(extract::int(tokens[0], src), Ok(255));
        assert_eq!(extract::int(tokens[1], src), Ok(1000));
        assert_eq!(extract::float(tokens[2], src), Ok((2.5, true)));
        assert_eq!(&*extract::string(tokens[3], src), "a\tb");
        assert_eq!(extract::char(tokens[4], src), '\n');
        assert_eq!(&*extract::template(tokens[5], src), "x");
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![$(($kind, $range)),*],
            )),*]
        }};
    }
    use cases;
}
