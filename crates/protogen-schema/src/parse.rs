//! `.proto` source to IR parser.
//!
//! Handles the subset of the protobuf language that shapes the type graph:
//! packages, imports, file options, messages (with nesting and `oneof`),
//! enums and services. Field options, `reserved`, `extensions` and `extend`
//! blocks are skipped. Type references are left as written; the loader links
//! them to fully-qualified names.

use crate::ir::{
    EnumConstant, EnumDef, Field, FieldType, Label, MessageDef, ProtoFile, Rpc, Scalar,
    ServiceDef, TypeDef, TypeDefKind,
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{path}:{line}: {message}")]
    Syntax {
        path: String,
        line: usize,
        message: String,
    },
    #[error("{path}:{line}: unsupported construct: {construct}")]
    Unsupported {
        path: String,
        line: usize,
        construct: String,
    },
}

/// Parse the contents of the `.proto` file at `path`.
pub fn parse_proto(path: &str, source: &str) -> Result<ProtoFile, ParseError> {
    let tokens = Lexer::new(path, source).tokenize()?;
    Parser {
        path,
        tokens,
        pos: 0,
    }
    .parse_file()
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Number(String),
    Str(String),
    Symbol(char),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    /// Comment lines immediately before this token.
    docs: Option<String>,
}

struct Lexer<'a> {
    path: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(path: &'a str, source: &'a str) -> Self {
        Self {
            path,
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut docs: Vec<String> = Vec::new();

        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '/' => {
                    self.chars.next();
                    match self.chars.next() {
                        Some('/') => docs.push(self.line_comment()),
                        Some('*') => docs.extend(self.block_comment()?),
                        _ => return Err(self.error("unexpected '/'")),
                    }
                }
                '"' | '\'' => {
                    let line = self.line;
                    let value = self.string(c)?;
                    tokens.push(self.token(TokenKind::Str(value), line, &mut docs));
                }
                c if c.is_ascii_digit() => {
                    let line = self.line;
                    let value = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.');
                    tokens.push(self.token(TokenKind::Number(value), line, &mut docs));
                }
                c if c.is_ascii_alphabetic() || c == '_' || c == '.' => {
                    let line = self.line;
                    let value =
                        self.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                    tokens.push(self.token(TokenKind::Ident(value), line, &mut docs));
                }
                c => {
                    self.chars.next();
                    let line = self.line;
                    tokens.push(self.token(TokenKind::Symbol(c), line, &mut docs));
                }
            }
        }
        Ok(tokens)
    }

    fn token(&self, kind: TokenKind, line: usize, docs: &mut Vec<String>) -> Token {
        let docs = std::mem::take(docs);
        Token {
            kind,
            line,
            docs: (!docs.is_empty()).then(|| docs.join("\n")),
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut value = String::new();
        while let Some(&c) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            value.push(c);
            self.chars.next();
        }
        value
    }

    fn line_comment(&mut self) -> String {
        let text = self.take_while(|c| c != '\n');
        text.trim_start_matches('/').trim().to_string()
    }

    fn block_comment(&mut self) -> Result<Vec<String>, ParseError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('*') if self.chars.peek() == Some(&'/') => {
                    self.chars.next();
                    break;
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    text.push(c);
                }
                None => return Err(self.error("unterminated comment")),
            }
        }
        Ok(text
            .lines()
            .map(|l| l.trim().trim_start_matches('*').trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        self.chars.next();
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.chars.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(c) => value.push(c),
                    None => break,
                },
                Some('\n') | None => break,
                Some(c) => value.push(c),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::Syntax {
            path: self.path.to_string(),
            line: self.line,
            message: message.to_string(),
        }
    }
}

struct Parser<'a> {
    path: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_file(mut self) -> Result<ProtoFile, ParseError> {
        let mut file = ProtoFile::new(self.path);

        while let Some(token) = self.peek().cloned() {
            match &token.kind {
                TokenKind::Symbol(';') => {
                    self.pos += 1;
                }
                TokenKind::Ident(word) => match word.as_str() {
                    "syntax" => {
                        self.pos += 1;
                        self.expect_symbol('=')?;
                        let syntax = self.expect_string()?;
                        if syntax != "proto2" && syntax != "proto3" {
                            let message = format!("unknown syntax '{syntax}'");
                            return Err(self.syntax(token.line, message));
                        }
                        self.expect_symbol(';')?;
                    }
                    "package" => {
                        self.pos += 1;
                        file.package = Some(self.expect_ident()?);
                        self.expect_symbol(';')?;
                    }
                    "import" => {
                        self.pos += 1;
                        if self.peek_ident(&["public", "weak"]) {
                            self.pos += 1;
                        }
                        file.imports.push(self.expect_string()?);
                        self.expect_symbol(';')?;
                    }
                    "option" => {
                        self.pos += 1;
                        let (name, value) = self.parse_option()?;
                        file.options.insert(name, value);
                    }
                    "message" | "enum" | "service" => {
                        let scope = file.package.clone().unwrap_or_default();
                        let ty = self.parse_type(&scope)?;
                        file.types.push(ty);
                    }
                    "extend" => {
                        self.pos += 1;
                        self.expect_ident()?;
                        self.skip_block()?;
                    }
                    other => {
                        return Err(self.syntax(token.line, format!("unexpected '{other}'")));
                    }
                },
                other => {
                    return Err(self.syntax(token.line, format!("unexpected {other:?}")));
                }
            }
        }
        Ok(file)
    }

    /// Parse a `message`, `enum` or `service` declaration in `scope`.
    fn parse_type(&mut self, scope: &str) -> Result<TypeDef, ParseError> {
        let keyword = self.next()?;
        let docs = keyword.docs.clone();
        let simple = self.expect_ident()?;
        let name = if scope.is_empty() {
            simple
        } else {
            format!("{scope}.{simple}")
        };
        self.expect_symbol('{')?;

        let mut ty = match &keyword.kind {
            TokenKind::Ident(k) if k == "message" => self.parse_message_body(&name)?,
            TokenKind::Ident(k) if k == "enum" => self.parse_enum_body(&name)?,
            _ => self.parse_service_body(&name)?,
        };
        ty.docs = docs;
        Ok(ty)
    }

    fn parse_message_body(&mut self, name: &str) -> Result<TypeDef, ParseError> {
        let mut fields = Vec::new();
        let mut nested = Vec::new();

        loop {
            let token = self.peek_required()?.clone();
            match &token.kind {
                TokenKind::Symbol('}') => {
                    self.pos += 1;
                    break;
                }
                TokenKind::Symbol(';') => self.pos += 1,
                TokenKind::Ident(word) => match word.as_str() {
                    "message" | "enum" => nested.push(self.parse_type(name)?),
                    "option" => {
                        self.pos += 1;
                        self.parse_option()?;
                    }
                    "reserved" | "extensions" => self.skip_statement()?,
                    "extend" => {
                        self.pos += 1;
                        self.expect_ident()?;
                        self.skip_block()?;
                    }
                    "oneof" => {
                        self.pos += 1;
                        self.expect_ident()?;
                        self.expect_symbol('{')?;
                        while !self.eat_symbol('}') {
                            if self.peek_ident(&["option"]) {
                                self.pos += 1;
                                self.parse_option()?;
                                continue;
                            }
                            fields.push(self.parse_field()?);
                        }
                    }
                    _ => fields.push(self.parse_field()?),
                },
                other => return Err(self.syntax(token.line, format!("unexpected {other:?}"))),
            }
        }

        Ok(TypeDef {
            name: name.to_string(),
            docs: None,
            kind: TypeDefKind::Message(MessageDef { fields }),
            nested,
        })
    }

    /// `label? type name = tag [options]? ;` where a missing label means optional.
    fn parse_field(&mut self) -> Result<Field, ParseError> {
        let first = self.next()?;
        let docs = first.docs.clone();
        let line = first.line;
        let TokenKind::Ident(first) = first.kind else {
            return Err(self.syntax(line, "expected field".to_string()));
        };

        let (label, type_name) = match first.as_str() {
            "optional" => (Label::Optional, self.expect_ident()?),
            "required" => (Label::Required, self.expect_ident()?),
            "repeated" => (Label::Repeated, self.expect_ident()?),
            _ => (Label::Optional, first),
        };
        if type_name == "map" && self.peek_symbol('<') {
            return Err(self.unsupported(line, "map fields"));
        }
        if type_name == "group" {
            return Err(self.unsupported(line, "groups"));
        }

        let name = self.expect_ident()?;
        self.expect_symbol('=')?;
        let tag = self.expect_number(line)?;
        let tag = u32::try_from(tag)
            .map_err(|_| self.syntax(line, format!("invalid field tag {tag}")))?;
        if self.peek_symbol('[') {
            self.skip_until(']')?;
        }
        self.expect_symbol(';')?;

        let ty = match Scalar::from_keyword(&type_name) {
            Some(scalar) => FieldType::Scalar(scalar),
            None => FieldType::Named(type_name),
        };
        Ok(Field {
            name,
            tag,
            label,
            ty,
            docs,
        })
    }

    fn parse_enum_body(&mut self, name: &str) -> Result<TypeDef, ParseError> {
        let mut constants = Vec::new();
        while !self.eat_symbol('}') {
            if self.eat_symbol(';') {
                continue;
            }
            if self.peek_ident(&["option"]) {
                self.pos += 1;
                self.parse_option()?;
                continue;
            }
            if self.peek_ident(&["reserved"]) {
                self.skip_statement()?;
                continue;
            }

            let token = self.next()?;
            let docs = token.docs.clone();
            let TokenKind::Ident(constant) = token.kind else {
                return Err(self.syntax(token.line, "expected enum constant".to_string()));
            };
            self.expect_symbol('=')?;
            let negative = self.eat_symbol('-');
            let tag = self.expect_number(token.line)?;
            let tag = i32::try_from(if negative { -tag } else { tag })
                .map_err(|_| self.syntax(token.line, format!("invalid enum value {tag}")))?;
            if self.peek_symbol('[') {
                self.skip_until(']')?;
            }
            self.expect_symbol(';')?;
            constants.push(EnumConstant {
                name: constant,
                tag,
                docs,
            });
        }

        Ok(TypeDef {
            name: name.to_string(),
            docs: None,
            kind: TypeDefKind::Enum(EnumDef { constants }),
            nested: Vec::new(),
        })
    }

    fn parse_service_body(&mut self, name: &str) -> Result<TypeDef, ParseError> {
        let mut rpcs = Vec::new();
        while !self.eat_symbol('}') {
            if self.eat_symbol(';') {
                continue;
            }
            if self.peek_ident(&["option"]) {
                self.pos += 1;
                self.parse_option()?;
                continue;
            }

            let token = self.next()?;
            if token.kind != TokenKind::Ident("rpc".to_string()) {
                return Err(self.syntax(token.line, "expected 'rpc'".to_string()));
            }
            let rpc_name = self.expect_ident()?;
            let (client_streaming, request) = self.parse_rpc_type()?;
            if !self.peek_ident(&["returns"]) {
                return Err(self.syntax(token.line, "expected 'returns'".to_string()));
            }
            self.pos += 1;
            let (server_streaming, response) = self.parse_rpc_type()?;
            if self.peek_symbol('{') {
                self.skip_block()?;
            } else {
                self.expect_symbol(';')?;
            }
            rpcs.push(Rpc {
                name: rpc_name,
                request,
                response,
                client_streaming,
                server_streaming,
                docs: token.docs,
            });
        }

        Ok(TypeDef {
            name: name.to_string(),
            docs: None,
            kind: TypeDefKind::Service(ServiceDef { rpcs }),
            nested: Vec::new(),
        })
    }

    /// `( stream? Type )`
    fn parse_rpc_type(&mut self) -> Result<(bool, String), ParseError> {
        self.expect_symbol('(')?;
        let mut ty = self.expect_ident()?;
        let streaming = ty == "stream" && !self.peek_symbol(')');
        if streaming {
            ty = self.expect_ident()?;
        }
        self.expect_symbol(')')?;
        Ok((streaming, ty))
    }

    /// `name = value ;` after the `option` keyword.
    fn parse_option(&mut self) -> Result<(String, String), ParseError> {
        let mut name = String::new();
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Symbol('=') => break,
                TokenKind::Ident(s) | TokenKind::Number(s) => name.push_str(&s),
                TokenKind::Symbol(c) => name.push(c),
                TokenKind::Str(_) => {
                    return Err(self.syntax(token.line, "unexpected string".to_string()));
                }
            }
        }

        let mut parts = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Symbol(';') if depth == 0 => break,
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => depth = depth.saturating_sub(1),
                TokenKind::Ident(s) | TokenKind::Number(s) | TokenKind::Str(s) => parts.push(s),
                TokenKind::Symbol(c) => parts.push(c.to_string()),
            }
        }
        Ok((name, parts.join(" ")))
    }

    fn skip_statement(&mut self) -> Result<(), ParseError> {
        self.skip_until(';')
    }

    /// Skip through the next matching `close`, honouring nested braces.
    fn skip_until(&mut self, close: char) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.next()?.kind {
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') if depth > 0 => depth -= 1,
                TokenKind::Symbol(c) if c == close && depth == 0 => return Ok(()),
                _ => {}
            }
        }
    }

    /// Skip a `{ ... }` block, nested blocks included.
    fn skip_block(&mut self) -> Result<(), ParseError> {
        self.expect_symbol('{')?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()?.kind {
                TokenKind::Symbol('{') => depth += 1,
                TokenKind::Symbol('}') => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_required(&self) -> Result<&Token, ParseError> {
        self.peek().ok_or_else(|| self.eof())
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        let token = self.tokens.get(self.pos).cloned().ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_symbol(&self, symbol: char) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Symbol(c), .. }) if *c == symbol)
    }

    fn peek_ident(&self, words: &[&str]) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Ident(w), .. }) if words.contains(&w.as_str()))
    }

    fn eat_symbol(&mut self, symbol: char) -> bool {
        let matched = self.peek_symbol(symbol);
        if matched {
            self.pos += 1;
        }
        matched
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Symbol(c) if c == symbol => Ok(()),
            other => Err(self.syntax(token.line, format!("expected '{symbol}', found {other:?}"))),
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Ident(s) => Ok(s),
            other => Err(self.syntax(token.line, format!("expected identifier, found {other:?}"))),
        }
    }

    fn expect_string(&mut self) -> Result<String, ParseError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Str(s) => Ok(s),
            other => Err(self.syntax(token.line, format!("expected string, found {other:?}"))),
        }
    }

    fn expect_number(&mut self, line: usize) -> Result<i64, ParseError> {
        let token = self.next()?;
        let TokenKind::Number(text) = token.kind else {
            return Err(self.syntax(token.line, "expected number".to_string()));
        };
        let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => i64::from_str_radix(hex, 16),
            None => text.parse(),
        };
        parsed.map_err(|_| self.syntax(line, format!("invalid number '{text}'")))
    }

    fn eof(&self) -> ParseError {
        let line = self.tokens.last().map(|t| t.line).unwrap_or(1);
        self.syntax(line, "unexpected end of file".to_string())
    }

    fn syntax(&self, line: usize, message: String) -> ParseError {
        ParseError::Syntax {
            path: self.path.to_string(),
            line,
            message,
        }
    }

    fn unsupported(&self, line: usize, construct: &str) -> ParseError {
        ParseError::Unsupported {
            path: self.path.to_string(),
            line,
            construct: construct.to_string(),
        }
    }
}
