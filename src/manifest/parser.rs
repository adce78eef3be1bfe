use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::iter::Peekable;
use core::str::Chars;

use hashbrown::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {0}: unexpected token")]
    UnexpectedToken(usize),
    #[error("line {0}: unexpected end of input")]
    UnexpectedEof(usize),
    #[error("line {0}: unterminated string")]
    UnterminatedString(usize),
    #[error("line {0}: expected 'key = value'")]
    ExpectedAssignment(usize),
    #[error("line {line}: undefined variable '{name}'")]
    UndefinedVariable { line: usize, name: String },
    #[error("line {line}: can't apply '{op}' to {left} and {right}")]
    InvalidOperands {
        line: usize,
        op: char,
        left: &'static str,
        right: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManifestValue {
    String(String),
    Array(Vec<ManifestValue>),
}

impl ManifestValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ManifestValue::String(_) => "string",
            ManifestValue::Array(_) => "array",
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        if let ManifestValue::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// The value as a list of strings; a single string is a one-element list.
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            ManifestValue::String(s) => Some(vec![s.clone()]),
            ManifestValue::Array(arr) => arr
                .iter()
                .map(|v| v.as_string().map(String::from))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Value(ManifestValue),
    Array(Vec<Expr>),
    Identifier(String),
    Add(Box<Expr>, Box<Expr>),
    Join(Box<Expr>, Box<Expr>),
}

/// A parsed build description: `[section]` headers followed by
/// `key = value` lines.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManifestFile {
    sections: HashMap<String, HashMap<String, ManifestValue>>,
}

impl ManifestFile {
    pub fn parse(content: &str) -> Result<ManifestFile, ParseError> {
        ManifestParser::new(content).parse()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&ManifestValue> {
        self.sections.get(section)?.get(key)
    }

    pub fn section(&self, section: &str) -> Option<&HashMap<String, ManifestValue>> {
        self.sections.get(section)
    }

    /// Section names, sorted.
    pub fn section_names(&self) -> Vec<&str> {
        let mut names = self.sections.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    fn set(&mut self, section: &str, key: &str, value: ManifestValue) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn evaluate(&self, section: &str, line: usize, expr: &Expr) -> Result<ManifestValue, ParseError> {
        match expr {
            Expr::Value(v) => Ok(v.clone()),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.evaluate(section, line, item))
                .collect::<Result<Vec<_>, _>>()
                .map(ManifestValue::Array),
            Expr::Identifier(name) => self
                .get("constants", name)
                .or_else(|| self.get(section, name))
                .cloned()
                .ok_or_else(|| ParseError::UndefinedVariable {
                    line,
                    name: name.clone(),
                }),
            Expr::Add(left, right) => {
                let left = self.evaluate(section, line, left)?;
                let right = self.evaluate(section, line, right)?;
                match (left, right) {
                    (ManifestValue::String(mut a), ManifestValue::String(b)) => {
                        a.push_str(&b);
                        Ok(ManifestValue::String(a))
                    }
                    (ManifestValue::Array(mut a), ManifestValue::Array(b)) => {
                        a.extend(b);
                        Ok(ManifestValue::Array(a))
                    }
                    (ManifestValue::Array(mut a), b @ ManifestValue::String(_)) => {
                        a.push(b);
                        Ok(ManifestValue::Array(a))
                    }
                    (a @ ManifestValue::String(_), ManifestValue::Array(b)) => {
                        let mut result = vec![a];
                        result.extend(b);
                        Ok(ManifestValue::Array(result))
                    }
                    (a, b) => Err(ParseError::InvalidOperands {
                        line,
                        op: '+',
                        left: a.type_name(),
                        right: b.type_name(),
                    }),
                }
            }
            Expr::Join(left, right) => {
                let left = self.evaluate(section, line, left)?;
                let right = self.evaluate(section, line, right)?;
                match (left, right) {
                    (ManifestValue::String(a), ManifestValue::String(b)) => {
                        let mut result = a;
                        if !result.is_empty() && !result.ends_with('/') {
                            result.push('/');
                        }
                        result.push_str(b.trim_start_matches('/'));
                        Ok(ManifestValue::String(result))
                    }
                    (a, b) => Err(ParseError::InvalidOperands {
                        line,
                        op: '/',
                        left: a.type_name(),
                        right: b.type_name(),
                    }),
                }
            }
        }
    }
}

struct ManifestParser<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    /// Per section, key -> (declaration index, line, expression).
    sections: HashMap<String, HashMap<String, (usize, usize, Expr)>>,
}

impl<'a> ManifestParser<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().map(str::trim).collect(),
            pos: 0,
            sections: HashMap::new(),
        }
    }

    fn set(&mut self, section: &str, key: &str, line: usize, expr: Expr) {
        let section = self.sections.entry(section.to_string()).or_default();

        let n = section.len();
        if let Some(entry) = section.get_mut(key) {
            // later assignments win but keep their first position
            entry.1 = line;
            entry.2 = expr;
        } else {
            section.insert(key.to_string(), (n, line, expr));
        }
    }

    fn parse(&mut self) -> Result<ManifestFile, ParseError> {
        let mut current_section = String::new();

        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];
            let line_no = self.pos + 1;
            self.pos += 1;

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len() - 1].trim().to_string();
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ParseError::ExpectedAssignment(line_no));
            };
            let key = key.trim();
            if key.is_empty() || !key.chars().all(is_ident_char) {
                return Err(ParseError::ExpectedAssignment(line_no));
            }

            let expr = self.parse_value(value.trim(), line_no)?;
            self.set(&current_section, key, line_no, expr);
        }

        let mut manifest = ManifestFile::default();
        let mut sections = core::mem::take(&mut self.sections);

        // constants are visible from every other section
        if let Some(entries) = sections.remove("constants") {
            Self::evaluate_section(&mut manifest, "constants", entries)?;
        }

        let mut names = sections.keys().cloned().collect::<Vec<_>>();
        names.sort_unstable();
        for name in names {
            if let Some(entries) = sections.remove(&name) {
                Self::evaluate_section(&mut manifest, &name, entries)?;
            }
        }

        Ok(manifest)
    }

    fn evaluate_section(
        manifest: &mut ManifestFile,
        section: &str,
        entries: HashMap<String, (usize, usize, Expr)>,
    ) -> Result<(), ParseError> {
        let mut entries = entries.into_iter().collect::<Vec<_>>();
        entries.sort_by_key(|(_, (idx, _, _))| *idx);
        for (key, (_, line, expr)) in entries {
            let value = manifest.evaluate(section, line, &expr)?;
            manifest.set(section, &key, value);
        }
        Ok(())
    }

    /// Parses the value starting on `first_line`, pulling in continuation
    /// lines while the expression is incomplete (e.g. an open array).
    fn parse_value(&mut self, first_line: &str, line_no: usize) -> Result<Expr, ParseError> {
        let mut content = String::from(first_line);

        loop {
            match ExprParser::new(&content, line_no).parse() {
                Err(ParseError::UnexpectedEof(_)) if self.pos < self.lines.len() => {
                    content.push('\n');
                    content.push_str(self.lines[self.pos]);
                    self.pos += 1;
                }
                result => return result,
            }
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    String(String),
    Identifier(String),
    Plus,
    Slash,
    LeftBracket,
    RightBracket,
    Comma,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str, line: usize) -> Self {
        Self {
            chars: input.chars().peekable(),
            line,
        }
    }

    fn tokenize(mut self) -> Result<Vec<(usize, Token)>, ParseError> {
        let mut tokens = Vec::new();

        while let Some(&ch) = self.chars.peek() {
            let line = self.line;
            let token = match ch {
                '\n' => {
                    self.chars.next();
                    self.line += 1;
                    continue;
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                    continue;
                }
                '#' => {
                    while self.chars.next_if(|&c| c != '\n').is_some() {}
                    continue;
                }
                '\'' | '"' => {
                    self.chars.next();
                    Token::String(self.read_string(ch)?)
                }
                '+' => {
                    self.chars.next();
                    Token::Plus
                }
                '/' => {
                    self.chars.next();
                    Token::Slash
                }
                '[' => {
                    self.chars.next();
                    Token::LeftBracket
                }
                ']' => {
                    self.chars.next();
                    Token::RightBracket
                }
                ',' => {
                    self.chars.next();
                    Token::Comma
                }
                // values are quoted, so a bare number or flag is an error
                c if c.is_ascii_digit() || c == '-' => {
                    return Err(ParseError::UnexpectedToken(line));
                }
                c if is_ident_char(c) => {
                    let mut ident = String::new();
                    while let Some(c) = self.chars.next_if(|&c| is_ident_char(c)) {
                        ident.push(c);
                    }
                    Token::Identifier(ident)
                }
                _ => return Err(ParseError::UnexpectedToken(line)),
            };
            tokens.push((line, token));
        }

        Ok(tokens)
    }

    fn read_string(&mut self, quote: char) -> Result<String, ParseError> {
        let mut string = String::new();

        while let Some(ch) = self.chars.next() {
            match ch {
                '\\' => {
                    let escaped = match self.chars.next() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some(c) => c,
                        None => return Err(ParseError::UnexpectedEof(self.line)),
                    };
                    string.push(escaped);
                }
                '\n' => return Err(ParseError::UnterminatedString(self.line)),
                c if c == quote => return Ok(string),
                c => string.push(c),
            }
        }

        Err(ParseError::UnterminatedString(self.line))
    }

}

/// Recursive-descent parser for a single value expression.
///
/// ```text
/// sum  := path ('+' path)*
/// path := atom ('/' atom)*
/// atom := string | identifier | '[' (sum (',' sum)* ','?)? ']'
/// ```
struct ExprParser<'a> {
    input: &'a str,
    line: usize,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn new(input: &'a str, line: usize) -> Self {
        Self {
            input,
            line,
            tokens: Vec::new(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Expr, ParseError> {
        self.tokens = Lexer::new(self.input, self.line).tokenize()?;
        let expr = self.sum()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some((line, _)) => Err(ParseError::UnexpectedToken(*line)),
        }
    }

    fn last_line(&self) -> usize {
        self.line + self.input.matches('\n').count()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn next(&mut self) -> Result<(usize, Token), ParseError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof(self.last_line()))?;
        self.pos += 1;
        Ok(token)
    }

    fn sum(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.path()?;
        while self.peek() == Some(&Token::Plus) {
            self.pos += 1;
            let right = self.path()?;
            left = Expr::Add(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn path(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.atom()?;
        while self.peek() == Some(&Token::Slash) {
            self.pos += 1;
            let right = self.atom()?;
            left = Expr::Join(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let (line, token) = self.next()?;
        match token {
            Token::String(s) => Ok(Expr::Value(ManifestValue::String(s))),
            Token::Identifier(name) => Ok(Expr::Identifier(name)),
            Token::LeftBracket => {
                let mut items = Vec::new();
                loop {
                    if self.peek() == Some(&Token::RightBracket) {
                        self.pos += 1;
                        break;
                    }
                    items.push(self.sum()?);
                    match self.next()? {
                        (_, Token::Comma) => {}
                        (_, Token::RightBracket) => break,
                        (line, _) => return Err(ParseError::UnexpectedToken(line)),
                    }
                }
                Ok(Expr::Array(items))
            }
            _ => Err(ParseError::UnexpectedToken(line)),
        }
    }
}
