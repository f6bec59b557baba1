use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{FlowError, ParseIssue};
use crate::ir::{
    Arrow, CONTINUATION_PORT, CompDecl, Component, Flow, Plugin, Port, SourceMap, Token, TypeRef,
    Whereer,
};
use crate::log::debug;

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*").unwrap());
static PACKAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*\.").unwrap());
static LOCAL_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][a-zA-Z0-9]*").unwrap());
static NATURAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+").unwrap());

const FIRST_ARROW_WITHOUT_SOURCE: &str = "The first arrow of this flow line is missing a source port";
const LAST_ARROW_WITHOUT_DESTINATION: &str =
    "The last arrow of this flow line is missing a destination port";

/// Issue found before it could be located in the source.
#[derive(Debug, Clone)]
struct PendingIssue {
    pos: usize,
    message: String,
}

impl PendingIssue {
    fn new(pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }

    fn locate(self, whereer: &dyn Whereer) -> ParseIssue {
        ParseIssue {
            location: whereer.where_is(self.pos),
            message: self.message,
        }
    }
}

type ParseResult<T> = Result<T, PendingIssue>;

struct ParsedLine {
    start: usize,
    tokens: Vec<Token>,
}

/// Parses flow source text into its token stream.
///
/// Syntax errors stop the parser at the first problem; line level checks
/// (alternating arrows and components, missing ports, continuations) are
/// collected and reported together.
pub fn parse_flow(source: &SourceMap) -> Result<Flow, FlowError> {
    let mut parser = FlowParser::new(source.source());
    let lines = parser
        .parse_lines()
        .map_err(|issue| FlowError::Parse(vec![issue.locate(source)]))?;

    let mut issues = Vec::new();
    for line in &lines {
        check_line(line, &mut issues);
    }
    check_continuations(&lines, &mut issues);
    if !issues.is_empty() {
        return Err(FlowError::Parse(
            issues.into_iter().map(|issue| issue.locate(source)).collect(),
        ));
    }

    debug!(lines = lines.len(), "parsed flow");
    Ok(Flow::new(lines.into_iter().map(|line| line.tokens).collect()))
}

struct FlowParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FlowParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn eat(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, literal: &str) -> ParseResult<()> {
        if self.eat(literal) {
            Ok(())
        } else {
            Err(PendingIssue::new(
                self.pos,
                format!("Literal '{literal}' expected"),
            ))
        }
    }

    fn match_re(&mut self, re: &Regex) -> Option<&'a str> {
        let found = re.find(self.rest())?;
        let text = &self.rest()[..found.end()];
        self.pos += found.end();
        Some(text)
    }

    /// Skips spaces and tabs; returns how many were skipped.
    fn skip_inline_space(&mut self) -> usize {
        let count = self
            .rest()
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\r'))
            .count();
        self.pos += count;
        count
    }

    /// Skips whitespace and comments; returns whether a line break was seen.
    fn skip_space_comment(&mut self) -> ParseResult<bool> {
        let mut newline = false;
        loop {
            let rest = self.rest();
            if let Some(ch) = rest.chars().next().filter(|ch| ch.is_whitespace()) {
                newline |= ch == '\n';
                self.pos += ch.len_utf8();
            } else if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(idx) => self.pos += idx,
                    None => self.pos = self.input.len(),
                }
            } else if rest.starts_with("/*") {
                let Some(idx) = rest[2..].find("*/") else {
                    return Err(PendingIssue::new(self.pos, "Block comment is never closed"));
                };
                newline |= rest[2..2 + idx].contains('\n');
                self.pos += idx + 4;
            } else {
                return Ok(newline);
            }
        }
    }

    fn parse_lines(&mut self) -> ParseResult<Vec<ParsedLine>> {
        self.skip_space_comment()?;
        let mut lines = Vec::new();
        while !self.at_end() {
            lines.push(self.parse_line()?);
        }
        if lines.is_empty() {
            return Err(PendingIssue::new(self.pos, "At least one flow line expected"));
        }
        Ok(lines)
    }

    fn parse_line(&mut self) -> ParseResult<ParsedLine> {
        let start = self.pos;
        let mut tokens = Vec::new();
        loop {
            tokens.push(self.parse_part()?);
            self.skip_inline_space();
            if !self.starts_part() {
                break;
            }
        }
        if tokens.len() < 2 {
            return Err(PendingIssue::new(
                start,
                format!(
                    "A flow line needs at least 2 parts (arrows or components) but got only {}",
                    tokens.len()
                ),
            ));
        }
        self.parse_statement_end()?;
        Ok(ParsedLine { start, tokens })
    }

    fn starts_part(&self) -> bool {
        matches!(self.peek(), Some(ch) if ch == '[' || ch == '(' || ch == '-' || ch == '.' || ch.is_ascii_lowercase())
    }

    fn parse_part(&mut self) -> ParseResult<Token> {
        if self.peek() == Some('[') {
            Ok(Token::Component(self.parse_component()?))
        } else {
            Ok(Token::Arrow(self.parse_arrow()?))
        }
    }

    fn parse_statement_end(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let mut newline = self.skip_space_comment()?;
        let semicolon = self.eat(";");
        newline |= self.skip_space_comment()?;
        if newline || semicolon || self.at_end() {
            Ok(())
        } else {
            Err(PendingIssue::new(
                start,
                "A statement must be ended by a semicolon (';'), a new line or the end of the input",
            ))
        }
    }

    fn parse_arrow(&mut self) -> ParseResult<Arrow> {
        let src_pos = self.pos;
        let from_port = self.parse_port()?;
        self.skip_inline_space();
        let mut data = Vec::new();
        if self.eat("(") {
            self.skip_space_comment()?;
            data = self.parse_type_list()?;
            self.skip_space_comment()?;
            self.expect(")")?;
            self.skip_inline_space();
        }
        self.expect("->")?;
        self.skip_inline_space();
        let to_port = self.parse_port()?;
        Ok(Arrow {
            from_port,
            to_port,
            data,
            src_pos,
        })
    }

    fn parse_natural(&mut self) -> ParseResult<Option<u32>> {
        let pos = self.pos;
        let Some(digits) = self.match_re(&NATURAL_RE) else {
            return Ok(None);
        };
        digits
            .parse()
            .map(Some)
            .map_err(|_| PendingIssue::new(pos, format!("Number '{digits}' is too large")))
    }

    fn parse_port(&mut self) -> ParseResult<Option<Port>> {
        let src_pos = self.pos;
        if self.eat(CONTINUATION_PORT) {
            let Some(index) = self.parse_natural()? else {
                return Err(PendingIssue::new(
                    self.pos,
                    "A continuation ('...') needs a number",
                ));
            };
            return Ok(Some(Port {
                name: CONTINUATION_PORT.to_string(),
                index: Some(index),
                src_pos,
            }));
        }

        let Some(name) = self.match_re(&NAME_RE) else {
            return Ok(None);
        };
        let mut index = None;
        let before_colon = self.pos;
        if self.eat(":") {
            index = self.parse_natural()?;
            if index.is_none() {
                self.pos = before_colon;
            }
        }
        Ok(Some(Port {
            name: name.to_string(),
            index,
            src_pos,
        }))
    }

    fn parse_type(&mut self) -> ParseResult<TypeRef> {
        let src_pos = self.pos;
        if self.eat("list(") {
            self.skip_space_comment()?;
            let item = self.parse_type()?;
            self.skip_space_comment()?;
            self.expect(")")?;
            return Ok(TypeRef::List {
                item: Box::new(item),
                src_pos,
            });
        }
        if self.eat("map(") {
            self.skip_space_comment()?;
            let key = self.parse_type()?;
            self.skip_space_comment()?;
            self.expect(",")?;
            self.skip_space_comment()?;
            let value = self.parse_type()?;
            self.skip_space_comment()?;
            self.expect(")")?;
            return Ok(TypeRef::Map {
                key: Box::new(key),
                value: Box::new(value),
                src_pos,
            });
        }

        let package = self
            .match_re(&PACKAGE_RE)
            .map(|pkg| pkg.trim_end_matches('.').to_string());
        let Some(local) = self.match_re(&LOCAL_TYPE_RE) else {
            self.pos = src_pos;
            return Err(PendingIssue::new(src_pos, "Type expected"));
        };
        if package.is_none() && (local == "list" || local == "map") {
            self.pos = src_pos;
            return Err(PendingIssue::new(
                src_pos,
                format!("The keyword '{local}' can only be used as 'list(T)' or 'map(K, V)'"),
            ));
        }
        Ok(TypeRef::Simple {
            package,
            local: local.to_string(),
            src_pos,
        })
    }

    fn parse_type_list(&mut self) -> ParseResult<Vec<TypeRef>> {
        let mut types = vec![self.parse_type()?];
        loop {
            let save = self.pos;
            self.skip_space_comment()?;
            if !self.eat(",") {
                self.pos = save;
                return Ok(types);
            }
            self.skip_space_comment()?;
            types.push(self.parse_type()?);
        }
    }

    fn parse_component(&mut self) -> ParseResult<Component> {
        let src_pos = self.pos;
        self.expect("[")?;
        self.skip_space_comment()?;
        let decl = self.parse_comp_decl()?;
        let save = self.pos;
        self.skip_space_comment()?;
        let plugins = if self.peek() == Some('[') {
            self.parse_plugins()?
        } else {
            self.pos = save;
            Vec::new()
        };
        self.skip_space_comment()?;
        self.expect("]")?;
        Ok(Component {
            decl,
            plugins,
            src_pos,
        })
    }

    fn parse_comp_decl(&mut self) -> ParseResult<CompDecl> {
        let src_pos = self.pos;
        if let Some(name) = self.match_re(&NAME_RE) {
            if self.skip_inline_space() > 0 {
                if let Ok(type_ref) = self.parse_type() {
                    return Ok(CompDecl {
                        name: name.to_string(),
                        type_ref,
                        vague_type: false,
                        src_pos,
                    });
                }
            }
            self.pos = src_pos;
        }

        let type_ref = self.parse_type()?;
        let TypeRef::Simple { package, local, .. } = &type_ref else {
            return Err(PendingIssue::new(
                src_pos,
                format!("A component of type '{type_ref}' needs an explicit name"),
            ));
        };
        let name = lower_first(local);
        let vague_type = package.is_none() && *local == name;
        Ok(CompDecl {
            name,
            type_ref,
            vague_type,
            src_pos,
        })
    }

    /// Parses either a list of named plugins or a plain type list, whichever
    /// matches more of the input.
    fn parse_plugins(&mut self) -> ParseResult<Vec<Plugin>> {
        let src_pos = self.pos;
        self.expect("[")?;
        self.skip_space_comment()?;
        let start = self.pos;

        let as_plugins = self.parse_plugin_list().map(|plugins| (plugins, self.pos));
        self.pos = start;
        let as_types = self.parse_type_list().map(|types| (types, self.pos));

        let plugins = match (as_plugins, as_types) {
            (Ok((plugins, plugin_end)), Ok((types, type_end))) => {
                if type_end > plugin_end {
                    self.pos = type_end;
                    vec![unnamed_plugin(types, src_pos)]
                } else {
                    self.pos = plugin_end;
                    plugins
                }
            }
            (Ok((plugins, end)), Err(_)) => {
                self.pos = end;
                plugins
            }
            (Err(_), Ok((types, end))) => {
                self.pos = end;
                vec![unnamed_plugin(types, src_pos)]
            }
            (Err(issue), Err(_)) => return Err(issue),
        };
        self.skip_space_comment()?;
        self.expect("]")?;
        Ok(plugins)
    }

    fn parse_plugin_list(&mut self) -> ParseResult<Vec<Plugin>> {
        let mut plugins = vec![self.parse_plugin()?];
        loop {
            let save = self.pos;
            self.skip_space_comment()?;
            if !self.eat("|") {
                self.pos = save;
                return Ok(plugins);
            }
            self.skip_space_comment()?;
            plugins.push(self.parse_plugin()?);
        }
    }

    fn parse_plugin(&mut self) -> ParseResult<Plugin> {
        let src_pos = self.pos;
        if let Some(name) = self.match_re(&NAME_RE) {
            self.skip_space_comment()?;
            if self.eat("=") {
                self.skip_space_comment()?;
                let types = self.parse_type_list()?;
                return Ok(Plugin {
                    name: name.to_string(),
                    types,
                    src_pos,
                });
            }
            self.pos = src_pos;
        }
        let type_ref = self.parse_type()?;
        Ok(unnamed_plugin(vec![type_ref], src_pos))
    }
}

fn unnamed_plugin(types: Vec<TypeRef>, src_pos: usize) -> Plugin {
    Plugin {
        name: String::new(),
        types,
        src_pos,
    }
}

fn lower_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn check_line(line: &ParsedLine, issues: &mut Vec<PendingIssue>) {
    let tokens = &line.tokens;
    let last = tokens.len() - 1;
    let mut previous_was_arrow = None;
    for (idx, token) in tokens.iter().enumerate() {
        let is_arrow = matches!(token, Token::Arrow(_));
        if previous_was_arrow == Some(is_arrow) {
            let kind = if is_arrow { "arrows" } else { "components" };
            issues.push(PendingIssue::new(
                token.src_pos(),
                format!(
                    "A flow line must alternate arrows and components but found two consecutive {kind} at position {}",
                    idx + 1
                ),
            ));
            return;
        }
        previous_was_arrow = Some(is_arrow);

        if let Token::Arrow(arrow) = token {
            let continues_in = idx > 0 && is_continuation(arrow.from_port.as_ref());
            let continues_out = idx < last && is_continuation(arrow.to_port.as_ref());
            if continues_in || continues_out {
                issues.push(PendingIssue::new(
                    arrow.src_pos,
                    "A continuation can only be used at the start or end of a flow line",
                ));
                return;
            }
        }
    }

    if let Token::Arrow(first) = &tokens[0] {
        if first.from_port.is_none() {
            issues.push(PendingIssue::new(line.start, FIRST_ARROW_WITHOUT_SOURCE));
        }
        if first.data.is_empty() {
            debug!(pos = line.start, "first arrow of line has no data type");
        }
    }
    if let Token::Arrow(last_arrow) = &tokens[last] {
        if last_arrow.to_port.is_none() {
            issues.push(PendingIssue::new(line.start, LAST_ARROW_WITHOUT_DESTINATION));
        }
    }
}

fn is_continuation(port: Option<&Port>) -> bool {
    port.is_some_and(Port::is_continuation)
}

/// A line may end in `-> ...N` and a later line start with `...N ->`.
fn check_continuations(lines: &[ParsedLine], issues: &mut Vec<PendingIssue>) {
    let mut open_ends: BTreeMap<u32, usize> = BTreeMap::new();
    for line in lines {
        if let Some(Token::Arrow(first)) = line.tokens.first() {
            if let Some(port) = first.from_port.as_ref().filter(|p| p.is_continuation()) {
                let number = port.index.unwrap_or_default();
                if open_ends.remove(&number).is_none() {
                    issues.push(PendingIssue::new(
                        port.src_pos,
                        format!(
                            "Continuation '...{number}' at the start of this line has no matching continuation at the end of an earlier line"
                        ),
                    ));
                }
            }
        }
        if let Some(Token::Arrow(last)) = line.tokens.last() {
            if let Some(port) = last.to_port.as_ref().filter(|p| p.is_continuation()) {
                let number = port.index.unwrap_or_default();
                if !last.data.is_empty() {
                    issues.push(PendingIssue::new(
                        last.src_pos,
                        "The data type of a continued arrow has to be given at its start, not at the end of the line",
                    ));
                }
                if open_ends.insert(number, port.src_pos).is_some() {
                    issues.push(PendingIssue::new(
                        port.src_pos,
                        format!("Continuation '...{number}' is used at the end of two lines"),
                    ));
                }
            }
        }
    }
    for (number, pos) in open_ends {
        issues.push(PendingIssue::new(
            pos,
            format!("Continuation '...{number}' is never continued at the start of a later line"),
        ));
    }
}
