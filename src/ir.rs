//! Token stream produced by the flow parser.

/// Name of the port that continues an arrow wrapped over two lines.
pub const CONTINUATION_PORT: &str = "...";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    pub lines: Vec<Vec<Token>>,
}

impl Flow {
    pub fn new(lines: Vec<Vec<Token>>) -> Self {
        Self { lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Arrow(Arrow),
    Component(Component),
}

impl Token {
    pub fn src_pos(&self) -> usize {
        match self {
            Token::Arrow(arrow) => arrow.src_pos,
            Token::Component(comp) => comp.src_pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrow {
    pub from_port: Option<Port>,
    pub to_port: Option<Port>,
    pub data: Vec<TypeRef>,
    pub src_pos: usize,
}

impl Arrow {
    /// Text shown above the arrow: `(T1, T2)` or nothing.
    pub fn data_label(&self) -> String {
        if self.data.is_empty() {
            return String::new();
        }
        let types: Vec<String> = self.data.iter().map(TypeRef::to_string).collect();
        format!("({})", types.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub index: Option<u32>,
    pub src_pos: usize,
}

impl Port {
    pub fn is_continuation(&self) -> bool {
        self.name == CONTINUATION_PORT
    }

    /// Display form: `name`, `name[3]` or `...` for continuations.
    pub fn label(&self) -> String {
        match self.index {
            Some(idx) if !self.is_continuation() => format!("{}[{}]", self.name, idx),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub decl: CompDecl,
    pub plugins: Vec<Plugin>,
    pub src_pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompDecl {
    pub name: String,
    pub type_ref: TypeRef,
    /// The type was only used to derive the name (`[a]`), so a later
    /// occurrence may still refer to this component.
    pub vague_type: bool,
    pub src_pos: usize,
}

impl CompDecl {
    /// Title lines of the box: `[name]` or `[name, type]`.
    pub fn title(&self) -> Vec<String> {
        let type_name = self.type_ref.to_string();
        if type_name == self.name {
            vec![self.name.clone()]
        } else {
            vec![self.name.clone(), type_name]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    /// Empty for a plain type list.
    pub name: String,
    pub types: Vec<TypeRef>,
    pub src_pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Simple {
        package: Option<String>,
        local: String,
        src_pos: usize,
    },
    List {
        item: Box<TypeRef>,
        src_pos: usize,
    },
    Map {
        key: Box<TypeRef>,
        value: Box<TypeRef>,
        src_pos: usize,
    },
}

impl TypeRef {
    pub fn simple(local: &str) -> Self {
        TypeRef::Simple {
            package: None,
            local: local.to_string(),
            src_pos: 0,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeRef::Simple {
                package: Some(package),
                local,
                ..
            } => write!(f, "{package}.{local}"),
            TypeRef::Simple { local, .. } => f.write_str(local),
            TypeRef::List { item, .. } => write!(f, "list({item})"),
            TypeRef::Map { key, value, .. } => write!(f, "map({key}, {value})"),
        }
    }
}

/// Turns a source position into a human readable location.
pub trait Whereer {
    fn where_is(&self, pos: usize) -> String;
}

/// Named source text that can locate byte positions.
#[derive(Debug, Clone)]
pub struct SourceMap {
    name: String,
    source: String,
}

impl SourceMap {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// One based line and column of `pos` plus the text of that line.
    pub fn line_col(&self, pos: usize) -> (usize, usize, &str) {
        let mut pos = pos.min(self.source.len());
        while !self.source.is_char_boundary(pos) {
            pos -= 1;
        }
        let before = &self.source[..pos];
        let line_start = before.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
        let line_end = self.source[pos..]
            .find('\n')
            .map(|idx| pos + idx)
            .unwrap_or(self.source.len());
        let line = before.matches('\n').count() + 1;
        let column = self.source[line_start..pos].chars().count() + 1;
        let text = self.source[line_start..line_end].trim_end_matches('\r');
        (line, column, text)
    }
}

impl Whereer for SourceMap {
    fn where_is(&self, pos: usize) -> String {
        let (line, column, text) = self.line_col(pos);
        format!(
            "File '{}', line {}, column {}:\n{}",
            self.name, line, column, text
        )
    }
}
