//! Block markup tree.
//!
//! Block markup is HTML interleaved with comment delimiters:
//!
//! ```text
//! <!-- wp:group {"layout":{"type":"constrained"}} -->
//! <div class="wp-block-group"><!-- wp:navigation {"ref":4} /--></div>
//! <!-- /wp:group -->
//! ```
//!
//! [`Document::parse`] turns that into a tree of [`Node`]s: either a block
//! (type name, JSON attribute bag, inner nodes) or a run of literal HTML.
//! Blocks whose attributes are never touched serialize back to their exact
//! source delimiters, so parsing and re-serializing untouched markup is
//! lossless.

use std::fmt;

use serde_json::{Map, Value};

/// JSON attribute bag of a block delimiter (insertion ordered).
pub type Attributes = Map<String, Value>;

/// A node in the block tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A block delimited by `<!-- wp:name -->` comments.
    Block(Block),
    /// Literal HTML between delimiters.
    Html(String),
}

/// Source text of a block's delimiters, kept until the attributes change.
#[derive(Debug, Clone, PartialEq)]
struct Delimiters {
    open: String,
    /// `None` for void blocks and blocks left open at the end of input.
    close: Option<String>,
}

/// A single block invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    attrs: Attributes,
    inner: Vec<Node>,
    void: bool,
    source: Option<Delimiters>,
}

impl Block {
    /// Create a block with no attributes and no inner content.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Attributes::new(),
            inner: Vec::new(),
            void: false,
            source: None,
        }
    }

    /// Create a self-closing block (`<!-- wp:name {...} /-->`).
    #[must_use]
    pub fn void(name: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            attrs,
            void: true,
            ..Self::new(name)
        }
    }

    /// Name as written in the delimiter, e.g. `paragraph` or `acme/card`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with the implicit `core/` namespace removed.
    #[must_use]
    pub fn block_type(&self) -> &str {
        normalize_name(&self.name)
    }

    /// Whether this block is of the given (core-relative) type.
    #[must_use]
    pub fn is(&self, block_type: &str) -> bool {
        self.block_type() == block_type
    }

    /// Rename the block, e.g. `block` → `pattern`.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.source = None;
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        self.void
    }

    #[must_use]
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Mutable access to the attribute bag. The delimiter is rebuilt on output.
    pub fn attrs_mut(&mut self) -> &mut Attributes {
        self.source = None;
        &mut self.attrs
    }

    /// Replace the whole attribute bag.
    pub fn set_attrs(&mut self, attrs: Attributes) {
        self.source = None;
        self.attrs = attrs;
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: Value) {
        self.attrs_mut().insert(key.into(), value);
    }

    /// Remove an attribute, keeping the order of the others.
    ///
    /// The source delimiter is only dropped if something was removed.
    pub fn remove_attr(&mut self, key: &str) -> Option<Value> {
        let removed = self.attrs.shift_remove(key);
        if removed.is_some() {
            self.source = None;
        }
        removed
    }

    #[must_use]
    pub fn inner(&self) -> &[Node] {
        &self.inner
    }

    /// Mutable access to inner nodes. Delimiters are unaffected.
    pub fn inner_mut(&mut self) -> &mut Vec<Node> {
        &mut self.inner
    }

    /// Whether any inner node is itself a block.
    #[must_use]
    pub fn has_child_blocks(&self) -> bool {
        self.inner.iter().any(|n| matches!(n, Node::Block(_)))
    }

    /// The HTML runs directly inside this block (not inside children).
    pub fn html_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.inner.iter_mut().filter_map(|n| match n {
            Node::Html(html) => Some(html),
            Node::Block(_) => None,
        })
    }

    /// Serialize this block (and its children) to markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        if let Some(source) = &self.source {
            out.push_str(&source.open);
            write_nodes(&self.inner, out);
            if let Some(close) = &source.close {
                out.push_str(close);
            }
            return;
        }

        let attrs = if self.attrs.is_empty() {
            String::new()
        } else {
            format!(" {}", serialize_attrs(&self.attrs))
        };

        if self.void {
            out.push_str(&format!("<!-- wp:{}{attrs} /-->", self.name));
        } else {
            out.push_str(&format!("<!-- wp:{}{attrs} -->", self.name));
            write_nodes(&self.inner, out);
            out.push_str(&format!("<!-- /wp:{} -->", self.name));
        }
    }
}

/// A parsed block document: top-level nodes in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    /// Parse block markup.
    ///
    /// Parsing never fails. Comments that are not well-formed block
    /// delimiters (including ones with invalid JSON attributes) stay literal
    /// HTML, a closer that does not match the innermost open block is kept
    /// as HTML, and blocks still open at the end of input are closed
    /// implicitly.
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        let mut root: Vec<Node> = Vec::new();
        let mut stack: Vec<Block> = Vec::new();
        let mut html_start = 0;
        let mut search = 0;

        while let Some(offset) = markup[search..].find("<!--") {
            let start = search + offset;
            let Some(token) = scan_delimiter(markup, start) else {
                search = start + 4;
                continue;
            };

            push_html(&mut stack, &mut root, &markup[html_start..start]);
            let raw = &markup[start..token.end];

            match token.kind {
                DelimiterKind::Void => {
                    let block = Block {
                        name: token.name,
                        attrs: token.attrs,
                        inner: Vec::new(),
                        void: true,
                        source: Some(Delimiters {
                            open: raw.to_string(),
                            close: None,
                        }),
                    };
                    target(&mut stack, &mut root).push(Node::Block(block));
                }
                DelimiterKind::Opener => stack.push(Block {
                    name: token.name,
                    attrs: token.attrs,
                    inner: Vec::new(),
                    void: false,
                    source: Some(Delimiters {
                        open: raw.to_string(),
                        close: None,
                    }),
                }),
                DelimiterKind::Closer => {
                    let matches_open = stack
                        .last()
                        .is_some_and(|open| open.block_type() == normalize_name(&token.name));
                    match stack.pop() {
                        Some(mut block) if matches_open => {
                            if let Some(source) = block.source.as_mut() {
                                source.close = Some(raw.to_string());
                            }
                            target(&mut stack, &mut root).push(Node::Block(block));
                        }
                        popped => {
                            if let Some(block) = popped {
                                stack.push(block);
                            }
                            push_html(&mut stack, &mut root, raw);
                        }
                    }
                }
            }

            html_start = token.end;
            search = token.end;
        }

        push_html(&mut stack, &mut root, &markup[html_start..]);
        while let Some(block) = stack.pop() {
            target(&mut stack, &mut root).push(Node::Block(block));
        }

        Self { nodes: root }
    }

    #[must_use]
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut Vec<Node> {
        &mut self.nodes
    }

    /// Visit every block, parents before children.
    pub fn walk_blocks<F: FnMut(&Block)>(&self, f: &mut F) {
        visit(&self.nodes, f);
    }

    /// Visit every block mutably, parents before children.
    pub fn walk_blocks_mut<F: FnMut(&mut Block)>(&mut self, f: &mut F) {
        visit_mut(&mut self.nodes, f);
    }

    /// Visit every HTML run in the tree, at any depth.
    pub fn walk_html_mut<F: FnMut(&mut String)>(&mut self, f: &mut F) {
        visit_html_mut(&mut self.nodes, f);
    }

    /// Serialize the tree back to markup.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, &mut out);
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markup())
    }
}

fn normalize_name(name: &str) -> &str {
    name.strip_prefix("core/").unwrap_or(name)
}

/// Serialize an attribute bag for a delimiter.
///
/// `--` inside string values would terminate the HTML comment, so it is
/// written as the escaped pair `\u002d\u002d`. JSON never contains `--`
/// outside strings.
#[must_use]
pub fn serialize_attrs(attrs: &Attributes) -> String {
    serde_json::to_string(attrs)
        .unwrap_or_default()
        .replace("--", "\\u002d\\u002d")
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Html(html) => out.push_str(html),
            Node::Block(block) => block.write_to(out),
        }
    }
}

fn visit<F: FnMut(&Block)>(nodes: &[Node], f: &mut F) {
    for node in nodes {
        if let Node::Block(block) = node {
            f(block);
            visit(&block.inner, f);
        }
    }
}

fn visit_mut<F: FnMut(&mut Block)>(nodes: &mut [Node], f: &mut F) {
    for node in nodes {
        if let Node::Block(block) = node {
            f(block);
            visit_mut(&mut block.inner, f);
        }
    }
}

fn visit_html_mut<F: FnMut(&mut String)>(nodes: &mut [Node], f: &mut F) {
    for node in nodes {
        match node {
            Node::Html(html) => f(html),
            Node::Block(block) => visit_html_mut(&mut block.inner, f),
        }
    }
}

fn target<'a>(stack: &'a mut [Block], root: &'a mut Vec<Node>) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(block) => &mut block.inner,
        None => root,
    }
}

fn push_html(stack: &mut [Block], root: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    let nodes = target(stack, root);
    if let Some(Node::Html(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Html(text.to_string()));
    }
}

// ── Delimiter scanning ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterKind {
    Opener,
    Closer,
    Void,
}

#[derive(Debug)]
struct Delimiter {
    kind: DelimiterKind,
    name: String,
    attrs: Attributes,
    /// Byte offset just past the closing `-->`.
    end: usize,
}

/// Try to read a block delimiter starting at `start` (which points at `<!--`).
///
/// Grammar: `<!--` ws+ `/`? `wp:` name ws+ (`{json}` ws+)? `/`? `-->`.
/// Closers carry neither attributes nor the void marker.
fn scan_delimiter(s: &str, start: usize) -> Option<Delimiter> {
    let bytes = s.as_bytes();
    let mut i = skip_whitespace(bytes, start + 4);
    if i == start + 4 {
        return None;
    }

    let closer = bytes.get(i) == Some(&b'/');
    if closer {
        i += 1;
    }
    if !s[i..].starts_with("wp:") {
        return None;
    }
    i += 3;

    let name_start = i;
    i = scan_name_segment(bytes, i)?;
    if bytes.get(i) == Some(&b'/') {
        i = scan_name_segment(bytes, i + 1)?;
    }
    let name = s[name_start..i].to_string();

    let after_name = i;
    i = skip_whitespace(bytes, i);
    if i == after_name {
        return None;
    }

    if !closer && bytes.get(i) == Some(&b'{') {
        let close = i + s[i..].find("-->")?;
        let mut body = s[i..close].trim_end();
        let void = body.ends_with('/');
        if void {
            body = body[..body.len() - 1].trim_end();
        }
        if !body.ends_with('}') {
            return None;
        }
        // the JSON must be followed by whitespace before `/-->` or `-->`
        if !bytes.get(i + body.len()).is_some_and(u8::is_ascii_whitespace) {
            return None;
        }
        let Value::Object(attrs) = serde_json::from_str::<Value>(body).ok()? else {
            return None;
        };
        return Some(Delimiter {
            kind: if void {
                DelimiterKind::Void
            } else {
                DelimiterKind::Opener
            },
            name,
            attrs,
            end: close + 3,
        });
    }

    let (kind, end) = if s[i..].starts_with("/-->") {
        if closer {
            return None;
        }
        (DelimiterKind::Void, i + 4)
    } else if s[i..].starts_with("-->") {
        let kind = if closer {
            DelimiterKind::Closer
        } else {
            DelimiterKind::Opener
        };
        (kind, i + 3)
    } else {
        return None;
    };

    Some(Delimiter {
        kind,
        name,
        attrs: Attributes::new(),
        end,
    })
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
        i += 1;
    }
    i
}

/// `[a-z][a-z0-9_-]*`, returning the offset just past the segment.
fn scan_name_segment(bytes: &[u8], i: usize) -> Option<usize> {
    if !bytes.get(i).is_some_and(u8::is_ascii_lowercase) {
        return None;
    }
    let mut j = i + 1;
    while bytes
        .get(j)
        .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'_' || *b == b'-')
    {
        j += 1;
    }
    Some(j)
}
