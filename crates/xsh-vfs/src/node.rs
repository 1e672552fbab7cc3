use indexmap::IndexMap;

pub type NodeId = u64;

/// S-expression AST variants (§3.1, §4.4). Subterms are carried as ordinary
/// children; `Holder` points at another node without re-materializing it.
#[derive(Debug, Clone, PartialEq)]
pub enum SAstKind {
    Int(i64),
    Bool(bool),
    Str(String),
    Sym(String),
    If,
    Lambda { params: Vec<String> },
    Call,
    Holder { target: Option<NodeId> },
}

/// C++ construction AST variants (§3.4). Variants marked directory-like
/// expose their sub-nodes as ordinary children in the order listed in the
/// spec (e.g. a `Function`'s single child is its `body` `Compound`).
#[derive(Debug, Clone, PartialEq)]
pub enum CppAstKind {
    TranslationUnit,
    Include { header: String, angled: bool },
    Function { return_type: String, name: String, params: Vec<(String, String)> },
    Compound,
    RangeFor { decl: String, range: String },
    ExprStmt,
    Return { has_expr: bool },
    VarDecl { ty: String, name: String, init: Option<String>, has_init: bool },
    RawStmt { text: String },
    Id { id: String },
    StringLit { value: String },
    IntLit { value: i64 },
    Call,
    BinOp { op: String },
    StreamOut,
    RawExpr { text: String },
}

impl CppAstKind {
    pub fn is_directory_like(&self) -> bool {
        matches!(
            self,
            CppAstKind::TranslationUnit | CppAstKind::Function { .. } | CppAstKind::Compound | CppAstKind::RangeFor { .. }
        )
    }
}

/// One `Jobs` line: `[x] <priority> <assignee>: <description>`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobEntry {
    pub done: bool,
    pub priority: i64,
    pub assignee: String,
    pub description: String,
}

/// Plan node variants (§3.5). Always directories; the structured data lives
/// alongside the generic child map so sub-plans nest normally.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanKind {
    Root { content: String },
    SubPlan { content: String },
    Strategy { content: String },
    Notes { content: String },
    Goals { items: Vec<String> },
    Ideas { items: Vec<String> },
    Deps { items: Vec<String> },
    Implemented { items: Vec<String> },
    Research { items: Vec<String> },
    Jobs { entries: Vec<JobEntry> },
}

#[derive(Debug, Clone, Default)]
pub struct MountState {
    pub host_path: std::path::PathBuf,
    pub materialized: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub host_path: std::path::PathBuf,
    pub loaded: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    pub address: String,
    pub connected: bool,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Dir,
    File(Vec<u8>),
    SAst(SAstKind),
    CppAst(CppAstKind),
    Plan(PlanKind),
    Mount(MountState),
    Library(LibraryState),
    LibrarySymbol(String),
    Remote(RemoteState),
}

impl NodeKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            NodeKind::Dir => "dir",
            NodeKind::File(_) => "file",
            NodeKind::SAst(_) => "sast",
            NodeKind::CppAst(_) => "cppast",
            NodeKind::Plan(_) => "plan",
            NodeKind::Mount(_) => "mount",
            NodeKind::Library(_) => "library",
            NodeKind::LibrarySymbol(_) => "librarysymbol",
            NodeKind::Remote(_) => "remote",
        }
    }

    /// Whether this node carries an ordered child map at all (§3.1).
    pub fn is_directory_like(&self) -> bool {
        match self {
            NodeKind::Dir | NodeKind::Mount(_) | NodeKind::Library(_) | NodeKind::Remote(_) => true,
            NodeKind::Plan(_) => true,
            NodeKind::CppAst(k) => k.is_directory_like(),
            NodeKind::SAst(_) => true,
            NodeKind::File(_) | NodeKind::LibrarySymbol(_) => false,
        }
    }

    pub fn is_writable_leaf(&self) -> bool {
        matches!(self, NodeKind::File(_))
    }
}

/// One node in one overlay's tree. Parent is a relation, not an ownership
/// edge — see the module doc on [`crate::overlay`] for how sharing (`link`)
/// is represented.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub parents: Vec<NodeId>,
    pub children: IndexMap<String, NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Node { id, name: name.into(), parents: Vec::new(), children: IndexMap::new(), kind }
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory_like()
    }

    /// Reading a directory node yields the empty byte string (§3.1).
    pub fn read_bytes(&self) -> Vec<u8> {
        match &self.kind {
            NodeKind::File(data) => data.clone(),
            NodeKind::LibrarySymbol(sig) => sig.clone().into_bytes(),
            _ => Vec::new(),
        }
    }
}
