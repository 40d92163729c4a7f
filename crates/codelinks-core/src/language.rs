//! Source languages and their grammar tables
//!
//! Every supported language is one variant of [`Language`]. Each variant
//! carries a static [`Grammar`] describing which tree-sitter node kinds are
//! comments, which kinds count as documentable scopes, and which kinds are
//! generic blocks that scope resolution looks one level into.

use arborium::tree_sitter::Parser;
use eyre::{Result, WrapErr};
use std::ffi::OsStr;

/// A source language with a comment scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    C,
    Cpp,
    Python,
    CSharp,
    Yaml,
    Rust,
}

/// How docstrings are recognized for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocstringRule {
    /// The language has no docstring-class comments
    None,
    /// String-literal expression statements directly inside a module,
    /// function body or class body
    PythonString,
    /// Inner doc comments (`//!`, `/*!`) document their enclosing item
    RustInnerDoc,
}

/// Static per-language table used by the scanner and scope resolution.
#[derive(Debug)]
pub struct Grammar {
    /// Node kinds that are comments
    pub comment_kinds: &'static [&'static str],
    /// Node kinds a comment can document
    pub scope_kinds: &'static [&'static str],
    /// Generic block kinds searched one level deep when looking forward
    pub block_kinds: &'static [&'static str],
    /// Docstring recognition
    pub docstrings: DocstringRule,
}

static C_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["comment"],
    scope_kinds: &[
        "function_definition",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
    ],
    block_kinds: &["compound_statement", "field_declaration_list"],
    docstrings: DocstringRule::None,
};

static CPP_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["comment"],
    scope_kinds: &[
        "function_definition",
        "class_specifier",
        "struct_specifier",
        "union_specifier",
        "enum_specifier",
        "template_declaration",
    ],
    block_kinds: &[
        "compound_statement",
        "declaration_list",
        "field_declaration_list",
    ],
    docstrings: DocstringRule::None,
};

static PYTHON_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["comment"],
    scope_kinds: &[
        "function_definition",
        "class_definition",
        "decorated_definition",
    ],
    block_kinds: &["block"],
    docstrings: DocstringRule::PythonString,
};

static CSHARP_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["comment"],
    scope_kinds: &[
        "class_declaration",
        "struct_declaration",
        "interface_declaration",
        "record_declaration",
        "enum_declaration",
        "method_declaration",
        "constructor_declaration",
        "property_declaration",
    ],
    block_kinds: &["block", "declaration_list"],
    docstrings: DocstringRule::None,
};

// YAML scopes are resolved positionally, see `scope::find_yaml_scope`.
static YAML_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["comment"],
    scope_kinds: &["block_mapping_pair", "block_sequence_item", "flow_pair"],
    block_kinds: &[
        "stream",
        "document",
        "block_node",
        "flow_node",
        "block_mapping",
        "block_sequence",
        "flow_mapping",
        "flow_sequence",
    ],
    docstrings: DocstringRule::None,
};

static RUST_GRAMMAR: Grammar = Grammar {
    comment_kinds: &["line_comment", "block_comment"],
    scope_kinds: &[
        "function_item",
        "function_signature_item",
        "struct_item",
        "enum_item",
        "union_item",
        "trait_item",
        "impl_item",
        "mod_item",
        "const_item",
        "static_item",
        "type_item",
        "macro_definition",
    ],
    block_kinds: &["block", "declaration_list"],
    docstrings: DocstringRule::RustInnerDoc,
};

impl Language {
    /// All supported languages
    pub const ALL: [Language; 6] = [
        Language::C,
        Language::Cpp,
        Language::Python,
        Language::CSharp,
        Language::Yaml,
        Language::Rust,
    ];

    /// Canonical configuration name of the language
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Python => "python",
            Language::CSharp => "csharp",
            Language::Yaml => "yaml",
            Language::Rust => "rust",
        }
    }

    /// Parse a language from its configuration name.
    ///
    /// A few common aliases are accepted (`c++`, `py`, `cs`, `c#`, `yml`, `rs`).
    pub fn from_name(name: &str) -> Option<Language> {
        match name.trim().to_ascii_lowercase().as_str() {
            "c" => Some(Language::C),
            "cpp" | "c++" => Some(Language::Cpp),
            "python" | "py" => Some(Language::Python),
            "csharp" | "cs" | "c#" => Some(Language::CSharp),
            "yaml" | "yml" => Some(Language::Yaml),
            "rust" | "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    /// File extensions (lower case, without dot) discovered for this language
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::C => &["c", "h"],
            Language::Cpp => &["c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx"],
            Language::Python => &["py", "pyi"],
            Language::CSharp => &["cs"],
            Language::Yaml => &["yaml", "yml"],
            Language::Rust => &["rs"],
        }
    }

    /// Whether a file extension belongs to this language (case-insensitive)
    pub fn matches_extension(&self, ext: &OsStr) -> bool {
        ext.to_str()
            .map(|e| {
                let e = e.to_ascii_lowercase();
                self.extensions().contains(&e.as_str())
            })
            .unwrap_or(false)
    }

    /// Grammar table for this language
    pub fn grammar(&self) -> &'static Grammar {
        match self {
            Language::C => &C_GRAMMAR,
            Language::Cpp => &CPP_GRAMMAR,
            Language::Python => &PYTHON_GRAMMAR,
            Language::CSharp => &CSHARP_GRAMMAR,
            Language::Yaml => &YAML_GRAMMAR,
            Language::Rust => &RUST_GRAMMAR,
        }
    }

    /// Create a tree-sitter parser loaded with this language's grammar
    pub fn parser(&self) -> Result<Parser> {
        let mut parser = Parser::new();
        let loaded = match self {
            Language::C => parser.set_language(&arborium_c::language().into()),
            Language::Cpp => parser.set_language(&arborium_cpp::language().into()),
            Language::Python => parser.set_language(&arborium_python::language().into()),
            Language::CSharp => parser.set_language(&arborium_c_sharp::language().into()),
            Language::Yaml => parser.set_language(&arborium_yaml::language().into()),
            Language::Rust => parser.set_language(&arborium_rust::language().into()),
        };
        loaded.wrap_err_with(|| format!("Failed to load {} grammar", self))?;
        Ok(parser)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Language::from_name(s).ok_or_else(|| {
            let known: Vec<&str> = Language::ALL.iter().map(|l| l.as_str()).collect();
            eyre::eyre!("Unknown language '{}'. Expected one of: {}", s, known.join(", "))
        })
    }
}
