use crate::{
    error::{Error, Result},
    parser::{extractor::SyntaxExtractor, syntax::FileSyntax},
};
use tree_sitter::Parser;

pub struct RustParser {
    parser: Parser,
}

impl RustParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::LANGUAGE.into())
            .map_err(|e| Error::TreeSitterError(format!("Failed to set language: {e}")))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<tree_sitter::Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| Error::ParseError("Failed to parse source code".to_string()))
    }

    /// Parse `source` and extract the facts the module model is built from
    pub fn extract(&mut self, source: &str) -> Result<FileSyntax> {
        let tree = self.parse(source)?;
        if tree.root_node().has_error() {
            tracing::debug!("source contains syntax errors, extraction is best-effort");
        }
        SyntaxExtractor::new(source).extract(&tree)
    }
}
