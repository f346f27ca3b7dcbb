//! Pre-lowering tree transformation seam.
//!
//! A [`Preprocessor`] runs between parsing and semantic lowering. The core
//! pipeline uses [`Identity`]; richer simplification passes plug in through
//! `Compiler::with_preprocessor` without the core knowing their shape.

use crate::frontend::ast::Tree;
use crate::frontend::diagnostics::CompileResult;

pub trait Preprocessor {
    fn process(&self, tree: Tree) -> CompileResult<Tree>;
}

/// The no-op pass: hands the tree through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Preprocessor for Identity {
    fn process(&self, tree: Tree) -> CompileResult<Tree> {
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::NodeKind;

    #[test]
    fn test_identity_hands_the_tree_through() {
        let tree = Tree::new(NodeKind::Start, vec![]);
        let processed = Identity.process(tree.clone()).unwrap();
        assert_eq!(processed, tree);
    }
}
