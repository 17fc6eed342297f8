//! Depth-first traversal of the document tree.

use crate::ast::Node;

/// What the traversal should do after visiting a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WalkStatus {
    /// Continue with the node's children, then its siblings.
    #[default]
    GoToNext,
    /// Do not descend into the node's children. The exit visit still happens.
    SkipChildren,
    /// Stop the whole traversal.
    Terminate,
}

/// Callback interface for [`walk`].
///
/// Containers are visited twice (`entering` is `true`, then `false` after the
/// children); leaves are visited once with `entering == true`.
pub trait Visitor {
    type Error;

    fn visit(&mut self, node: &Node<'_>, entering: bool) -> Result<WalkStatus, Self::Error>;
}

/// Walk `node` and its descendants depth-first.
///
/// Returns [`WalkStatus::Terminate`] if the visitor stopped the traversal,
/// [`WalkStatus::GoToNext`] otherwise. Visitor errors abort immediately.
pub fn walk<V: Visitor + ?Sized>(node: &Node<'_>, visitor: &mut V) -> Result<WalkStatus, V::Error> {
    let status = visitor.visit(node, true)?;
    if node.is_leaf() {
        return Ok(match status {
            WalkStatus::Terminate => WalkStatus::Terminate,
            _ => WalkStatus::GoToNext,
        });
    }

    match status {
        WalkStatus::Terminate => return Ok(WalkStatus::Terminate),
        WalkStatus::SkipChildren => {}
        WalkStatus::GoToNext => {
            for child in &node.children {
                if walk(child, visitor)? == WalkStatus::Terminate {
                    return Ok(WalkStatus::Terminate);
                }
            }
        }
    }

    match visitor.visit(node, false)? {
        WalkStatus::Terminate => Ok(WalkStatus::Terminate),
        _ => Ok(WalkStatus::GoToNext),
    }
}
