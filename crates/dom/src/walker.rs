//! Ancestor traversal from a target element up to `body`, bridging out of
//! shadow roots through their host elements.

use crate::DomNode;

#[derive(Clone, Debug)]
pub struct AncestorStep {
    pub node: DomNode,
    /// True when reaching this node required jumping from a shadow root to
    /// its host instead of following a regular parent edge.
    pub crossed_shadow_boundary: bool,
}

/// Iterator over `target` and its element ancestors, `body` inclusive.
///
/// Traversal stops at `body`, at the document, or when a detached node runs
/// out of parents. Document fragments backing shadow roots are never yielded;
/// the walker steps to the fragment's host instead.
pub struct AncestorWalker {
    next: Option<AncestorStep>,
}

impl AncestorWalker {
    pub fn from(target: &DomNode) -> Self {
        let next = target.is_element().then(|| AncestorStep {
            node: target.clone(),
            crossed_shadow_boundary: false,
        });
        Self { next }
    }
}

impl Iterator for AncestorWalker {
    type Item = AncestorStep;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.next.take()?;
        self.next = if step.node.is_tag("body") {
            None
        } else {
            match step.node.parent() {
                Some(parent) if parent.is_shadow_root() => {
                    parent.host().map(|host| AncestorStep {
                        node: host,
                        crossed_shadow_boundary: true,
                    })
                }
                Some(parent) if parent.is_element() => Some(AncestorStep {
                    node: parent,
                    crossed_shadow_boundary: false,
                }),
                _ => None,
            }
        };
        Some(step)
    }
}
