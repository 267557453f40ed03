//! Iterative in-order (Morris) traversal: threads the predecessor's right
//! pointer to the current node while descending left, then un-threads it
//! on the way back up. No recursion, no auxiliary stack.

use crate::Tree;

pub(crate) fn traverse<K: Ord, V, F: FnMut(&K, &V) -> bool>(tree: &mut Tree<K, V>, mut visit: F) {
    let mut current = tree.root;
    // Once the caller asks to stop we keep iterating (to finish
    // un-threading every link we created) but stop invoking `visit`.
    let mut stopped = false;

    while let Some(idx) = current {
        if let Some(left) = tree.node(idx).left {
            let mut predecessor = left;
            while let Some(pred_right) = tree.node(predecessor).right {
                if pred_right == idx {
                    break;
                }
                predecessor = pred_right;
            }

            if tree.node(predecessor).right.is_none() {
                tree.node_mut(predecessor).right = Some(idx);
                current = Some(left);
            } else {
                tree.node_mut(predecessor).right = None;
                if !stopped {
                    let node = tree.node(idx);
                    stopped = !visit(&node.key, &node.value);
                }
                current = tree.node(idx).right;
            }
        } else {
            if !stopped {
                let node = tree.node(idx);
                stopped = !visit(&node.key, &node.value);
            }
            current = tree.node(idx).right;
        }
    }
}
