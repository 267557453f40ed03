//! AVL fixups. Balance factor is `height(right) - height(left)`, kept in
//! `{-1, 0, 1}` for every node; `{-2, 2}` triggers a single or double
//! rotation back into range.

use crate::Tree;

pub(crate) fn insert_fixup<K: Ord, V>(tree: &mut Tree<K, V>, leaf: usize) {
    let mut child = leaf;
    while let Some(parent) = tree.node(child).parent {
        if tree.node(parent).left == Some(child) {
            tree.node_mut(parent).balance -= 1;
        } else {
            tree.node_mut(parent).balance += 1;
        }

        let bf = tree.node(parent).balance;
        if bf == 0 {
            // subtree height unchanged from the pre-insert tree; done
            break;
        } else if bf == 1 || bf == -1 {
            child = parent;
        } else {
            // insertion only ever needs one rotation to restore height
            rebalance(tree, parent);
            break;
        }
    }
}

/// Removes the (at most one-child) `target` node, retracing from its old
/// parent up to the root and rebalancing every ancestor whose subtree
/// height changed.
pub(crate) fn remove_and_splice<K: Ord, V>(tree: &mut Tree<K, V>, target: usize) {
    let child = tree.node(target).left.or(tree.node(target).right);
    let parent = tree.node(target).parent;
    let was_left = parent.map(|p| tree.node(p).left == Some(target));

    if let Some(c) = child {
        tree.node_mut(c).parent = parent;
    }
    match parent {
        None => tree.root = child,
        Some(p) => {
            if tree.node(p).left == Some(target) {
                tree.node_mut(p).left = child;
            } else {
                tree.node_mut(p).right = child;
            }
        }
    }
    tree.dealloc(target);

    if let (Some(p), Some(was_left)) = (parent, was_left) {
        delete_fixup(tree, p, was_left);
    }
}

fn delete_fixup<K: Ord, V>(tree: &mut Tree<K, V>, start: usize, start_was_left: bool) {
    let mut node = start;
    let mut was_left = start_was_left;
    loop {
        if was_left {
            tree.node_mut(node).balance += 1;
        } else {
            tree.node_mut(node).balance -= 1;
        }
        let bf = tree.node(node).balance;

        let (subtree_root, height_decreased) = if bf == 2 || bf == -2 {
            let new_root = rebalance(tree, node);
            let decreased = tree.node(new_root).balance == 0;
            (new_root, decreased)
        } else if bf == 0 {
            (node, true)
        } else {
            (node, false)
        };

        if !height_decreased {
            break;
        }
        let Some(parent) = tree.node(subtree_root).parent else { break };
        was_left = tree.node(parent).left == Some(subtree_root);
        node = parent;
    }
}

/// Rotates the subtree rooted at `z` (whose balance factor is `+-2`) back
/// into range, returning the index of the new subtree root.
fn rebalance<K: Ord, V>(tree: &mut Tree<K, V>, z: usize) -> usize {
    let balance = tree.node(z).balance;
    if balance == 2 {
        let y = tree.node(z).right.expect("balance +2 implies a right child");
        if tree.node(y).balance < 0 {
            rotate_right_left(tree, z, y)
        } else {
            rotate_left_simple(tree, z, y);
            y
        }
    } else {
        let y = tree.node(z).left.expect("balance -2 implies a left child");
        if tree.node(y).balance > 0 {
            rotate_left_right(tree, z, y)
        } else {
            rotate_right_simple(tree, z, y);
            y
        }
    }
}

fn rotate_left_simple<K: Ord, V>(tree: &mut Tree<K, V>, z: usize, y: usize) {
    let y_balance = tree.node(y).balance;
    tree.rotate_left(z);
    if y_balance == 0 {
        tree.node_mut(z).balance = 1;
        tree.node_mut(y).balance = -1;
    } else {
        tree.node_mut(z).balance = 0;
        tree.node_mut(y).balance = 0;
    }
}

fn rotate_right_simple<K: Ord, V>(tree: &mut Tree<K, V>, z: usize, y: usize) {
    let y_balance = tree.node(y).balance;
    tree.rotate_right(z);
    if y_balance == 0 {
        tree.node_mut(z).balance = -1;
        tree.node_mut(y).balance = 1;
    } else {
        tree.node_mut(z).balance = 0;
        tree.node_mut(y).balance = 0;
    }
}

fn rotate_right_left<K: Ord, V>(tree: &mut Tree<K, V>, z: usize, y: usize) -> usize {
    let x = tree.node(y).left.expect("y.balance < 0 implies a left child");
    let x_balance = tree.node(x).balance;
    tree.rotate_right(y);
    tree.rotate_left(z);
    match x_balance {
        1 => {
            tree.node_mut(z).balance = -1;
            tree.node_mut(y).balance = 0;
        }
        -1 => {
            tree.node_mut(z).balance = 0;
            tree.node_mut(y).balance = 1;
        }
        _ => {
            tree.node_mut(z).balance = 0;
            tree.node_mut(y).balance = 0;
        }
    }
    tree.node_mut(x).balance = 0;
    x
}

fn rotate_left_right<K: Ord, V>(tree: &mut Tree<K, V>, z: usize, y: usize) -> usize {
    let x = tree.node(y).right.expect("y.balance > 0 implies a right child");
    let x_balance = tree.node(x).balance;
    tree.rotate_left(y);
    tree.rotate_right(z);
    match x_balance {
        -1 => {
            tree.node_mut(z).balance = 1;
            tree.node_mut(y).balance = 0;
        }
        1 => {
            tree.node_mut(z).balance = 0;
            tree.node_mut(y).balance = -1;
        }
        _ => {
            tree.node_mut(z).balance = 0;
            tree.node_mut(y).balance = 0;
        }
    }
    tree.node_mut(x).balance = 0;
    x
}
