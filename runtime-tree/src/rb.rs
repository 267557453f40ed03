//! Red-black fixups (CLRS *Introduction to Algorithms*, 3rd ed., ch. 13),
//! adapted to the arena's `Option<usize>` links in place of a sentinel nil
//! node: where CLRS reads `x.parent` off the sentinel, we thread the
//! parent through explicitly instead.

use crate::{Color, Link, Tree};

pub(crate) fn insert_fixup<K: Ord, V>(tree: &mut Tree<K, V>, mut z: usize) {
    loop {
        let Some(p) = tree.node(z).parent else { break };
        if tree.node(p).color == Color::Black {
            break;
        }
        // A red node is never the root, so it has a parent; a red parent
        // therefore has a parent too.
        let gp = tree.node(p).parent.expect("red parent implies a grandparent");

        if Some(p) == tree.node(gp).left {
            let uncle = tree.node(gp).right;
            if uncle.is_some_and(|u| tree.node(u).color == Color::Red) {
                tree.node_mut(p).color = Color::Black;
                tree.node_mut(uncle.unwrap()).color = Color::Black;
                tree.node_mut(gp).color = Color::Red;
                z = gp;
            } else {
                let mut z = z;
                let mut p = p;
                if tree.node(p).right == Some(z) {
                    z = p;
                    tree.rotate_left(z);
                    p = tree.node(z).parent.unwrap();
                }
                tree.node_mut(p).color = Color::Black;
                let gp = tree.node(p).parent.unwrap();
                tree.node_mut(gp).color = Color::Red;
                tree.rotate_right(gp);
                break;
            }
        } else {
            let uncle = tree.node(gp).left;
            if uncle.is_some_and(|u| tree.node(u).color == Color::Red) {
                tree.node_mut(p).color = Color::Black;
                tree.node_mut(uncle.unwrap()).color = Color::Black;
                tree.node_mut(gp).color = Color::Red;
                z = gp;
            } else {
                let mut z = z;
                let mut p = p;
                if tree.node(p).left == Some(z) {
                    z = p;
                    tree.rotate_right(z);
                    p = tree.node(z).parent.unwrap();
                }
                tree.node_mut(p).color = Color::Black;
                let gp = tree.node(p).parent.unwrap();
                tree.node_mut(gp).color = Color::Red;
                tree.rotate_left(gp);
                break;
            }
        }
    }
    tree.node_mut(tree.root.expect("tree is non-empty after an insert")).color = Color::Black;
}

/// Splices the (at most one-child) `target` node out of the tree and, if
/// that removed a black node, restores the red-black invariants.
pub(crate) fn remove_fixup_and_splice<K: Ord, V>(tree: &mut Tree<K, V>, target: usize) {
    let original_color = tree.node(target).color;
    let child = tree.node(target).left.or(tree.node(target).right);
    let parent = tree.node(target).parent;

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

    if original_color == Color::Black {
        delete_fixup(tree, child, parent);
    }
}

fn is_black<K: Ord, V>(tree: &Tree<K, V>, x: Link) -> bool {
    x.map_or(true, |i| tree.node(i).color == Color::Black)
}

fn delete_fixup<K: Ord, V>(tree: &mut Tree<K, V>, mut x: Link, mut x_parent: Link) {
    while x != tree.root && is_black(tree, x) {
        let Some(p) = x_parent else { break };

        if tree.node(p).left == x {
            let mut w = tree.node(p).right.expect("x's sibling must exist to balance black-height");
            if tree.node(w).color == Color::Red {
                tree.node_mut(w).color = Color::Black;
                tree.node_mut(p).color = Color::Red;
                tree.rotate_left(p);
                w = tree.node(p).right.unwrap();
            }
            let w_left_black = tree.node(w).left.map_or(true, |c| tree.node(c).color == Color::Black);
            let w_right_black = tree.node(w).right.map_or(true, |c| tree.node(c).color == Color::Black);
            if w_left_black && w_right_black {
                tree.node_mut(w).color = Color::Red;
                x = Some(p);
                x_parent = tree.node(p).parent;
            } else {
                if w_right_black {
                    if let Some(wl) = tree.node(w).left {
                        tree.node_mut(wl).color = Color::Black;
                    }
                    tree.node_mut(w).color = Color::Red;
                    tree.rotate_right(w);
                    w = tree.node(p).right.unwrap();
                }
                tree.node_mut(w).color = tree.node(p).color;
                tree.node_mut(p).color = Color::Black;
                if let Some(wr) = tree.node(w).right {
                    tree.node_mut(wr).color = Color::Black;
                }
                tree.rotate_left(p);
                x = tree.root;
                x_parent = None;
            }
        } else {
            let mut w = tree.node(p).left.expect("x's sibling must exist to balance black-height");
            if tree.node(w).color == Color::Red {
                tree.node_mut(w).color = Color::Black;
                tree.node_mut(p).color = Color::Red;
                tree.rotate_right(p);
                w = tree.node(p).left.unwrap();
            }
            let w_left_black = tree.node(w).left.map_or(true, |c| tree.node(c).color == Color::Black);
            let w_right_black = tree.node(w).right.map_or(true, |c| tree.node(c).color == Color::Black);
            if w_left_black && w_right_black {
                tree.node_mut(w).color = Color::Red;
                x = Some(p);
                x_parent = tree.node(p).parent;
            } else {
                if w_left_black {
                    if let Some(wr) = tree.node(w).right {
                        tree.node_mut(wr).color = Color::Black;
                    }
                    tree.node_mut(w).color = Color::Red;
                    tree.rotate_left(w);
                    w = tree.node(p).left.unwrap();
                }
                tree.node_mut(w).color = tree.node(p).color;
                tree.node_mut(p).color = Color::Black;
                if let Some(wl) = tree.node(w).left {
                    tree.node_mut(wl).color = Color::Black;
                }
                tree.rotate_right(p);
                x = tree.root;
                x_parent = None;
            }
        }
    }
    if let Some(xi) = x {
        tree.node_mut(xi).color = Color::Black;
    }
}
