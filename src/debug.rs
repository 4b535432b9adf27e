use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{BstTree, Dir, Links, TreeNode};

impl<T, C> BstTree<T, C>
where
    T: TreeNode<Links<T>>,
    T::Key: fmt::Display,
{
    /// Writes the shape of the tree to `w` as a Graphviz `digraph`.
    ///
    /// Each level of the tree is drawn on one rank. Missing children are drawn as points so that
    /// left and right children can be told apart.
    pub fn dotgraph<W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        W: fmt::Write,
    {
        let root = match self.root {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T> {
            Node(NonNull<T>),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let key = unsafe { node.as_ref().key() };
                write!(w, "\"graph{name}-{key}\" [label=\"{key}\"]; ")?;

                for dir in [Dir::Left, Dir::Right] {
                    match unsafe { self.links(node).child(dir) } {
                        Some(child) => {
                            let child_key = unsafe { child.as_ref().key() };

                            queue.push_back(Item::Node(child));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                            )?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(
                                links,
                                "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                            )?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use crate::model::TestNode;
    use crate::BstTree;

    #[test]
    fn empty_dotgraph() {
        let tree: BstTree<TestNode> = BstTree::new();
        let mut out = String::new();
        tree.dotgraph("empty", &mut out).unwrap();
        assert_eq!(out, "digraph \"graph-empty\" {}");
    }

    #[test]
    fn dotgraph_edges() {
        let mut tree: BstTree<TestNode> = BstTree::new();
        for key in [2, 1, 3] {
            tree.insert(TestNode::new(key));
        }

        let mut out = String::new();
        tree.dotgraph("small", &mut out).unwrap();

        assert!(out.starts_with("digraph \"graph-small\" {"));
        assert!(out.contains("\"graphsmall-2\" -> \"graphsmall-1\";"));
        assert!(out.contains("\"graphsmall-2\" -> \"graphsmall-3\";"));
        assert!(out.contains("\"graphsmall-1\" [label=\"1\"]"));
        // Two leaves, each with two missing children.
        assert_eq!(out.matches("[shape=point]").count(), 4);
        assert!(out.ends_with(" }\n}"));
    }
}
