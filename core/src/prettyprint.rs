use std::fmt::{Debug, Write};

use crate::radix::{lossy, Node, NodeKind, RadixTree};

impl NodeKind {
    fn label(self) -> &'static str {
        match self {
            NodeKind::Static => "static",
            NodeKind::Root => "root",
            NodeKind::Param => "param",
            NodeKind::CatchAll => "catch-all",
        }
    }
}

impl<T: Debug> RadixTree<T> {
    /// Box-drawing dump of the tree for debugging
    ///
    /// One line per node: segment, kind, priority and the handler when a
    /// route terminates there. Siblings appear in match order.
    pub fn pretty_print(&self) -> String {
        if self.is_empty() {
            return "(empty tree)\n".to_string();
        }
        let mut output = String::new();
        self.print_node(self.root(), &mut output, "", true, true);
        output
    }

    fn print_node(&self, node: &Node<T>, output: &mut String, prefix: &str, is_last: bool, is_root: bool) {
        if !is_root {
            let connector = if is_last { "└── " } else { "├── " };
            output.push_str(prefix);
            output.push_str(connector);
        }

        // Writing into a String cannot fail
        let _ = write!(
            output,
            "{:?} ({}, {})",
            lossy(&node.segment),
            node.kind.label(),
            node.priority
        );
        if let Some(leaf) = &node.leaf {
            let _ = write!(output, " [handler: {:?}]", leaf.handler);
        }
        output.push('\n');

        let child_prefix = if is_root {
            String::new()
        } else {
            format!("{}{}", prefix, if is_last { "    " } else { "│   " })
        };

        for (i, &child) in node.children.iter().enumerate() {
            let is_last_child = i == node.children.len() - 1;
            self.print_node(self.node(child), output, &child_prefix, is_last_child, false);
        }
    }
}
