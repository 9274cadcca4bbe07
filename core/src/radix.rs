//! Compressed radix tree for route matching
//!
//! Nodes live in an arena (`Vec<Node<T>>`) and refer to their children by
//! index, so edge splits and child reordering are local vector operations.
//! Each parent keeps the first byte of every static child in `indices`,
//! positionally aligned with `children`, and both are kept sorted by
//! descending priority so the hottest branch is compared first.

use memchr::memchr;
use tracing::trace;

use crate::params::Params;
use crate::path::{
    count_wildcards, find_wildcard, is_sigil, longest_common_prefix, validate_pattern, wildcard_span,
    CATCH_ALL_SIGIL,
};
use crate::RouterError;

const ROOT: usize = 0;

/// Role of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Literal substring
    Static,
    /// First node created in an empty tree
    Root,
    /// `:name`, matches up to the next `/`
    Param,
    /// `*name`, matches the rest of the path
    CatchAll,
}

/// A registered route terminating at a node
pub(crate) struct Leaf<T> {
    pub(crate) pattern: Box<str>,
    pub(crate) handler: T,
}

pub(crate) struct Node<T> {
    /// Bytes of the pattern owned by this edge; may split a multi-byte char
    pub(crate) segment: Vec<u8>,
    pub(crate) kind: NodeKind,
    /// Parameter name for Param / CatchAll nodes, empty otherwise
    pub(crate) name: Box<str>,
    /// Sole child is a Param or CatchAll node; `indices` is then empty
    pub(crate) wild_child: bool,
    /// First byte of each static child, aligned with `children`
    pub(crate) indices: Vec<u8>,
    pub(crate) children: Vec<usize>,
    /// Routes passing through this node
    pub(crate) priority: u32,
    pub(crate) leaf: Option<Leaf<T>>,
}

impl<T> Node<T> {
    fn new(kind: NodeKind, priority: u32) -> Self {
        Self {
            segment: Vec::new(),
            kind,
            name: Box::default(),
            wild_child: false,
            indices: Vec::new(),
            children: Vec::new(),
            priority,
            leaf: None,
        }
    }

    fn wildcard(token: &str, kind: NodeKind) -> Self {
        Self {
            segment: token.as_bytes().to_vec(),
            name: token[1..].into(),
            ..Self::new(kind, 1)
        }
    }
}

/// Result of walking the tree for one request path
#[derive(Debug)]
pub struct MatchResult<'a, T> {
    /// Handler of the matched route
    pub handler: Option<&'a T>,
    /// Pattern the matched route was registered under
    pub route: Option<&'a str>,
    /// Captured parameters in path order
    pub params: Params<'a>,
    /// The path would match with a trailing slash added or removed
    pub trailing_slash_redirect: bool,
}

impl<'a, T> MatchResult<'a, T> {
    fn hit(leaf: &'a Leaf<T>, params: Params<'a>) -> Self {
        Self {
            handler: Some(&leaf.handler),
            route: Some(&*leaf.pattern),
            params,
            trailing_slash_redirect: false,
        }
    }

    fn miss(params: Params<'a>, trailing_slash_redirect: bool) -> Self {
        Self {
            handler: None,
            route: None,
            params,
            trailing_slash_redirect,
        }
    }
}

/// Where a new pattern leaves the existing structure. Offsets index the
/// full pattern.
enum Landing {
    /// Pattern ends exactly on this node
    Existing(usize),
    /// Node segment diverges from the pattern after `at` bytes
    Split { node: usize, at: usize, rest: usize },
    /// Pattern continues below the node with no child to follow
    Extend { node: usize, rest: usize },
}

/// High-performance radix tree for route matching
///
/// Build once, then match from any number of threads: [`RadixTree::lookup`]
/// takes `&self` and never mutates.
pub struct RadixTree<T> {
    nodes: Vec<Node<T>>,
    size: usize,
    max_params: usize,
}

impl<T> RadixTree<T> {
    /// Create new radix tree
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Root, 0)],
            size: 0,
            max_params: 0,
        }
    }

    /// Get number of routes
    pub fn len(&self) -> usize {
        self.size
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Largest parameter count any registered pattern can produce
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Registered patterns, depth first in sibling priority order
    pub fn routes(&self) -> impl Iterator<Item = &str> + '_ {
        let mut stack = vec![ROOT];
        std::iter::from_fn(move || {
            while let Some(id) = stack.pop() {
                let node = &self.nodes[id];
                stack.extend(node.children.iter().rev());
                if let Some(leaf) = &node.leaf {
                    return Some(&*leaf.pattern);
                }
            }
            None
        })
    }

    pub(crate) fn root(&self) -> &Node<T> {
        &self.nodes[ROOT]
    }

    pub(crate) fn node(&self, id: usize) -> &Node<T> {
        &self.nodes[id]
    }

    /// Insert route into tree
    ///
    /// Fails without touching the tree when the pattern is malformed,
    /// clashes with a wildcard already registered at the same position, or
    /// is already registered.
    pub fn insert(&mut self, pattern: &str, handler: T) -> Result<(), RouterError> {
        validate_pattern(pattern).map_err(|reason| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        })?;

        if self.size == 0 {
            self.nodes[ROOT].priority = 1;
            self.insert_child(ROOT, 0, pattern, handler);
            self.nodes[ROOT].kind = NodeKind::Root;
        } else {
            let (hops, landing) = self.plan(pattern)?;

            self.nodes[ROOT].priority += 1;
            for (parent, pos) in hops {
                self.bump_and_resort(parent, pos);
            }

            match landing {
                Landing::Existing(id) => self.attach(id, pattern, handler),
                Landing::Split { node, at, rest } => {
                    self.split_edge(node, at);
                    if rest == pattern.len() {
                        self.attach(node, pattern, handler);
                    } else {
                        let child = self.add_static_child(node, pattern.as_bytes()[rest]);
                        self.insert_child(child, rest, pattern, handler);
                    }
                }
                Landing::Extend { node, rest } => {
                    let first = pattern.as_bytes()[rest];
                    if is_sigil(first) {
                        self.insert_child(node, rest, pattern, handler);
                    } else {
                        let child = self.add_static_child(node, first);
                        self.insert_child(child, rest, pattern, handler);
                    }
                }
            }
        }

        self.size += 1;
        self.max_params = self.max_params.max(count_wildcards(pattern));
        trace!(pattern, nodes = self.nodes.len(), "route inserted");
        Ok(())
    }

    /// Walk the existing structure for `pattern` without mutating it.
    ///
    /// Returns the `(parent, child position)` hops taken below the root and
    /// the point where the pattern leaves the tree, or the registration error.
    fn plan(&self, pattern: &str) -> Result<(Vec<(usize, usize)>, Landing), RouterError> {
        let bytes = pattern.as_bytes();
        let mut hops = Vec::new();
        let mut id = ROOT;
        let mut offset = 0;

        loop {
            let node = &self.nodes[id];
            let i = longest_common_prefix(&bytes[offset..], &node.segment);

            if i < node.segment.len() {
                let rest = offset + i;
                if bytes.get(rest).is_some_and(|&b| is_sigil(b)) {
                    return Err(children_conflict(pattern, rest, &node.segment[i..]));
                }
                return Ok((hops, Landing::Split { node: id, at: i, rest }));
            }

            offset += i;
            if offset == bytes.len() {
                if node.leaf.is_some() {
                    return Err(RouterError::DuplicateRoute {
                        pattern: pattern.to_string(),
                    });
                }
                return Ok((hops, Landing::Existing(id)));
            }

            let path = &bytes[offset..];

            if node.wild_child {
                let child_id = node.children[0];
                let child = &self.nodes[child_id];
                let wildcard = child.segment.as_slice();

                if child.kind == NodeKind::CatchAll && path == wildcard {
                    return Err(RouterError::DuplicateRoute {
                        pattern: pattern.to_string(),
                    });
                }

                let fits = path.starts_with(wildcard)
                    && child.kind != NodeKind::CatchAll
                    && path.get(wildcard.len()).map_or(true, |&b| b == b'/');
                if !fits {
                    let segment = match (child.kind, memchr(b'/', path)) {
                        (NodeKind::Param, Some(end)) => &path[..end],
                        _ => path,
                    };
                    return Err(RouterError::RouteConflict {
                        segment: lossy(segment),
                        pattern: pattern.to_string(),
                        existing_prefix: lossy(&[&bytes[..offset], wildcard].concat()),
                    });
                }

                hops.push((id, 0));
                id = child_id;
                continue;
            }

            let first = path[0];
            if let Some(pos) = node.indices.iter().position(|&b| b == first) {
                hops.push((id, pos));
                id = node.children[pos];
                continue;
            }

            if is_sigil(first) {
                if let Some(&existing) = node.children.first() {
                    return Err(children_conflict(pattern, offset, &self.nodes[existing].segment));
                }
            }

            return Ok((hops, Landing::Extend { node: id, rest: offset }));
        }
    }

    /// Increment a child's priority and move it ahead of lower-priority
    /// siblings, keeping `indices` aligned. Returns the child's new position.
    fn bump_and_resort(&mut self, parent: usize, pos: usize) -> usize {
        let child = self.nodes[parent].children[pos];
        self.nodes[child].priority += 1;
        let priority = self.nodes[child].priority;

        let mut new_pos = pos;
        while new_pos > 0 {
            let left = self.nodes[parent].children[new_pos - 1];
            if self.nodes[left].priority >= priority {
                break;
            }
            new_pos -= 1;
        }

        if new_pos != pos {
            let node = &mut self.nodes[parent];
            node.children[new_pos..=pos].rotate_right(1);
            node.indices[new_pos..=pos].rotate_right(1);
        }
        new_pos
    }

    /// Split `id` after `at` bytes: the node keeps the prefix and a single
    /// static child takes over the suffix with everything the node owned.
    fn split_edge(&mut self, id: usize, at: usize) {
        let node = &mut self.nodes[id];
        let suffix = node.segment.split_off(at);
        let first = suffix[0];

        let child = Node {
            segment: suffix,
            kind: NodeKind::Static,
            name: Box::default(),
            wild_child: std::mem::replace(&mut node.wild_child, false),
            indices: std::mem::replace(&mut node.indices, vec![first]),
            children: std::mem::take(&mut node.children),
            priority: node.priority - 1,
            leaf: node.leaf.take(),
        };

        let child_id = self.push_node(child);
        self.nodes[id].children.push(child_id);
        trace!(node = id, at, "edge split");
    }

    /// Append an empty static child starting with `first` and sort it into place
    fn add_static_child(&mut self, parent: usize, first: u8) -> usize {
        let child = self.push_node(Node::new(NodeKind::Static, 0));
        let node = &mut self.nodes[parent];
        node.indices.push(first);
        node.children.push(child);
        let pos = node.children.len() - 1;
        self.bump_and_resort(parent, pos);
        child
    }

    /// Build `pattern[offset..]` below `id`, which has no children yet.
    fn insert_child(&mut self, mut id: usize, mut offset: usize, pattern: &str, handler: T) {
        let bytes = pattern.as_bytes();

        while let Some((start, end, _)) = wildcard_span(&bytes[offset..]) {
            let (start, end) = (offset + start, offset + end);
            if start > offset {
                self.nodes[id].segment = bytes[offset..start].to_vec();
            }

            let token = &pattern[start..end];
            let kind = if token.as_bytes()[0] == CATCH_ALL_SIGIL {
                NodeKind::CatchAll
            } else {
                NodeKind::Param
            };
            let child = self.push_node(Node::wildcard(token, kind));
            let node = &mut self.nodes[id];
            node.wild_child = true;
            node.children.push(child);

            if kind == NodeKind::CatchAll || end == bytes.len() {
                self.attach(child, pattern, handler);
                return;
            }

            // A param followed by more pattern continues with a '/' segment
            offset = end;
            let next = self.push_node(Node::new(NodeKind::Static, 1));
            let param = &mut self.nodes[child];
            param.indices.push(bytes[offset]);
            param.children.push(next);
            id = next;
        }

        self.nodes[id].segment = bytes[offset..].to_vec();
        self.attach(id, pattern, handler);
    }

    fn push_node(&mut self, node: Node<T>) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn attach(&mut self, id: usize, pattern: &str, handler: T) {
        self.nodes[id].leaf = Some(Leaf {
            pattern: pattern.into(),
            handler,
        });
    }

    /// Walk the tree for `path`, capturing parameters on the way.
    ///
    /// Single pass, no backtracking: a wildcard capture is never retried.
    /// The trailing-slash signal always refers to `path` with its trailing
    /// slash removed when it has one, and added when it has none.
    pub fn lookup<'a>(&'a self, path: &'a str) -> MatchResult<'a, T> {
        let mut params = Params::with_capacity(self.max_params);
        if self.size == 0 || path.is_empty() {
            return MatchResult::miss(params, false);
        }

        let bytes = path.as_bytes();
        let mut node = &self.nodes[ROOT];
        // Node whose end the path reached right before entering `node`
        let mut prev: Option<&Node<T>> = None;
        let mut offset = 0;

        loop {
            let segment = node.segment.as_slice();
            let rest = &bytes[offset..];

            if !rest.starts_with(segment) {
                // Request stops one '/' short of this node, or carries one
                // '/' past the node it came from
                let add_slash = segment.len() == rest.len() + 1
                    && segment.ends_with(b"/")
                    && segment.starts_with(rest)
                    && !rest.ends_with(b"/")
                    && self.terminates(node);
                let drop_slash = rest == b"/" && prev.is_some_and(|p| p.leaf.is_some());
                return MatchResult::miss(params, add_slash || drop_slash);
            }

            offset += segment.len();
            if offset == bytes.len() {
                return self.match_exact(node, prev, params);
            }

            // Captures start right after a complete static prefix and end at
            // '/' or the end of the path, so they are valid str slices.
            if node.wild_child {
                let child = &self.nodes[node.children[0]];

                if child.kind == NodeKind::CatchAll {
                    params.push(&child.name, &path[offset..]);
                    return match &child.leaf {
                        Some(leaf) => MatchResult::hit(leaf, params),
                        None => MatchResult::miss(params, false),
                    };
                }

                let end = memchr(b'/', &bytes[offset..]).map_or(bytes.len(), |end| offset + end);
                params.push(&child.name, &path[offset..end]);
                // An empty capture leaves the path at the end of `node`
                let reached = if end > offset { child } else { node };

                if end < bytes.len() {
                    if let Some(&next) = child.children.first() {
                        offset = end;
                        prev = Some(reached);
                        node = &self.nodes[next];
                        continue;
                    }
                    let tsr = bytes.len() == end + 1 && reached.leaf.is_some();
                    return MatchResult::miss(params, tsr);
                }

                return match &child.leaf {
                    Some(leaf) => MatchResult::hit(leaf, params),
                    None => {
                        let tsr = child
                            .children
                            .first()
                            .is_some_and(|&next| self.is_slash_terminal(next));
                        MatchResult::miss(params, tsr)
                    }
                };
            }

            let first = bytes[offset];
            match node.indices.iter().position(|&b| b == first) {
                Some(pos) => {
                    prev = Some(node);
                    node = &self.nodes[node.children[pos]];
                }
                None => {
                    let tsr = &bytes[offset..] == b"/" && node.leaf.is_some();
                    return MatchResult::miss(params, tsr);
                }
            }
        }
    }

    /// Find handler for path with parameter extraction
    pub fn find<'a>(&'a self, path: &'a str) -> Option<(&'a T, Params<'a>)> {
        let result = self.lookup(path);
        result.handler.map(|handler| (handler, result.params))
    }

    /// The request path ended exactly at the end of `node`'s segment
    fn match_exact<'a>(
        &'a self,
        node: &'a Node<T>,
        prev: Option<&'a Node<T>>,
        mut params: Params<'a>,
    ) -> MatchResult<'a, T> {
        if let Some(leaf) = &node.leaf {
            return MatchResult::hit(leaf, params);
        }

        // Bare catch-all prefix, e.g. "/files/" against "/files/*filepath"
        if let Some(child) = self.catch_all_child(node) {
            if let Some(leaf) = &child.leaf {
                params.push(&child.name, "");
                return MatchResult::hit(leaf, params);
            }
        }

        let add_slash = !node.segment.ends_with(b"/")
            && node
                .indices
                .iter()
                .position(|&b| b == b'/')
                .is_some_and(|pos| self.is_slash_terminal(node.children[pos]));
        let drop_slash = node.segment == b"/" && prev.is_some_and(|p| p.leaf.is_some());

        MatchResult::miss(params, add_slash || drop_slash)
    }

    fn catch_all_child(&self, node: &Node<T>) -> Option<&Node<T>> {
        if !node.wild_child {
            return None;
        }
        let child = &self.nodes[node.children[0]];
        (child.kind == NodeKind::CatchAll).then_some(child)
    }

    /// A request ending exactly at this node would be served
    fn terminates(&self, node: &Node<T>) -> bool {
        node.leaf.is_some()
            || self
                .catch_all_child(node)
                .is_some_and(|child| child.leaf.is_some())
    }

    fn is_slash_terminal(&self, id: usize) -> bool {
        let node = &self.nodes[id];
        node.segment == b"/" && self.terminates(node)
    }
}

impl<T> Default for RadixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// A new wildcard at `at` would hide the static children already there
fn children_conflict(pattern: &str, at: usize, existing: &[u8]) -> RouterError {
    let rest = &pattern[at..];
    let segment = find_wildcard(rest).map_or(rest, |wildcard| wildcard.token);
    RouterError::RouteConflict {
        segment: segment.to_string(),
        pattern: pattern.to_string(),
        existing_prefix: format!("{}{}", &pattern[..at], lossy(existing)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(routes: &[&'static str]) -> RadixTree<&'static str> {
        let mut tree = RadixTree::new();
        for route in routes {
            tree.insert(route, *route).unwrap();
        }
        tree
    }

    /// Walk every node and assert the structural invariants
    fn check_invariants<T>(tree: &RadixTree<T>) {
        fn leaves<T>(tree: &RadixTree<T>, id: usize) -> u32 {
            let node = &tree.nodes[id];
            let own = u32::from(node.leaf.is_some());
            own + node.children.iter().map(|&c| leaves(tree, c)).sum::<u32>()
        }

        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &tree.nodes[id];
            assert_eq!(node.priority, leaves(tree, id), "priority of {}", lossy(&node.segment));

            if node.kind == NodeKind::CatchAll {
                assert!(node.children.is_empty());
            }

            if node.wild_child {
                assert_eq!(node.children.len(), 1);
                assert!(node.indices.is_empty());
                let child = &tree.nodes[node.children[0]];
                assert!(matches!(child.kind, NodeKind::Param | NodeKind::CatchAll));
            } else {
                assert_eq!(node.indices.len(), node.children.len());
                for (byte, &child) in node.indices.iter().zip(&node.children) {
                    assert_eq!(Some(byte), tree.nodes[child].segment.first());
                }
                let mut seen = node.indices.clone();
                seen.sort_unstable();
                seen.dedup();
                assert_eq!(seen.len(), node.indices.len(), "duplicate index byte");
            }

            for pair in node.children.windows(2) {
                assert!(tree.nodes[pair[0]].priority >= tree.nodes[pair[1]].priority);
            }

            stack.extend(&node.children);
        }
    }

    #[test]
    fn test_static_routes() {
        let tree = build(&["/", "/users", "/users/profile", "/about"]);
        check_invariants(&tree);

        assert_eq!(tree.find("/").unwrap().0, &"/");
        assert_eq!(tree.find("/users").unwrap().0, &"/users");
        assert_eq!(tree.find("/users/profile").unwrap().0, &"/users/profile");
        assert_eq!(tree.find("/about").unwrap().0, &"/about");
        assert!(tree.find("/nonexistent").is_none());
        assert!(tree.find("/user").is_none());
        assert!(tree.find("").is_none());
    }

    #[test]
    fn test_static_round_trip_has_no_params() {
        let routes = [
            "/", "/cmd/tool", "/cmd/test", "/search/", "/support", "/info/user/public",
            "/info/user/project", "/src", "/contact", "/co", "/c", "/a", "/ab", "/doc/",
            "/doc/go_faq.html", "/doc/go1.html", "/α", "/β",
        ];
        let tree = build(&routes);
        check_invariants(&tree);

        for route in routes {
            let result = tree.lookup(route);
            assert_eq!(result.handler, Some(&route), "route {}", route);
            assert_eq!(result.route, Some(route));
            assert!(result.params.is_empty());
            assert!(!result.trailing_slash_redirect);
        }
    }

    #[test]
    fn test_parameter_routes() {
        let tree = build(&["/users/:id", "/users/:id/posts/:post_id"]);
        check_invariants(&tree);

        let (handler, params) = tree.find("/users/123").unwrap();
        assert_eq!(handler, &"/users/:id");
        assert_eq!(params.get("id"), Some("123"));

        let (handler, params) = tree.find("/users/42/posts/7").unwrap();
        assert_eq!(handler, &"/users/:id/posts/:post_id");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, [("id", "42"), ("post_id", "7")]);

        assert!(tree.find("/users/42/posts").is_none());
        assert!(tree.find("/users/42/comments/7").is_none());
    }

    #[test]
    fn test_catch_all_routes() {
        let tree = build(&["/files/*filepath", "/src/*path"]);
        check_invariants(&tree);

        let (handler, params) = tree.find("/files/a/b/c.txt").unwrap();
        assert_eq!(handler, &"/files/*filepath");
        assert_eq!(params.as_slice(), [crate::Param { key: "filepath", value: "a/b/c.txt" }]);

        let (_, params) = tree.find("/files/").unwrap();
        assert_eq!(params.get("filepath"), Some(""));

        let result = tree.lookup("/files");
        assert!(result.handler.is_none());
        assert!(result.trailing_slash_redirect);
    }

    #[test]
    fn test_mixed_wildcards() {
        let tree = build(&[
            "/",
            "/cmd/:tool/:sub",
            "/cmd/:tool/",
            "/src/*filepath",
            "/search/",
            "/search/:query",
            "/user_:name",
            "/user_:name/about",
            "/files/:dir/*filepath",
            "/info/:user/public",
            "/info/:user/project/:project",
        ]);
        check_invariants(&tree);

        let cases: &[(&str, &str, &[(&str, &str)])] = &[
            ("/", "/", &[]),
            ("/cmd/test/", "/cmd/:tool/", &[("tool", "test")]),
            ("/cmd/test/3", "/cmd/:tool/:sub", &[("tool", "test"), ("sub", "3")]),
            ("/src/", "/src/*filepath", &[("filepath", "")]),
            ("/src/some/file.png", "/src/*filepath", &[("filepath", "some/file.png")]),
            ("/search/", "/search/", &[]),
            ("/search/someth!ng+in+ünìcodé", "/search/:query", &[("query", "someth!ng+in+ünìcodé")]),
            ("/user_gopher", "/user_:name", &[("name", "gopher")]),
            ("/user_gopher/about", "/user_:name/about", &[("name", "gopher")]),
            ("/files/js/inc/framework.js", "/files/:dir/*filepath", &[("dir", "js"), ("filepath", "inc/framework.js")]),
            ("/info/gordon/public", "/info/:user/public", &[("user", "gordon")]),
            ("/info/gordon/project/go", "/info/:user/project/:project", &[("user", "gordon"), ("project", "go")]),
        ];

        for (path, route, expected) in cases {
            let result = tree.lookup(path);
            assert_eq!(result.handler, Some(route), "path {}", path);
            let params: Vec<_> = result.params.iter().collect();
            assert_eq!(&params, expected, "path {}", path);
        }

        assert!(tree.find("/cmd/test").is_none());
        assert!(tree.find("/search/someth!ng/extra").is_none());
    }

    #[test]
    fn test_priority_counts_routes_through_node() {
        let tree = build(&["/api/users", "/api/users/:id", "/api/posts", "/api/posts/:id", "/api/posts/:id/comments", "/health"]);
        check_invariants(&tree);

        let root = &tree.nodes[ROOT];
        assert_eq!(root.segment, b"/");
        assert_eq!(root.priority, 6);

        let api = &tree.nodes[root.children[0]];
        assert_eq!(api.segment, b"api/");
        assert_eq!(api.priority, 5);

        // "posts" (3 routes) overtook "users" (2 routes)
        let first = &tree.nodes[api.children[0]];
        assert_eq!(first.segment, b"posts");
        assert_eq!(first.priority, 3);
        assert_eq!(api.indices, b"pu");
    }

    #[test]
    fn test_edge_split_keeps_handler_on_suffix() {
        let tree = build(&["/search", "/support"]);
        check_invariants(&tree);

        let root = &tree.nodes[ROOT];
        assert_eq!(root.kind, NodeKind::Root);
        assert_eq!(root.segment, b"/s");
        assert!(root.leaf.is_none());
        assert_eq!(root.indices, b"eu");

        assert_eq!(tree.find("/search").unwrap().0, &"/search");
        assert_eq!(tree.find("/support").unwrap().0, &"/support");
        assert!(tree.find("/s").is_none());
    }

    #[test]
    fn test_wildcard_conflicts() {
        let mut tree = build(&["/users/:id", "/cmd/:tool/:sub", "/src/*filepath", "/search/"]);

        let conflicts = [
            "/users/:name",
            "/users/new",
            "/users/:idx",
            "/cmd/vet",
            "/src/a",
            "/src/*other",
            "/src/:file",
            "/cmd/:tool/:other",
        ];
        for pattern in conflicts {
            let err = tree.insert(pattern, pattern).unwrap_err();
            assert!(matches!(err, RouterError::RouteConflict { .. }), "{}: {:?}", pattern, err);
        }

        // Static then wildcard at the same position also conflicts
        let mut other = build(&["/user/new"]);
        let err = other.insert("/user/:user", "").unwrap_err();
        assert!(matches!(err, RouterError::RouteConflict { .. }));
    }

    #[test]
    fn test_conflict_message_names_both_routes() {
        let mut tree = build(&["/users/:id"]);
        let err = tree.insert("/users/:name", "").unwrap_err();
        match &err {
            RouterError::RouteConflict { segment, pattern, existing_prefix } => {
                assert_eq!(segment, ":name");
                assert_eq!(pattern, "/users/:name");
                assert_eq!(existing_prefix, "/users/:id");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("'/users/:id'"));
    }

    #[test]
    fn test_duplicate_routes() {
        let mut tree = build(&["/", "/doc/", "/src/*filepath", "/search/:query", "/user_:name"]);
        for pattern in ["/", "/doc/", "/src/*filepath", "/search/:query", "/user_:name"] {
            let err = tree.insert(pattern, pattern).unwrap_err();
            assert_eq!(err, RouterError::DuplicateRoute { pattern: pattern.to_string() });
        }
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_invalid_patterns() {
        let mut tree = RadixTree::new();
        for pattern in ["", "no-slash", "/:a:b", "/src/*", "/src/*path/x", "/x/:"] {
            let err = tree.insert(pattern, ()).unwrap_err();
            assert!(matches!(err, RouterError::InvalidPattern { .. }), "{}", pattern);
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_rejected_insert_leaves_tree_untouched() {
        let mut tree = build(&["/users/:id", "/users/:id/posts", "/about"]);
        let before: Vec<(Vec<u8>, u32)> = tree.nodes.iter().map(|n| (n.segment.clone(), n.priority)).collect();

        assert!(tree.insert("/users/:name/posts", "").is_err());
        assert!(tree.insert("/about", "").is_err());
        assert!(tree.insert("/users/new", "").is_err());

        let after: Vec<(Vec<u8>, u32)> = tree.nodes.iter().map(|n| (n.segment.clone(), n.priority)).collect();
        assert_eq!(before, after);
        check_invariants(&tree);
    }

    #[test]
    fn test_trailing_slash_redirect() {
        let tree = build(&[
            "/hi",
            "/b/",
            "/search/:query",
            "/cmd/:tool/",
            "/src/*filepath",
            "/x",
            "/x/y",
            "/y/",
            "/y/z",
            "/0/:id",
            "/0/:id/1",
            "/1/:id/",
            "/1/:id/2",
            "/aa",
            "/a/",
            "/admin",
            "/admin/:category",
            "/admin/:category/:page",
            "/doc",
            "/doc/go_faq.html",
            "/doc/go1.html",
            "/no/a",
            "/no/b",
            "/api/hello/:name/bar/",
            "/api/bar/:name",
            "/api/baz/foo",
            "/api/baz/foo/bar",
        ]);
        check_invariants(&tree);

        let redirects = [
            "/hi/", "/b", "/search/gopher/", "/cmd/vet", "/src", "/x/", "/y", "/0/go/", "/1/go",
            "/a", "/admin/", "/admin/config/", "/admin/config/permissions/", "/doc/",
            "/api/hello/x/bar", "/api/baz/foo/", "/api/baz/foo/bar/",
        ];
        for path in redirects {
            let result = tree.lookup(path);
            assert!(result.handler.is_none(), "{} should not match", path);
            assert!(result.trailing_slash_redirect, "{} should signal a redirect", path);
        }

        let misses = ["/", "/no", "/no/", "/_", "/_/", "/api/world/abc"];
        for path in misses {
            let result = tree.lookup(path);
            assert!(result.handler.is_none(), "{} should not match", path);
            assert!(!result.trailing_slash_redirect, "{} should not signal a redirect", path);
        }
    }

    #[test]
    fn test_about_slash_both_directions() {
        let with_slash = build(&["/about/"]);
        let result = with_slash.lookup("/about");
        assert!(result.handler.is_none());
        assert!(result.trailing_slash_redirect);

        let without_slash = build(&["/about"]);
        let result = without_slash.lookup("/about/");
        assert!(result.handler.is_none());
        assert!(result.trailing_slash_redirect);
    }

    #[test]
    fn test_empty_capture_trailing_slash() {
        // "/users//" captures an empty id; "/users/" does not match
        let tree = build(&["/users/:id"]);
        let result = tree.lookup("/users//");
        assert!(result.handler.is_none());
        assert!(!result.trailing_slash_redirect);

        let tree = build(&["/:y"]);
        assert!(!tree.lookup("//").trailing_slash_redirect);

        // "/a/" is "/a" plus a slash even though the walk enters the wildcard
        for routes in [["/a", "/a:z/x"], ["/a", "/a:z/a/"], ["/a", "/a:z"]] {
            let tree = build(&routes);
            let result = tree.lookup("/a/");
            assert!(result.handler.is_none(), "{:?}", routes);
            assert!(result.trailing_slash_redirect, "{:?}", routes);
        }

        // Empty capture must not claim the param's own route
        let tree = build(&["/a:z", "/a:z/x"]);
        assert!(!tree.lookup("/a/").trailing_slash_redirect);
    }

    #[test]
    fn test_slash_signal_direction_matches_path() {
        // "/a/" would need a second slash, not a removed one
        let tree = build(&["/a//"]);
        let result = tree.lookup("/a/");
        assert!(result.handler.is_none());
        assert!(!result.trailing_slash_redirect);
        assert!(tree.lookup("/a").handler.is_none());

        let tree = build(&["/x/", "/x//"]);
        assert!(tree.lookup("/x").trailing_slash_redirect);
        assert!(!tree.lookup("/x/").trailing_slash_redirect);
    }

    #[test]
    fn test_empty_path_never_signals() {
        let tree = build(&["/"]);
        let result = tree.lookup("");
        assert!(result.handler.is_none());
        assert!(!result.trailing_slash_redirect);
    }

    #[test]
    fn test_insertion_order_does_not_change_matches() {
        let routes = [
            "/",
            "/users",
            "/users/:id",
            "/users/:id/posts",
            "/users/:id/posts/:post_id",
            "/static/*filepath",
            "/search/",
            "/support",
            "/s",
            "/contact",
            "/co",
        ];
        let paths = [
            "/", "/users", "/users/", "/users/9", "/users/9/posts", "/users/9/posts/1",
            "/static/", "/static/css/app.css", "/search", "/search/", "/support", "/s",
            "/contact", "/co", "/c", "/nope",
        ];

        let reference = build(&routes);
        let expected: Vec<_> = paths
            .iter()
            .map(|p| {
                let r = reference.lookup(p);
                (r.handler.copied(), r.params, r.trailing_slash_redirect)
            })
            .collect();

        for shift in 1..routes.len() {
            let mut order = routes.to_vec();
            order.rotate_left(shift);
            if shift % 2 == 0 {
                order.reverse();
            }

            let tree = build(&order);
            check_invariants(&tree);
            for (path, want) in paths.iter().zip(&expected) {
                let r = tree.lookup(path);
                assert_eq!(
                    (r.handler.copied(), r.params, r.trailing_slash_redirect),
                    *want,
                    "path {} with order {:?}",
                    path,
                    order
                );
            }
        }
    }

    #[test]
    fn test_max_params_and_routes() {
        let tree = build(&["/a", "/b/:x", "/c/:x/:y/*rest"]);
        assert_eq!(tree.max_params(), 3);
        assert_eq!(tree.len(), 3);

        let mut routes: Vec<_> = tree.routes().collect();
        routes.sort_unstable();
        assert_eq!(routes, ["/a", "/b/:x", "/c/:x/:y/*rest"]);
    }

    #[test]
    fn test_empty_tree_lookup() {
        let tree: RadixTree<()> = RadixTree::new();
        let result = tree.lookup("/");
        assert!(result.handler.is_none());
        assert!(!result.trailing_slash_redirect);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_pattern() -> impl Strategy<Value = String> {
            let segment = prop::sample::select(vec!["a", "b", "ab", "ba", ":p", ":q", "a:z", ""]);
            (prop::collection::vec(segment, 0..4), any::<bool>(), any::<bool>()).prop_map(
                |(segments, catch_all, trailing)| {
                    let mut pattern = format!("/{}", segments.join("/"));
                    if catch_all {
                        if !pattern.ends_with('/') {
                            pattern.push('/');
                        }
                        pattern.push_str("*rest");
                    } else if trailing {
                        pattern.push('/');
                    }
                    pattern
                },
            )
        }

        fn arb_path() -> impl Strategy<Value = String> {
            let segment = prop::sample::select(vec!["a", "b", "ab", "ba", "az", "x", ""]);
            (prop::collection::vec(segment, 0..5), any::<bool>()).prop_map(|(segments, trailing)| {
                let mut path = format!("/{}", segments.join("/"));
                if trailing {
                    path.push('/');
                }
                path
            })
        }

        /// Insert in order, keeping the patterns the tree accepted
        fn insert_all(tree: &mut RadixTree<String>, patterns: &[String]) -> Vec<String> {
            let mut accepted = Vec::new();
            for pattern in patterns {
                if tree.insert(pattern, pattern.clone()).is_ok() {
                    accepted.push(pattern.clone());
                }
            }
            accepted
        }

        fn toggle_slash(path: &str) -> String {
            match path.strip_suffix('/') {
                Some(trimmed) => trimmed.to_string(),
                None => format!("{}/", path),
            }
        }

        proptest! {
            /// Property: any insertion order of a compatible set yields the same matches
            #[test]
            fn prop_insertion_order_does_not_change_matches(
                patterns in prop::collection::vec(arb_pattern(), 1..12),
                paths in prop::collection::vec(arb_path(), 1..24),
                shift in any::<usize>(),
            ) {
                let mut forward = RadixTree::new();
                let accepted = insert_all(&mut forward, &patterns);

                let mut order = accepted.clone();
                order.reverse();
                let len = order.len().max(1);
                order.rotate_left(shift % len);
                let mut reordered = RadixTree::new();
                prop_assert_eq!(insert_all(&mut reordered, &order).len(), accepted.len());

                check_invariants(&forward);
                check_invariants(&reordered);
                prop_assert_eq!(forward.len(), accepted.len());

                for path in &paths {
                    let a = forward.lookup(path);
                    let b = reordered.lookup(path);
                    prop_assert_eq!(a.handler, b.handler, "path {}", path);
                    prop_assert_eq!(a.params, b.params, "path {}", path);
                    prop_assert_eq!(a.trailing_slash_redirect, b.trailing_slash_redirect, "path {}", path);
                }
            }

            /// Property: static patterns round-trip with no params
            #[test]
            fn prop_static_patterns_round_trip(patterns in prop::collection::vec(arb_pattern(), 1..12)) {
                let mut tree = RadixTree::new();
                for pattern in insert_all(&mut tree, &patterns) {
                    if count_wildcards(&pattern) == 0 {
                        let result = tree.lookup(&pattern);
                        prop_assert_eq!(result.route, Some(pattern.as_str()));
                        prop_assert!(result.params.is_empty());
                    }
                }
            }

            /// Property: the trailing-slash signal only fires when the toggled path matches
            #[test]
            fn prop_trailing_slash_signal_is_sound(
                patterns in prop::collection::vec(arb_pattern(), 1..12),
                paths in prop::collection::vec(arb_path(), 1..24),
            ) {
                let mut tree = RadixTree::new();
                insert_all(&mut tree, &patterns);

                for path in &paths {
                    let result = tree.lookup(path);
                    if result.trailing_slash_redirect {
                        prop_assert!(result.handler.is_none());
                        let toggled = toggle_slash(path);
                        prop_assert!(
                            tree.lookup(&toggled).handler.is_some(),
                            "{} -> {} with {:?}",
                            path,
                            toggled,
                            patterns
                        );
                    }
                }
            }
        }
    }
}
