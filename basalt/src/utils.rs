/// Builds a tree top down from `(node, children)` pairs.
///
/// Used by [`OptExpression`](crate::plan::OptExpression) and
/// [`Pattern`](crate::rules::Pattern). `begin_node` opens a nested node which is closed by
/// `end_node`, `leaf` adds a node without children to the innermost open node. `build` closes
/// whatever is still open and returns the root:
///
/// ```no
/// OptExpression::new_builder(join)
///     .begin_node(filter)
///         .leaf(scan1)
///     .end_node()
///     .leaf(scan2)
/// .build()
/// ```
pub struct TreeBuilder<T, N> {
    root: (N, Vec<T>),
    /// Nested nodes not closed yet, innermost last.
    open: Vec<(N, Vec<T>)>,
}

impl<T, N> TreeBuilder<T, N>
where
    T: From<(N, Vec<T>)>,
{
    pub fn new(root: N) -> Self {
        Self {
            root: (root, vec![]),
            open: vec![],
        }
    }

    pub fn begin_node<K: Into<N>>(mut self, node: K) -> Self {
        self.open.push((node.into(), vec![]));
        self
    }

    pub fn leaf<K: Into<N>>(mut self, node: K) -> Self {
        let tree = T::from((node.into(), vec![]));
        self.innermost_children().push(tree);
        self
    }

    /// Closes the innermost nested node. The root stays open until [`TreeBuilder::build`].
    pub fn end_node(mut self) -> Self {
        if let Some(node) = self.open.pop() {
            let tree = T::from(node);
            self.innermost_children().push(tree);
        }
        self
    }

    pub fn build(mut self) -> T {
        while !self.open.is_empty() {
            self = self.end_node();
        }
        T::from(self.root)
    }

    fn innermost_children(&mut self) -> &mut Vec<T> {
        match self.open.last_mut() {
            Some((_, children)) => children,
            None => &mut self.root.1,
        }
    }
}
