// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene arena: node storage, structure updates, and the layout commit.

use stave_units::{Point, Unit};

use crate::flowable::{Flowable, FlowableConfig, FlowableStart, generate_lines};
use crate::layout_controllers::{MarginController, insert_margin_controller};
use crate::spanner::Spanner;
use crate::{
    DEFAULT_PAGE_GAP, LocalNode, NodeFlags, NodeId, NodeRole, PageProvider, Paper, PaperPages,
    SceneError, mapping,
};

/// Configuration for a [`Scene`] laying out pages of a single paper size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SceneConfig {
    /// Paper geometry shared by every page.
    pub paper: Paper,
    /// Horizontal gap between pages on the canvas.
    pub page_gap: Unit,
}

impl SceneConfig {
    /// Builder-style paper.
    pub fn with_paper(mut self, paper: Paper) -> Self {
        self.paper = paper;
        self
    }

    /// Builder-style page gap.
    pub fn with_page_gap(mut self, page_gap: Unit) -> Self {
        self.page_gap = page_gap;
        self
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            paper: Paper::A4,
            page_gap: DEFAULT_PAGE_GAP,
        }
    }
}

/// Totals from a [`Scene::commit`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSummary {
    /// Number of flowables laid out.
    pub flowables: usize,
    /// Number of lines generated across all flowables.
    pub lines: usize,
    /// Highest page index any line landed on.
    pub last_page: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) role: NodeRole,
    pub(crate) local: LocalNode,
    pub(crate) flowable: Option<Flowable>,
    pub(crate) spanner: Option<Spanner>,
}

impl Node {
    fn new(role: NodeRole, local: LocalNode) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            role,
            local,
            flowable: None,
            spanner: None,
        }
    }
}

/// The per-document scene.
///
/// A scene owns its nodes, the page provider, and the layout of every flowable. It always
/// contains a document root and at least one page; further pages are created on demand.
pub struct Scene {
    nodes: Vec<Option<Node>>,
    // Generation of each slot, kept across frees so reused slots get fresh ids.
    generations: Vec<u32>,
    free_list: Vec<usize>,
    epoch: u64,
    root: NodeId,
    pages: Vec<NodeId>,
    provider: Box<dyn PageProvider>,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("epoch", &self.epoch)
            .field("pages", &self.pages.len())
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl Scene {
    /// Create a scene laying out pages of `config.paper` left to right.
    pub fn new(config: SceneConfig) -> Self {
        Self::with_provider(PaperPages::new(config.paper).with_page_gap(config.page_gap))
    }

    /// Create a scene whose pages are supplied by `provider`.
    pub fn with_provider(provider: impl PageProvider + 'static) -> Self {
        let mut scene = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            epoch: 0,
            root: NodeId::new(0, 1),
            pages: Vec::new(),
            provider: Box::new(provider),
        };
        scene.root = scene.alloc(Node::new(NodeRole::Document, LocalNode::default()));
        scene.page(0);
        scene
    }

    /// The page provider.
    pub fn provider(&self) -> &dyn PageProvider {
        &*self.provider
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Incremented by every [`Scene::commit`]. Caches derived from layout key on it.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of pages created so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The page at `index`, creating it and any pages before it as needed.
    pub fn page(&mut self, index: usize) -> NodeId {
        while self.pages.len() <= index {
            let page_index = self.pages.len();
            let local = LocalNode::at(self.provider.page_origin(page_index));
            let mut node = Node::new(NodeRole::Page { index: page_index }, local);
            node.parent = Some(self.root);
            let id = self.alloc(node);
            if let Ok(root) = self.node_mut(self.root) {
                root.children.push(id);
            }
            tracing::trace!(page = page_index, "created page");
            self.pages.push(id);
        }
        self.pages[index]
    }

    /// The page at `index`, if it has been created.
    pub fn page_id(&self, index: usize) -> Option<NodeId> {
        self.pages.get(index).copied()
    }

    /// Whether `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Insert a new node as a child of `parent`, or of page 0 if `None`.
    pub fn insert(&mut self, parent: Option<NodeId>, local: LocalNode) -> Result<NodeId, SceneError> {
        let parent = self.resolve_parent(parent)?;
        let id = self.alloc(Node::new(NodeRole::Object, local));
        self.link_parent(id, parent)?;
        self.invalidate_layout();
        Ok(id)
    }

    /// Insert a new flowable as a child of `parent`, or of page 0 if `None`.
    ///
    /// Flowables cannot be nested.
    pub fn insert_flowable(
        &mut self,
        parent: Option<NodeId>,
        pos: Point,
        config: FlowableConfig,
    ) -> Result<NodeId, SceneError> {
        config.validate()?;
        let parent = self.resolve_parent(parent)?;
        if let Some(outer) = self.flowable_of_inclusive(parent)? {
            return Err(SceneError::NestedFlowable(outer));
        }
        let id = self.alloc(Node::new(NodeRole::Flowable, LocalNode::at(pos)));
        self.node_mut(id)?.flowable = Some(Flowable::new(id, config));
        self.link_parent(id, parent)?;
        self.invalidate_layout();
        Ok(id)
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.require_movable(id)?;
        if let Some(parent) = self.node(id)?.parent {
            self.unlink_parent(id, parent)?;
        }
        self.free_subtree(id)?;
        self.invalidate_layout();
        Ok(())
    }

    /// Detach a node from its parent, keeping its subtree alive as a free-standing tree.
    ///
    /// Detached nodes are not rendered and share no ancestor with the document until
    /// reattached with [`Scene::reparent`].
    pub fn detach(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.require_movable(id)?;
        if let Some(parent) = self.node(id)?.parent {
            self.unlink_parent(id, parent)?;
        }
        self.invalidate_layout();
        Ok(())
    }

    /// Move `id` under `new_parent` (page 0 if `None`), appending it to the new parent's children.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        self.require_movable(id)?;
        let new_parent = self.resolve_parent(new_parent)?;
        if new_parent == id || self.ancestors(new_parent)?.contains(&id) {
            return Err(SceneError::Cycle(id));
        }
        if let Some(outer) = self.flowable_of_inclusive(new_parent)? {
            let moves_flowable = self.node(id)?.role == NodeRole::Flowable
                || self
                    .descendants(id)?
                    .into_iter()
                    .any(|d| matches!(self.role(d), Ok(NodeRole::Flowable)));
            if moves_flowable {
                return Err(SceneError::NestedFlowable(outer));
            }
        }
        if let Some(parent) = self.node(id)?.parent {
            self.unlink_parent(id, parent)?;
        }
        self.link_parent(id, new_parent)?;
        self.invalidate_layout();
        Ok(())
    }

    /// The node's position relative to its parent.
    pub fn pos(&self, id: NodeId) -> Result<Point, SceneError> {
        Ok(self.node(id)?.local.pos)
    }

    /// Set the node's position relative to its parent.
    pub fn set_pos(&mut self, id: NodeId, pos: Point) -> Result<(), SceneError> {
        self.require_movable(id)?;
        self.node_mut(id)?.local.pos = pos;
        self.invalidate_layout();
        Ok(())
    }

    /// Set only the x position.
    pub fn set_x(&mut self, id: NodeId, x: Unit) -> Result<(), SceneError> {
        let pos = self.pos(id)?;
        self.set_pos(id, pos.with_x(x))
    }

    /// Set only the y position.
    pub fn set_y(&mut self, id: NodeId, y: Unit) -> Result<(), SceneError> {
        let pos = self.pos(id)?;
        self.set_pos(id, pos.with_y(y))
    }

    /// The node's local data.
    pub fn local(&self, id: NodeId) -> Result<&LocalNode, SceneError> {
        Ok(&self.node(id)?.local)
    }

    /// The node's flags.
    pub fn flags(&self, id: NodeId) -> Result<NodeFlags, SceneError> {
        Ok(self.node(id)?.local.flags)
    }

    /// Replace the node's flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) -> Result<(), SceneError> {
        self.node_mut(id)?.local.flags = flags;
        self.invalidate_layout();
        Ok(())
    }

    /// Set the extent along the flow axis that may be split across lines.
    pub fn set_breakable_length(&mut self, id: NodeId, length: Unit) -> Result<(), SceneError> {
        self.node_mut(id)?.local.breakable_length = length;
        Ok(())
    }

    /// The node's structural role.
    pub fn role(&self, id: NodeId) -> Result<NodeRole, SceneError> {
        Ok(self.node(id)?.role)
    }

    /// The node's parent, or `None` for the document root and detached nodes.
    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        Ok(self.node(id)?.parent)
    }

    /// The node's children in insertion (paint) order.
    pub fn children(&self, id: NodeId) -> Result<&[NodeId], SceneError> {
        Ok(&self.node(id)?.children)
    }

    /// The node's ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut out = Vec::new();
        let mut current = self.node(id)?.parent;
        while let Some(p) = current {
            out.push(p);
            current = self.node(p)?.parent;
        }
        Ok(out)
    }

    /// All descendants in depth-first order, each node before its children.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>, SceneError> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.node(id)?.children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.node(next)?.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Descendants carrying all of `flags`, in depth-first order.
    pub fn descendants_with_flags(
        &self,
        id: NodeId,
        flags: NodeFlags,
    ) -> Result<Vec<NodeId>, SceneError> {
        let mut out = Vec::new();
        for d in self.descendants(id)? {
            if self.node(d)?.local.flags.contains(flags) {
                out.push(d);
            }
        }
        Ok(out)
    }

    /// The nearest ancestor whose role matches `pred`.
    pub fn first_ancestor_of_role(
        &self,
        id: NodeId,
        pred: impl Fn(NodeRole) -> bool,
    ) -> Result<Option<NodeId>, SceneError> {
        for a in self.ancestors(id)? {
            if pred(self.node(a)?.role) {
                return Ok(Some(a));
            }
        }
        Ok(None)
    }

    /// The flowable containing `id`, if any. A flowable is not its own flowable.
    pub fn flowable_of(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        self.first_ancestor_of_role(id, |role| role == NodeRole::Flowable)
    }

    /// Index of the page `id` is on. A page is on itself.
    pub fn page_of(&self, id: NodeId) -> Result<Option<usize>, SceneError> {
        if let NodeRole::Page { index } = self.role(id)? {
            return Ok(Some(index));
        }
        let page = self.first_ancestor_of_role(id, |role| matches!(role, NodeRole::Page { .. }))?;
        match page {
            Some(page) => match self.role(page)? {
                NodeRole::Page { index } => Ok(Some(index)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// The position of `dst` relative to `src`, ignoring line wrapping.
    pub fn map_to(&self, src: NodeId, dst: NodeId) -> Result<Point, SceneError> {
        mapping::map_between(self, src, dst)
    }

    /// The x position of `dst` relative to `src`, ignoring line wrapping.
    pub fn map_x_to(&self, src: NodeId, dst: NodeId) -> Result<Unit, SceneError> {
        mapping::map_between_x(self, src, dst)
    }

    /// The position of `descendant` relative to `ancestor`.
    pub fn descendant_pos(&self, descendant: NodeId, ancestor: NodeId) -> Result<Point, SceneError> {
        mapping::descendant_pos(self, descendant, ancestor)
    }

    /// The x position of `descendant` relative to `ancestor`.
    pub fn descendant_pos_x(&self, descendant: NodeId, ancestor: NodeId) -> Result<Unit, SceneError> {
        mapping::descendant_pos_x(self, descendant, ancestor)
    }

    /// The on-canvas position of `id`, following line wrapping inside flowables.
    pub fn canvas_pos(&self, id: NodeId) -> Result<Point, SceneError> {
        mapping::canvas_pos_of(self, id)
    }

    /// The flowable data of a flowable node.
    pub fn flowable(&self, id: NodeId) -> Result<&Flowable, SceneError> {
        self.node(id)?
            .flowable
            .as_ref()
            .ok_or(SceneError::NotAFlowable(id))
    }

    fn flowable_mut(&mut self, id: NodeId) -> Result<&mut Flowable, SceneError> {
        self.node_mut(id)?
            .flowable
            .as_mut()
            .ok_or(SceneError::NotAFlowable(id))
    }

    /// Replace a flowable's geometry.
    pub fn set_flowable_config(
        &mut self,
        id: NodeId,
        config: FlowableConfig,
    ) -> Result<(), SceneError> {
        config.validate()?;
        *self.flowable_mut(id)?.config_mut() = config;
        Ok(())
    }

    /// Register a margin controller on a flowable.
    ///
    /// Adding a controller identical to an existing one does nothing. A controller at the
    /// same position and layer as an existing one replaces it.
    pub fn add_margin_controller(
        &mut self,
        id: NodeId,
        controller: MarginController,
    ) -> Result<(), SceneError> {
        if !controller.margin_left.base_value().is_finite() {
            return Err(SceneError::InvalidConfig("margin must be finite"));
        }
        insert_margin_controller(self.flowable_mut(id)?.margin_controllers_mut(), controller);
        Ok(())
    }

    /// Remove every margin controller on `layer`.
    pub fn clear_margin_layer(&mut self, id: NodeId, layer: &str) -> Result<(), SceneError> {
        self.flowable_mut(id)?
            .margin_controllers_mut()
            .retain(|c| c.layer.as_ref() != layer);
        Ok(())
    }

    /// Lay out every flowable on a page, creating pages as lines overflow.
    ///
    /// Flowables in detached subtrees stay stale.
    pub fn commit(&mut self) -> Result<LayoutSummary, SceneError> {
        self.epoch = self.epoch.wrapping_add(1);
        let mut summary = LayoutSummary::default();

        let flowables: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                Some(n) if n.flowable.is_some() => {
                    #[allow(
                        clippy::cast_possible_truncation,
                        reason = "NodeId uses 32-bit indices by design."
                    )]
                    Some(NodeId::new(i as u32, self.generations[i]))
                }
                _ => None,
            })
            .collect();

        for id in flowables {
            let Some(page) = self.page_of(id)? else {
                tracing::debug!(flowable = %id, "skipping detached flowable");
                continue;
            };
            let page_node = self.page(page);
            let start = FlowableStart {
                page,
                pos: self.descendant_pos(id, page_node)?,
            };
            let opportunities = self.break_opportunities(id)?;
            let flowable = self.flowable(id)?;
            let lines = generate_lines(
                id,
                flowable.config(),
                flowable.margin_controllers(),
                start,
                &opportunities,
                &*self.provider,
            )?;
            let last_page = lines.last().map_or(page, |line| line.page);
            self.page(last_page);
            summary.flowables += 1;
            summary.lines += lines.len();
            summary.last_page = summary.last_page.max(Some(last_page));
            tracing::debug!(flowable = %id, lines = lines.len(), first_page = page, last_page, "laid out flowable");
            self.flowable_mut(id)?.set_lines(lines);
        }
        Ok(summary)
    }

    // --- internals ---

    /// Sorted flowable x positions of every break opportunity in a flowable.
    fn break_opportunities(&self, id: NodeId) -> Result<Vec<Unit>, SceneError> {
        let length = self.flowable(id)?.config().length;
        let mut out = Vec::new();
        for opp in self.descendants_with_flags(id, NodeFlags::BREAK_OPPORTUNITY)? {
            let x = self.descendant_pos_x(opp, id)?;
            if x < Unit::ZERO || x > length {
                tracing::warn!(flowable = %id, node = %opp, x = %x, "break opportunity outside flowable");
            }
            out.push(x);
        }
        out.sort_by(|a, b| a.base_value().total_cmp(&b.base_value()));
        Ok(out)
    }

    fn generation_matches(&self, id: NodeId) -> bool {
        self.generations.get(id.idx()) == Some(&id.1)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        if !self.generation_matches(id) {
            return Err(SceneError::StaleNode(id));
        }
        self.nodes[id.idx()]
            .as_ref()
            .ok_or(SceneError::StaleNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        if !self.generation_matches(id) {
            return Err(SceneError::StaleNode(id));
        }
        self.nodes[id.idx()]
            .as_mut()
            .ok_or(SceneError::StaleNode(id))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.generations.push(1);
            self.nodes.len() - 1
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        NodeId::new(idx as u32, self.generations[idx])
    }

    fn resolve_parent(&mut self, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let parent = match parent {
            Some(p) => p,
            None => self.page(0),
        };
        if self.node(parent)?.role == NodeRole::Document {
            return Err(SceneError::StructuralNode(parent));
        }
        Ok(parent)
    }

    fn require_movable(&self, id: NodeId) -> Result<(), SceneError> {
        match self.node(id)?.role {
            NodeRole::Document | NodeRole::Page { .. } => Err(SceneError::StructuralNode(id)),
            NodeRole::Flowable | NodeRole::Object => Ok(()),
        }
    }

    /// The flowable containing `id`, or `id` itself if it is a flowable.
    fn flowable_of_inclusive(&self, id: NodeId) -> Result<Option<NodeId>, SceneError> {
        if self.node(id)?.role == NodeRole::Flowable {
            return Ok(Some(id));
        }
        self.flowable_of(id)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.node_mut(parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(parent);
        Ok(())
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) -> Result<(), SceneError> {
        self.node_mut(parent)?.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    fn free_subtree(&mut self, id: NodeId) -> Result<(), SceneError> {
        let children = self.node(id)?.children.clone();
        for child in children {
            self.free_subtree(child)?;
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
        Ok(())
    }

    fn invalidate_layout(&mut self) {
        for flowable in self.nodes.iter_mut().flatten().filter_map(|n| n.flowable.as_mut()) {
            flowable.mark_stale();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mm(x: f64, y: f64) -> Point {
        Point::new(Unit::mm(x), Unit::mm(y))
    }

    #[test]
    fn new_scene_has_document_and_first_page() {
        let scene = Scene::default();
        assert_eq!(scene.role(scene.root()).unwrap(), NodeRole::Document);
        assert_eq!(scene.page_count(), 1);
        let page = scene.page_id(0).unwrap();
        assert_eq!(scene.role(page).unwrap(), NodeRole::Page { index: 0 });
        assert_eq!(scene.parent(page).unwrap(), Some(scene.root()));
        assert_eq!(scene.page_of(page).unwrap(), Some(0));
    }

    #[test]
    fn insert_without_parent_goes_to_first_page() {
        let mut scene = Scene::default();
        let node = scene.insert(None, LocalNode::at(mm(1.0, 2.0))).unwrap();
        assert_eq!(scene.parent(node).unwrap(), scene.page_id(0));
        assert_eq!(scene.pos(node).unwrap(), mm(1.0, 2.0));
        assert_eq!(
            scene.insert(Some(scene.root()), LocalNode::default()),
            Err(SceneError::StructuralNode(scene.root()))
        );
    }

    #[test]
    fn pages_are_created_on_demand_at_provider_origins() {
        let mut scene = Scene::default();
        let third = scene.page(2);
        assert_eq!(scene.page_count(), 3);
        assert_eq!(scene.page_of(third).unwrap(), Some(2));
        assert_eq!(scene.pos(third).unwrap(), mm(740.0, 20.0));
        assert_eq!(scene.page(2), third);
    }

    #[test]
    fn structural_nodes_cannot_move() {
        let mut scene = Scene::default();
        let page = scene.page_id(0).unwrap();
        assert_eq!(scene.remove(page), Err(SceneError::StructuralNode(page)));
        assert_eq!(
            scene.set_pos(page, Point::ORIGIN),
            Err(SceneError::StructuralNode(page))
        );
    }

    #[test]
    fn remove_frees_subtree_and_stales_ids() {
        let mut scene = Scene::default();
        let parent = scene.insert(None, LocalNode::default()).unwrap();
        let child = scene.insert(Some(parent), LocalNode::default()).unwrap();
        scene.remove(parent).unwrap();
        assert!(!scene.is_alive(parent));
        assert!(!scene.is_alive(child));
        assert_eq!(scene.pos(child), Err(SceneError::StaleNode(child)));
        assert!(scene.children(scene.page_id(0).unwrap()).unwrap().is_empty());

        // A reused slot gets a new generation.
        let fresh = scene.insert(None, LocalNode::default()).unwrap();
        assert_ne!(fresh, parent);
        assert_ne!(fresh, child);
        assert!(scene.is_alive(fresh));
        assert!(!scene.is_alive(child));
    }

    #[test]
    fn reparent_moves_between_children_lists() {
        let mut scene = Scene::default();
        let a = scene.insert(None, LocalNode::default()).unwrap();
        let b = scene.insert(None, LocalNode::default()).unwrap();
        let child = scene.insert(Some(a), LocalNode::default()).unwrap();
        scene.reparent(child, Some(b)).unwrap();
        assert!(scene.children(a).unwrap().is_empty());
        assert_eq!(scene.children(b).unwrap(), [child]);
        assert_eq!(scene.parent(child).unwrap(), Some(b));
        assert_eq!(scene.reparent(b, Some(child)), Err(SceneError::Cycle(b)));
        assert_eq!(scene.reparent(b, Some(b)), Err(SceneError::Cycle(b)));
    }

    #[test]
    fn traversal_orders() {
        let mut scene = Scene::default();
        let a = scene.insert(None, LocalNode::default()).unwrap();
        let a1 = scene.insert(Some(a), LocalNode::default()).unwrap();
        let a2 = scene
            .insert(
                Some(a),
                LocalNode::default().with_flags(NodeFlags::VISIBLE | NodeFlags::BREAK_OPPORTUNITY),
            )
            .unwrap();
        let a11 = scene.insert(Some(a1), LocalNode::default()).unwrap();
        assert_eq!(scene.descendants(a).unwrap(), [a1, a11, a2]);
        assert_eq!(
            scene.descendants_with_flags(a, NodeFlags::BREAK_OPPORTUNITY).unwrap(),
            [a2]
        );
        assert_eq!(
            scene.ancestors(a11).unwrap(),
            [a1, a, scene.page_id(0).unwrap(), scene.root()]
        );
        assert_eq!(scene.flowable_of(a11).unwrap(), None);
    }

    #[test]
    fn flowables_cannot_nest() {
        let mut scene = Scene::default();
        let config = FlowableConfig::new(Unit::mm(100.0), Unit::mm(10.0));
        let outer = scene.insert_flowable(None, Point::ORIGIN, config).unwrap();
        let inner_parent = scene.insert(Some(outer), LocalNode::default()).unwrap();
        assert_eq!(
            scene.insert_flowable(Some(inner_parent), Point::ORIGIN, config),
            Err(SceneError::NestedFlowable(outer))
        );
        let other = scene.insert_flowable(None, Point::ORIGIN, config).unwrap();
        assert_eq!(
            scene.reparent(other, Some(inner_parent)),
            Err(SceneError::NestedFlowable(outer))
        );
        assert_eq!(scene.flowable_of(inner_parent).unwrap(), Some(outer));
        assert_eq!(scene.flowable_of(outer).unwrap(), None);
    }

    #[test]
    fn mutation_marks_layout_stale() {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(
                None,
                Point::ORIGIN,
                FlowableConfig::new(Unit::mm(100.0), Unit::mm(10.0)),
            )
            .unwrap();
        let node = scene.insert(Some(flowable), LocalNode::default()).unwrap();
        scene.commit().unwrap();
        assert!(!scene.flowable(flowable).unwrap().is_stale());
        scene.set_x(node, Unit::mm(5.0)).unwrap();
        assert!(scene.flowable(flowable).unwrap().is_stale());
        assert_eq!(scene.canvas_pos(node), Err(SceneError::LayoutStale(flowable)));
        let epoch = scene.epoch();
        scene.commit().unwrap();
        assert_eq!(scene.epoch(), epoch + 1);
        assert_eq!(scene.canvas_pos(node).unwrap(), mm(25.0, 20.0));
    }

    #[test]
    fn commit_creates_pages_for_overflowing_lines() {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(
                None,
                Point::ORIGIN,
                FlowableConfig::new(Unit::mm(2000.0), Unit::mm(100.0)),
            )
            .unwrap();
        let summary = scene.commit().unwrap();
        // 170mm lines, two 100mm lines per 257mm page.
        assert_eq!(summary.lines, 12);
        assert_eq!(summary.last_page, Some(5));
        assert_eq!(scene.page_count(), 6);
        let lines = scene.flowable(flowable).unwrap().lines().unwrap();
        assert_eq!(lines[2].page, 1);
        assert_eq!(lines[2].canvas_pos, scene.canvas_pos(scene.page_id(1).unwrap()).unwrap());
    }

    #[test]
    fn break_opportunities_are_found_in_descendants() {
        let mut scene = Scene::default();
        let flowable = scene
            .insert_flowable(
                None,
                Point::ORIGIN,
                FlowableConfig::new(Unit::mm(400.0), Unit::mm(10.0)),
            )
            .unwrap();
        let bar = scene.insert(Some(flowable), LocalNode::at(mm(160.0, 0.0))).unwrap();
        scene
            .insert(
                Some(bar),
                LocalNode::at(mm(6.0, 0.0))
                    .with_flags(NodeFlags::VISIBLE | NodeFlags::BREAK_OPPORTUNITY),
            )
            .unwrap();
        scene.commit().unwrap();
        let lines = scene.flowable(flowable).unwrap().lines().unwrap();
        assert_eq!(lines[0].length, Unit::mm(166.0));
        assert_eq!(lines[1].flowable_x, Unit::mm(166.0));
    }

    #[test]
    fn margin_controllers_shape_lines() {
        // 160mm live width.
        let paper = Paper::new(
            Unit::mm(200.0),
            Unit::mm(297.0),
            Unit::mm(20.0),
            Unit::mm(20.0),
            Unit::mm(20.0),
            Unit::mm(20.0),
            Unit::ZERO,
        );
        let mut scene = Scene::new(SceneConfig::default().with_paper(paper));
        let flowable = scene
            .insert_flowable(
                None,
                mm(10.0, 0.0),
                FlowableConfig::new(Unit::mm(480.0), Unit::mm(30.0)),
            )
            .unwrap();
        scene
            .add_margin_controller(flowable, MarginController::new(Unit::ZERO, Unit::mm(20.0)))
            .unwrap();
        scene
            .add_margin_controller(
                flowable,
                MarginController::new(Unit::mm(160.0), Unit::mm(50.0)),
            )
            .unwrap();
        scene
            .add_margin_controller(
                flowable,
                MarginController::new(Unit::mm(300.0), Unit::mm(10.0)).with_layer("other layer"),
            )
            .unwrap();
        scene.commit().unwrap();
        let lines = scene.flowable(flowable).unwrap().lines().unwrap();
        let xs: Vec<_> = lines.iter().map(|l| l.pos.x.display_value()).collect();
        assert_eq!(xs, [30.0, 20.0, 50.0, 60.0]);

        scene.clear_margin_layer(flowable, "other layer").unwrap();
        assert!(scene.flowable(flowable).unwrap().is_stale());
        scene.commit().unwrap();
        let lines = scene.flowable(flowable).unwrap().lines().unwrap();
        assert_eq!(lines[3].pos.x, Unit::mm(50.0));
    }

    #[test]
    fn flowable_config_is_validated() {
        let mut scene = Scene::default();
        let bad = FlowableConfig::new(Unit::mm(100.0), Unit::mm(-1.0));
        assert!(matches!(
            scene.insert_flowable(None, Point::ORIGIN, bad),
            Err(SceneError::InvalidConfig(_))
        ));
        let node = scene.insert(None, LocalNode::default()).unwrap();
        assert_eq!(
            scene.set_flowable_config(node, FlowableConfig::new(Unit::mm(1.0), Unit::mm(1.0))),
            Err(SceneError::NotAFlowable(node))
        );
    }
}
