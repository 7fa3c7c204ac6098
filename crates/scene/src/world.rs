use crate::components::{ComponentBounds, NodeKind, Transform};
use crate::entity::NodeId;
use foundation::bounds::Aabb3;
use foundation::handles::Handle;
use foundation::math::{Mat4, Vec3};

/// Scene graph: a flat component store with parent links.
///
/// Slots are reused after `despawn`; a bumped generation makes stale
/// `NodeId`s fail `contains`.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    kinds: Vec<Option<NodeKind>>,
    parents: Vec<Option<NodeId>>,
    transforms: Vec<Option<Transform>>,
    bounds: Vec<Option<ComponentBounds>>,
    names: Vec<Option<String>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_group(&mut self, parent: Option<NodeId>) -> NodeId {
        self.spawn(NodeKind::Group, parent)
    }

    pub fn spawn_mesh(&mut self, parent: Option<NodeId>, bounds: ComponentBounds) -> NodeId {
        let id = self.spawn(NodeKind::Mesh, parent);
        self.bounds[id.index() as usize] = Some(bounds);
        id
    }

    fn spawn(&mut self, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.generations.len() as u32;
                self.ensure_capacity(index as usize);
                index
            }
        };
        let idx = index as usize;
        let id = NodeId(Handle::new(index, self.generations[idx]));
        let parent = parent.filter(|p| self.contains(*p));

        self.alive[idx] = true;
        self.kinds[idx] = Some(kind);
        self.parents[idx] = parent;
        self.transforms[idx] = Some(Transform::identity());
        self.bounds[idx] = None;
        self.names[idx] = None;
        id
    }

    /// Remove a node and its whole subtree. Unknown ids are ignored.
    pub fn despawn(&mut self, node: NodeId) {
        if !self.contains(node) {
            return;
        }
        for child in self.children(node) {
            self.despawn(child);
        }
        let idx = node.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.kinds[idx] = None;
        self.parents[idx] = None;
        self.transforms[idx] = None;
        self.bounds[idx] = None;
        self.names[idx] = None;
        self.free.push(node.index());
    }

    pub fn contains(&self, node: NodeId) -> bool {
        let idx = node.index() as usize;
        self.alive.get(idx).copied().unwrap_or(false)
            && self.generations.get(idx).copied() == Some(node.generation())
    }

    pub fn len(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.slot(node).and_then(|idx| self.kinds[idx])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node).and_then(|idx| self.parents[idx])
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (idx, parent) in self.parents.iter().enumerate() {
            if *parent == Some(node) && self.alive[idx] {
                out.push(NodeId(Handle::new(idx as u32, self.generations[idx])));
            }
        }
        out
    }

    pub fn set_transform(&mut self, node: NodeId, transform: Transform) {
        if let Some(idx) = self.slot(node) {
            self.transforms[idx] = Some(transform);
        }
    }

    pub fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(idx) = self.slot(node) {
            let t = self.transforms[idx].get_or_insert_with(Transform::identity);
            t.position = position;
        }
    }

    pub fn transform(&self, node: NodeId) -> Option<Transform> {
        self.slot(node).and_then(|idx| self.transforms[idx])
    }

    pub fn set_bounds(&mut self, node: NodeId, bounds: ComponentBounds) {
        if let Some(idx) = self.slot(node) {
            self.bounds[idx] = Some(bounds);
        }
    }

    pub fn bounds(&self, node: NodeId) -> Option<ComponentBounds> {
        self.slot(node).and_then(|idx| self.bounds[idx])
    }

    pub fn set_name(&mut self, node: NodeId, name: impl Into<String>) {
        if let Some(idx) = self.slot(node) {
            self.names[idx] = Some(name.into());
        }
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.slot(node).and_then(|idx| self.names[idx].as_deref())
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.iter().enumerate().find_map(|(idx, n)| {
            (self.alive[idx] && n.as_deref() == Some(name))
                .then(|| NodeId(Handle::new(idx as u32, self.generations[idx])))
        })
    }

    /// Local-to-world matrix, composed through every ancestor.
    pub fn world_matrix(&self, node: NodeId) -> Option<Mat4> {
        let mut m = self.transform(node)?.matrix();
        let mut cursor = self.parent(node);
        // Walk is bounded by the slot count.
        let mut hops = 0usize;
        while let Some(parent) = cursor {
            let Some(t) = self.transform(parent) else {
                break;
            };
            m = t.matrix().mul(&m);
            cursor = self.parent(parent);
            hops += 1;
            if hops > self.generations.len() {
                break;
            }
        }
        Some(m)
    }

    pub fn world_position(&self, node: NodeId) -> Option<Vec3> {
        self.world_matrix(node).map(|m| m.translation_part())
    }

    /// World-space bounds of every mesh in the subtree rooted at `node`.
    pub fn world_bounds(&self, node: NodeId) -> Option<Aabb3> {
        if !self.contains(node) {
            return None;
        }
        let mut out = Aabb3::empty();
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let (Some(bounds), Some(m)) = (self.bounds(n), self.world_matrix(n)) {
                out = out.union(&bounds.local.transformed(&m));
            }
            stack.extend(self.children(n));
        }
        Some(out)
    }

    fn slot(&self, node: NodeId) -> Option<usize> {
        self.contains(node).then_some(node.index() as usize)
    }

    fn ensure_capacity(&mut self, idx: usize) {
        if self.generations.len() <= idx {
            let new_len = idx + 1;
            self.generations.resize(new_len, 0);
            self.alive.resize(new_len, false);
            self.kinds.resize(new_len, None);
            self.parents.resize(new_len, None);
            self.transforms.resize(new_len, None);
            self.bounds.resize(new_len, None);
            self.names.resize(new_len, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{ComponentBounds, NodeKind, Transform};
    use foundation::math::Vec3;

    #[test]
    fn spawn_group_and_mesh() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        let mesh = world.spawn_mesh(Some(group), ComponentBounds::sized(Vec3::new(1.0, 1.0, 1.0)));

        assert_eq!(world.kind(group), Some(NodeKind::Group));
        assert_eq!(world.kind(mesh), Some(NodeKind::Mesh));
        assert_eq!(world.parent(mesh), Some(group));
        assert_eq!(world.children(group), vec![mesh]);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn world_position_resolves_ancestors() {
        let mut world = World::new();
        let root = world.spawn_group(None);
        world.set_transform(root, Transform::translate(Vec3::new(100.0, 0.0, 0.0)));
        let island = world.spawn_group(Some(root));
        world.set_transform(
            island,
            Transform::translate(Vec3::new(0.0, 10.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        let mesh = world.spawn_mesh(Some(island), ComponentBounds::sized(Vec3::new(4.0, 4.0, 4.0)));
        world.set_position(mesh, Vec3::new(1.0, 1.0, 0.0));

        assert_eq!(world.world_position(mesh), Some(Vec3::new(102.0, 12.0, 0.0)));
    }

    #[test]
    fn world_bounds_unions_subtree_meshes() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        world.set_position(group, Vec3::new(0.0, 5.0, 0.0));
        let low = world.spawn_mesh(Some(group), ComponentBounds::sized(Vec3::new(2.0, 2.0, 2.0)));
        let high = world.spawn_mesh(Some(group), ComponentBounds::sized(Vec3::new(2.0, 2.0, 2.0)));
        world.set_position(low, Vec3::new(0.0, -3.0, 0.0));
        world.set_position(high, Vec3::new(0.0, 3.0, 0.0));

        let b = world.world_bounds(group).expect("bounds");
        assert_eq!(b.min.y, 1.0);
        assert_eq!(b.max.y, 9.0);
        assert_eq!(b.height(), 8.0);
    }

    #[test]
    fn empty_group_has_empty_bounds() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        assert_eq!(world.world_bounds(group).map(|b| b.height()), Some(0.0));
    }

    #[test]
    fn despawn_invalidates_subtree_and_stale_ids() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        let mesh = world.spawn_mesh(Some(group), ComponentBounds::sized(Vec3::new(1.0, 1.0, 1.0)));
        world.despawn(group);

        assert!(!world.contains(group));
        assert!(!world.contains(mesh));
        assert!(world.world_bounds(group).is_none());

        let reused = world.spawn_group(None);
        assert!(world.contains(reused));
        assert!(!world.contains(group));
        assert!(!world.contains(mesh));
    }

    #[test]
    fn names_are_searchable() {
        let mut world = World::new();
        let a = world.spawn_group(None);
        world.set_name(a, "Moon Palace");
        assert_eq!(world.find_by_name("Moon Palace"), Some(a));
        assert_eq!(world.name(a), Some("Moon Palace"));
        assert!(world.find_by_name("Atlantis").is_none());
    }
}
