/// Scene node flavor.
///
/// Groups are containers whose own position is taken to already be in world
/// space when labels anchor to them; meshes carry geometry bounds and resolve
/// their full ancestor transform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh,
}

impl NodeKind {
    pub fn is_group(self) -> bool {
        matches!(self, NodeKind::Group)
    }
}
