use foundation::handles::Handle;

/// Non-owning reference to a scene node.
///
/// The generation distinguishes a live node from a despawned slot that has
/// been reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub Handle);

impl NodeId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    pub fn generation(&self) -> u32 {
        self.0.generation()
    }
}
