//! Incremental reconciliation of style bindings into a flat texel buffer.
//!
//! The node universe can run into the millions, so the builder never repaints
//! wholesale on a change. It keeps a per-binding baseline of what was last
//! painted and, on each [`build`](AppearanceTextureBuilder::build), touches
//! only the indices whose effective style actually changed. The one
//! whole-buffer operation is changing the default appearance, which
//! invalidates every unset-field fallback.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytemuck::{Pod, Zeroable};

use stratum_core::{ConnectionId, IndexSet, NumericRange};

use crate::appearance::{NodeAppearance, ResolvedAppearance};
use crate::provider::{BindingId, NodeStyleProvider};

/// One node's entry in the override buffer: RGB plus a packed flag byte.
///
/// The flag byte layout is
/// `visible(1) | in_front(2) | ghosted(4) | outline << 3`; see
/// [`ResolvedAppearance::flags`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Texel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub flags: u8,
}

impl From<ResolvedAppearance> for Texel {
    fn from(appearance: ResolvedAppearance) -> Self {
        let [r, g, b] = appearance.color;
        Self {
            r,
            g,
            b,
            flags: appearance.flags(),
        }
    }
}

/// Which of the three classification sets an appearance lands in.
///
/// In-front wins over ghosted when both are set; the renderer draws the
/// in-front pass last either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StyleClass {
    Regular,
    Ghosted,
    InFront,
}

fn classify(appearance: &ResolvedAppearance) -> StyleClass {
    if appearance.render_in_front {
        StyleClass::InFront
    } else if appearance.render_ghosted {
        StyleClass::Ghosted
    } else {
        StyleClass::Regular
    }
}

/// What was last painted for one binding id, used to diff the next build.
struct AppliedBinding {
    revision: u32,
    indices: IndexSet,
    appearance: NodeAppearance,
}

/// Reconciles a [`NodeStyleProvider`]'s bindings into a fixed-size override
/// buffer plus three classification sets.
///
/// The builder subscribes to the provider's `changed` signal to arm its
/// [`needs_update`](Self::needs_update) flag; the caller runs
/// [`build`](Self::build) on demand (not per frame) when the flag is set, and
/// re-uploads [`texel_data`](Self::texel_data) to the GPU afterwards.
///
/// Indices outside `[0, node_count)` contributed by a binding are ignored.
pub struct AppearanceTextureBuilder {
    provider: Arc<NodeStyleProvider>,
    subscription: ConnectionId,
    node_count: u64,
    default_appearance: ResolvedAppearance,
    texels: Vec<Texel>,
    regular: IndexSet,
    ghosted: IndexSet,
    in_front: IndexSet,
    applied: HashMap<BindingId, AppliedBinding>,
    needs_update: Arc<AtomicBool>,
    /// Set when the default appearance changed; forces a full repaint on the
    /// next build.
    full_repaint: bool,
}

impl AppearanceTextureBuilder {
    /// Create a builder over a universe of `node_count` node indices.
    ///
    /// The buffer starts out fully default-painted with every index
    /// classified regular, and `needs_update` armed so the first build picks
    /// up the provider's current bindings.
    pub fn new(node_count: u64, provider: Arc<NodeStyleProvider>) -> Self {
        let default_appearance = ResolvedAppearance::default();
        let needs_update = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&needs_update);
        let subscription = provider.changed().connect(move |_| {
            flag.store(true, Ordering::SeqCst);
        });
        Self {
            provider,
            subscription,
            node_count,
            default_appearance,
            texels: vec![Texel::from(default_appearance); node_count as usize],
            regular: IndexSet::from(NumericRange::new(0, node_count)),
            ghosted: IndexSet::new(),
            in_front: IndexSet::new(),
            applied: HashMap::new(),
            needs_update,
            full_repaint: false,
        }
    }

    /// The fixed node-index universe size.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    /// Whether the provider changed since the last [`build`](Self::build).
    pub fn needs_update(&self) -> bool {
        self.needs_update.load(Ordering::SeqCst)
    }

    /// The override buffer, 4 bytes per node index, row-major.
    pub fn texel_data(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// The override buffer as texels.
    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// Indices rendered in the regular geometry pass.
    pub fn regular_indices(&self) -> &IndexSet {
        &self.regular
    }

    /// Indices rendered ghosted.
    pub fn ghosted_indices(&self) -> &IndexSet {
        &self.ghosted
    }

    /// Indices rendered in front of regular geometry.
    pub fn in_front_indices(&self) -> &IndexSet {
        &self.in_front
    }

    /// The appearance unstyled indices (and unset binding fields) fall back
    /// to.
    pub fn default_appearance(&self) -> ResolvedAppearance {
        self.default_appearance
    }

    /// Replace the default appearance.
    ///
    /// This invalidates every unset-field fallback in the buffer, so the next
    /// [`build`](Self::build) repaints everything. Expensive on large
    /// universes; avoid calling it per frame.
    pub fn set_default_appearance(&mut self, appearance: ResolvedAppearance) {
        if self.default_appearance == appearance {
            return;
        }
        self.default_appearance = appearance;
        self.full_repaint = true;
        self.needs_update.store(true, Ordering::SeqCst);
    }

    /// Reconcile the provider's current bindings into the buffer and clear
    /// `needs_update`.
    ///
    /// Only indices whose effective style changed since the last build are
    /// touched, unless a full repaint is pending.
    pub fn build(&mut self) {
        let mut current: Vec<(BindingId, u32, IndexSet, NodeAppearance)> = Vec::new();
        self.provider.visit_bindings(|id, revision, set, appearance| {
            current.push((id, revision, set, appearance));
        });

        if self.full_repaint {
            self.reset_everything();
        }

        // Orphans: bindings painted last time that no longer exist.
        let orphans: Vec<BindingId> = self
            .applied
            .keys()
            .filter(|id| !current.iter().any(|(current_id, ..)| *current_id == **id))
            .copied()
            .collect();
        let mut touched = 0_u64;
        for id in orphans {
            if let Some(previous) = self.applied.remove(&id) {
                touched += self.write(&previous.indices, self.default_appearance);
            }
        }

        // Assignment order: later bindings overwrite earlier ones on overlap.
        for (id, revision, indices, appearance) in current {
            let resolved = appearance.applied_over(&self.default_appearance);
            match self.applied.get(&id) {
                None => {
                    touched += self.write(&indices, resolved);
                }
                Some(previous) => {
                    let appearance_changed = previous.appearance != appearance;
                    if previous.revision == revision && !appearance_changed {
                        continue;
                    }
                    // Indices that left the binding go back to default.
                    let mut removed = previous.indices.clone();
                    removed.difference_with(&indices);
                    // A replaced appearance repaints the whole binding;
                    // otherwise only newly added indices are painted.
                    let mut painted = indices.clone();
                    if !appearance_changed {
                        painted.difference_with(&previous.indices);
                    }
                    touched += self.write(&removed, self.default_appearance);
                    touched += self.write(&painted, resolved);
                }
            }
            self.applied.insert(
                id,
                AppliedBinding {
                    revision,
                    indices,
                    appearance,
                },
            );
        }

        tracing::debug!(
            target: "stratum_style::texture",
            touched,
            bindings = self.applied.len(),
            "texture build complete"
        );
        self.needs_update.store(false, Ordering::SeqCst);
    }

    /// Repaint the whole buffer to the default appearance and drop the
    /// per-binding baselines so every binding repaints from scratch.
    fn reset_everything(&mut self) {
        let default_texel = Texel::from(self.default_appearance);
        self.texels.fill(default_texel);
        let universe = IndexSet::from(NumericRange::new(0, self.node_count));
        match classify(&self.default_appearance) {
            StyleClass::Regular => {
                self.regular = universe;
                self.ghosted = IndexSet::new();
                self.in_front = IndexSet::new();
            }
            StyleClass::Ghosted => {
                self.regular = IndexSet::new();
                self.ghosted = universe;
                self.in_front = IndexSet::new();
            }
            StyleClass::InFront => {
                self.regular = IndexSet::new();
                self.ghosted = IndexSet::new();
                self.in_front = universe;
            }
        }
        self.applied.clear();
        self.full_repaint = false;
    }

    /// Paint `indices` (clipped to the universe) with `appearance` and move
    /// them into its classification set. Returns how many indices were
    /// written.
    fn write(&mut self, indices: &IndexSet, appearance: ResolvedAppearance) -> u64 {
        let mut clipped = indices.clone();
        clipped.intersect_with(&IndexSet::from(NumericRange::new(0, self.node_count)));
        if clipped.is_empty() {
            return 0;
        }

        let texel = Texel::from(appearance);
        for index in clipped.iter() {
            self.texels[index as usize] = texel;
        }

        self.regular.difference_with(&clipped);
        self.ghosted.difference_with(&clipped);
        self.in_front.difference_with(&clipped);
        match classify(&appearance) {
            StyleClass::Regular => self.regular.union_with(&clipped),
            StyleClass::Ghosted => self.ghosted.union_with(&clipped),
            StyleClass::InFront => self.in_front.union_with(&clipped),
        }
        clipped.count()
    }
}

impl Drop for AppearanceTextureBuilder {
    fn drop(&mut self) {
        self.provider.changed().disconnect(self.subscription);
    }
}

impl std::fmt::Debug for AppearanceTextureBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppearanceTextureBuilder")
            .field("node_count", &self.node_count)
            .field("bindings", &self.applied.len())
            .field("needs_update", &self.needs_update())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::OutlineColor;
    use stratum_collections::{NodeCollection, SimpleNodeCollection};

    fn indices(values: &[u64]) -> IndexSet {
        values.iter().copied().collect()
    }

    fn collection(values: &[u64]) -> Arc<SimpleNodeCollection> {
        Arc::new(SimpleNodeCollection::from_set(indices(values)))
    }

    fn setup(node_count: u64) -> (Arc<NodeStyleProvider>, AppearanceTextureBuilder) {
        let provider = Arc::new(NodeStyleProvider::new());
        let builder = AppearanceTextureBuilder::new(node_count, Arc::clone(&provider));
        (provider, builder)
    }

    const RED: NodeAppearance = NodeAppearance {
        color: Some([255, 0, 0]),
        ..NodeAppearance::DEFAULT
    };

    #[test]
    fn test_initial_state() {
        let (_provider, builder) = setup(4);
        assert!(builder.needs_update());
        assert_eq!(builder.texel_data().len(), 16);
        assert_eq!(builder.regular_indices().count(), 4);
        assert!(builder.ghosted_indices().is_empty());
        assert!(builder.in_front_indices().is_empty());
        // Default texel: no color override, visible flag only.
        assert_eq!(builder.texels()[0], Texel { r: 0, g: 0, b: 0, flags: 1 });
    }

    #[test]
    fn test_incremental_diff_touches_only_changed_bytes() {
        let (provider, mut builder) = setup(8);
        let styled = collection(&[1, 2, 3]);
        provider.assign(styled.clone() as Arc<dyn NodeCollection>, RED);

        builder.build();
        assert!(!builder.needs_update());
        let before = builder.texel_data().to_vec();
        assert_eq!(builder.texels()[1], Texel { r: 255, g: 0, b: 0, flags: 1 });

        styled.update_set(indices(&[2, 3, 4]));
        assert!(builder.needs_update());
        builder.build();
        let after = builder.texel_data().to_vec();

        let changed_bytes: Vec<usize> = before
            .iter()
            .zip(&after)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(position, _)| position)
            .collect();
        // Only the texels of index 1 (reset) and index 4 (painted) moved;
        // within each, only the red byte differs.
        assert_eq!(changed_bytes, vec![4, 16]);
        assert_eq!(builder.texels()[1], Texel { r: 0, g: 0, b: 0, flags: 1 });
        assert_eq!(builder.texels()[4], Texel { r: 255, g: 0, b: 0, flags: 1 });
    }

    #[test]
    fn test_unassign_resets_orphaned_indices() {
        let (provider, mut builder) = setup(8);
        let styled = collection(&[1, 2]) as Arc<dyn NodeCollection>;
        provider.assign(Arc::clone(&styled), NodeAppearance::GHOSTED);
        builder.build();
        assert_eq!(builder.ghosted_indices().to_vec(), vec![1, 2]);

        provider.unassign(&styled).unwrap();
        builder.build();
        assert!(builder.ghosted_indices().is_empty());
        assert_eq!(builder.regular_indices().count(), 8);
        assert_eq!(builder.texels()[1], Texel { r: 0, g: 0, b: 0, flags: 1 });
    }

    #[test]
    fn test_classification_sets_partition_universe() {
        let (provider, mut builder) = setup(10);
        provider.assign(
            collection(&[0, 1]) as Arc<dyn NodeCollection>,
            NodeAppearance::GHOSTED,
        );
        provider.assign(
            collection(&[5, 6]) as Arc<dyn NodeCollection>,
            NodeAppearance::IN_FRONT,
        );
        builder.build();

        assert_eq!(builder.ghosted_indices().to_vec(), vec![0, 1]);
        assert_eq!(builder.in_front_indices().to_vec(), vec![5, 6]);
        assert_eq!(builder.regular_indices().to_vec(), vec![2, 3, 4, 7, 8, 9]);

        let total = builder.regular_indices().count()
            + builder.ghosted_indices().count()
            + builder.in_front_indices().count();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_later_binding_wins_on_overlap() {
        let (provider, mut builder) = setup(8);
        provider.assign(collection(&[1, 2, 3]) as Arc<dyn NodeCollection>, RED);
        provider.assign(
            collection(&[3, 4]) as Arc<dyn NodeCollection>,
            NodeAppearance::HIDDEN,
        );
        builder.build();

        assert_eq!(builder.texels()[2], Texel { r: 255, g: 0, b: 0, flags: 1 });
        // Index 3 is in both bindings; the later one wins.
        assert_eq!(builder.texels()[3].flags & 1, 0);
        assert_eq!(builder.texels()[4].flags & 1, 0);
    }

    #[test]
    fn test_appearance_replacement_repaints_binding() {
        let (provider, mut builder) = setup(8);
        let styled = collection(&[1, 2]) as Arc<dyn NodeCollection>;
        provider.assign(Arc::clone(&styled), RED);
        builder.build();

        provider.assign(Arc::clone(&styled), NodeAppearance::GHOSTED);
        builder.build();

        assert_eq!(builder.texels()[1], Texel { r: 0, g: 0, b: 0, flags: 1 | 4 });
        assert_eq!(builder.ghosted_indices().to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_set_default_appearance_repaints_everything() {
        let (provider, mut builder) = setup(4);
        provider.assign(collection(&[0]) as Arc<dyn NodeCollection>, RED);
        builder.build();
        assert!(!builder.needs_update());

        builder.set_default_appearance(ResolvedAppearance {
            color: [9, 9, 9],
            ..ResolvedAppearance::default()
        });
        assert!(builder.needs_update());
        builder.build();

        // Unstyled indices carry the new default.
        assert_eq!(builder.texels()[1], Texel { r: 9, g: 9, b: 9, flags: 1 });
        // The binding's unset color no longer applies, but its explicit
        // fields still override the new default.
        assert_eq!(builder.texels()[0], Texel { r: 255, g: 0, b: 0, flags: 1 });
    }

    #[test]
    fn test_out_of_universe_indices_ignored() {
        let (provider, mut builder) = setup(4);
        provider.assign(collection(&[2, 3, 4, 5]) as Arc<dyn NodeCollection>, RED);
        builder.build();

        assert_eq!(builder.texels()[2].r, 255);
        assert_eq!(builder.texels()[3].r, 255);
        assert_eq!(builder.texel_data().len(), 16);
    }

    #[test]
    fn test_outline_packed_into_flags() {
        let (provider, mut builder) = setup(2);
        provider.assign(
            collection(&[0]) as Arc<dyn NodeCollection>,
            NodeAppearance {
                outline: Some(OutlineColor::Cyan),
                ..NodeAppearance::DEFAULT
            },
        );
        builder.build();
        assert_eq!(builder.texels()[0].flags, 1 | (3 << 3));
    }

    #[test]
    fn test_unchanged_binding_is_skipped() {
        let (provider, mut builder) = setup(8);
        let stable = collection(&[1]);
        let churning = collection(&[5]);
        provider.assign(stable as Arc<dyn NodeCollection>, RED);
        provider.assign(
            churning.clone() as Arc<dyn NodeCollection>,
            NodeAppearance::GHOSTED,
        );
        builder.build();
        let before = builder.texel_data().to_vec();

        churning.add_range(NumericRange::new(6, 1));
        builder.build();
        let after = builder.texel_data().to_vec();

        // Only index 6's texel changed; the stable binding was not repainted.
        let changed: Vec<usize> = before
            .iter()
            .zip(&after)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(position, _)| position)
            .collect();
        assert_eq!(changed, vec![6 * 4 + 3]);
    }

    #[test]
    fn test_drop_disconnects_from_provider() {
        let provider = Arc::new(NodeStyleProvider::new());
        {
            let _builder = AppearanceTextureBuilder::new(4, Arc::clone(&provider));
            assert_eq!(provider.changed().connection_count(), 1);
        }
        assert_eq!(provider.changed().connection_count(), 0);
    }
}
