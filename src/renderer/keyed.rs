//! Keyed array diff.
//!
//! Matches old and new children by type and key:
//!
//! 1. sync the common prefix
//! 2. sync the common suffix
//! 3. mount what is left of the new list, or unmount what is left of the
//!    old list, when the other side is exhausted
//! 4. otherwise resolve each old child of the middle range to a new index,
//!    patch matched pairs, unmount the rest, then walk the new range
//!    backwards mounting fresh nodes and moving every matched node that is
//!    not on the longest increasing subsequence of old positions

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{trace, warn};

use super::component::ComponentInstance;
use super::host::{Host, HostNode};
use super::sequence::longest_increasing_subsequence;
use super::Renderer;
use crate::vnode::{is_same_type, Key, VNode};

impl<H: Host + 'static> Renderer<H> {
    /// Diff `c1` (old) against `c2` (new) inside `container`.
    ///
    /// `parent_anchor` marks the end of the range the lists occupy; it is
    /// `None` for element children and the host node after the fragment for
    /// fragment children.
    pub(super) fn patch_keyed_children(
        &self,
        c1: &[VNode],
        c2: &[VNode],
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        parent_anchor: Option<HostNode>,
    ) {
        let mut i = 0;
        // exclusive ends
        let mut e1 = c1.len();
        let mut e2 = c2.len();

        // 1. prefix
        while i < e1 && i < e2 && is_same_type(&c1[i], &c2[i]) {
            let anchor = self.next_host_node(c1, i + 1).or(parent_anchor);
            let result = self.patch(Some(&c1[i]), &c2[i], container, parent, anchor);
            self.contain(result, &c2[i], "patch");
            i += 1;
        }

        // 2. suffix
        while i < e1 && i < e2 && is_same_type(&c1[e1 - 1], &c2[e2 - 1]) {
            let anchor = self.next_host_node(c2, e2).or(parent_anchor);
            let result = self.patch(Some(&c1[e1 - 1]), &c2[e2 - 1], container, parent, anchor);
            self.contain(result, &c2[e2 - 1], "patch");
            e1 -= 1;
            e2 -= 1;
        }

        // 3. one side exhausted
        if i >= e1 {
            if i < e2 {
                let anchor = self.next_host_node(c2, e2).or(parent_anchor);
                trace!(target: "spark_render::renderer", count = e2 - i, "insert range");
                self.mount_children(&c2[i..e2], container, parent, anchor);
            }
            return;
        }
        if i >= e2 {
            trace!(target: "spark_render::renderer", count = e1 - i, "remove range");
            for prev in &c1[i..e1] {
                let result = self.unmount_node(prev, true);
                self.contain(result, prev, "unmount");
            }
            return;
        }

        // 4. unknown middle range
        self.patch_middle(c1, c2, (i, e1), (i, e2), container, parent, parent_anchor);
    }

    #[allow(clippy::too_many_arguments)]
    fn patch_middle(
        &self,
        c1: &[VNode],
        c2: &[VNode],
        (s1, e1): (usize, usize),
        (s2, e2): (usize, usize),
        container: HostNode,
        parent: Option<&Rc<ComponentInstance>>,
        parent_anchor: Option<HostNode>,
    ) {
        let mut key_to_new_index: HashMap<&Key, usize> = HashMap::new();
        for (j, next) in c2.iter().enumerate().take(e2).skip(s2) {
            let Some(key) = next.key() else {
                continue;
            };
            if key_to_new_index.contains_key(key) {
                warn!(target: "spark_render::renderer", %key, "duplicate key among siblings");
                continue;
            }
            key_to_new_index.insert(key, j);
        }

        let to_be_patched = e2 - s2;
        let mut patched = 0;
        // old index + 1 for each slot of the new range, 0 while unmatched
        let mut new_to_old = vec![0usize; to_be_patched];
        let mut moved = false;
        let mut max_new_index_so_far = 0;

        for old_index in s1..e1 {
            let prev = &c1[old_index];
            if patched >= to_be_patched {
                let result = self.unmount_node(prev, true);
                self.contain(result, prev, "unmount");
                continue;
            }

            let new_index = match prev.key() {
                Some(key) => key_to_new_index.get(key).copied(),
                None => (s2..e2).find(|&j| {
                    new_to_old[j - s2] == 0 && c2[j].key().is_none() && is_same_type(prev, &c2[j])
                }),
            };

            match new_index {
                Some(j) if new_to_old[j - s2] == 0 => {
                    new_to_old[j - s2] = old_index + 1;
                    if j >= max_new_index_so_far {
                        max_new_index_so_far = j;
                    } else {
                        moved = true;
                    }
                    let anchor = self.next_host_node(c1, old_index + 1).or(parent_anchor);
                    let result = self.patch(Some(prev), &c2[j], container, parent, anchor);
                    self.contain(result, &c2[j], "patch");
                    patched += 1;
                }
                _ => {
                    let result = self.unmount_node(prev, true);
                    self.contain(result, prev, "unmount");
                }
            }
        }

        let stable = if moved {
            longest_increasing_subsequence(&new_to_old)
        } else {
            Vec::new()
        };
        let mut stable = stable.iter().rev().peekable();

        for offset in (0..to_be_patched).rev() {
            let j = s2 + offset;
            let next = &c2[j];
            let anchor = self.next_host_node(c2, j + 1).or(parent_anchor);

            if new_to_old[offset] == 0 {
                let result = self.patch(None, next, container, parent, anchor);
                self.contain(result, next, "mount");
            } else if moved {
                if stable.peek() == Some(&&offset) {
                    stable.next();
                } else {
                    trace!(target: "spark_render::renderer", node = next.kind().label(), "move");
                    let result = self.move_node(next, container, anchor);
                    self.contain(result, next, "move");
                }
            }
        }
    }
}
