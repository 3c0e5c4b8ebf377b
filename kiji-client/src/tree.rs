use crate::{
    api::{self, BlogId, CommentId, CommentPage, UserId, COMMENT_PAGE_SIZE},
    Comment,
};

/// In-memory state of one blog's comment section.
///
/// Comments are kept flattened in display order: a pre-order walk of the
/// comment tree, the way an indented outline reads. For any entry at depth
/// `d`, the contiguous run of following entries with depth greater than `d`
/// is exactly its materialized descendant subtree, terminated by the first
/// entry back at depth `d` or less. Every mutation below preserves this.
///
/// Mutations address their target by id and resolve its position when they
/// are applied, so a network completion that was initiated against an older
/// arrangement of the list still lands on the right comment. Completions
/// initiated against a *different blog* must be dropped instead: `reset`
/// bumps the generation, and callers are expected to tag every in-flight
/// request with the generation it was initiated under and compare on
/// completion.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentTree {
    blog: BlogId,
    generation: u64,
    entries: Vec<Comment>,

    loaded_roots: usize,
    total_roots: u64,
    has_more_roots: bool,
}

/// What [`CommentTree::apply_like`] changed, so that a failed backend call
/// can undo exactly that and nothing else
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LikeDelta {
    pub comment: CommentId,
    pub user: UserId,
    pub now_liked: bool,
}

impl CommentTree {
    pub fn new(blog: BlogId) -> CommentTree {
        CommentTree {
            blog,
            generation: 0,
            entries: Vec::new(),
            loaded_roots: 0,
            total_roots: 0,
            has_more_roots: true,
        }
    }

    /// Drops all loaded comments and starts over against `blog`, invalidating
    /// the completions of every request initiated before the reset
    pub fn reset(&mut self, blog: BlogId) {
        self.blog = blog;
        self.generation += 1;
        self.entries.clear();
        self.loaded_roots = 0;
        self.total_roots = 0;
        self.has_more_roots = true;
    }

    pub fn blog(&self) -> BlogId {
        self.blog
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All materialized comments, in display order
    pub fn entries(&self) -> &[Comment] {
        &self.entries
    }

    pub fn get(&self, idx: usize) -> Option<&Comment> {
        self.entries.get(idx)
    }

    pub fn comment(&self, id: CommentId) -> Option<&Comment> {
        self.entries.iter().find(|c| c.id == id)
    }

    pub fn position_of(&self, id: CommentId) -> Option<usize> {
        self.entries.iter().position(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of root comments currently materialized
    pub fn loaded_roots(&self) -> usize {
        self.loaded_roots
    }

    /// Total root comment count as last reported by the server
    pub fn total_roots(&self) -> u64 {
        self.total_roots
    }

    /// Whether fetching another page of root comments is worth it. This is
    /// the last-page-was-full heuristic, not an exact comparison: when the
    /// root count is a multiple of the page size, one extra fetch will come
    /// back empty before this flips to false.
    pub fn has_more_roots(&self) -> bool {
        self.has_more_roots
    }

    /// Number of direct replies of `parent` currently materialized, which is
    /// also the `skip` to use when loading more of them
    pub fn materialized_replies(&self, parent: CommentId) -> usize {
        match self.position_of(parent) {
            None => 0,
            Some(idx) => {
                let child_depth = self.entries[idx].depth + 1;
                self.entries[idx + 1..self.subtree_end(idx)]
                    .iter()
                    .filter(|c| c.depth == child_depth)
                    .count()
            }
        }
    }

    /// Index one past the last materialized descendant of the entry at `idx`
    fn subtree_end(&self, idx: usize) -> usize {
        let depth = self.entries[idx].depth;
        let mut end = idx + 1;
        while end < self.entries.len() && self.entries[end].depth > depth {
            end += 1;
        }
        end
    }

    /// Applies one fetched page of root comments.
    ///
    /// Pages land at the tail in server order. The server-reported total is
    /// kept for display; whether more roots remain is guessed from the page
    /// being full (see [`CommentTree::has_more_roots`]).
    pub fn append_root_page(&mut self, page: CommentPage) {
        let fetched = page.comments.len();
        self.entries
            .extend(page.comments.into_iter().map(|c| Comment::from_api(c, 0)));
        self.loaded_roots += fetched;
        self.total_roots = page.total_roots;
        self.has_more_roots = fetched >= COMMENT_PAGE_SIZE;
    }

    /// Applies one fetched page of replies to `parent`.
    ///
    /// The block lands right after everything already materialized under the
    /// parent, which is where the next page of direct replies belongs in
    /// pre-order, at one level deeper than the parent. Callers re-fetching
    /// page 0 of an already-expanded comment collapse it first, at request
    /// initiation, so that the fresh page does not duplicate entries.
    pub fn insert_replies(&mut self, parent: CommentId, replies: Vec<api::Comment>) {
        let idx = match self.position_of(parent) {
            Some(idx) => idx,
            None => {
                tracing::warn!(?parent, "got replies for a comment that is no longer loaded");
                return;
            }
        };
        let child_depth = self.entries[idx].depth + 1;
        let at = self.subtree_end(idx);
        self.entries.splice(
            at..at,
            replies
                .into_iter()
                .map(|c| Comment::from_api(c, child_depth)),
        );
        self.entries[idx].replies_expanded = true;
    }

    /// Removes the target's materialized subtree from display. Purely local:
    /// the backend is not contacted and its data is unaffected. Collapsing a
    /// comment with nothing materialized under it is a no-op.
    pub fn collapse_replies(&mut self, target: CommentId) {
        let idx = match self.position_of(target) {
            Some(idx) => idx,
            None => {
                tracing::warn!(?target, "collapsing a comment that is no longer loaded");
                return;
            }
        };
        let end = self.subtree_end(idx);
        self.entries.drain(idx + 1..end);
        self.entries[idx].replies_expanded = false;
    }

    /// Applies the backend's record of a comment the user just posted on the
    /// blog itself. Roots display newest first, so it lands at the front.
    pub fn prepend_root(&mut self, comment: api::Comment) {
        self.entries.insert(0, Comment::from_api(comment, 0));
        self.loaded_roots += 1;
        self.total_roots += 1;
    }

    /// Applies the backend's record of a reply the user just posted.
    ///
    /// The reply lands directly under its parent, before the parent's other
    /// materialized replies, and the parent is forced open so the new reply
    /// is actually visible. Inserting right at the parent never cuts another
    /// subtree in two: the parent is always the first entry of its own block.
    pub fn insert_reply(&mut self, parent: CommentId, comment: api::Comment) {
        let idx = match self.position_of(parent) {
            Some(idx) => idx,
            None => {
                tracing::warn!(?parent, "got a new reply for a comment that is no longer loaded");
                return;
            }
        };
        let child_depth = self.entries[idx].depth + 1;
        self.entries[idx].children.push(comment.id);
        self.entries[idx].replies_expanded = true;
        self.entries
            .insert(idx + 1, Comment::from_api(comment, child_depth));
    }

    /// Applies a confirmed deletion: the entry and its materialized subtree
    /// go away, the parent's reply list forgets the id, and the root counters
    /// shrink when the target was a root. The backend cascades deletion of
    /// descendant records, so descendants that were never loaded need no
    /// local bookkeeping.
    pub fn remove(&mut self, target: CommentId) {
        let idx = match self.position_of(target) {
            Some(idx) => idx,
            None => {
                tracing::warn!(?target, "deleting a comment that is no longer loaded");
                return;
            }
        };
        let depth = self.entries[idx].depth;
        let end = self.subtree_end(idx);
        self.entries.drain(idx..end);
        // the nearest preceding entry shallower than the target is its parent
        let parent = self.entries[..idx]
            .iter_mut()
            .rev()
            .find(|c| c.depth < depth);
        match parent {
            Some(parent) => {
                parent.children.retain(|c| *c != target);
                if parent.children.is_empty() {
                    parent.replies_expanded = false;
                }
            }
            None if depth == 0 => {
                self.loaded_roots = self.loaded_roots.saturating_sub(1);
                self.total_roots = self.total_roots.saturating_sub(1);
            }
            None => {
                tracing::warn!(?target, "deleted reply has no loaded parent");
            }
        }
    }

    /// Optimistically flips `user`'s like on a comment, before the backend
    /// has confirmed anything. Returns what changed so the caller can hand it
    /// back to [`CommentTree::rollback_like`] if the backend then refuses.
    pub fn apply_like(&mut self, target: CommentId, user: UserId) -> Option<LikeDelta> {
        let idx = match self.position_of(target) {
            Some(idx) => idx,
            None => {
                tracing::warn!(?target, "toggling like on a comment that is no longer loaded");
                return None;
            }
        };
        let c = &mut self.entries[idx];
        let now_liked = match c.liked_by.contains(&user) {
            true => {
                c.liked_by.remove(&user);
                c.like_count = c.like_count.saturating_sub(1);
                false
            }
            false => {
                c.liked_by.insert(user);
                c.like_count += 1;
                true
            }
        };
        Some(LikeDelta {
            comment: target,
            user,
            now_liked,
        })
    }

    /// Compensates a failed like toggle, restoring the exact previous count
    /// and membership rather than re-fetching
    pub fn rollback_like(&mut self, delta: &LikeDelta) {
        let idx = match self.position_of(delta.comment) {
            Some(idx) => idx,
            None => {
                tracing::warn!(
                    comment = ?delta.comment,
                    "rolling back a like on a comment that is no longer loaded"
                );
                return;
            }
        };
        let c = &mut self.entries[idx];
        match delta.now_liked {
            true => {
                c.liked_by.remove(&delta.user);
                c.like_count = c.like_count.saturating_sub(1);
            }
            false => {
                c.liked_by.insert(delta.user);
                c.like_count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;

    use super::*;
    use crate::api::Uuid;

    fn author(name: &str) -> api::User {
        api::User {
            id: api::UserId(Uuid::new_v4()),
            username: String::from(name),
            display_name: String::from(name),
            avatar_url: String::new(),
            is_moderator: false,
        }
    }

    fn comment(text: &str, children: Vec<CommentId>) -> api::Comment {
        api::Comment {
            id: CommentId(Uuid::new_v4()),
            blog: BlogId::stub(),
            author: author("someone"),
            text: String::from(text),
            created_at: Utc::now(),
            like_count: 0,
            liked_by: HashSet::new(),
            children,
        }
    }

    fn page(comments: Vec<api::Comment>, total_roots: u64) -> CommentPage {
        CommentPage {
            comments,
            total_roots,
        }
    }

    fn shape(tree: &CommentTree) -> Vec<(String, usize)> {
        tree.entries()
            .iter()
            .map(|c| (c.text.clone(), c.depth))
            .collect()
    }

    #[test]
    fn root_pages_append_at_tail() {
        let mut tree = CommentTree::new(BlogId::stub());
        let full: Vec<_> = (0..COMMENT_PAGE_SIZE)
            .map(|i| comment(&format!("c{i}"), vec![]))
            .collect();
        tree.append_root_page(page(full, 7));
        assert_eq!(tree.loaded_roots(), 5);
        assert_eq!(tree.total_roots(), 7);
        assert!(tree.has_more_roots());

        tree.append_root_page(page(vec![comment("c5", vec![]), comment("c6", vec![])], 7));
        assert_eq!(tree.loaded_roots(), 7);
        assert!(!tree.has_more_roots());
        assert_eq!(
            shape(&tree),
            (0..7)
                .map(|i| (format!("c{i}"), 0))
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn full_last_page_keeps_the_heuristic_on() {
        let mut tree = CommentTree::new(BlogId::stub());
        let full: Vec<_> = (0..COMMENT_PAGE_SIZE)
            .map(|i| comment(&format!("c{i}"), vec![]))
            .collect();
        tree.append_root_page(page(full, COMMENT_PAGE_SIZE as u64));
        // the count says we have everything, but the heuristic only looks at
        // the page being full; the next fetch comes back empty and fixes it
        assert!(tree.has_more_roots());
        tree.append_root_page(page(vec![], COMMENT_PAGE_SIZE as u64));
        assert!(!tree.has_more_roots());
        assert_eq!(tree.loaded_roots(), COMMENT_PAGE_SIZE);
    }

    #[test]
    fn expand_materializes_replies_one_level_deeper() {
        let mut tree = CommentTree::new(BlogId::stub());
        let r1 = comment("r1", vec![]);
        let r1_id = r1.id;
        let b = comment("b", vec![r1_id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![comment("a", vec![]), b], 2));

        tree.insert_replies(b_id, vec![r1]);
        assert_eq!(
            shape(&tree),
            vec![
                (String::from("a"), 0),
                (String::from("b"), 0),
                (String::from("r1"), 1),
            ]
        );
        assert!(tree.comment(b_id).unwrap().replies_expanded);
        assert_eq!(tree.materialized_replies(b_id), 1);
        assert_eq!(tree.position_of(r1_id), Some(2));
    }

    #[test]
    fn expand_then_collapse_round_trips() {
        let mut tree = CommentTree::new(BlogId::stub());
        let r = comment("r", vec![]);
        let b = comment("b", vec![r.id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![comment("a", vec![]), b, comment("c", vec![])], 3));
        let before = tree.clone();

        tree.insert_replies(b_id, vec![r]);
        tree.collapse_replies(b_id);
        assert_eq!(tree, before);
    }

    #[test]
    fn collapse_is_idempotent() {
        let mut tree = CommentTree::new(BlogId::stub());
        let r = comment("r", vec![]);
        let b = comment("b", vec![r.id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![b, comment("a", vec![])], 2));
        tree.insert_replies(b_id, vec![r]);

        tree.collapse_replies(b_id);
        let collapsed = tree.clone();
        tree.collapse_replies(b_id);
        assert_eq!(tree, collapsed);
        assert_eq!(tree.loaded_roots(), 2);
        assert_eq!(tree.total_roots(), 2);
    }

    #[test]
    fn collapse_removes_the_whole_materialized_subtree() {
        let mut tree = CommentTree::new(BlogId::stub());
        let g = comment("g", vec![]);
        let r = comment("r", vec![g.id]);
        let r_id = r.id;
        let b = comment("b", vec![r_id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![b, comment("z", vec![])], 2));
        tree.insert_replies(b_id, vec![r]);
        tree.insert_replies(r_id, vec![g]);
        assert_eq!(
            shape(&tree),
            vec![
                (String::from("b"), 0),
                (String::from("r"), 1),
                (String::from("g"), 2),
                (String::from("z"), 0),
            ]
        );

        // collapsing the root drops the grandchild too, not just one level
        tree.collapse_replies(b_id);
        assert_eq!(
            shape(&tree),
            vec![(String::from("b"), 0), (String::from("z"), 0)]
        );
    }

    #[test]
    fn reply_pages_land_after_the_existing_subtree() {
        let mut tree = CommentTree::new(BlogId::stub());
        let g = comment("g", vec![]);
        let c1 = comment("c1", vec![g.id]);
        let c2 = comment("c2", vec![]);
        let c3 = comment("c3", vec![]);
        let c1_id = c1.id;
        let b = comment("b", vec![c1_id, c2.id, c3.id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![b], 1));

        tree.insert_replies(b_id, vec![c1, c2]);
        tree.insert_replies(c1_id, vec![g]);
        // the next page of b's replies goes after g's block, where pre-order
        // puts the next direct child
        tree.insert_replies(b_id, vec![c3]);
        assert_eq!(
            shape(&tree),
            vec![
                (String::from("b"), 0),
                (String::from("c1"), 1),
                (String::from("g"), 2),
                (String::from("c2"), 1),
                (String::from("c3"), 1),
            ]
        );
        assert_eq!(tree.materialized_replies(b_id), 3);
        assert_eq!(tree.materialized_replies(c1_id), 1);
    }

    #[test]
    fn new_root_comment_lands_at_the_front() {
        let mut tree = CommentTree::new(BlogId::stub());
        tree.append_root_page(page(vec![comment("old", vec![])], 1));

        tree.prepend_root(comment("new", vec![]));
        assert_eq!(
            shape(&tree),
            vec![(String::from("new"), 0), (String::from("old"), 0)]
        );
        assert_eq!(tree.loaded_roots(), 2);
        assert_eq!(tree.total_roots(), 2);
    }

    #[test]
    fn new_reply_lands_right_under_its_parent() {
        let mut tree = CommentTree::new(BlogId::stub());
        let r = comment("r", vec![]);
        let a = comment("a", vec![r.id]);
        let a_id = a.id;
        let b = comment("b", vec![]);
        let b_id = b.id;
        tree.append_root_page(page(vec![a, b], 2));
        // another expanded subtree earlier in the list must not shift where
        // the reply to b goes
        tree.insert_replies(a_id, vec![r]);

        let reply = comment("hi", vec![]);
        let reply_id = reply.id;
        tree.insert_reply(b_id, reply);

        let b_idx = tree.position_of(b_id).unwrap();
        assert_eq!(tree.position_of(reply_id), Some(b_idx + 1));
        assert_eq!(tree.get(b_idx + 1).unwrap().depth, 1);
        let b_entry = tree.comment(b_id).unwrap();
        assert!(b_entry.replies_expanded);
        assert_eq!(b_entry.children, vec![reply_id]);
        // root bookkeeping is untouched by replies
        assert_eq!(tree.loaded_roots(), 2);
        assert_eq!(tree.total_roots(), 2);
    }

    #[test]
    fn deleting_a_subtree_cascades_and_fixes_counters() {
        // the scenario: roots a and b, b has reply r1, r1 gets a new reply
        let mut tree = CommentTree::new(BlogId::stub());
        let r1 = comment("r1", vec![]);
        let r1_id = r1.id;
        let b = comment("b", vec![r1_id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![comment("a", vec![]), b], 2));
        tree.insert_replies(b_id, vec![r1]);
        tree.insert_reply(r1_id, comment("hi", vec![]));
        assert_eq!(
            shape(&tree),
            vec![
                (String::from("a"), 0),
                (String::from("b"), 0),
                (String::from("r1"), 1),
                (String::from("hi"), 2),
            ]
        );

        tree.remove(b_id);
        assert_eq!(shape(&tree), vec![(String::from("a"), 0)]);
        assert_eq!(tree.loaded_roots(), 1);
        assert_eq!(tree.total_roots(), 1);
    }

    #[test]
    fn deleting_a_reply_updates_its_parent() {
        let mut tree = CommentTree::new(BlogId::stub());
        let r1 = comment("r1", vec![]);
        let r2 = comment("r2", vec![]);
        let r1_id = r1.id;
        let r2_id = r2.id;
        let b = comment("b", vec![r1_id, r2_id]);
        let b_id = b.id;
        tree.append_root_page(page(vec![b], 1));
        tree.insert_replies(b_id, vec![r1, r2]);

        tree.remove(r1_id);
        let b_entry = tree.comment(b_id).unwrap();
        assert_eq!(b_entry.children, vec![r2_id]);
        assert!(b_entry.replies_expanded);
        // roots were not touched
        assert_eq!(tree.loaded_roots(), 1);
        assert_eq!(tree.total_roots(), 1);

        tree.remove(r2_id);
        let b_entry = tree.comment(b_id).unwrap();
        assert!(b_entry.children.is_empty());
        assert!(!b_entry.replies_expanded);
    }

    #[test]
    fn deleting_the_last_loaded_root_empties_the_tree() {
        let mut tree = CommentTree::new(BlogId::stub());
        let a = comment("a", vec![]);
        let a_id = a.id;
        tree.append_root_page(page(vec![a], 1));

        tree.remove(a_id);
        assert!(tree.is_empty());
        assert_eq!(tree.loaded_roots(), 0);
        assert_eq!(tree.total_roots(), 0);
    }

    #[test]
    fn failed_like_rolls_back_to_the_exact_previous_state() {
        let mut tree = CommentTree::new(BlogId::stub());
        let me = api::UserId(Uuid::new_v4());
        let mut c = comment("c", vec![]);
        c.like_count = 3;
        c.liked_by = [api::UserId(Uuid::new_v4()), api::UserId(Uuid::new_v4())]
            .into_iter()
            .collect();
        let c_id = c.id;
        tree.append_root_page(page(vec![c], 1));
        let before = tree.comment(c_id).unwrap().clone();

        let delta = tree.apply_like(c_id, me).unwrap();
        {
            let liked = tree.comment(c_id).unwrap();
            assert_eq!(liked.like_count, 4);
            assert!(liked.liked_by_me(&me));
            assert!(delta.now_liked);
        }

        // the backend refused: compensate, do not re-fetch
        tree.rollback_like(&delta);
        assert_eq!(tree.comment(c_id).unwrap(), &before);
    }

    #[test]
    fn unliking_rolls_back_too() {
        let mut tree = CommentTree::new(BlogId::stub());
        let me = api::UserId(Uuid::new_v4());
        let mut c = comment("c", vec![]);
        c.like_count = 1;
        c.liked_by = [me].into_iter().collect();
        let c_id = c.id;
        tree.append_root_page(page(vec![c], 1));
        let before = tree.comment(c_id).unwrap().clone();

        let delta = tree.apply_like(c_id, me).unwrap();
        assert_eq!(tree.comment(c_id).unwrap().like_count, 0);
        assert!(!delta.now_liked);

        tree.rollback_like(&delta);
        assert_eq!(tree.comment(c_id).unwrap(), &before);
    }

    #[test]
    fn operations_on_unloaded_comments_change_nothing() {
        let mut tree = CommentTree::new(BlogId::stub());
        tree.append_root_page(page(vec![comment("a", vec![])], 1));
        let before = tree.clone();
        let gone = CommentId(Uuid::new_v4());

        tree.insert_replies(gone, vec![comment("r", vec![])]);
        tree.collapse_replies(gone);
        tree.insert_reply(gone, comment("r", vec![]));
        tree.remove(gone);
        assert_eq!(tree.apply_like(gone, api::UserId(Uuid::new_v4())), None);
        assert_eq!(tree, before);
    }

    #[test]
    fn reset_bumps_the_generation_and_clears_everything() {
        let mut tree = CommentTree::new(BlogId::stub());
        tree.append_root_page(page(vec![comment("a", vec![])], 1));
        let generation = tree.generation();

        let other = BlogId(Uuid::new_v4());
        tree.reset(other);
        assert_eq!(tree.blog(), other);
        assert_eq!(tree.generation(), generation + 1);
        assert!(tree.is_empty());
        assert_eq!(tree.loaded_roots(), 0);
        assert_eq!(tree.total_roots(), 0);
        assert!(tree.has_more_roots());
    }
}
