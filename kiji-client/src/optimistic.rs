//! Speculative toggles on a blog view: flip the flag locally, fire the
//! request, and compensate with the returned delta if the backend refuses.
//! Apply and rollback are pure so they can be tested without any network.

use crate::api::BlogView;

/// The viewer-flippable flags of a [`BlogView`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlogFlag {
    Liked,
    Bookmarked,
    FollowingAuthor,
}

/// What [`apply`] changed, to hand back to [`rollback`] on backend failure
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BlogDelta {
    pub flag: BlogFlag,
    pub now_set: bool,
}

/// Flips one of the viewer's flags before the backend has confirmed
/// anything, adjusting the like counter along with the like flag
pub fn apply(view: &mut BlogView, flag: BlogFlag) -> BlogDelta {
    let now_set = match flag {
        BlogFlag::Liked => {
            view.liked = !view.liked;
            let stats = &mut view.blog.stats;
            match view.liked {
                true => stats.total_likes += 1,
                false => stats.total_likes = stats.total_likes.saturating_sub(1),
            }
            view.liked
        }
        BlogFlag::Bookmarked => {
            view.bookmarked = !view.bookmarked;
            view.bookmarked
        }
        BlogFlag::FollowingAuthor => {
            view.following_author = !view.following_author;
            view.following_author
        }
    };
    BlogDelta { flag, now_set }
}

/// Compensates a failed toggle, restoring the exact previous state rather
/// than re-fetching
pub fn rollback(view: &mut BlogView, delta: &BlogDelta) {
    match delta.flag {
        BlogFlag::Liked => {
            view.liked = !delta.now_set;
            let stats = &mut view.blog.stats;
            match delta.now_set {
                true => stats.total_likes = stats.total_likes.saturating_sub(1),
                false => stats.total_likes += 1,
            }
        }
        BlogFlag::Bookmarked => view.bookmarked = !delta.now_set,
        BlogFlag::FollowingAuthor => view.following_author = !delta.now_set,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::api::{self, Blog, BlogStats};

    fn view() -> BlogView {
        BlogView {
            blog: Blog {
                id: api::BlogId::stub(),
                author: api::User::stub(),
                title: String::from("title"),
                description: String::from("description"),
                banner_url: String::new(),
                content: vec![api::Block::Paragraph(String::from("text"))],
                tags: vec![String::from("tag")],
                is_draft: false,
                published_at: Utc::now(),
                stats: BlogStats {
                    total_likes: 3,
                    total_comments: 0,
                    total_parent_comments: 0,
                    total_reads: 12,
                },
            },
            liked: false,
            bookmarked: false,
            following_author: true,
        }
    }

    #[test]
    fn like_toggle_adjusts_the_counter_and_rolls_back_exactly() {
        let mut v = view();
        let before = v.clone();

        let delta = apply(&mut v, BlogFlag::Liked);
        assert!(v.liked);
        assert_eq!(v.blog.stats.total_likes, 4);
        assert!(delta.now_set);

        rollback(&mut v, &delta);
        assert_eq!(v, before);
    }

    #[test]
    fn flag_only_toggles_roll_back_exactly() {
        for flag in [BlogFlag::Bookmarked, BlogFlag::FollowingAuthor] {
            let mut v = view();
            let before = v.clone();
            let delta = apply(&mut v, flag);
            assert_ne!(v, before);
            rollback(&mut v, &delta);
            assert_eq!(v, before);
        }
    }

    #[test]
    fn unlike_then_rollback_restores_the_counter() {
        let mut v = view();
        v.liked = true;
        let before = v.clone();

        let delta = apply(&mut v, BlogFlag::Liked);
        assert!(!v.liked);
        assert_eq!(v.blog.stats.total_likes, 2);
        assert!(!delta.now_set);

        rollback(&mut v, &delta);
        assert_eq!(v, before);
    }
}
