#![cfg(test)]

use async_recursion::async_recursion;
use kiji_mock_server::MockServer;
use std::{
    cmp,
    collections::HashSet,
    ops::RangeTo,
    panic::AssertUnwindSafe,
};

use crate::{
    api::{
        AuthToken, Block, BlogId, CommentId, CommentsRequest, Error, NewBlog, NewComment,
        NewSession, NewUser, RepliesRequest, UserId, Uuid,
    },
    CommentTree,
};

macro_rules! do_tokio_test {
    ( $name:ident, $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                tracing_subscriber::fmt::init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    CreateUser(NewUser),
    Auth {
        uid: usize,
        #[generator(bolero::generator::gen_with::<String>().len(1..100usize))]
        device: String,
    },
    LoadMoreRoots {
        sid: usize,
    },
    ExpandReplies {
        sid: usize,
        cid: usize,
    },
    LoadMoreReplies {
        sid: usize,
        cid: usize,
    },
    CollapseReplies {
        cid: usize,
    },
    AddRootComment {
        sid: usize,
        #[generator(bolero::generator::gen_with::<String>().len(1..100usize))]
        text: String,
    },
    AddReply {
        sid: usize,
        cid: usize,
        #[generator(bolero::generator::gen_with::<String>().len(1..100usize))]
        text: String,
    },
    DeleteComment {
        sid: usize,
        cid: usize,
    },
    ToggleCommentLike {
        sid: usize,
        cid: usize,
        backend_fails: bool,
    },
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

#[derive(Clone, Copy)]
struct Session {
    user: UserId,
    token: AuthToken,
}

struct ComparativeFuzzer {
    mock: MockServer,
    blog: BlogId,
    blog_author: UserId,
    sessions: Vec<Session>,
    tree: CommentTree,
}

impl ComparativeFuzzer {
    fn new() -> ComparativeFuzzer {
        let mut mock = MockServer::new();
        mock.admin_create_user(
            NewUser {
                id: UserId(Uuid::new_v4()),
                username: String::from("author"),
                display_name: String::from("Author"),
                initial_password_hash: String::from("password"),
                is_moderator: false,
            },
            String::from("password"),
        )
        .expect("creating the blog author");
        let token = mock
            .auth(NewSession {
                user: String::from("author"),
                password: String::from("password"),
                device: String::from("fuzzer"),
            })
            .expect("authenticating the blog author");
        let (blog_author, _, _) = mock.test_get_user_info(0);
        let blog = mock
            .create_blog(
                token,
                NewBlog {
                    id: BlogId(Uuid::new_v4()),
                    title: String::from("Fuzzing blog"),
                    description: String::from("About fuzzing"),
                    banner_url: String::new(),
                    content: vec![Block::Paragraph(String::from("hello"))],
                    tags: vec![String::from("fuzz")],
                    is_draft: false,
                },
            )
            .expect("creating the blog under test")
            .id;
        ComparativeFuzzer {
            mock,
            blog,
            blog_author,
            sessions: vec![Session {
                user: blog_author,
                token,
            }],
            tree: CommentTree::new(blog),
        }
    }

    fn session(&self, sid: usize) -> Session {
        let sid = resize_int(sid, ..self.sessions.len()).expect("there is always a session");
        self.sessions[sid]
    }

    /// Picks one displayed comment, or None while nothing is displayed
    fn entry_id(&self, cid: usize) -> Option<CommentId> {
        resize_int(cid, ..self.tree.entries().len()).map(|idx| self.tree.entries()[idx].id)
    }

    #[async_recursion]
    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        match op {
            FuzzOp::CreateUser(new_user) => {
                // no hashing for tests
                let pass = new_user.initial_password_hash.clone();
                let valid = new_user.validate().is_ok();
                let res = self.mock.admin_create_user(new_user, pass);
                if !valid {
                    assert!(res.is_err(), "an invalid user was accepted");
                }
                // a valid user can still hit a name or uuid conflict
            }
            FuzzOp::Auth { uid, device } => {
                match resize_int(uid, ..self.mock.test_num_users()) {
                    Some(uid) => {
                        let (user, username, password) = self.mock.test_get_user_info(uid);
                        let session = NewSession {
                            user: String::from(username),
                            password: String::from(password),
                            device,
                        };
                        let valid = session.validate().is_ok();
                        match self.mock.auth(session) {
                            Ok(token) => {
                                assert!(valid);
                                self.sessions.push(Session { user, token });
                            }
                            Err(_) => assert!(!valid, "auth with known credentials failed"),
                        }
                    }
                    None => {
                        self.execute_fuzz_op(FuzzOp::CreateUser(NewUser {
                            id: UserId(Uuid::new_v4()),
                            username: format!("user{}", self.mock.test_num_users()),
                            display_name: String::from("User"),
                            initial_password_hash: String::from("password"),
                            is_moderator: false,
                        }))
                        .await;
                        self.execute_fuzz_op(FuzzOp::Auth { uid, device }).await;
                    }
                }
            }
            FuzzOp::LoadMoreRoots { sid } => {
                let session = self.session(sid);
                let page = self
                    .mock
                    .fetch_comments(
                        session.token,
                        CommentsRequest {
                            blog: self.blog,
                            skip: self.tree.loaded_roots(),
                        },
                    )
                    .expect("fetching root comments");
                self.tree.append_root_page(page);
            }
            FuzzOp::ExpandReplies { sid, cid } => match self.entry_id(cid) {
                Some(target) => {
                    let session = self.session(sid);
                    // re-expanding starts over from the first page
                    if self.tree.comment(target).map(|c| c.replies_expanded) == Some(true) {
                        self.tree.collapse_replies(target);
                    }
                    let replies = self
                        .mock
                        .fetch_replies(
                            session.token,
                            RepliesRequest {
                                comment: target,
                                skip: 0,
                            },
                        )
                        .expect("fetching replies");
                    self.tree.insert_replies(target, replies);
                }
                None => {
                    self.with_first_comment(sid, FuzzOp::ExpandReplies { sid, cid })
                        .await
                }
            },
            FuzzOp::LoadMoreReplies { sid, cid } => match self.entry_id(cid) {
                Some(target) => {
                    let session = self.session(sid);
                    let skip = self.tree.materialized_replies(target);
                    let replies = self
                        .mock
                        .fetch_replies(
                            session.token,
                            RepliesRequest {
                                comment: target,
                                skip,
                            },
                        )
                        .expect("fetching replies");
                    self.tree.insert_replies(target, replies);
                }
                None => {
                    self.with_first_comment(sid, FuzzOp::LoadMoreReplies { sid, cid })
                        .await
                }
            },
            FuzzOp::CollapseReplies { cid } => {
                if let Some(target) = self.entry_id(cid) {
                    self.tree.collapse_replies(target);
                }
            }
            FuzzOp::AddRootComment { sid, text } => {
                let session = self.session(sid);
                let new = NewComment {
                    blog: self.blog,
                    replying_to: None,
                    text,
                };
                let valid = new.validate().is_ok();
                match self.mock.add_comment(session.token, new).await {
                    Ok(comment) => {
                        assert!(valid);
                        self.tree.prepend_root(comment);
                    }
                    Err(_) => assert!(!valid, "a valid root comment was refused"),
                }
            }
            FuzzOp::AddReply { sid, cid, text } => match self.entry_id(cid) {
                Some(target) => {
                    let session = self.session(sid);
                    let new = NewComment {
                        blog: self.blog,
                        replying_to: Some(target),
                        text,
                    };
                    let valid = new.validate().is_ok();
                    match self.mock.add_comment(session.token, new).await {
                        Ok(comment) => {
                            assert!(valid);
                            self.tree.insert_reply(target, comment);
                        }
                        Err(_) => assert!(!valid, "a valid reply was refused"),
                    }
                }
                None => {
                    self.with_first_comment(sid, FuzzOp::AddReply { sid, cid, text })
                        .await
                }
            },
            FuzzOp::DeleteComment { sid, cid } => match self.entry_id(cid) {
                Some(target) => {
                    let session = self.session(sid);
                    let author = self.tree.comment(target).map(|c| c.author.id);
                    let may_delete =
                        author == Some(session.user) || session.user == self.blog_author;
                    match self.mock.delete_comment(session.token, target) {
                        Ok(()) => {
                            assert!(may_delete, "deletion should have been refused");
                            self.tree.remove(target);
                        }
                        Err(Error::PermissionDenied) => {
                            assert!(!may_delete, "deletion should have been allowed");
                        }
                        Err(e) => panic!("unexpected deletion error: {e}"),
                    }
                }
                None => {
                    self.with_first_comment(sid, FuzzOp::DeleteComment { sid, cid })
                        .await
                }
            },
            FuzzOp::ToggleCommentLike {
                sid,
                cid,
                backend_fails,
            } => match self.entry_id(cid) {
                Some(target) => {
                    let session = self.session(sid);
                    match backend_fails {
                        true => {
                            // the rollback must restore exactly the pre-toggle state
                            let before = self.tree.clone();
                            let delta = self
                                .tree
                                .apply_like(target, session.user)
                                .expect("target is displayed");
                            self.tree.rollback_like(&delta);
                            assert_eq!(self.tree, before);
                        }
                        false => {
                            let delta = self
                                .tree
                                .apply_like(target, session.user)
                                .expect("target is displayed");
                            self.mock
                                .toggle_comment_like(session.token, target)
                                .expect("toggling a like");
                            let stored = self.mock.test_comment(target).expect("comment exists");
                            assert_eq!(stored.liked_by.contains(&session.user), delta.now_liked);
                        }
                    }
                }
                None => {
                    self.with_first_comment(
                        sid,
                        FuzzOp::ToggleCommentLike {
                            sid,
                            cid,
                            backend_fails,
                        },
                    )
                    .await
                }
            },
        }
    }

    /// Ops that need a displayed comment post one first, then retry
    async fn with_first_comment(&mut self, sid: usize, op: FuzzOp) {
        self.execute_fuzz_op(FuzzOp::AddRootComment {
            sid,
            text: String::from("first!"),
        })
        .await;
        self.execute_fuzz_op(op).await;
    }

    /// The displayed state must mirror the server after every step
    fn check_consistency(&self) {
        let entries = self.tree.entries();

        // display order is a pre-order walk: it starts at a root, only ever
        // deepens one level at a time, and never shows a comment twice
        if let Some(first) = entries.first() {
            assert_eq!(first.depth, 0, "the list must start at a root");
        }
        for w in entries.windows(2) {
            assert!(
                w[1].depth <= w[0].depth + 1,
                "depth may only deepen one level at a time"
            );
        }
        let mut seen = HashSet::new();
        for c in entries {
            assert!(seen.insert(c.id), "a comment is displayed twice");
        }

        // every displayed comment matches the server's record
        for c in entries {
            let stored = self
                .mock
                .test_comment(c.id)
                .expect("displayed comment no longer exists server-side");
            assert_eq!(c.blog, self.blog);
            assert_eq!(c.text, stored.text);
            assert_eq!(c.author, stored.author);
            assert_eq!(c.like_count, stored.like_count);
            assert_eq!(c.liked_by, stored.liked_by);
            assert_eq!(c.children, stored.children);
        }

        // displayed roots are the newest prefix of the server's root list
        let client_roots = entries
            .iter()
            .filter(|c| c.depth == 0)
            .map(|c| c.id)
            .collect::<Vec<_>>();
        let server_roots = self.mock.test_root_comments(self.blog);
        let newest_first = server_roots.iter().rev().copied().collect::<Vec<_>>();
        assert!(
            newest_first.starts_with(&client_roots),
            "displayed roots must be the newest prefix of the server's roots"
        );
        assert_eq!(self.tree.loaded_roots(), client_roots.len());
        assert_eq!(self.tree.total_roots(), server_roots.len() as u64);
        if !self.tree.has_more_roots() {
            assert_eq!(self.tree.loaded_roots() as u64, self.tree.total_roots());
        }

        // and under each displayed comment, the materialized direct replies
        // are the newest prefix of its reply list
        for (idx, c) in entries.iter().enumerate() {
            let mut materialized = Vec::new();
            for e in &entries[idx + 1..] {
                if e.depth <= c.depth {
                    break;
                }
                if e.depth == c.depth + 1 {
                    materialized.push(e.id);
                }
            }
            let newest_first = c.children.iter().rev().copied().collect::<Vec<_>>();
            assert!(
                newest_first.starts_with(&materialized),
                "displayed replies must be the newest prefix of the parent's replies"
            );
            if !materialized.is_empty() {
                assert!(
                    c.replies_expanded,
                    "a comment with displayed replies must be marked expanded"
                );
            }
        }
    }
}

do_tokio_test!(
    comment_tree_stays_consistent_with_backend,
    bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..100usize),
    |ops: Vec<FuzzOp>| async move {
        let mut fuzzer = ComparativeFuzzer::new();
        for op in ops {
            fuzzer.execute_fuzz_op(op).await;
            fuzzer.check_consistency();
        }
    }
);
