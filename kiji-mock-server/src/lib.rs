//! An in-memory stand-in for the real backend, with the same visible
//! behavior as the production API.
//!
//! This is used by comparative tests: run every operation against both
//! the client-side state and this server, then check they agree.

use std::collections::{btree_map, BTreeMap, HashMap, HashSet};

use chrono::Utc;
use kiji_api::{
    AuthToken, Blog, BlogId, BlogStats, BlogView, Comment, CommentId, CommentPage,
    CommentsRequest, ConversationRequest, DirectMessage, Error, FeedMessage, LatestBlogsRequest,
    MessageId, NewBlog, NewComment, NewMessage, NewReport, NewSession, NewUser, Notification,
    NotificationId, NotificationKind, RepliesRequest, Report, ReportId, ReportStatus,
    ReportTarget, User, UserId, Uuid, BLOG_PAGE_SIZE, COMMENT_PAGE_SIZE, MESSAGE_PAGE_SIZE,
};
use tokio::sync::mpsc;

#[derive(Debug)]
struct Device(#[allow(dead_code)] String);

#[derive(Debug)]
struct DbUser {
    user: User,
    pass: String,
    pass_hash: String,
    sessions: HashMap<AuthToken, Device>,
    feeds: Vec<mpsc::UnboundedSender<FeedMessage>>,
    bookmarks: HashSet<BlogId>,
    following: HashSet<UserId>,
    notifications: Vec<Notification>,
    messages: Vec<DirectMessage>,
}

impl DbUser {
    async fn relay_feed(&mut self, m: FeedMessage) {
        self.feeds
            .retain_mut(|f| matches!(f.send(m.clone()), Ok(())));
    }
}

#[derive(Debug)]
struct DbBlog {
    blog: Blog,
    liked_by: HashSet<UserId>,
    /// Root comments, in creation order
    roots: Vec<CommentId>,
}

/// `comment.children` on this record is the authoritative list of direct
/// replies, in creation order
#[derive(Debug)]
struct DbComment {
    comment: Comment,
    parent: Option<CommentId>,
}

pub struct MockServer {
    users: BTreeMap<UserId, DbUser>,
    blogs: BTreeMap<BlogId, DbBlog>,
    comments: HashMap<CommentId, DbComment>,
    reports: Vec<Report>,
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: BTreeMap::new(),
            blogs: BTreeMap::new(),
            comments: HashMap::new(),
            reports: Vec::new(),
        }
    }

    /// Return id, username and password for user number `id`
    pub fn test_get_user_info(&self, id: usize) -> (UserId, &str, &str) {
        let u = self
            .users
            .values()
            .nth(id)
            .unwrap_or_else(|| panic!("getting user {id} among {}", self.users.len()));
        (u.user.id, &u.user.username, &u.pass)
    }

    /// Return the current number of users
    pub fn test_num_users(&self) -> usize {
        self.users.len()
    }

    /// Snapshot of one stored comment
    pub fn test_comment(&self, comment: CommentId) -> Option<Comment> {
        self.comments.get(&comment).map(|db| db.comment.clone())
    }

    /// Root comments of a blog, in creation order
    pub fn test_root_comments(&self, blog: BlogId) -> Vec<CommentId> {
        self.blogs
            .get(&blog)
            .map(|db| db.roots.clone())
            .unwrap_or_default()
    }

    pub fn admin_create_user(&mut self, u: NewUser, password: String) -> Result<(), Error> {
        u.validate()?;

        if self.users.values().any(|db| db.user.username == u.username) {
            return Err(Error::NameAlreadyUsed(u.username));
        }

        match self.users.entry(u.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(u.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(DbUser {
                    user: User {
                        id: u.id,
                        // the real backend derives the avatar from the username
                        avatar_url: format!("https://avatars.example.org/{}.svg", u.username),
                        username: u.username,
                        display_name: u.display_name,
                        is_moderator: u.is_moderator,
                    },
                    pass: password,
                    pass_hash: u.initial_password_hash,
                    sessions: HashMap::new(),
                    feeds: Vec::new(),
                    bookmarks: HashSet::new(),
                    following: HashSet::new(),
                    notifications: Vec::new(),
                    messages: Vec::new(),
                });
                Ok(())
            }
        }
    }

    pub fn auth(&mut self, s: NewSession) -> Result<AuthToken, Error> {
        s.validate()?;
        for u in self.users.values_mut() {
            if u.user.username == s.user {
                // tests (of which mock-server is a part) don't actually hash passwords
                if s.password != u.pass_hash {
                    return Err(Error::PermissionDenied);
                } else {
                    let tok = AuthToken(Uuid::new_v4());
                    u.sessions.insert(tok, Device(s.device));
                    return Ok(tok);
                }
            }
        }
        Err(Error::PermissionDenied)
    }

    fn resolve(&self, tok: AuthToken) -> Result<&DbUser, Error> {
        self.users
            .values()
            .find(|u| u.sessions.contains_key(&tok))
            .ok_or(Error::PermissionDenied)
    }

    fn resolve_mut(&mut self, tok: AuthToken) -> Result<&mut DbUser, Error> {
        self.users
            .values_mut()
            .find(|u| u.sessions.contains_key(&tok))
            .ok_or(Error::PermissionDenied)
    }

    pub fn unauth(&mut self, tok: AuthToken) -> Result<(), Error> {
        let u = self.resolve_mut(tok)?;
        u.sessions.remove(&tok);
        Ok(())
    }

    pub fn whoami(&self, tok: AuthToken) -> Result<User, Error> {
        Ok(self.resolve(tok)?.user.clone())
    }

    pub fn create_blog(&mut self, tok: AuthToken, b: NewBlog) -> Result<Blog, Error> {
        b.validate()?;
        let author = self.resolve(tok)?.user.clone();
        match self.blogs.entry(b.id) {
            btree_map::Entry::Occupied(mut entry) => {
                // saving over an existing id is how the editor updates a draft
                let stored = entry.get_mut();
                if stored.blog.author.id != author.id {
                    return Err(Error::UuidAlreadyUsed(b.id.0));
                }
                let was_draft = stored.blog.is_draft;
                stored.blog.title = b.title;
                stored.blog.description = b.description;
                stored.blog.banner_url = b.banner_url;
                stored.blog.content = b.content;
                stored.blog.tags = b.tags;
                stored.blog.is_draft = b.is_draft;
                if was_draft && !b.is_draft {
                    stored.blog.published_at = Utc::now();
                }
                Ok(stored.blog.clone())
            }
            btree_map::Entry::Vacant(entry) => {
                let blog = Blog {
                    id: b.id,
                    author,
                    title: b.title,
                    description: b.description,
                    banner_url: b.banner_url,
                    content: b.content,
                    tags: b.tags,
                    is_draft: b.is_draft,
                    published_at: Utc::now(),
                    stats: BlogStats::default(),
                };
                entry.insert(DbBlog {
                    blog: blog.clone(),
                    liked_by: HashSet::new(),
                    roots: Vec::new(),
                });
                Ok(blog)
            }
        }
    }

    pub fn fetch_latest_blogs(
        &self,
        tok: AuthToken,
        req: LatestBlogsRequest,
    ) -> Result<Vec<Blog>, Error> {
        self.resolve(tok)?;
        let mut blogs = self
            .blogs
            .values()
            .map(|db| &db.blog)
            .filter(|b| !b.is_draft)
            .collect::<Vec<_>>();
        blogs.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(blogs
            .into_iter()
            .skip(req.skip)
            .take(BLOG_PAGE_SIZE)
            .cloned()
            .collect())
    }

    pub fn fetch_blog(&mut self, tok: AuthToken, blog: BlogId) -> Result<BlogView, Error> {
        let me = self.resolve(tok)?.user.id;
        let db = match self.blogs.get_mut(&blog) {
            None => return Err(Error::UnknownBlog(blog.0)),
            Some(db) => db,
        };
        // drafts are only visible to their author
        if db.blog.is_draft && db.blog.author.id != me {
            return Err(Error::UnknownBlog(blog.0));
        }
        if db.blog.author.id != me {
            db.blog.stats.total_reads += 1;
        }
        let liked = db.liked_by.contains(&me);
        let view = db.blog.clone();
        let author = view.author.id;
        let u = self.resolve(tok)?;
        Ok(BlogView {
            blog: view,
            liked,
            bookmarked: u.bookmarks.contains(&blog),
            following_author: u.following.contains(&author),
        })
    }

    pub fn fetch_comments(
        &self,
        tok: AuthToken,
        req: CommentsRequest,
    ) -> Result<CommentPage, Error> {
        self.resolve(tok)?;
        let db = match self.blogs.get(&req.blog) {
            None => return Err(Error::UnknownBlog(req.blog.0)),
            Some(db) => db,
        };
        Ok(CommentPage {
            comments: db
                .roots
                .iter()
                .rev()
                .skip(req.skip)
                .take(COMMENT_PAGE_SIZE)
                .map(|id| self.comments[id].comment.clone())
                .collect(),
            total_roots: db.roots.len() as u64,
        })
    }

    pub fn fetch_replies(
        &self,
        tok: AuthToken,
        req: RepliesRequest,
    ) -> Result<Vec<Comment>, Error> {
        self.resolve(tok)?;
        let db = match self.comments.get(&req.comment) {
            None => return Err(Error::UnknownComment(req.comment.0)),
            Some(db) => db,
        };
        Ok(db
            .comment
            .children
            .iter()
            .rev()
            .skip(req.skip)
            .take(COMMENT_PAGE_SIZE)
            .map(|id| self.comments[id].comment.clone())
            .collect())
    }

    pub async fn add_comment(&mut self, tok: AuthToken, c: NewComment) -> Result<Comment, Error> {
        c.validate()?;
        let author = self.resolve(tok)?.user.clone();
        let parent = match c.replying_to {
            None => None,
            Some(p) => match self.comments.get(&p) {
                None => return Err(Error::UnknownComment(p.0)),
                Some(db) if db.comment.blog != c.blog => return Err(Error::UnknownComment(p.0)),
                Some(db) => Some((p, db.comment.author.id)),
            },
        };
        let comment = {
            let blog = match self.blogs.get_mut(&c.blog) {
                None => return Err(Error::UnknownBlog(c.blog.0)),
                Some(db) => db,
            };
            let comment = Comment {
                id: CommentId(Uuid::new_v4()),
                blog: c.blog,
                author: author.clone(),
                text: c.text,
                created_at: Utc::now(),
                like_count: 0,
                liked_by: HashSet::new(),
                children: Vec::new(),
            };
            blog.blog.stats.total_comments += 1;
            if parent.is_none() {
                blog.roots.push(comment.id);
                blog.blog.stats.total_parent_comments += 1;
            }
            comment
        };
        if let Some((p, _)) = parent {
            self.comments
                .get_mut(&p)
                .expect("parent checked above")
                .comment
                .children
                .push(comment.id);
        }
        self.comments.insert(
            comment.id,
            DbComment {
                comment: comment.clone(),
                parent: parent.map(|(p, _)| p),
            },
        );
        let blog_author = self.blogs[&c.blog].blog.author.id;
        let notify = match parent {
            None if blog_author != author.id => Some((
                blog_author,
                NotificationKind::NewComment {
                    blog: c.blog,
                    comment: comment.id,
                },
            )),
            Some((p, parent_author)) if parent_author != author.id => Some((
                parent_author,
                NotificationKind::NewReply {
                    blog: c.blog,
                    comment: comment.id,
                    replying_to: p,
                },
            )),
            _ => None,
        };
        if let Some((recipient, kind)) = notify {
            self.notify(recipient, author, kind).await;
        }
        Ok(comment)
    }

    pub fn delete_comment(&mut self, tok: AuthToken, comment: CommentId) -> Result<(), Error> {
        let me = self.resolve(tok)?.user.id;
        let (blog, author) = match self.comments.get(&comment) {
            None => return Err(Error::UnknownComment(comment.0)),
            Some(db) => (db.comment.blog, db.comment.author.id),
        };
        // the comment's author can delete it, and so can the blog's author
        let blog_author = self.blogs[&blog].blog.author.id;
        if me != author && me != blog_author {
            return Err(Error::PermissionDenied);
        }
        self.delete_comment_records(comment);
        Ok(())
    }

    /// Delete a comment and all its descendants, fixing blog bookkeeping
    fn delete_comment_records(&mut self, comment: CommentId) {
        let removed = match self.comments.remove(&comment) {
            None => return,
            Some(db) => db,
        };
        let mut stack = removed.comment.children.clone();
        let mut deleted = 1u64;
        while let Some(c) = stack.pop() {
            if let Some(db) = self.comments.remove(&c) {
                stack.extend(db.comment.children.iter().copied());
                deleted += 1;
            }
        }
        if let Some(parent) = removed.parent {
            if let Some(db) = self.comments.get_mut(&parent) {
                db.comment.children.retain(|c| *c != comment);
            }
        }
        if let Some(db) = self.blogs.get_mut(&removed.comment.blog) {
            let stats = &mut db.blog.stats;
            stats.total_comments = stats.total_comments.saturating_sub(deleted);
            if removed.parent.is_none() {
                db.roots.retain(|c| *c != comment);
                stats.total_parent_comments = stats.total_parent_comments.saturating_sub(1);
            }
        }
    }

    pub fn toggle_comment_like(&mut self, tok: AuthToken, comment: CommentId) -> Result<(), Error> {
        let me = self.resolve(tok)?.user.id;
        let c = match self.comments.get_mut(&comment) {
            None => return Err(Error::UnknownComment(comment.0)),
            Some(db) => &mut db.comment,
        };
        match c.liked_by.contains(&me) {
            true => {
                c.liked_by.remove(&me);
                c.like_count = c.like_count.saturating_sub(1);
            }
            false => {
                c.liked_by.insert(me);
                c.like_count += 1;
            }
        }
        Ok(())
    }

    pub async fn toggle_blog_like(&mut self, tok: AuthToken, blog: BlogId) -> Result<(), Error> {
        let actor = self.resolve(tok)?.user.clone();
        let (author, now_liked) = {
            let db = match self.blogs.get_mut(&blog) {
                None => return Err(Error::UnknownBlog(blog.0)),
                Some(db) => db,
            };
            if db.blog.is_draft {
                return Err(Error::UnknownBlog(blog.0));
            }
            match db.liked_by.contains(&actor.id) {
                true => {
                    db.liked_by.remove(&actor.id);
                    db.blog.stats.total_likes = db.blog.stats.total_likes.saturating_sub(1);
                    (db.blog.author.id, false)
                }
                false => {
                    db.liked_by.insert(actor.id);
                    db.blog.stats.total_likes += 1;
                    (db.blog.author.id, true)
                }
            }
        };
        if now_liked && author != actor.id {
            self.notify(author, actor, NotificationKind::BlogLiked(blog))
                .await;
        }
        Ok(())
    }

    pub fn toggle_bookmark(&mut self, tok: AuthToken, blog: BlogId) -> Result<(), Error> {
        if !self.blogs.contains_key(&blog) {
            return Err(Error::UnknownBlog(blog.0));
        }
        let u = self.resolve_mut(tok)?;
        if !u.bookmarks.remove(&blog) {
            u.bookmarks.insert(blog);
        }
        Ok(())
    }

    pub async fn toggle_follow(&mut self, tok: AuthToken, target: UserId) -> Result<(), Error> {
        let actor = self.resolve(tok)?.user.clone();
        if actor.id == target {
            return Err(Error::InvalidSubmission(String::from(
                "cannot follow yourself",
            )));
        }
        if !self.users.contains_key(&target) {
            return Err(Error::UnknownUser(target.0));
        }
        let u = self.resolve_mut(tok)?;
        let now_following = match u.following.remove(&target) {
            true => false,
            false => {
                u.following.insert(target);
                true
            }
        };
        if now_following {
            self.notify(target, actor, NotificationKind::NewFollower)
                .await;
        }
        Ok(())
    }

    async fn notify(&mut self, recipient: UserId, actor: User, kind: NotificationKind) {
        let n = Notification {
            id: NotificationId(Uuid::new_v4()),
            actor,
            recipient,
            kind,
            seen: false,
            created_at: Utc::now(),
        };
        if let Some(u) = self.users.get_mut(&recipient) {
            u.notifications.push(n.clone());
            u.relay_feed(FeedMessage::Notification(n)).await;
        }
    }

    /// Newest first
    pub fn fetch_notifications(&self, tok: AuthToken) -> Result<Vec<Notification>, Error> {
        let u = self.resolve(tok)?;
        Ok(u.notifications.iter().rev().cloned().collect())
    }

    pub fn mark_notifications_seen(&mut self, tok: AuthToken) -> Result<(), Error> {
        let u = self.resolve_mut(tok)?;
        for n in &mut u.notifications {
            n.seen = true;
        }
        Ok(())
    }

    pub async fn send_message(
        &mut self,
        tok: AuthToken,
        m: NewMessage,
    ) -> Result<DirectMessage, Error> {
        m.validate()?;
        let from = self.resolve(tok)?.user.id;
        if from == m.to {
            return Err(Error::InvalidSubmission(String::from(
                "cannot message yourself",
            )));
        }
        if !self.users.contains_key(&m.to) {
            return Err(Error::UnknownUser(m.to.0));
        }
        let msg = DirectMessage {
            id: MessageId(Uuid::new_v4()),
            from,
            to: m.to,
            text: m.text,
            sent_at: Utc::now(),
        };
        for uid in [from, m.to] {
            if let Some(u) = self.users.get_mut(&uid) {
                u.messages.push(msg.clone());
                u.relay_feed(FeedMessage::Message(msg.clone())).await;
            }
        }
        Ok(msg)
    }

    /// Newest first
    pub fn fetch_conversation(
        &self,
        tok: AuthToken,
        req: ConversationRequest,
    ) -> Result<Vec<DirectMessage>, Error> {
        let u = self.resolve(tok)?;
        Ok(u.messages
            .iter()
            .rev()
            .filter(|m| m.from == req.with || m.to == req.with)
            .skip(req.skip)
            .take(MESSAGE_PAGE_SIZE)
            .cloned()
            .collect())
    }

    /// Conversation partners, most recently active first
    pub fn fetch_conversations(&self, tok: AuthToken) -> Result<Vec<User>, Error> {
        let u = self.resolve(tok)?;
        let me = u.user.id;
        let mut partners = Vec::new();
        for m in u.messages.iter().rev() {
            let other = match m.from == me {
                true => m.to,
                false => m.from,
            };
            if !partners.contains(&other) {
                partners.push(other);
            }
        }
        Ok(partners
            .into_iter()
            .filter_map(|id| self.users.get(&id).map(|db| db.user.clone()))
            .collect())
    }

    pub fn submit_report(&mut self, tok: AuthToken, r: NewReport) -> Result<Report, Error> {
        r.validate()?;
        let reporter = self.resolve(tok)?.user.id;
        match r.target {
            ReportTarget::Blog(b) if !self.blogs.contains_key(&b) => {
                return Err(Error::UnknownBlog(b.0))
            }
            ReportTarget::Comment(c) if !self.comments.contains_key(&c) => {
                return Err(Error::UnknownComment(c.0))
            }
            _ => (),
        }
        let report = Report {
            id: ReportId(Uuid::new_v4()),
            reporter,
            target: r.target,
            reason: r.reason,
            details: r.details,
            status: ReportStatus::Open,
            created_at: Utc::now(),
        };
        self.reports.push(report.clone());
        Ok(report)
    }

    pub fn fetch_open_reports(&self, tok: AuthToken) -> Result<Vec<Report>, Error> {
        let u = self.resolve(tok)?;
        if !u.user.is_moderator {
            return Err(Error::PermissionDenied);
        }
        Ok(self
            .reports
            .iter()
            .filter(|r| r.status == ReportStatus::Open)
            .cloned()
            .collect())
    }

    pub fn resolve_report(
        &mut self,
        tok: AuthToken,
        report: ReportId,
        status: ReportStatus,
    ) -> Result<(), Error> {
        let u = self.resolve(tok)?;
        if !u.user.is_moderator {
            return Err(Error::PermissionDenied);
        }
        if status == ReportStatus::Open {
            return Err(Error::InvalidSubmission(String::from(
                "reviewing a report cannot leave it open",
            )));
        }
        let target = match self.reports.iter_mut().find(|r| r.id == report) {
            None => {
                return Err(Error::InvalidSubmission(String::from(
                    "unknown report",
                )))
            }
            Some(r) => {
                r.status = status;
                r.target
            }
        };
        if status == ReportStatus::ContentRemoved {
            match target {
                ReportTarget::Comment(c) => self.delete_comment_records(c),
                ReportTarget::Blog(b) => self.delete_blog_records(b),
            }
        }
        Ok(())
    }

    fn delete_blog_records(&mut self, blog: BlogId) {
        if self.blogs.remove(&blog).is_some() {
            self.comments.retain(|_, db| db.comment.blog != blog);
        }
    }

    pub async fn feed(
        &mut self,
        tok: AuthToken,
    ) -> Result<mpsc::UnboundedReceiver<FeedMessage>, Error> {
        let u = self.resolve_mut(tok)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        u.feeds.push(sender);
        Ok(receiver)
    }
}
