use std::collections::HashSet;

use chrono::{Duration, Utc};
use kiji_api::{Block, Blog, BlogId, BlogStats, Comment, CommentId, Time, User, UserId};
use rand::{seq::SliceRandom, Rng};
use uuid::Uuid;

const NUM_USERS: usize = 4;
const NUM_BLOGS: usize = 12;

const MAX_BLOCKS_PER_BLOG: usize = 6;
const MAX_ROOT_COMMENTS: usize = 12;
const MAX_REPLIES: usize = 3;
const MAX_COMMENT_DEPTH: usize = 4;

const TAG_POOL: &[&str] = &[
    "rust", "cooking", "travel", "music", "photography", "gardening", "reviews",
];

const USERNAMES: &[&str] = &["alice", "bob", "carol", "dave"];

fn gen_user(i: usize) -> User {
    let username = USERNAMES[i % USERNAMES.len()];
    let mut display_name: Vec<char> = username.chars().collect();
    display_name[0] = display_name[0].to_ascii_uppercase();
    User {
        id: UserId(Uuid::new_v4()),
        username: String::from(username),
        display_name: display_name.into_iter().collect(),
        avatar_url: format!("https://avatars.example.org/{username}.svg"),
        // the first user gets to clean up whatever this generates
        is_moderator: i == 0,
    }
}

fn gen_block(rng: &mut impl Rng) -> Block {
    match rng.gen_range(0..10) {
        0 => {
            let len = rng.gen_range(2..6);
            Block::Heading {
                level: rng.gen_range(2..=3),
                text: lipsum::lipsum_words_with_rng(rng, len),
            }
        }
        1 => {
            let len = rng.gen_range(5..15);
            Block::Quote(lipsum::lipsum_words_with_rng(rng, len))
        }
        2 => Block::Code {
            language: String::from("rust"),
            code: String::from("fn main() {\n    println!(\"hello\");\n}\n"),
        },
        _ => {
            let len = rng.gen_range(30..80);
            Block::Paragraph(lipsum::lipsum_words_with_rng(rng, len))
        }
    }
}

fn gen_likes(rng: &mut impl Rng, users: &[User]) -> HashSet<UserId> {
    users
        .iter()
        .filter(|_| rng.gen_bool(0.3))
        .map(|u| u.id)
        .collect()
}

struct Generator {
    rng: rand::rngs::ThreadRng,
    users: Vec<User>,
    comments: Vec<(Comment, Option<CommentId>)>,
    /// Creation times move forward as comments are generated
    clock: Time,
}

impl Generator {
    fn gen_comment_tree(
        &mut self,
        blog: BlogId,
        parent: Option<CommentId>,
        depth: usize,
    ) -> CommentId {
        self.clock = self.clock + Duration::minutes(self.rng.gen_range(1..120));
        let author = self
            .users
            .choose(&mut self.rng)
            .expect("users is not empty")
            .clone();
        let liked_by = gen_likes(&mut self.rng, &self.users);
        let text_len = self.rng.gen_range(3..40);
        let comment = Comment {
            id: CommentId(Uuid::new_v4()),
            blog,
            author,
            text: lipsum::lipsum_words_with_rng(&mut self.rng, text_len),
            created_at: self.clock,
            like_count: liked_by.len() as u64,
            liked_by,
            children: Vec::new(),
        };
        let id = comment.id;
        let slot = self.comments.len();
        self.comments.push((comment, parent));
        if depth < MAX_COMMENT_DEPTH {
            let num_replies = self.rng.gen_range(0..=MAX_REPLIES);
            for _ in 0..num_replies {
                let child = self.gen_comment_tree(blog, Some(id), depth + 1);
                self.comments[slot].0.children.push(child);
            }
        }
        id
    }
}

fn main() {
    let mut gen = Generator {
        rng: rand::thread_rng(),
        users: (0..NUM_USERS).map(gen_user).collect(),
        comments: Vec::new(),
        clock: Utc::now() - Duration::days(365),
    };

    let mut blogs = Vec::new();
    for _ in 0..NUM_BLOGS {
        let author = gen
            .users
            .choose(&mut gen.rng)
            .expect("users is not empty")
            .clone();
        gen.clock = gen.clock + Duration::hours(gen.rng.gen_range(1..72));
        let num_blocks = gen.rng.gen_range(2..MAX_BLOCKS_PER_BLOG);
        let num_tags = gen.rng.gen_range(1..4);
        let description_len = gen.rng.gen_range(10..25);
        let blog = Blog {
            id: BlogId(Uuid::new_v4()),
            author,
            title: lipsum::lipsum_title_with_rng(&mut gen.rng),
            description: lipsum::lipsum_words_with_rng(&mut gen.rng, description_len),
            banner_url: String::new(),
            content: (0..num_blocks).map(|_| gen_block(&mut gen.rng)).collect(),
            tags: TAG_POOL
                .choose_multiple(&mut gen.rng, num_tags)
                .map(|t| String::from(*t))
                .collect(),
            is_draft: gen.rng.gen_bool(0.1),
            published_at: gen.clock,
            stats: BlogStats::default(),
        };
        let mut roots = Vec::new();
        if !blog.is_draft {
            for _ in 0..gen.rng.gen_range(0..MAX_ROOT_COMMENTS) {
                roots.push(gen.gen_comment_tree(blog.id, None, 0));
            }
        }
        blogs.push((blog, roots));
    }

    // fill in the stats now that the comments under each blog are known
    for (blog, roots) in &mut blogs {
        let total = gen
            .comments
            .iter()
            .filter(|(c, _)| c.blog == blog.id)
            .count();
        blog.stats = BlogStats {
            total_likes: gen_likes(&mut gen.rng, &gen.users).len() as u64,
            total_comments: total as u64,
            total_parent_comments: roots.len() as u64,
            total_reads: gen.rng.gen_range(10..1000),
        };
    }

    let doc = serde_json::json!({
        "users": gen.users
            .iter()
            .map(|u| serde_json::json!({ "user": u, "password": "password" }))
            .collect::<Vec<_>>(),
        "blogs": blogs
            .iter()
            .map(|(blog, roots)| serde_json::json!({ "blog": blog, "roots": roots }))
            .collect::<Vec<_>>(),
        "comments": gen.comments
            .iter()
            .map(|(c, parent)| serde_json::json!({ "comment": c, "parent": parent }))
            .collect::<Vec<_>>(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&doc).expect("serializing the fixture")
    );
}
