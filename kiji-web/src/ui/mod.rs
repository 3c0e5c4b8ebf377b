mod app;
pub use app::{App, AppMsg, ConnState, View};

mod blog_list;
pub use blog_list::BlogList;

mod blog_page;
pub use blog_page::BlogPage;

mod comment_item;
pub use comment_item::CommentItem;

mod comment_section;
pub use comment_section::CommentSection;

mod editor;
pub use editor::Editor;

mod error_toast;
pub use error_toast::ErrorToast;

mod login;
pub use login::Login;

mod messages_view;
pub use messages_view::MessagesView;

mod moderation_queue;
pub use moderation_queue::ModerationQueue;

mod notifications_menu;
pub use notifications_menu::NotificationsMenu;

mod offline_banner;
pub use offline_banner::OfflineBanner;
