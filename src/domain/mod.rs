pub mod comment;
pub mod community;
pub mod engagement;
pub mod error;
pub mod moderation;
pub mod notification;
pub mod post;
pub mod social_graph;
pub mod user;
