pub mod bookmark;
pub mod club;
pub mod comment;
pub mod like;
pub mod membership;
pub mod membership_request;
pub mod post;
pub mod session;
pub mod user;
