use thiserror::Error;

/// Caller-recoverable outcomes. The API layer maps these to user-facing
/// responses; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot follow yourself")]
    SelfFollow,
    #[error("already following")]
    AlreadyFollowing,
    #[error("follow request already sent")]
    RequestAlreadySent,
    #[error("not following")]
    NotFollowing,
    #[error("blocked")]
    Blocked,
    #[error("not a moderator")]
    NotModerator,
    #[error("comment has active replies")]
    HasActiveReplies,
    #[error("follower limit reached")]
    FollowerLimit,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
