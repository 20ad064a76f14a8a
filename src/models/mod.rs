pub mod playlist;
pub mod session;
pub mod user;

pub use playlist::{
    Channel, Playlist, PlaylistCreatedResponse, PlaylistSource, PlaylistSummary,
    XtreamPlaylistRequest, UNKNOWN_DURATION,
};
pub use session::{AuthStatusResponse, CredentialsRequest, MessageResponse, Session};
pub use user::User;
