mod auth;
mod handoff;
mod playlist;
mod resolver;
mod state;

pub use auth::AuthenticatedSessions;
pub use auth::DEFAULT_SESSION_IDLE_TTL;
pub use auth::EXPIRY_SKEW_SECS;
pub use auth::TokenManager;
pub use auth::get_valid_credential;
pub use auth::is_expired;
pub use handoff::AuthenticatedClient;
pub use handoff::HandoffReceiver;
pub use handoff::HandoffRegistry;
pub use playlist::DEFAULT_NAME_PREFIX;
pub use playlist::KeywordQuery;
pub use playlist::PLAYLIST_DESCRIPTION;
pub use playlist::PlaylistAssembler;
pub use playlist::effective_name;
pub use playlist::keyword_queries;
pub use resolver::DEFAULT_SEARCH_LIMIT;
pub use resolver::TrackResolver;
pub use resolver::select_track;
pub use state::AuthSession;
pub use state::AuthorizationManager;
pub use state::AuthorizationRequest;
pub use state::CompletedAuthorization;
pub use state::DEFAULT_SESSION;
