use tokio::sync::watch;

use crate::identity::{AuthState, Principal, SessionSource};

/// Protected pages. Each one gets its own sign-in pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Profile,
    Compass,
    Forge,
    Recommendations,
    Discover,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub title: &'static str,
    pub message: &'static str,
}

impl Page {
    pub fn info(self) -> PageInfo {
        let (title, message) = match self {
            Page::Profile => (
                "Unlock Your Identity!",
                "This is your personal space where you can build and manage your career profile.",
            ),
            Page::Compass => (
                "Chart Your Course!",
                "Sign in to access your personalized career Compass and track your progress.",
            ),
            Page::Forge => (
                "The Anvil Awaits!",
                "Ready to test your mettle? Sign in to the Skill Forge and craft your expertise.",
            ),
            Page::Recommendations => (
                "Your Future is Calling!",
                "Sign in to discover the personalized career recommendations we've prepared just for you.",
            ),
            Page::Discover => (
                "Ready for an Adventure?",
                "Sign in to start a conversation with your AI career mentor and discover your true path.",
            ),
            Page::Other => ("Access Restricted", "Please sign in to view this page."),
        };
        PageInfo { title, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated(Principal),
    Unauthenticated,
}

impl From<&AuthState> for GuardState {
    fn from(auth: &AuthState) -> Self {
        match auth {
            AuthState::Checking => GuardState::Checking,
            AuthState::SignedIn(p) => GuardState::Authenticated(p.clone()),
            AuthState::SignedOut => GuardState::Unauthenticated,
        }
    }
}

/// What a guarded route shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Loading,
    SignInPrompt(PageInfo),
    Content(T),
}

/// Gates protected pages on session presence. Holds nothing but a handle
/// to the session source.
#[derive(Clone)]
pub struct RouteGuard {
    session: SessionSource,
}

impl RouteGuard {
    pub fn new(session: SessionSource) -> Self {
        Self { session }
    }

    pub fn state(&self) -> GuardState {
        GuardState::from(&self.session.current())
    }

    /// `content` only runs for an authenticated principal.
    pub fn render<T>(&self, page: Page, content: impl FnOnce(&Principal) -> T) -> Guarded<T> {
        match self.state() {
            GuardState::Checking => Guarded::Loading,
            GuardState::Unauthenticated => Guarded::SignInPrompt(page.info()),
            GuardState::Authenticated(principal) => Guarded::Content(content(&principal)),
        }
    }

    /// Waits until the session source has reported at least once.
    pub async fn resolved(&self) -> GuardState {
        let mut rx = self.session.subscribe();
        let state = match rx.wait_for(AuthState::is_resolved).await {
            Ok(auth) => GuardState::from(&*auth),
            Err(_) => GuardState::from(&self.session.current()),
        };
        state
    }

    pub fn changes(&self) -> watch::Receiver<AuthState> {
        self.session.subscribe()
    }
}
