//! Profile page controller.
//!
//! Owns the page view state (loading, loaded, failed), runs the authenticated
//! fetch once per mount and turns user actions into navigation, sign-out and
//! avatar updates. Every collaborator is injected through [`ProfileDeps`].

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use profile_shared::UserProfile;
use tokio::task::JoinHandle;

use crate::api::{ApiError, ProfileMirror, ProfileSource, SessionService, SignOutOptions};
use crate::nav::{Navigator, Route};
use crate::toast::Notifier;

pub const LOAD_FAILED_MESSAGE: &str = "Impossible de charger votre profil";
pub const SIGN_OUT_FAILED_MESSAGE: &str = "Erreur lors de la déconnexion";
pub const BIO_PLACEHOLDER: &str = "Aucune description pour le moment.";

const MONTHS_FR: [&str; 12] = [
    "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre",
    "octobre", "novembre", "décembre",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    Loading,
    Loaded(UserProfile),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileTab {
    #[default]
    Info,
    Favorites,
    Activities,
}

impl ProfileTab {
    pub const ALL: [ProfileTab; 3] = [ProfileTab::Info, ProfileTab::Favorites, ProfileTab::Activities];

    pub fn title(self) -> &'static str {
        match self {
            ProfileTab::Info => "Informations",
            ProfileTab::Favorites => "Favoris",
            ProfileTab::Activities => "Activités",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ProfileTab::Info => ProfileTab::Favorites,
            ProfileTab::Favorites => ProfileTab::Activities,
            ProfileTab::Activities => ProfileTab::Info,
        }
    }
}

/// Identifies one mount of the profile page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountId(u64);

#[derive(Debug)]
pub enum ProfileEvent {
    Fetched {
        mount: MountId,
        result: Result<UserProfile, ApiError>,
    },
    AvatarChanged {
        url: String,
    },
    TabSelected(ProfileTab),
}

pub struct ProfileDeps {
    pub source: Arc<dyn ProfileSource>,
    pub session: Arc<dyn SessionService>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub mirror: Arc<dyn ProfileMirror>,
}

pub struct ProfileController {
    deps: ProfileDeps,
    state: ProfileState,
    active_tab: ProfileTab,
    last_mount: u64,
    mounted: Option<MountId>,
    fetch: Option<JoinHandle<()>>,
}

impl ProfileController {
    pub fn new(deps: ProfileDeps) -> Self {
        Self {
            deps,
            state: ProfileState::Loading,
            active_tab: ProfileTab::default(),
            last_mount: 0,
            mounted: None,
            fetch: None,
        }
    }

    pub fn state(&self) -> &ProfileState {
        &self.state
    }

    pub fn active_tab(&self) -> ProfileTab {
        self.active_tab
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        match &self.state {
            ProfileState::Loaded(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn fetch_in_flight(&self) -> bool {
        self.fetch.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Start a mount and issue its single profile fetch.
    ///
    /// The result is handed to `deliver` as [`ProfileEvent::Fetched`]; feed it
    /// back through [`ProfileController::handle`]. Returns `None` when the page
    /// is already mounted.
    pub fn mount<F>(&mut self, deliver: F) -> Option<MountId>
    where
        F: FnOnce(ProfileEvent) + Send + 'static,
    {
        if self.mounted.is_some() {
            tracing::debug!("Profile already mounted, skipping fetch");
            return None;
        }

        self.last_mount += 1;
        let mount = MountId(self.last_mount);
        self.mounted = Some(mount);
        self.state = ProfileState::Loading;
        self.active_tab = ProfileTab::default();

        tracing::debug!(mount = mount.0, "Fetching profile");
        let source = Arc::clone(&self.deps.source);
        self.fetch = Some(tokio::spawn(async move {
            let result = source.fetch_profile().await;
            deliver(ProfileEvent::Fetched { mount, result });
        }));

        Some(mount)
    }

    /// Tear the page down. Any in-flight fetch is aborted and late results
    /// for this mount are ignored.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.fetch.take() {
            handle.abort();
        }
        self.mounted = None;
    }

    pub fn handle(&mut self, event: ProfileEvent) {
        match event {
            ProfileEvent::Fetched { mount, result } => self.on_fetched(mount, result),
            ProfileEvent::AvatarChanged { url } => self.on_avatar_changed(url),
            ProfileEvent::TabSelected(tab) => self.active_tab = tab,
        }
    }

    fn on_fetched(&mut self, mount: MountId, result: Result<UserProfile, ApiError>) {
        if self.mounted != Some(mount) {
            tracing::debug!(mount = mount.0, "Dropping profile response for stale mount");
            return;
        }
        self.fetch = None;

        match result {
            Ok(profile) => {
                tracing::info!(user_id = %profile.user_id, "Profile loaded");
                self.state = ProfileState::Loaded(profile);
            }
            Err(e) => {
                tracing::warn!("Failed to load profile: {}", e);
                self.state = ProfileState::Failed;
                self.deps.notifier.error(LOAD_FAILED_MESSAGE);
                self.deps.navigator.navigate(Route::Login);
            }
        }
    }

    fn on_avatar_changed(&mut self, url: String) {
        let ProfileState::Loaded(profile) = &self.state else {
            return;
        };

        let updated = profile.with_avatar(url);
        if let Err(e) = self.deps.mirror.store(&updated) {
            tracing::debug!("Profile mirror write failed: {:#}", e);
        }
        self.state = ProfileState::Loaded(updated);
    }

    pub fn update_avatar(&mut self, url: impl Into<String>) {
        self.handle(ProfileEvent::AvatarChanged { url: url.into() });
    }

    pub fn select_tab(&mut self, tab: ProfileTab) {
        self.handle(ProfileEvent::TabSelected(tab));
    }

    /// Sign out without letting the session redirect, then go to login.
    /// On failure the user stays here and gets an error toast.
    pub async fn sign_out(&mut self) {
        let options = SignOutOptions { redirect: false };

        match self.deps.session.sign_out(options).await {
            Ok(()) => self.deps.navigator.navigate(Route::Login),
            Err(e) => {
                tracing::warn!("Sign out failed: {}", e);
                self.deps.notifier.error(SIGN_OUT_FAILED_MESSAGE);
            }
        }
    }

    pub fn go_home(&self) {
        self.deps.navigator.navigate(Route::Explore);
    }

    pub fn edit_profile(&self) {
        self.deps.navigator.navigate(Route::EditProfile);
    }

    pub fn back_to_login(&self) {
        self.deps.navigator.navigate(Route::Login);
    }
}

/// Display-ready content of the profile card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileCard<'a> {
    pub display_name: String,
    pub avatar: Option<&'a str>,
    pub location: Option<&'a str>,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub member_since: String,
    pub user_id: &'a str,
    pub about: &'a str,
}

impl<'a> ProfileCard<'a> {
    pub fn new(profile: &'a UserProfile) -> Self {
        let joined = profile
            .joined_at()
            .map(format_month_year)
            .unwrap_or_else(|| "date inconnue".to_string());

        Self {
            display_name: profile.display_name(),
            avatar: profile.avatar(),
            location: profile.location(),
            email: &profile.email,
            phone: profile.phone(),
            member_since: format!("Membre depuis {}", joined),
            user_id: &profile.user_id,
            about: profile.bio().unwrap_or(BIO_PLACEHOLDER),
        }
    }
}

/// Long month and year in French, e.g. "mars 2023"
pub fn format_month_year(date: DateTime<Utc>) -> String {
    let month = MONTHS_FR[date.month0() as usize];
    format!("{} {}", month, date.year())
}
