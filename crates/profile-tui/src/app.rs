use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

use crate::api::{ApiAdapter, ApiClient, FileMirror, NoopMirror, ProfileMirror};
use crate::avatar::{AvatarInput, AvatarUpload, AVATAR_UPDATED_MESSAGE};
use crate::config::Config;
use crate::nav::{ChannelNavigator, Navigator, Route};
use crate::profile::{ProfileController, ProfileDeps, ProfileEvent, ProfileState, ProfileTab};
use crate::toast::{ChannelNotifier, Notifier, Toast, ToastQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VimMode {
    Normal,
    Insert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Email,
    Password,
}

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Tick,
    Navigate(Route),
    Toast(Toast),
    Profile(ProfileEvent),
}

pub struct App {
    pub api: Arc<Mutex<ApiClient>>,
    pub route: Route,
    pub vim_mode: VimMode,

    // Loading state
    pub loading: bool,
    pub loading_message: String,
    pub error_message: Option<String>,
    pub spinner_frame: usize,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_field: InputField,

    // Profile page
    pub profile: ProfileController,
    pub avatar: AvatarUpload,

    pub toasts: ToastQueue,

    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    events: UnboundedSender<AppEvent>,
    start_route: Route,
}

impl App {
    pub fn new(
        api: ApiClient,
        config: &Config,
        has_tokens: bool,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let api = Arc::new(Mutex::new(api));
        let navigator: Arc<dyn Navigator> = Arc::new(ChannelNavigator::new(events.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(ChannelNotifier::new(events.clone()));
        let adapter = Arc::new(ApiAdapter::new(api.clone(), navigator.clone()));
        let mirror: Arc<dyn ProfileMirror> = if config.mirror_enabled {
            Arc::new(FileMirror::new(config.mirror_file.clone()))
        } else {
            Arc::new(NoopMirror)
        };

        let profile = ProfileController::new(ProfileDeps {
            source: adapter.clone(),
            session: adapter,
            navigator: navigator.clone(),
            notifier: notifier.clone(),
            mirror,
        });

        let start_route = if has_tokens {
            Route::Profile
        } else {
            Route::Login
        };

        Self::from_parts(api, profile, navigator, notifier, events, start_route)
    }

    pub fn from_parts(
        api: Arc<Mutex<ApiClient>>,
        profile: ProfileController,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        events: UnboundedSender<AppEvent>,
        start_route: Route,
    ) -> Self {
        Self {
            api,
            route: Route::Login,
            vim_mode: VimMode::Normal,
            loading: false,
            loading_message: String::new(),
            error_message: None,
            spinner_frame: 0,
            login_email: String::new(),
            login_password: String::new(),
            login_field: InputField::Email,
            profile,
            avatar: AvatarUpload::default(),
            toasts: ToastQueue::default(),
            navigator,
            notifier,
            events,
            start_route,
        }
    }

    /// Enter the start route. Must run inside the tokio runtime.
    pub fn start(&mut self) {
        self.on_navigate(self.start_route);
    }

    pub fn set_loading(&mut self, loading: bool, message: &str) {
        self.loading = loading;
        self.loading_message = message.to_string();
    }

    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Everything except key presses
    pub fn on_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(_) => {}
            AppEvent::Tick => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                self.toasts.expire(Instant::now());
            }
            AppEvent::Navigate(route) => self.on_navigate(route),
            AppEvent::Toast(toast) => self.toasts.push(toast, Instant::now()),
            AppEvent::Profile(event) => self.profile.handle(event),
        }
    }

    pub fn on_navigate(&mut self, route: Route) {
        if self.route == route && (route != Route::Profile || self.profile.is_mounted()) {
            return;
        }

        if self.route == Route::Profile && route != Route::Profile {
            self.profile.unmount();
            self.avatar.cancel();
        }

        tracing::debug!(from = self.route.path(), to = route.path(), "Route change");
        self.route = route;

        if route == Route::Profile {
            let tx = self.events.clone();
            self.profile.mount(move |event| {
                let _ = tx.send(AppEvent::Profile(event));
            });
        }
    }

    /// Handle key events, returns true if app should quit
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Clear error on any key press
        if self.error_message.is_some() && key.code != KeyCode::Esc {
            self.clear_error();
        }

        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }

        match self.route {
            Route::Login => self.handle_login_key(key).await,
            Route::Profile => self.handle_profile_key(key).await,
            Route::Explore | Route::EditProfile => Ok(self.handle_placeholder_key(key)),
        }
    }

    async fn handle_login_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.loading {
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') if self.vim_mode == VimMode::Normal => return Ok(true),
            KeyCode::Esc => {
                if self.vim_mode == VimMode::Insert {
                    self.vim_mode = VimMode::Normal;
                }
            }
            KeyCode::Char('i') if self.vim_mode == VimMode::Normal => {
                self.vim_mode = VimMode::Insert;
            }
            KeyCode::Tab | KeyCode::BackTab => self.toggle_login_field(),
            KeyCode::Char('j') | KeyCode::Down if self.vim_mode == VimMode::Normal => {
                self.login_field = InputField::Password;
            }
            KeyCode::Char('k') | KeyCode::Up if self.vim_mode == VimMode::Normal => {
                self.login_field = InputField::Email;
            }
            KeyCode::Enter => {
                if !self.login_email.is_empty() && !self.login_password.is_empty() {
                    self.do_login().await;
                }
            }
            KeyCode::Char(c) if self.vim_mode == VimMode::Insert => match self.login_field {
                InputField::Email => self.login_email.push(c),
                InputField::Password => self.login_password.push(c),
            },
            KeyCode::Backspace if self.vim_mode == VimMode::Insert => match self.login_field {
                InputField::Email => {
                    self.login_email.pop();
                }
                InputField::Password => {
                    self.login_password.pop();
                }
            },
            _ => {}
        }

        Ok(false)
    }

    fn toggle_login_field(&mut self) {
        self.login_field = match self.login_field {
            InputField::Email => InputField::Password,
            InputField::Password => InputField::Email,
        };
    }

    async fn do_login(&mut self) {
        self.set_loading(true, "Connexion...");

        let email = self.login_email.clone();
        let password = self.login_password.clone();
        let result = self.api.lock().await.login(&email, &password).await;

        match result {
            Ok(()) => {
                self.login_password.clear();
                self.vim_mode = VimMode::Normal;
                self.notifier.success("Connexion réussie");
                self.navigator.navigate(Route::Profile);
            }
            Err(e) => {
                self.login_password.clear();
                self.set_error(format!("Échec de la connexion : {}", e));
            }
        }

        self.set_loading(false, "");
    }

    async fn handle_profile_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.avatar.is_editing() {
            if let AvatarInput::Changed(url) = self.avatar.handle_key(key) {
                self.profile.update_avatar(url);
                self.notifier.success(AVATAR_UPDATED_MESSAGE);
            }
            return Ok(false);
        }

        if key.code == KeyCode::Char('q') {
            return Ok(true);
        }

        if matches!(self.profile.state(), ProfileState::Loaded(_)) {
            self.handle_loaded_profile_key(key).await;
        } else if *self.profile.state() == ProfileState::Failed && key.code == KeyCode::Enter {
            self.profile.back_to_login();
        }

        Ok(false)
    }

    async fn handle_loaded_profile_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('h') => self.profile.go_home(),
            KeyCode::Char('e') => self.profile.edit_profile(),
            KeyCode::Char('a') => {
                let current = self.profile.profile().and_then(|p| p.avatar());
                self.avatar.open(current);
            }
            KeyCode::Char('L') => self.profile.sign_out().await,
            KeyCode::Tab => {
                let next = self.profile.active_tab().next();
                self.profile.select_tab(next);
            }
            KeyCode::Char('1') => self.profile.select_tab(ProfileTab::Info),
            KeyCode::Char('2') => self.profile.select_tab(ProfileTab::Favorites),
            KeyCode::Char('3') => self.profile.select_tab(ProfileTab::Activities),
            _ => {}
        }
    }

    fn handle_placeholder_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Backspace | KeyCode::Esc => self.navigator.navigate(Route::Profile),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use tokio::sync::mpsc;

    use super::*;
    use crate::profile::tests::{ana, Harness};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(
        harness: &Harness,
        start_route: Route,
    ) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = ApiClient::new("http://127.0.0.1:9", PathBuf::from("unused.json"));
        let app = App::from_parts(
            Arc::new(Mutex::new(api)),
            harness.controller(),
            harness.navigator.clone(),
            harness.notifier.clone(),
            tx,
            start_route,
        );
        (app, rx)
    }

    async fn settle_profile(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        let event = rx.recv().await.expect("profile event");
        assert!(matches!(event, AppEvent::Profile(_)));
        app.on_event(event);
    }

    #[tokio::test]
    async fn start_on_profile_mounts_and_loads() {
        let harness = Harness::new(Some(ana()));
        let (mut app, mut rx) = app_with(&harness, Route::Profile);

        app.start();
        assert_eq!(app.route, Route::Profile);
        assert!(app.profile.is_mounted());

        settle_profile(&mut app, &mut rx).await;
        assert_eq!(app.profile.state(), &ProfileState::Loaded(ana()));
    }

    #[tokio::test]
    async fn start_on_login_does_not_fetch() {
        let harness = Harness::new(Some(ana()));
        let (mut app, _rx) = app_with(&harness, Route::Login);

        app.start();

        assert_eq!(app.route, Route::Login);
        assert!(!app.profile.is_mounted());
        assert_eq!(harness.fetches(), 0);
    }

    #[tokio::test]
    async fn leaving_profile_unmounts_and_returning_refetches() {
        let harness = Harness::new(Some(ana()));
        let (mut app, mut rx) = app_with(&harness, Route::Profile);
        app.start();
        settle_profile(&mut app, &mut rx).await;

        assert!(!app.handle_key(key(KeyCode::Char('e'))).await.unwrap());
        assert_eq!(harness.routes(), vec![Route::EditProfile]);

        app.on_event(AppEvent::Navigate(Route::EditProfile));
        assert!(!app.profile.is_mounted());

        app.on_event(AppEvent::Navigate(Route::Profile));
        settle_profile(&mut app, &mut rx).await;
        assert_eq!(harness.fetches(), 2);
    }

    #[tokio::test]
    async fn profile_keys_dispatch_actions() {
        let harness = Harness::new(Some(ana()));
        let (mut app, mut rx) = app_with(&harness, Route::Profile);
        app.start();
        settle_profile(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('3'))).await.unwrap();
        assert_eq!(app.profile.active_tab(), ProfileTab::Activities);
        app.handle_key(key(KeyCode::Tab)).await.unwrap();
        assert_eq!(app.profile.active_tab(), ProfileTab::Info);

        app.handle_key(key(KeyCode::Char('h'))).await.unwrap();
        app.handle_key(key(KeyCode::Char('L'))).await.unwrap();
        assert_eq!(harness.routes(), vec![Route::Explore, Route::Login]);

        assert!(app.handle_key(key(KeyCode::Char('q'))).await.unwrap());
    }

    #[tokio::test]
    async fn avatar_picker_updates_profile() {
        let harness = Harness::new(Some(ana()));
        let (mut app, mut rx) = app_with(&harness, Route::Profile);
        app.start();
        settle_profile(&mut app, &mut rx).await;

        app.handle_key(key(KeyCode::Char('a'))).await.unwrap();
        assert!(app.avatar.is_editing());
        // 'q' while typing is text, not quit
        for c in "q.png".chars() {
            assert!(!app.handle_key(key(KeyCode::Char(c))).await.unwrap());
        }
        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        assert_eq!(app.profile.profile().unwrap().avatar(), Some("q.png"));
        assert_eq!(harness.toasts(), vec![Toast::success(AVATAR_UPDATED_MESSAGE)]);
        assert_eq!(harness.fetches(), 1);
    }

    #[tokio::test]
    async fn failed_view_enter_goes_to_login() {
        let harness = Harness::new(None);
        let (mut app, mut rx) = app_with(&harness, Route::Profile);
        app.start();
        settle_profile(&mut app, &mut rx).await;
        assert_eq!(app.profile.state(), &ProfileState::Failed);

        app.handle_key(key(KeyCode::Enter)).await.unwrap();

        assert_eq!(harness.routes(), vec![Route::Login, Route::Login]);
    }

    #[tokio::test]
    async fn placeholder_returns_to_profile() {
        let harness = Harness::new(Some(ana()));
        let (mut app, _rx) = app_with(&harness, Route::Login);
        app.on_navigate(Route::Explore);

        app.handle_key(key(KeyCode::Backspace)).await.unwrap();

        assert_eq!(harness.routes(), vec![Route::Profile]);
    }

    #[test]
    fn toasts_and_ticks() {
        let harness = Harness::new(None);
        let (mut app, _rx) = app_with(&harness, Route::Login);

        app.on_event(AppEvent::Toast(Toast::error("boom")));
        app.on_event(AppEvent::Tick);

        assert_eq!(app.toasts.iter().count(), 1);
        assert_eq!(app.spinner_frame, 1);
    }
}
