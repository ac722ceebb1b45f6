use tokio::sync::mpsc::UnboundedSender;

use crate::app::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Explore,
    Profile,
    EditProfile,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Explore => "/explorer",
            Route::Profile => "/profil",
            Route::EditProfile => "/profil/edit",
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that asks the event loop to switch routes
pub struct ChannelNavigator {
    tx: UnboundedSender<AppEvent>,
}

impl ChannelNavigator {
    pub fn new(tx: UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(path = route.path(), "navigate");
        let _ = self.tx.send(AppEvent::Navigate(route));
    }
}
