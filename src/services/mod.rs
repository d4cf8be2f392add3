// Linkshelf services
// Services talk to the outside world: the backend collaborator, its change feed, settings and site URLs.

pub mod backend;
pub mod change_feed;
pub mod settings_engine;
pub mod site_url;
pub mod sqlite_backend;
