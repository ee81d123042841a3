pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod layout;
pub mod surface;
pub mod tile;
pub mod tasks {
    pub mod composer;
    pub mod rotation;
    pub mod viewer;
    pub mod watcher;
}
