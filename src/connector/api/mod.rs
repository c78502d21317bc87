pub mod container;

pub use container::{ChatProvider, Container, ContainerConfig, DATABASE_FILE};
