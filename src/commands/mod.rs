//! Commands shipped with dok.
use crate::dispatch::{Command, Namespace, Registry};

mod containers;
mod svc;
pub mod update;

pub use containers::{All, Local, Ps, Swarm, CONTAINER_COLUMNS};
pub use svc::{Svc, TASK_COLUMNS};
pub use update::Update;

/// Registry with every built-in command.
///
/// `core` commands are probed before the `docker` ones.
pub fn registry() -> Registry {
    let core: Vec<Box<dyn Command>> = vec![Box::new(Update)];
    let docker: Vec<Box<dyn Command>> = vec![
        Box::new(Ps),
        Box::new(Swarm),
        Box::new(Local),
        Box::new(All),
        Box::new(Svc),
    ];
    Registry::default()
        .with(Namespace::new("core", core))
        .with(Namespace::new("docker", docker))
}

#[cfg(test)]
mod registry_should {
    use super::*;

    #[test]
    fn know_every_builtin_alias() {
        let registry = registry();
        for alias in ["update", "ps", "swarm", "local", "all", "svc"] {
            assert_eq!(registry.resolve(alias).map(|c| c.name()), Some(alias));
        }
    }

    #[test]
    fn only_update_skips_engine_check() {
        let registry = registry();
        let without: Vec<&str> = registry
            .commands()
            .filter(|c| !c.requires_engine())
            .map(|c| c.name())
            .collect();
        assert_eq!(without, vec!["update"]);
    }
}
