//! Container listings: every container, swarm ones, standalone ones, or both groups.
use crate::dispatch::{Command, CommandError, Context};
use crate::output::Console;
use crate::parse::Container;
use crate::table::{print_table, print_title, Column};

/// Columns of every container table.
pub const CONTAINER_COLUMNS: [Column; 4] = [
    Column::fixed("ID", "ID", 12),
    Column::fixed("NAME", "NAME", 34),
    Column::fixed("IMAGE", "IMAGE", 28),
    Column::fixed("PORTS", "PORTS", 28),
];

fn display(console: &mut dyn Console, title: &str, containers: &[Container]) {
    print_title(console, title);
    print_table(console, containers, &CONTAINER_COLUMNS);
}

fn display_swarm(console: &mut dyn Console, containers: &[Container]) {
    display(console, "Swarm containers", containers);
}

fn display_standalone(console: &mut dyn Console, containers: &[Container]) {
    display(console, "Standalone containers", containers);
}

/// `dok ps`
pub struct Ps;

impl Command for Ps {
    fn name(&self) -> &'static str {
        "ps"
    }

    fn description(&self) -> &'static str {
        "List running Docker containers"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok ps")
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &[String]) -> Result<i32, CommandError> {
        let containers = ctx.engine().containers(None)?;
        display(ctx.console, "Containers", &containers);
        Ok(0)
    }
}

/// `dok swarm`
pub struct Swarm;

impl Command for Swarm {
    fn name(&self) -> &'static str {
        "swarm"
    }

    fn description(&self) -> &'static str {
        "List only Swarm containers (with the swarm service label)"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok swarm")
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &[String]) -> Result<i32, CommandError> {
        let classified = ctx.engine().classified_containers()?;
        display_swarm(ctx.console, &classified.swarm);
        Ok(0)
    }
}

/// `dok local`
pub struct Local;

impl Command for Local {
    fn name(&self) -> &'static str {
        "local"
    }

    fn description(&self) -> &'static str {
        "List only standalone containers (without the swarm service label)"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok local")
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &[String]) -> Result<i32, CommandError> {
        let classified = ctx.engine().classified_containers()?;
        display_standalone(ctx.console, &classified.standalone);
        Ok(0)
    }
}

/// `dok all`: swarm section first, standalone section second.
pub struct All;

impl Command for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn description(&self) -> &'static str {
        "List all containers grouped by type (Swarm and Standalone)"
    }

    fn usage(&self) -> Option<&'static str> {
        Some("dok all")
    }

    fn run(&self, ctx: &mut Context<'_>, _args: &[String]) -> Result<i32, CommandError> {
        let classified = ctx.engine().classified_containers()?;
        display_swarm(ctx.console, &classified.swarm);
        display_standalone(ctx.console, &classified.standalone);
        Ok(0)
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use crate::command::{ExecOutput, MockCommandRunner};
    use crate::config::AppConfig;
    use crate::engine::tests::docker_mock;
    use crate::output::MemoryConsole;
    use crate::table::NO_RESULTS;

    const TWO_WEBS: &str =
        "abc123||web-1||nginx:latest||80/tcp\ndef456||web-2||nginx:latest||80/tcp";

    fn run(command: &dyn Command, mock: &MockCommandRunner) -> (i32, MemoryConsole) {
        let config = AppConfig::default();
        let mut console = MemoryConsole::new();
        let mut ctx = Context {
            config: &config,
            runner: mock,
            console: &mut console,
        };
        let code = match command.run(&mut ctx, &[]) {
            Ok(code) => code,
            Err(e) => e.exit_code(),
        };
        (code, console)
    }

    #[test]
    fn list_every_container_with_ps() {
        let mock = docker_mock(TWO_WEBS, &[]);
        let (code, console) = run(&Ps, &mock);
        assert_eq!(code, 0);
        assert_eq!(console.out[1], "=== Containers ===");
        assert!(console.out[2].starts_with("ID            NAME"));
        assert!(console.out[4].starts_with("abc123        web-1"));
        assert_eq!(console.out.len(), 6);
    }

    #[test]
    fn put_labelled_containers_in_swarm_only() {
        let labels = &[("abc123", "web"), ("def456", "web")];
        let mock = docker_mock(TWO_WEBS, labels);
        let (_, swarm) = run(&Swarm, &mock);
        assert_eq!(swarm.out[1], "=== Swarm containers ===");
        assert_eq!(swarm.out.len(), 2 + 2 + 2);

        let mock = docker_mock(TWO_WEBS, labels);
        let (_, local) = run(&Local, &mock);
        assert_eq!(local.out[1], "=== Standalone containers ===");
        assert_eq!(local.out[2], NO_RESULTS);
    }

    #[test]
    fn group_swarm_before_standalone() {
        let mock = docker_mock(TWO_WEBS, &[("def456", "api")]);
        let (code, console) = run(&All, &mock);
        assert_eq!(code, 0);
        let titles: Vec<&String> = console.out.iter().filter(|l| l.starts_with("===")).collect();
        assert_eq!(
            titles,
            vec!["=== Swarm containers ===", "=== Standalone containers ==="]
        );
        let swarm_row = console.out.iter().position(|l| l.starts_with("def456")).unwrap();
        let local_row = console.out.iter().position(|l| l.starts_with("abc123")).unwrap();
        assert!(swarm_row < local_row);
    }

    #[test]
    fn propagate_engine_failure_code() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .returning(|_, _| Ok(ExecOutput::failed(125, "Cannot connect")));
        let (code, console) = run(&Swarm, &mock);
        assert_eq!(code, 125);
        assert!(console.out.is_empty());
    }
}
